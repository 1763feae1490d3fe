//! Process-wide configuration shared by every [`crate::dict::Dict`].
//!
//! The hash seed and the automatic-resize toggle are genuine globals: set
//! once at startup, or at a quiescent point such as "before a fork-based
//! snapshot", and read by every dictionary in the process. They're kept as
//! plain atomics rather than threaded through every call, preserving that
//! one-global behavior while still exposing setters for it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

static HASH_FUNCTION_SEED: AtomicU32 = AtomicU32::new(0);
static RESIZE_ENABLED: AtomicBool = AtomicBool::new(true);

/// Sets the seed mixed into every [`crate::hash::gen_hash_function`] /
/// [`crate::hash::gen_case_hash_function`] call. Identical seeds across runs
/// produce identical hashes for identical inputs.
pub fn set_hash_function_seed(seed: u32) {
    HASH_FUNCTION_SEED.store(seed, Ordering::Relaxed);
}

/// Returns the seed currently mixed into the built-in hash functions.
pub fn hash_function_seed() -> u32 {
    HASH_FUNCTION_SEED.load(Ordering::Relaxed)
}

/// Disables automatic table growth on insert across every dictionary in the
/// process. Used by external mechanisms — e.g. a fork-based snapshot — that
/// want to avoid copy-on-write page churn while a child process reads a
/// stable table.
pub fn disable_resize() {
    RESIZE_ENABLED.store(false, Ordering::Relaxed);
}

/// Re-enables automatic table growth (the default).
pub fn enable_resize() {
    RESIZE_ENABLED.store(true, Ordering::Relaxed);
}

/// Whether automatic growth-on-insert is currently permitted.
pub fn resize_enabled() -> bool {
    RESIZE_ENABLED.load(Ordering::Relaxed)
}
