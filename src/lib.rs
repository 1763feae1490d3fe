//! Core in-memory data structures behind a Redis-like key/value store: a
//! binary-safe dynamic string, a compact sorted integer set, and an
//! incrementally-rehashing hash table.

/// Process-wide configuration: hash seed, automatic-resize toggle.
pub mod config;
/// Incrementally-rehashing chained hash table.
pub mod dict;
/// Crate-level error type.
pub mod error;
/// Built-in seeded hash functions (MurmurHash2).
pub mod hash;
/// Compact sorted integer set with automatic width upgrade.
pub mod intset;
/// Binary-safe dynamic string with amortized growth.
pub mod sds;

pub use dict::Dict;
pub use error::{Error, Result};
pub use intset::IntSet;
pub use sds::SdsString;
