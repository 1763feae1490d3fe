use thiserror::Error;

/// Precondition violations surfaced by [`crate::dict::Dict`]'s API surface.
///
/// Not-found conditions are never represented here — `find`/`remove` use
/// `Option` for that, keeping "not found" distinct from a genuine error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("dict: expand/resize called while a rehash is already in progress")]
    AlreadyRehashing,
    #[error("dict: requested capacity is smaller than the current element count")]
    CapacityTooSmall,
    #[error("dict: resize is forbidden while automatic resizing is disabled")]
    ResizeForbidden,
    #[error("dict: key already exists")]
    KeyExists,
    #[error("allocation failed growing the table")]
    OutOfMemory,
}

pub type Result<T> = std::result::Result<T, Error>;
