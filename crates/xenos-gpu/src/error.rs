use crate::arena::ArenaError;
use crate::guest_memory::GuestMemoryError;
use crate::ring::AcquireError;

/// Failure to bring up a [`crate::BufferCache`]. The cache must not be used after this.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid buffer cache config: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("arena provider returned {actual} bytes, expected {expected}")]
    CapacityMismatch { expected: u64, actual: u64 },
}

/// Errors from upload operations.
///
/// Only [`UploadError::Exhausted`] is expected in normal operation: the caller should skip or
/// retry the draw. Everything else indicates a bad request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("transient buffer exhausted: {requested} bytes requested after scavenging")]
    Exhausted { requested: u64 },
    #[error("upload of {requested} bytes exceeds transient buffer capacity {capacity}")]
    TooLarge { requested: u64, capacity: u64 },
    #[error("unsupported endian mode {0:?} for vertex data")]
    UnsupportedEndian(crate::Endian),
    #[error(transparent)]
    GuestMemory(#[from] GuestMemoryError),
}

impl UploadError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, UploadError::Exhausted { .. })
    }
}

impl From<AcquireError> for UploadError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Exhausted { requested, .. } => UploadError::Exhausted { requested },
            AcquireError::TooLarge {
                requested,
                capacity,
            } => UploadError::TooLarge {
                requested,
                capacity,
            },
        }
    }
}
