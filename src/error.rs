//! Error type shared by all filters.

/// Invalid filter configuration.
///
/// Returned synchronously by the offending constructor or setter. A setter
/// that fails leaves the filter in its last valid state.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("size must be strictly positive")]
    InvalidSize,
    #[error("block size must be strictly positive")]
    InvalidBlockSize,
    #[error("block size {block_size} must equal the filter size {size}")]
    BlockSizeMismatch { block_size: usize, size: usize },
    #[error("memory must be in (0, 1), got {0}")]
    MemoryOutOfRange(f64),
    #[error("mu must be in (0, 1), got {0}")]
    MuOutOfRange(f64),
    #[error("epsilon must be strictly positive, got {0}")]
    EpsilonOutOfRange(f64),
    #[error("pan must be in [-1, 1], got {0}")]
    PanOutOfRange(f64),
    #[error("expected {expected} weights, got {actual}")]
    WeightLengthMismatch { expected: usize, actual: usize },
    #[error("impulse response has {actual} taps, at most {max} are supported")]
    ImpulseResponseTooLong { max: usize, actual: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
