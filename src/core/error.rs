//! Error types for the codec core.

use thiserror::Error;

/// Everything that can go wrong while encoding or decoding a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlcError {
    /// Frame length, bit depth, channel count or Rice tuning out of range.
    #[error("malformed config: {0}")]
    MalformedConfig(String),

    /// Caller buffers disagree with the config.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The bit cursor ran past the end of its buffer.
    #[error("bitstream underrun")]
    Underrun,

    /// A value no well-formed encoder could have produced.
    #[error("stream desynchronized: {0}")]
    Desync(String),

    /// Prediction order at or above the frame length or the hard cap.
    #[error("unsupported prediction order {order} (limit {limit})")]
    UnsupportedOrder { order: usize, limit: usize },
}

impl AlcError {
    /// Per-frame errors that a resync may get past. Config and input errors
    /// abort the whole call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AlcError::Underrun | AlcError::Desync(_) | AlcError::UnsupportedOrder { .. }
        )
    }
}

/// result type for codec stuff
pub type AlcResult<T> = Result<T, AlcError>;
