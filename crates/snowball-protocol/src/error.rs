//! Protocol error types.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame does not have the expected length.
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    Malformed {
        /// The required frame length.
        expected: usize,
        /// The length that was received.
        actual: usize,
    },

    /// The stream ended in the middle of a frame.
    #[error("truncated frame: stream closed after {0} bytes")]
    Truncated(usize),

    /// The index cannot be represented as a signed 64-bit integer.
    #[error("index {0} does not fit in a request frame")]
    IndexTooLarge(u64),

    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
