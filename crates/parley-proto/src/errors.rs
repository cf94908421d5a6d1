//! Protocol error types.
//!
//! Every failure that can come out of reading or writing a frame. Callers in
//! the relay layer log the variant and stop the loop; they never try to
//! resynchronize a stream after one of these.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced by the wire codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Length prefix announced more bytes than a frame may carry.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Announced payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// Stream ended in the middle of a frame.
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    FrameTruncated {
        /// Bytes the frame announced.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Payload is not well-formed CBOR.
    #[error("corrupted frame: invalid encoding at offset {offset}")]
    CorruptedFrame {
        /// Byte offset of the syntax error inside the payload.
        offset: usize,
    },

    /// Payload is valid CBOR but not a message record (missing or mistyped
    /// fields, or a bare primitive in place of a record).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Record could not be encoded.
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// A frame of the wrong shape arrived (text where a record was expected,
    /// or the reverse).
    #[error("unexpected frame: expected {expected}, got {actual}")]
    UnexpectedFrame {
        /// Shape the reader expected.
        expected: &'static str,
        /// Shape that arrived.
        actual: &'static str,
    },

    /// A text frame cannot be projected into a structured record because it
    /// carries no author or date.
    #[error("cannot project a text frame into a structured record")]
    UnsupportedProjection,
}

impl ProtocolError {
    /// True for failures caused by the bytes on the wire rather than by the
    /// transport.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::FrameTooLarge { .. }
                | Self::FrameTruncated { .. }
                | Self::CorruptedFrame { .. }
                | Self::MalformedRecord(_)
                | Self::UnexpectedFrame { .. }
        )
    }
}

impl From<ciborium::de::Error<std::io::Error>> for ProtocolError {
    fn from(err: ciborium::de::Error<std::io::Error>) -> Self {
        match err {
            ciborium::de::Error::Io(e) => Self::Io(e),
            ciborium::de::Error::Syntax(offset) => Self::CorruptedFrame { offset },
            ciborium::de::Error::Semantic(_, msg) => Self::MalformedRecord(msg),
            ciborium::de::Error::RecursionLimitExceeded => {
                Self::MalformedRecord("recursion limit exceeded".to_string())
            },
        }
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for ProtocolError {
    fn from(err: ciborium::ser::Error<std::io::Error>) -> Self {
        match err {
            ciborium::ser::Error::Io(e) => Self::Io(e),
            ciborium::ser::Error::Value(msg) => Self::CborEncode(msg),
        }
    }
}
