//! Directional relay loops.
//!
//! Each relay moves frames in one direction and owns one half of the server
//! socket. Both share a [`RunFlag`](crate::RunFlag): whichever relay stops
//! first flips it, and the other one notices on its next iteration or while
//! parked in its blocking read.

mod inbound;
mod outbound;

use std::{fmt, io};

pub use inbound::InboundRelay;
pub use outbound::OutboundRelay;
use parley_proto::ProtocolError;
use thiserror::Error;

/// Why a relay loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayExit {
    /// The participant typed the farewell keyword.
    Farewell,
    /// The input side reached end of stream.
    EndOfStream,
    /// The server sent a null record.
    NullRecord,
    /// The shared run flag was stopped by someone else.
    Stopped,
    /// A read or write failed.
    Failed,
}

impl RelayExit {
    /// Whether the loop ended without an I/O or decode failure.
    pub fn is_clean(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for RelayExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Farewell => "farewell",
            Self::EndOfStream => "end of stream",
            Self::NullRecord => "null record",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Failure inside a relay iteration.
///
/// These never leave the relay: the loop logs them and exits with
/// [`RelayExit::Failed`].
#[derive(Debug, Error)]
pub enum RelayError {
    /// Reading local input failed.
    #[error("local read failed: {0}")]
    LocalRead(#[source] io::Error),

    /// Reading or decoding from the server failed.
    #[error("server read failed: {0}")]
    ServerRead(#[source] ProtocolError),

    /// Writing to the server failed.
    #[error("server write failed: {0}")]
    ServerWrite(#[source] ProtocolError),

    /// Writing to the local sink failed.
    #[error("local write failed: {0}")]
    LocalWrite(#[source] ProtocolError),
}

impl RelayError {
    /// Whether the failure came from a malformed frame rather than transport.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::ServerRead(e) if e.is_decode_failure())
    }
}
