//! Bridge error types.

use parley_proto::PayloadMode;
use thiserror::Error;

/// Errors from the loopback bridge and its text sender.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A frame of the wrong shape reached the bridge.
    #[error("unexpected {actual} frame on a {expected} bridge")]
    UnexpectedFrame {
        /// Shape the bridge decodes.
        expected: PayloadMode,
        /// Shape that arrived.
        actual: &'static str,
    },

    /// The session no longer accepts outbound text.
    #[error("session closed, text not sent")]
    Closed,
}
