//! Outbound text handle.

use tokio::sync::mpsc;
use tracing::warn;

use crate::BridgeError;

/// Cloneable "send text" handle feeding a session's outbound relay.
///
/// Each call queues one line; the relay forwards it verbatim to the server.
#[derive(Debug, Clone)]
pub struct TextSender {
    tx: mpsc::Sender<String>,
}

impl TextSender {
    pub(crate) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Queue `text` from async code, waiting for room in the channel.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Closed`] once the session stopped reading.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.tx.send(text.into()).await.map_err(|_| closed())
    }

    /// Queue `text` from a plain thread, blocking until there is room.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Closed`] once the session stopped reading.
    pub fn blocking_send_text(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.tx.blocking_send(text.into()).map_err(|_| closed())
    }

    /// Whether the session stopped reading.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

fn closed() -> BridgeError {
    warn!("text dropped, session closed");
    BridgeError::Closed
}
