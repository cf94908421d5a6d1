//! Loopback bridge between a session and a presentation layer.
//!
//! The bridge owns both ends of two bounded channels. The session side gets a
//! [`BridgeSink`] (inbound relay output) and a [`BridgeSource`] (outbound relay
//! input) through [`LoopbackBridge::take_endpoints`]; the presentation side
//! gets decoded calls on its [`MessageHandler`] and a [`TextSender`].
//!
//! ```text
//! InboundRelay ──► BridgeSink ══frames══► LoopbackBridge::run ──► MessageHandler
//! OutboundRelay ◄── BridgeSource ◄══lines══ TextSender ◄── presentation
//! ```
//!
//! The bridge decodes one shape, fixed at construction. In structured mode
//! each record produces `receive_message`, then `receive_participant` when it
//! names an author, then `request_full_rerender`. In text mode each line
//! produces `receive_text` only.
//!
//! The loop has no cancel token of its own. It ends when the session closes
//! the sink (always true once the session is cleaned up) or when a frame of
//! the wrong shape arrives.

use parley_client::{ChannelSink, RelayExit, RunFlag};
use parley_proto::{Frame, PayloadMode};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{BridgeError, ColorCache, MessageHandler, TextSender};

/// Default capacity of each bridge channel.
pub const BRIDGE_CAPACITY: usize = 64;

/// Session-facing end the inbound relay writes into.
pub type BridgeSink = ChannelSink;

/// Session-facing end the outbound relay reads from.
pub type BridgeSource = mpsc::Receiver<String>;

/// Presentation-facing counterpart of a session.
pub struct LoopbackBridge<H> {
    mode: PayloadMode,
    handler: H,
    frames: mpsc::Receiver<Frame>,
    lines: mpsc::Sender<String>,
    endpoints: Option<(BridgeSink, BridgeSource)>,
    run_flag: RunFlag,
    colors: ColorCache,
    closed: bool,
}

impl<H: MessageHandler> LoopbackBridge<H> {
    /// Bridge decoding `mode` frames into `handler`, with default capacity.
    pub fn new(mode: PayloadMode, handler: H, run_flag: RunFlag) -> Self {
        Self::with_capacity(mode, handler, run_flag, BRIDGE_CAPACITY)
    }

    /// Bridge whose channels each buffer up to `capacity` items (at least 1).
    pub fn with_capacity(mode: PayloadMode, handler: H, run_flag: RunFlag, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (frame_tx, frames) = mpsc::channel(capacity);
        let (lines, line_rx) = mpsc::channel(capacity);

        Self {
            mode,
            handler,
            frames,
            lines,
            endpoints: Some((ChannelSink::new(frame_tx, mode), line_rx)),
            run_flag,
            colors: ColorCache::new(),
            closed: false,
        }
    }

    /// Shape this bridge decodes.
    pub fn mode(&self) -> PayloadMode {
        self.mode
    }

    /// Hand the session-facing ends to a session. Returns `None` after the
    /// first call.
    pub fn take_endpoints(&mut self) -> Option<(BridgeSink, BridgeSource)> {
        self.endpoints.take()
    }

    /// Handle for queueing outbound text.
    pub fn text_sender(&self) -> TextSender {
        TextSender::new(self.lines.clone())
    }

    /// Colors of the participants seen by this bridge.
    pub fn colors(&self) -> ColorCache {
        self.colors.clone()
    }

    /// Flag shared with the session.
    pub fn run_flag(&self) -> &RunFlag {
        &self.run_flag
    }

    /// The presentation handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The presentation handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the bridge, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Decode frames into the handler until the session closes the sink or a
    /// frame of the wrong shape arrives, then clean up.
    ///
    /// Leaves the shared run flag stopped.
    pub async fn run(&mut self) -> RelayExit {
        if self.endpoints.take().is_some() {
            warn!("bridge started with no session attached");
        }

        let exit = loop {
            let Some(frame) = self.frames.recv().await else {
                debug!("bridge input closed");
                break RelayExit::EndOfStream;
            };

            if let Err(e) = self.dispatch(frame) {
                warn!(error = %e, "bridge stopped");
                break RelayExit::Failed;
            }
        };

        if self.run_flag.stop() {
            info!(%exit, "bridge stopped the session");
        }
        self.cleanup();
        exit
    }

    fn dispatch(&mut self, frame: Frame) -> Result<(), BridgeError> {
        match (self.mode, frame) {
            (PayloadMode::Structured, Frame::Message(message)) => {
                let author = message.author().filter(|a| !a.is_empty()).map(str::to_string);
                self.handler.receive_message(message);
                if let Some(author) = author {
                    self.colors.color_for(&author);
                    self.handler.receive_participant(&author);
                }
                self.handler.request_full_rerender();
                Ok(())
            },
            (PayloadMode::Text, Frame::Text(line)) => {
                self.handler.receive_text(line);
                Ok(())
            },
            (expected, frame) => Err(BridgeError::UnexpectedFrame { expected, actual: frame.kind() }),
        }
    }

    /// Close the inbound channel and drop anything still queued.
    pub fn cleanup(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        debug!("closing bridge input");
        self.frames.close();
        while self.frames.try_recv().is_ok() {}
    }
}
