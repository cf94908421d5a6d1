//! Server to local output.

use parley_proto::{FrameReader, ReadOutcome};
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

use super::{RelayError, RelayExit};
use crate::{FrameSink, RunFlag};

/// Decodes frames from the server and hands them to a local sink.
///
/// The server's wire shape is fixed by the reader's mode; the local shape is
/// fixed by the sink's mode. Records may be projected to text on the way
/// through, never the reverse.
pub struct InboundRelay<R, K> {
    server: Option<FrameReader<R>>,
    sink: K,
    run_flag: RunFlag,
    closed: bool,
}

impl<R: AsyncRead + Unpin + Send, K: FrameSink> InboundRelay<R, K> {
    /// Relay frames from `server` into `sink`.
    pub fn new(server: FrameReader<R>, sink: K, run_flag: RunFlag) -> Self {
        Self { server: Some(server), sink, run_flag, closed: false }
    }

    /// Run until the server closes, sends a null record, sends an undecodable
    /// frame, the sink fails, or a stop request.
    ///
    /// Always leaves the shared run flag stopped.
    pub async fn run(&mut self) -> RelayExit {
        let exit = loop {
            if !self.run_flag.is_running() {
                break RelayExit::Stopped;
            }
            let Some(server) = self.server.as_mut() else {
                break RelayExit::Stopped;
            };

            let outcome = tokio::select! {
                biased;
                () = self.run_flag.stopped() => break RelayExit::Stopped,
                outcome = server.read_frame() => outcome,
            };

            match outcome {
                Ok(ReadOutcome::Frame(frame)) => {
                    debug!(kind = frame.kind(), "frame received from server");
                    if let Err(e) = self.sink.send_frame(frame).await {
                        error!(error = %RelayError::LocalWrite(e), "inbound relay failed");
                        break RelayExit::Failed;
                    }
                },
                Ok(ReadOutcome::NullRecord) => {
                    info!("null record from server");
                    break RelayExit::NullRecord;
                },
                Ok(ReadOutcome::EndOfStream) => {
                    info!("server closed the stream");
                    break RelayExit::EndOfStream;
                },
                Err(e) => {
                    let e = RelayError::ServerRead(e);
                    if e.is_decode_failure() {
                        warn!(error = %e, "undecodable frame from server");
                    } else {
                        error!(error = %e, "inbound relay failed");
                    }
                    break RelayExit::Failed;
                },
            }
        };

        if self.run_flag.stop() {
            info!(%exit, "inbound relay stopped the session");
        }
        debug!(%exit, "inbound relay finished");
        exit
    }

    /// Drop the server decoder and close the local sink. Errors are logged
    /// only.
    pub async fn cleanup(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        debug!("closing server input");
        self.server = None;

        debug!("closing local output");
        if let Err(e) = self.sink.close().await {
            warn!(error = %e, "failed to close local output");
        }
    }
}
