//! Local input to server.

use std::io;

use parley_proto::{FrameWriter, vocabulary};
use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};

use super::{RelayError, RelayExit};
use crate::{LineSource, RunFlag};

/// Forwards locally typed lines to the server, verbatim, one line per frame.
///
/// Lines are never interpreted except for the farewell keyword, which is
/// forwarded and then ends the loop.
pub struct OutboundRelay<S, W> {
    source: S,
    server: FrameWriter<W>,
    run_flag: RunFlag,
    closed: bool,
}

impl<S: LineSource, W: AsyncWrite + Unpin + Send> OutboundRelay<S, W> {
    /// Relay lines from `source` into `server`.
    pub fn new(source: S, server: FrameWriter<W>, run_flag: RunFlag) -> Self {
        Self { source, server, run_flag, closed: false }
    }

    /// Run until farewell, end of input, an I/O failure, or a stop request.
    ///
    /// Always leaves the shared run flag stopped.
    pub async fn run(&mut self) -> RelayExit {
        let exit = loop {
            if !self.run_flag.is_running() {
                break RelayExit::Stopped;
            }

            let line = tokio::select! {
                biased;
                () = self.run_flag.stopped() => break RelayExit::Stopped,
                line = self.source.next_line() => line,
            };

            match self.forward(line).await {
                Ok(None) => {},
                Ok(Some(exit)) => break exit,
                Err(e) => {
                    warn!(error = %e, "outbound relay failed");
                    break RelayExit::Failed;
                },
            }
        };

        if self.run_flag.stop() {
            info!(%exit, "outbound relay stopped the session");
        }
        debug!(%exit, "outbound relay finished");
        exit
    }

    async fn forward(
        &mut self,
        line: io::Result<Option<String>>,
    ) -> Result<Option<RelayExit>, RelayError> {
        let Some(line) = line.map_err(RelayError::LocalRead)? else {
            info!("local input ended");
            return Ok(Some(RelayExit::EndOfStream));
        };

        self.server.write_raw_line(&line).await.map_err(RelayError::ServerWrite)?;
        debug!(len = line.len(), "line sent to server");

        if vocabulary::is_bye(&line) {
            info!("farewell sent");
            return Ok(Some(RelayExit::Farewell));
        }
        Ok(None)
    }

    /// Close local input and the server write half. Errors are logged only.
    pub async fn cleanup(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        debug!("closing local input");
        self.source.close();

        debug!("closing server output");
        if let Err(e) = self.server.shutdown().await {
            warn!(error = %e, "failed to close server output");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parley_proto::PayloadMode;
    use tokio::{
        io::{AsyncReadExt, DuplexStream, duplex},
        sync::mpsc,
    };

    use super::*;
    use crate::LineReader;

    fn relay_over<S: LineSource>(source: S) -> (OutboundRelay<S, DuplexStream>, DuplexStream, RunFlag) {
        let (client, server) = duplex(4096);
        let flag = RunFlag::new();
        let relay = OutboundRelay::new(source, FrameWriter::new(client, PayloadMode::Text), flag.clone());
        (relay, server, flag)
    }

    async fn drain(mut server: DuplexStream) -> String {
        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        received
    }

    #[tokio::test]
    async fn farewell_is_forwarded_then_stops() {
        let (mut relay, server, flag) = relay_over(LineReader::new(&b"hello\nBYE\nnever sent\n"[..]));

        assert_eq!(relay.run().await, RelayExit::Farewell);
        assert!(!flag.is_running());

        relay.cleanup().await;
        assert_eq!(drain(server).await, "hello\nBYE\n");
    }

    #[tokio::test]
    async fn end_of_input_stops_the_session() {
        let (mut relay, server, flag) = relay_over(LineReader::new(&b"one\ntwo\n"[..]));

        assert_eq!(relay.run().await, RelayExit::EndOfStream);
        assert!(!flag.is_running());

        relay.cleanup().await;
        assert_eq!(drain(server).await, "one\ntwo\n");
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_session() {
        let (mut relay, server, _flag) = relay_over(LineReader::new(&b"caf\xe9\nhello\n"[..]));

        assert_eq!(relay.run().await, RelayExit::EndOfStream);

        relay.cleanup().await;
        assert_eq!(drain(server).await, "caf\u{fffd}\nhello\n");
    }

    #[tokio::test]
    async fn stopped_flag_prevents_any_write() {
        let (mut relay, server, flag) = relay_over(LineReader::new(&b"ignored\n"[..]));
        flag.stop();

        assert_eq!(relay.run().await, RelayExit::Stopped);

        relay.cleanup().await;
        assert_eq!(drain(server).await, "");
    }

    #[tokio::test]
    async fn stop_wakes_relay_parked_on_input() {
        let (tx, rx) = mpsc::channel::<String>(1);
        let (mut relay, _server, flag) = relay_over(rx);

        let task = tokio::spawn(async move { relay.run().await });
        tokio::task::yield_now().await;
        flag.stop();

        let exit = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("relay should notice the stop")
            .unwrap();
        assert_eq!(exit, RelayExit::Stopped);
        drop(tx);
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let (mut relay, server, _flag) = relay_over(LineReader::new(&b""[..]));

        relay.cleanup().await;
        relay.cleanup().await;
        assert_eq!(drain(server).await, "");
    }
}
