//! Local endpoints of a session.
//!
//! The relays never touch stdin, stdout, or a presentation layer directly.
//! They read from a [`LineSource`] and write into a [`FrameSink`], so the same
//! relay code serves the console client (byte streams) and the loopback
//! bridge (in-memory channels).

use std::{future::Future, io};

use parley_proto::{Frame, FrameWriter, PayloadMode, ProtocolError, read_text_line};
use tokio::{
    io::{AsyncRead, AsyncWrite, BufReader},
    sync::mpsc,
};

/// Producer of locally typed lines, consumed by the outbound relay.
pub trait LineSource: Send {
    /// Wait for the next line.
    ///
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input fails.
    fn next_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;

    /// Release the input. Later reads report end of input.
    fn close(&mut self);
}

/// Consumer of frames relayed from the server, fed by the inbound relay.
pub trait FrameSink: Send {
    /// Shape this sink wants frames in.
    fn mode(&self) -> PayloadMode;

    /// Deliver one frame, projected to [`FrameSink::mode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be projected or the sink is gone.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Flush and release the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&mut self) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

/// [`LineSource`] over any async byte reader (stdin, a socket half, a test
/// buffer).
///
/// Lines are split the way text frames are: bytes that are not UTF-8 are
/// replaced, and an over-long line is an [`io::ErrorKind::InvalidData`] error.
pub struct LineReader<R> {
    reader: Option<BufReader<R>>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Split `reader` into lines.
    pub fn new(reader: R) -> Self {
        Self { reader: Some(BufReader::new(reader)), buf: Vec::new() }
    }
}

impl<R: AsyncRead + Unpin + Send> LineSource for LineReader<R> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        read_text_line(reader, &mut self.buf).await.map_err(|e| match e {
            ProtocolError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        })
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

impl LineSource for mpsc::Receiver<String> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.recv().await)
    }

    fn close(&mut self) {
        mpsc::Receiver::close(self);
    }
}

impl<W: AsyncWrite + Unpin + Send> FrameSink for FrameWriter<W> {
    fn mode(&self) -> PayloadMode {
        FrameWriter::mode(self)
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), ProtocolError> {
        self.write_frame(frame).await
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.shutdown().await
    }
}

/// [`FrameSink`] feeding a bounded in-memory channel.
///
/// Frames are projected to the sink's mode before they are queued, so the
/// receiving side only ever sees one shape.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<mpsc::Sender<Frame>>,
    mode: PayloadMode,
}

impl ChannelSink {
    /// Sink delivering `mode`-shaped frames into `tx`.
    pub fn new(tx: mpsc::Sender<Frame>, mode: PayloadMode) -> Self {
        Self { tx: Some(tx), mode }
    }

    /// Whether the receiving side is still attached.
    pub fn is_open(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl FrameSink for ChannelSink {
    fn mode(&self) -> PayloadMode {
        self.mode
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), ProtocolError> {
        let frame = frame.project(self.mode)?;
        let tx = self.tx.as_ref().ok_or_else(closed_channel)?;
        tx.send(frame).await.map_err(|_| closed_channel())
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.tx = None;
        Ok(())
    }
}

fn closed_channel() -> ProtocolError {
    ProtocolError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "local channel closed"))
}

#[cfg(test)]
mod tests {
    use parley_proto::Message;

    use super::*;

    #[tokio::test]
    async fn line_reader_yields_lines_then_none() {
        let mut source = LineReader::new(&b"one\ntwo\n"[..]);

        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("two"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn line_reader_replaces_invalid_utf8() {
        let mut source = LineReader::new(&b"caf\xe9\r\nhello\n"[..]);

        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("caf\u{fffd}"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn closed_line_reader_reports_end() {
        let mut source = LineReader::new(&b"one\n"[..]);
        LineSource::close(&mut source);

        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn channel_sink_projects_records_to_text() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx, PayloadMode::Text);

        sink.send_frame(Frame::Message(Message::system("maintenance"))).await.unwrap();

        match rx.recv().await {
            Some(Frame::Text(line)) => assert!(line.ends_with("maintenance"), "got {line}"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn channel_sink_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx, PayloadMode::Text);
        drop(rx);

        assert!(!sink.is_open());
        let err = sink.send_frame(Frame::Text("lost".into())).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }

    #[tokio::test]
    async fn closed_channel_sink_rejects_frames() {
        let (tx, _rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx, PayloadMode::Text);
        sink.close().await.unwrap();

        assert!(sink.send_frame(Frame::Text("late".into())).await.is_err());
    }
}
