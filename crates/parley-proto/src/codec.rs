//! Wire codec for both payload modes.
//!
//! Two frame shapes share one TCP stream type:
//!
//! - Text: UTF-8 line terminated by `\n` (a preceding `\r` is stripped).
//!   Invalid UTF-8 is replaced with U+FFFD, not rejected.
//! - Structured: `[length: u32 BE][payload: CBOR Message record]`.
//!
//! CBOR is self-describing (field names travel with the record), so a
//! record missing a field, carrying a mistyped one, or holding a bare
//! primitive is detected on decode. A CBOR `null` in place of a record is
//! reported as [`ReadOutcome::NullRecord`], which readers treat as a stop
//! condition rather than a decode failure.
//!
//! # Invariants
//!
//! - A structured payload never exceeds [`MAX_RECORD_SIZE`]; the limit is
//!   checked on both encode and decode before any payload allocation.
//! - A text line never exceeds [`MAX_LINE_SIZE`] bytes before its
//!   terminator; a longer one yields [`ProtocolError::FrameTooLarge`].
//! - End of stream is only "clean" on a frame boundary. A stream that ends
//!   inside a length prefix or payload yields
//!   [`ProtocolError::FrameTruncated`].

use bytes::BufMut;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};

use crate::{
    Message, PayloadMode,
    errors::{ProtocolError, Result},
};

/// Size of the structured frame length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Maximum structured payload size (1 MiB).
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Maximum text line size, terminator excluded.
pub const MAX_LINE_SIZE: usize = MAX_RECORD_SIZE;

/// One discrete unit of wire data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text line, without its terminator.
    Text(String),
    /// A structured message record.
    Message(Message),
}

impl Frame {
    /// Shape name used in log lines and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Message(_) => "record",
        }
    }

    /// Convert this frame to the shape required by `mode`.
    ///
    /// A record projects to text through its display form. Text cannot be
    /// projected to a record.
    pub fn project(self, mode: PayloadMode) -> Result<Self> {
        match (mode, self) {
            (PayloadMode::Text, Self::Message(message)) => Ok(Self::Text(message.to_string())),
            (PayloadMode::Structured, Self::Text(_)) => Err(ProtocolError::UnsupportedProjection),
            (_, frame) => Ok(frame),
        }
    }
}

/// Result of one blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete frame.
    Frame(Frame),
    /// A structured `null` arrived where a record was expected.
    NullRecord,
    /// Peer closed the stream on a frame boundary.
    EndOfStream,
}

/// Encode `message` as a length-prefixed record into `dst`.
pub fn encode_record(message: &Message, dst: &mut impl BufMut) -> Result<()> {
    let mut payload = Vec::new();
    ciborium::into_writer(message, &mut payload)?;

    if payload.len() > MAX_RECORD_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: payload.len(), max: MAX_RECORD_SIZE });
    }

    // INVARIANT: payload.len() <= MAX_RECORD_SIZE < u32::MAX
    dst.put_u32(payload.len() as u32);
    dst.put_slice(&payload);
    Ok(())
}

/// Decode one length-prefixed record from the start of `bytes`.
///
/// Trailing bytes after the record are ignored.
pub fn decode_record(bytes: &[u8]) -> Result<Option<Message>> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = bytes
        .get(..LENGTH_PREFIX_SIZE)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(ProtocolError::FrameTruncated { expected: LENGTH_PREFIX_SIZE, actual: bytes.len() })?;

    let size = checked_size(prefix)?;
    let available = bytes.len() - LENGTH_PREFIX_SIZE;
    let payload = bytes
        .get(LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + size)
        .ok_or(ProtocolError::FrameTruncated { expected: size, actual: available })?;

    decode_payload(payload)
}

fn checked_size(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
    let size = u32::from_be_bytes(prefix) as usize;
    if size > MAX_RECORD_SIZE {
        return Err(ProtocolError::FrameTooLarge { size, max: MAX_RECORD_SIZE });
    }
    Ok(size)
}

fn decode_payload(payload: &[u8]) -> Result<Option<Message>> {
    Ok(ciborium::from_reader::<Option<Message>, _>(payload)?)
}

/// Read as many bytes as available into `buf`, stopping early only at end of
/// stream. Returns the number of bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one `\n`-terminated line into `buf` and decode it lossily.
///
/// The terminator and a trailing `\r` are stripped. A final line without a
/// terminator is still returned. Returns `None` at end of stream.
///
/// # Errors
///
/// - [`ProtocolError::FrameTooLarge`] if no terminator arrives within
///   [`MAX_LINE_SIZE`] bytes
/// - [`ProtocolError::Io`] if the stream fails
pub async fn read_text_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for the line plus "\r\n"; anything that still does not fit is over.
    let limit = MAX_LINE_SIZE as u64 + 2;
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: buf.len(), max: MAX_LINE_SIZE });
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Decoding half of a stream, fixed to one payload mode.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    mode: PayloadMode,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap `reader`, decoding frames of shape `mode`.
    pub fn new(reader: R, mode: PayloadMode) -> Self {
        Self { reader: BufReader::new(reader), mode, line: Vec::new() }
    }

    /// Payload mode this reader decodes.
    pub fn mode(&self) -> PayloadMode {
        self.mode
    }

    /// Block until one frame, a null record, or end of stream.
    pub async fn read_frame(&mut self) -> Result<ReadOutcome> {
        match self.mode {
            PayloadMode::Text => self.read_line().await,
            PayloadMode::Structured => self.read_record().await,
        }
    }

    async fn read_line(&mut self) -> Result<ReadOutcome> {
        Ok(match read_text_line(&mut self.reader, &mut self.line).await? {
            Some(line) => ReadOutcome::Frame(Frame::Text(line)),
            None => ReadOutcome::EndOfStream,
        })
    }

    async fn read_record(&mut self) -> Result<ReadOutcome> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let got = read_full(&mut self.reader, &mut prefix).await?;
        if got == 0 {
            return Ok(ReadOutcome::EndOfStream);
        }
        if got < LENGTH_PREFIX_SIZE {
            return Err(ProtocolError::FrameTruncated { expected: LENGTH_PREFIX_SIZE, actual: got });
        }

        let size = checked_size(prefix)?;
        let mut payload = vec![0u8; size];
        let got = read_full(&mut self.reader, &mut payload).await?;
        if got < size {
            return Err(ProtocolError::FrameTruncated { expected: size, actual: got });
        }

        Ok(match decode_payload(&payload)? {
            Some(message) => ReadOutcome::Frame(Frame::Message(message)),
            None => ReadOutcome::NullRecord,
        })
    }

    /// Unwrap the underlying reader. Buffered, unread bytes are dropped.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Encoding half of a stream, fixed to one payload mode.
///
/// Every write is flushed before returning, so a frame is on the wire (or has
/// failed) by the time the call completes.
pub struct FrameWriter<W> {
    writer: BufWriter<W>,
    mode: PayloadMode,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap `writer`, encoding frames of shape `mode`.
    pub fn new(writer: W, mode: PayloadMode) -> Self {
        Self { writer: BufWriter::new(writer), mode }
    }

    /// Payload mode this writer encodes.
    pub fn mode(&self) -> PayloadMode {
        self.mode
    }

    /// Write `frame`, projecting it to this writer's mode first.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        match frame.project(self.mode)? {
            Frame::Text(line) => self.write_raw_line(&line).await,
            Frame::Message(message) => {
                let mut buf = Vec::new();
                encode_record(&message, &mut buf)?;
                self.writer.write_all(&buf).await?;
                self.writer.flush().await?;
                Ok(())
            },
        }
    }

    /// Write a newline-terminated line regardless of mode.
    ///
    /// Used for the handshake, which is always plain text.
    pub async fn write_raw_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and shut down the write side.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample() -> Message {
        let date = Utc.with_ymd_and_hms(2023, 11, 2, 8, 30, 0).single().unwrap_or_default();
        Message::with_date(date, "hi", Some("alice".to_string()))
    }

    #[test]
    fn record_round_trip() {
        let mut buf = Vec::new();
        encode_record(&sample(), &mut buf).unwrap();

        assert_eq!(decode_record(&buf).unwrap(), Some(sample()));
    }

    #[test]
    fn record_preserves_subsecond_date() {
        let msg = Message::from_author("hi", "alice");
        let mut buf = Vec::new();
        encode_record(&msg, &mut buf).unwrap();

        assert_eq!(decode_record(&buf).unwrap(), Some(msg));
    }

    #[test]
    fn missing_fields_take_defaults() {
        #[derive(serde::Serialize)]
        struct Bare {
            author: &'static str,
        }

        let mut payload = Vec::new();
        ciborium::into_writer(&Bare { author: "bob" }, &mut payload).unwrap();
        let decoded = decode_payload(&payload).unwrap().unwrap();

        assert_eq!(decoded.content(), "");
        assert_eq!(decoded.author(), Some("bob"));
    }

    #[test]
    fn primitive_in_place_of_record_is_malformed() {
        let mut payload = Vec::new();
        ciborium::into_writer(&42u32, &mut payload).unwrap();

        let mut frame = Vec::new();
        frame.put_u32(payload.len() as u32);
        frame.put_slice(&payload);

        assert!(matches!(decode_record(&frame), Err(ProtocolError::MalformedRecord(_))));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let frame = [0, 0, 0, 3, 0xff, 0xff, 0xff];
        let err = decode_record(&frame).unwrap_err();
        assert!(err.is_decode_failure(), "unexpected error: {err:?}");
    }

    #[test]
    fn null_record_is_reported() {
        let mut payload = Vec::new();
        ciborium::into_writer(&Option::<Message>::None, &mut payload).unwrap();

        let mut frame = Vec::new();
        frame.put_u32(payload.len() as u32);
        frame.put_slice(&payload);

        assert_eq!(decode_record(&frame).unwrap(), None);
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let frame = (MAX_RECORD_SIZE as u32 + 1).to_be_bytes();
        assert!(matches!(decode_record(&frame), Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut buf = Vec::new();
        encode_record(&sample(), &mut buf).unwrap();
        buf.truncate(buf.len() - 2);

        assert!(matches!(decode_record(&buf), Err(ProtocolError::FrameTruncated { .. })));
    }

    #[test]
    fn text_cannot_become_record() {
        let frame = Frame::Text("hi".to_string());
        assert!(matches!(
            frame.project(PayloadMode::Structured),
            Err(ProtocolError::UnsupportedProjection)
        ));
    }

    #[test]
    fn record_projects_to_display_text() {
        let frame = Frame::Message(sample()).project(PayloadMode::Text).unwrap();
        assert_eq!(frame, Frame::Text("[2023/11/02 08:30:00] alice : hi".to_string()));
    }

    #[tokio::test]
    async fn reader_yields_records_then_end() {
        let mut wire = Vec::new();
        encode_record(&sample(), &mut wire).unwrap();
        encode_record(&Message::system("notice"), &mut wire).unwrap();

        let mut reader = FrameReader::new(wire.as_slice(), PayloadMode::Structured);

        assert_eq!(reader.read_frame().await.unwrap(), ReadOutcome::Frame(Frame::Message(sample())));
        assert!(matches!(reader.read_frame().await.unwrap(), ReadOutcome::Frame(Frame::Message(_))));
        assert_eq!(reader.read_frame().await.unwrap(), ReadOutcome::EndOfStream);
    }

    #[tokio::test]
    async fn reader_rejects_partial_prefix() {
        let wire = [0u8, 0];
        let mut reader = FrameReader::new(&wire[..], PayloadMode::Structured);

        assert!(matches!(reader.read_frame().await, Err(ProtocolError::FrameTruncated { .. })));
    }

    #[tokio::test]
    async fn reader_splits_lines() {
        let wire = b"hello\r\nworld\nlast";
        let mut reader = FrameReader::new(&wire[..], PayloadMode::Text);

        let mut lines = Vec::new();
        while let ReadOutcome::Frame(Frame::Text(line)) = reader.read_frame().await.unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, vec!["hello", "world", "last"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let wire = b"caf\xe9\nhello\n";
        let mut reader = FrameReader::new(&wire[..], PayloadMode::Text);

        assert_eq!(
            reader.read_frame().await.unwrap(),
            ReadOutcome::Frame(Frame::Text("caf\u{fffd}".to_string()))
        );
        assert_eq!(reader.read_frame().await.unwrap(), ReadOutcome::Frame(Frame::Text("hello".into())));
        assert_eq!(reader.read_frame().await.unwrap(), ReadOutcome::EndOfStream);
    }

    #[tokio::test]
    async fn unterminated_line_past_limit_is_rejected() {
        let wire = vec![b'a'; MAX_LINE_SIZE + 1];
        let mut reader = FrameReader::new(wire.as_slice(), PayloadMode::Text);

        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { max: MAX_LINE_SIZE, .. }));
        assert!(err.is_decode_failure());
    }

    #[tokio::test]
    async fn line_at_limit_is_accepted() {
        let mut wire = vec![b'a'; MAX_LINE_SIZE];
        wire.extend_from_slice(b"\r\n");
        let mut reader = FrameReader::new(wire.as_slice(), PayloadMode::Text);

        match reader.read_frame().await.unwrap() {
            ReadOutcome::Frame(Frame::Text(line)) => assert_eq!(line.len(), MAX_LINE_SIZE),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_writer_renders_records() {
        let mut out = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut out, PayloadMode::Text);
            writer.write_frame(Frame::Message(sample())).await.unwrap();
            writer.write_frame(Frame::Text("plain".to_string())).await.unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "[2023/11/02 08:30:00] alice : hi\nplain\n");
    }

    #[tokio::test]
    async fn structured_writer_output_reads_back() {
        let mut out = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut out, PayloadMode::Structured);
            writer.write_frame(Frame::Message(sample())).await.unwrap();
        }

        let mut reader = FrameReader::new(out.as_slice(), PayloadMode::Structured);
        assert_eq!(reader.read_frame().await.unwrap(), ReadOutcome::Frame(Frame::Message(sample())));
    }
}
