//! Line framing for the IRC byte stream.
//!
//! The server sends an unbounded stream of bytes. A single read may hold no
//! line, several lines, or the tail of one line and the head of the next.
//! [`LineFramer`] carries the undecoded remainder across reads and yields
//! each complete `\r\n`-terminated line as a [`RawLine`]. [`LineCodec`] is
//! the same framing rule packaged for `tokio_util::codec`.

use std::fmt;

use bytes::{Buf, BytesMut};
use tracing::debug;

/// A single line received from the server, without its `\r\n` terminator.
///
/// Bytes that are not valid UTF-8 are replaced with `U+FFFD`; IRC servers
/// relay whatever their users send, and one bad byte must not cost the
/// session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawLine(String);

impl RawLine {
    /// Decode a line from raw bytes, substituting invalid sequences.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The line text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lines that are empty or only whitespace carry no message.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consume the line, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for RawLine {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for RawLine {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Longest line accepted by default, `\r\n` included.
pub const DEFAULT_MAX_LINE_LEN: usize = 512;

/// Outcome of scanning the buffer for the next line.
enum Scan {
    Line(RawLine),
    /// A complete line over the limit. Its bytes have been consumed.
    TooLong(usize),
    /// No terminator yet; the buffer holds this many bytes of one line.
    Partial(usize),
}

/// Split the next complete line off the front of `buffer`.
///
/// `scanned` remembers how far the buffer has already been searched so a
/// long partial line is not rescanned on every read. It is reset once a line
/// is taken.
fn scan_line(buffer: &mut BytesMut, scanned: &mut usize, max_len: usize) -> Scan {
    let start = (*scanned).min(buffer.len());
    match buffer[start..].windows(2).position(|w| w == b"\r\n") {
        Some(offset) => {
            let end = start + offset;
            *scanned = 0;
            if end + 2 > max_len {
                buffer.advance(end + 2);
                return Scan::TooLong(end + 2);
            }
            let line = RawLine::from_bytes(&buffer[..end]);
            buffer.advance(end + 2);
            Scan::Line(line)
        }
        None => {
            // A trailing '\r' may pair with a '\n' from the next read.
            *scanned = buffer.len().saturating_sub(1);
            Scan::Partial(buffer.len())
        }
    }
}

/// Push-style line framer.
///
/// Lines longer than the limit (512 bytes unless set with
/// [`LineFramer::with_max_len`]) are dropped, and framing resumes at the next
/// `\r\n`. The carry-over buffer never grows past the limit.
///
/// # Example
///
/// ```
/// use slirc_client::line::LineFramer;
///
/// let mut framer = LineFramer::new();
/// let lines: Vec<_> = framer.feed(b"PING :a\r\nPRIV").map(|l| l.into_string()).collect();
/// assert_eq!(lines, vec!["PING :a"]);
///
/// let lines: Vec<_> = framer.feed(b"MSG #x :hi\r\n").map(|l| l.into_string()).collect();
/// assert_eq!(lines, vec!["PRIVMSG #x :hi"]);
/// ```
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    scanned: usize,
    max_len: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty framer with a custom line limit, `\r\n` included.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_len,
            discarding: false,
        }
    }

    /// Append `bytes` to the carry-over buffer and iterate the complete
    /// lines now available.
    ///
    /// The iterator is lazy: lines not pulled before it is dropped stay
    /// buffered and are yielded by the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Lines<'_> {
        self.buffer.extend_from_slice(bytes);
        Lines { framer: self }
    }

    /// Number of buffered bytes not yet terminated by `\r\n`.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Throw away the buffered part of an over-long line, keeping a
    /// trailing `\r` that may start its terminator.
    fn discard_partial(&mut self) {
        let keep = usize::from(self.buffer.last() == Some(&b'\r'));
        let drop = self.buffer.len() - keep;
        self.buffer.advance(drop);
        self.scanned = 0;
    }
}

/// Iterator returned by [`LineFramer::feed`].
#[derive(Debug)]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        let framer = &mut *self.framer;
        loop {
            match scan_line(&mut framer.buffer, &mut framer.scanned, framer.max_len) {
                Scan::Line(line) => {
                    if std::mem::take(&mut framer.discarding) {
                        continue;
                    }
                    return Some(line);
                }
                Scan::TooLong(len) => {
                    if !std::mem::take(&mut framer.discarding) {
                        debug!(len, limit = framer.max_len, "dropping over-long line");
                    }
                }
                Scan::Partial(len) => {
                    if !framer.discarding && len > framer.max_len {
                        debug!(limit = framer.max_len, "dropping over-long line");
                        framer.discarding = true;
                    }
                    if framer.discarding {
                        framer.discard_partial();
                    }
                    return None;
                }
            }
        }
    }
}

#[cfg(feature = "tokio")]
pub use self::codec::LineCodec;

#[cfg(feature = "tokio")]
mod codec {
    use std::io;

    use bytes::{BufMut, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};
    use tracing::trace;

    use super::{scan_line, RawLine, Scan, DEFAULT_MAX_LINE_LEN};
    use crate::encode::{IrcEncode, OutgoingCommand};

    /// `\r\n` line codec for IRC connections.
    ///
    /// Decodes [`RawLine`]s and encodes [`OutgoingCommand`]s. A received line
    /// longer than the limit (512 bytes unless set with
    /// [`LineCodec::with_max_len`]) is an [`io::ErrorKind::InvalidData`]
    /// error.
    #[derive(Debug)]
    pub struct LineCodec {
        scanned: usize,
        max_len: usize,
    }

    impl Default for LineCodec {
        fn default() -> Self {
            Self::with_max_len(DEFAULT_MAX_LINE_LEN)
        }
    }

    impl LineCodec {
        /// Create a new codec.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a new codec with a custom line limit, `\r\n` included.
        pub fn with_max_len(max_len: usize) -> Self {
            Self {
                scanned: 0,
                max_len,
            }
        }
    }

    fn too_long(len: usize, limit: usize) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line of {} bytes exceeds the {} byte limit", len, limit),
        )
    }

    impl Decoder for LineCodec {
        type Item = RawLine;
        type Error = io::Error;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawLine>, io::Error> {
            match scan_line(src, &mut self.scanned, self.max_len) {
                Scan::Line(line) => Ok(Some(line)),
                Scan::TooLong(len) => Err(too_long(len, self.max_len)),
                Scan::Partial(len) if len > self.max_len => Err(too_long(len, self.max_len)),
                Scan::Partial(_) => Ok(None),
            }
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawLine>, io::Error> {
            if let Some(line) = self.decode(src)? {
                return Ok(Some(line));
            }
            if !src.is_empty() {
                trace!(bytes = src.len(), "discarding unterminated data at end of stream");
                src.clear();
                self.scanned = 0;
            }
            Ok(None)
        }
    }

    impl Encoder<OutgoingCommand> for LineCodec {
        type Error = io::Error;

        fn encode(&mut self, cmd: OutgoingCommand, dst: &mut BytesMut) -> Result<(), io::Error> {
            dst.reserve(cmd.as_str().len() + 2);
            cmd.encode(&mut dst.writer())?;
            Ok(())
        }
    }
}
