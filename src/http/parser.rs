//! Incremental HTTP request parser.
//!
//! The parser reads from a [`Connection`] into a growable buffer and scans
//! the newly arrived bytes for CRLF-terminated lines. It moves through three
//! states, never going back:
//!
//! ```text
//! AwaitingRequestLine ──first non-blank line──▶ AwaitingHeaders
//! AwaitingHeaders     ──blank line───────────▶ Complete
//! ```
//!
//! The total message size is unknown until the blank line after the headers
//! has been seen. From then on the parser knows the absolute offset where the
//! message ends (`length_cap`) and reads exactly up to it.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{MAX_GROWTH_FACTOR, ParserConfig};
use crate::error::HttpError;
use crate::http::request::{Headers, HttpRequest};
use crate::server::connection::Connection;

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &str = ": ";
const CONTENT_LENGTH: &str = "Content-Length";

/// Receives every header line the parser accepts, in arrival order.
pub trait HeaderObserver {
    fn on_header(&mut self, key: &str, value: &str);
}

impl HeaderObserver for Headers {
    fn on_header(&mut self, key: &str, value: &str) {
        self.insert(key, value);
    }
}

/// Growable byte buffer with a fill cursor and a line-scan cursor.
///
/// Bytes before `line_start` have already been split into lines and are never
/// scanned again. Growing keeps every filled byte in place.
#[derive(Debug)]
pub struct ParseBuffer {
    data: BytesMut,
    filled: usize,
    line_start: usize,
}

impl ParseBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut data = BytesMut::with_capacity(capacity);
        data.resize(capacity.max(1), 0);
        Self {
            data,
            filled: 0,
            line_start: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes received so far.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.data.len()
    }

    pub fn filled(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    /// Unfilled space, at most `limit` bytes long.
    pub fn spare_mut(&mut self, limit: usize) -> &mut [u8] {
        let end = self.data.len().min(self.filled.saturating_add(limit));
        &mut self.data[self.filled..end]
    }

    /// Marks `n` bytes of the spare space as filled.
    pub fn commit(&mut self, n: usize) {
        assert!(self.filled + n <= self.data.len(), "commit past buffer capacity");
        self.filled += n;
    }

    /// Multiplies the capacity by `factor`, growing by at least one byte.
    /// Factors outside `(1.0, MAX_GROWTH_FACTOR]` are clamped into it.
    pub fn grow(&mut self, factor: f64) {
        let factor = if factor.is_finite() {
            factor.clamp(1.0, MAX_GROWTH_FACTOR)
        } else {
            MAX_GROWTH_FACTOR
        };
        let current = self.data.len();
        let target = ((current as f64) * factor) as usize;
        self.data.resize(target.max(current + 1), 0);
    }

    /// Returns the next complete line (without its CRLF) and moves the scan
    /// cursor past it. An unterminated tail stays pending until more bytes
    /// arrive.
    pub fn next_line(&mut self) -> Option<Range<usize>> {
        let pending = &self.data[self.line_start..self.filled];
        let pos = pending.windows(CRLF.len()).position(|w| w == CRLF)?;
        let line = self.line_start..self.line_start + pos;
        self.line_start = line.end + CRLF.len();
        Some(line)
    }

    /// Drops the unfilled space and hands the received bytes over.
    pub fn freeze(mut self) -> Bytes {
        self.data.truncate(self.filled);
        self.data.freeze()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    AwaitingRequestLine,
    AwaitingHeaders,
    Complete,
}

/// Builds one [`HttpRequest`] from a connection.
///
/// A parser is single use: [`parse`](RequestParser::parse) consumes it.
#[derive(Debug)]
pub struct RequestParser<H = Headers> {
    buffer: ParseBuffer,
    growth_factor: f64,
    state: ParseState,
    method: String,
    url: String,
    content_length: Option<usize>,
    body_offset: Option<usize>,
    length_cap: Option<usize>,
    observer: H,
}

impl RequestParser<Headers> {
    pub fn new(config: &ParserConfig) -> Self {
        Self::with_observer(config, Headers::default())
    }
}

impl<H: HeaderObserver> RequestParser<H> {
    /// Creates a parser that reports headers to `observer` instead of
    /// collecting them into [`Headers`].
    pub fn with_observer(config: &ParserConfig, observer: H) -> Self {
        Self {
            buffer: ParseBuffer::with_capacity(config.initial_capacity),
            growth_factor: config.growth_factor,
            state: ParseState::AwaitingRequestLine,
            method: String::new(),
            url: String::new(),
            content_length: None,
            body_offset: None,
            length_cap: None,
            observer,
        }
    }

    /// Reads from `conn` until the request line, the headers and the body
    /// (when `Content-Length` announces one) have all arrived.
    ///
    /// Bytes past the end of the message are never requested from the
    /// connection; any that arrived in the same read are ignored.
    pub async fn parse<S>(mut self, conn: &mut Connection<S>) -> Result<HttpRequest<H>, HttpError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while !self.is_complete() {
            let limit = self
                .length_cap
                .map_or(usize::MAX, |cap| cap - self.buffer.len());
            let read = conn.read(self.buffer.spare_mut(limit)).await?;
            if read == 0 {
                return Err(HttpError::IncompleteRequest {
                    received: self.buffer.len(),
                });
            }
            self.buffer.commit(read);
            if self.buffer.is_full() {
                self.buffer.grow(self.growth_factor);
            }
            self.scan();
        }

        Ok(self.finish())
    }

    fn is_complete(&self) -> bool {
        self.length_cap.is_some_and(|cap| self.buffer.len() >= cap)
    }

    fn scan(&mut self) {
        while self.state != ParseState::Complete {
            let Some(line) = self.buffer.next_line() else {
                break;
            };
            let line_end = line.end + CRLF.len();
            let bytes = &self.buffer.filled()[line];

            match self.state {
                ParseState::AwaitingRequestLine => {
                    // Stray CRLFs ahead of the request line are skipped.
                    if bytes.is_empty() {
                        continue;
                    }
                    // A line without a space leaves method and URL empty.
                    let text = String::from_utf8_lossy(bytes);
                    if let Some((method, rest)) = text.split_once(' ') {
                        self.method = method.to_string();
                        self.url = rest
                            .split(' ')
                            .find(|t| !t.is_empty())
                            .unwrap_or_default()
                            .to_string();
                    }
                    self.state = ParseState::AwaitingHeaders;
                }
                ParseState::AwaitingHeaders => {
                    if bytes.is_empty() {
                        // A length that would overflow the cap is unusable, same as malformed.
                        let cap = self.content_length.and_then(|n| line_end.checked_add(n));
                        if cap.is_none() {
                            self.content_length = None;
                        }
                        self.body_offset = Some(line_end);
                        self.length_cap = Some(cap.unwrap_or(line_end));
                        self.state = ParseState::Complete;
                        continue;
                    }
                    let text = String::from_utf8_lossy(bytes);
                    let Some((key, value)) = text.split_once(HEADER_SEPARATOR) else {
                        continue;
                    };
                    if key.eq_ignore_ascii_case(CONTENT_LENGTH) {
                        self.content_length = value.parse().ok().filter(|&n| n > 0);
                    }
                    self.observer.on_header(key, value);
                }
                ParseState::Complete => unreachable!("scan stops once complete"),
            }
        }
    }

    fn finish(self) -> HttpRequest<H> {
        let body = self
            .body_offset
            .zip(self.content_length)
            .map(|(offset, length)| offset..offset + length);

        HttpRequest::new(self.method, self.url, self.observer, self.buffer.freeze(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buffer: &mut ParseBuffer, bytes: &[u8]) {
        let spare = buffer.spare_mut(bytes.len());
        spare.copy_from_slice(bytes);
        buffer.commit(bytes.len());
    }

    #[test]
    fn next_line_waits_for_split_crlf() {
        let mut buffer = ParseBuffer::with_capacity(32);
        fill(&mut buffer, b"GET / HTTP/1.1\r");
        assert_eq!(buffer.next_line(), None);

        fill(&mut buffer, b"\nHost: x\r\n");
        assert_eq!(buffer.next_line(), Some(0..14));
        assert_eq!(buffer.next_line(), Some(16..23));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn grow_keeps_filled_bytes_and_scan_cursor() {
        let mut buffer = ParseBuffer::with_capacity(8);
        fill(&mut buffer, b"ab\r\ncdef");
        assert!(buffer.is_full());
        assert_eq!(buffer.next_line(), Some(0..2));

        buffer.grow(1.95);
        assert_eq!(buffer.capacity(), 15);
        assert_eq!(buffer.filled(), b"ab\r\ncdef");

        fill(&mut buffer, b"\r\n");
        assert_eq!(buffer.next_line(), Some(4..8));
    }

    #[test]
    fn grow_always_adds_space() {
        let mut buffer = ParseBuffer::with_capacity(1);
        buffer.grow(1.5);
        assert_eq!(buffer.capacity(), 2);
    }

    #[test]
    fn grow_clamps_oversized_factor() {
        let mut buffer = ParseBuffer::with_capacity(16);
        buffer.grow(1.0e30);
        assert_eq!(buffer.capacity(), 256);

        buffer.grow(f64::INFINITY);
        assert_eq!(buffer.capacity(), 4096);

        buffer.grow(f64::NAN);
        assert_eq!(buffer.capacity(), 65536);
    }

    #[test]
    fn spare_respects_limit() {
        let mut buffer = ParseBuffer::with_capacity(16);
        fill(&mut buffer, b"abcd");
        assert_eq!(buffer.spare_mut(3).len(), 3);
        assert_eq!(buffer.spare_mut(usize::MAX).len(), 12);
    }

    #[test]
    fn freeze_drops_unfilled_space() {
        let mut buffer = ParseBuffer::with_capacity(16);
        fill(&mut buffer, b"hello");
        assert_eq!(&buffer.freeze()[..], b"hello");
    }
}
