/*
 * response.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Spindle, a memory-bounded JSON web API client.
 *
 * Spindle is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Response head: status line reader, header skipper, stray-byte discard and error body
//! capture. Header values are never stored.

use tracing::{debug, warn};

use crate::bounded::BoundedStr;
use crate::error::ClientError;
use crate::json::{FieldSink, Scalar};
use crate::transport::Transport;

/// Bytes of the status line kept for parsing; the rest of a long line is left to the
/// header skipper.
pub const STATUS_LINE_CAPACITY: usize = 32;

const HEADER_END: &[u8; 4] = b"\r\n\r\n";

/// Parse `HTTP/1.0 <code> ...` or `HTTP/1.1 <code> ...`. The code must be exactly three
/// digits. Anything else yields None.
pub fn parse_status_line(line: &[u8]) -> Option<u16> {
    let mut tokens = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty());
    match tokens.next()? {
        b"HTTP/1.0" | b"HTTP/1.1" => {}
        _ => return None,
    }
    match tokens.next()? {
        code @ [_, _, _] if code.iter().all(u8::is_ascii_digit) => Some(
            code.iter()
                .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0')),
        ),
        _ => None,
    }
}

/// Status line as read off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    /// The line ended in CRLF within the buffer, so the header block starts next.
    pub terminated: bool,
    /// The buffer filled on a `\r`; its `\n` is still unread.
    pub pending_cr: bool,
}

impl StatusLine {
    /// Header-end matcher carrying over the line ending already consumed.
    pub(crate) fn header_matcher(&self) -> HeaderEndMatcher {
        if self.terminated {
            HeaderEndMatcher::after_line()
        } else if self.pending_cr {
            HeaderEndMatcher { matched: 1 }
        } else {
            HeaderEndMatcher::default()
        }
    }
}

/// Read the first response line (up to [`STATUS_LINE_CAPACITY`] bytes) and parse it.
pub fn read_status_line<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<StatusLine, ClientError> {
    let mut buf = [0u8; STATUS_LINE_CAPACITY];
    let (n, found) = transport.read_until(b'\n', &mut buf).map_err(|e| {
        warn!(error = %e, "status line read failed");
        ClientError::MalformedStatusLine
    })?;
    let line = &buf[..n];
    match parse_status_line(line) {
        Some(code) => Ok(StatusLine {
            code,
            terminated: found && line.last() == Some(&b'\r'),
            pending_cr: !found && n == STATUS_LINE_CAPACITY && line.last() == Some(&b'\r'),
        }),
        None => {
            warn!(
                line = %String::from_utf8_lossy(line).trim_end(),
                "malformed status line"
            );
            Err(ClientError::MalformedStatusLine)
        }
    }
}

/// Incremental matcher for the blank line ending the header block.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HeaderEndMatcher {
    matched: usize,
}

impl HeaderEndMatcher {
    /// Matcher for a header block whose preceding line already ended in CRLF.
    pub(crate) fn after_line() -> Self {
        Self { matched: 2 }
    }

    /// Feed one byte; true once `\r\n\r\n` is complete.
    pub(crate) fn feed(&mut self, b: u8) -> bool {
        if b == HEADER_END[self.matched] {
            self.matched += 1;
        } else if b == b'\r' {
            self.matched = 1;
        } else {
            self.matched = 0;
        }
        self.matched == HEADER_END.len()
    }
}

/// Consume bytes through the end of the header block.
pub(crate) fn skip_headers<T: Transport + ?Sized>(
    transport: &mut T,
    mut matcher: HeaderEndMatcher,
) -> Result<usize, ClientError> {
    let mut consumed = 0;
    loop {
        let b = transport.read_byte().ok().flatten().ok_or_else(|| {
            warn!(consumed, "response ended before the end of headers");
            ClientError::InvalidResponse("end of headers not found")
        })?;
        consumed += 1;
        if matcher.feed(b) {
            return Ok(consumed);
        }
    }
}

/// Drop buffered bytes until the next one opens a JSON object or array. Stops as soon as
/// nothing is buffered, so it never waits on the peer.
pub(crate) fn discard_before_body<T: Transport + ?Sized>(transport: &mut T) -> usize {
    let mut discarded = 0;
    while transport.available() > 0 {
        match transport.peek() {
            Some(b'{' | b'[') | None => break,
            Some(_) => {
                if transport.read_byte().ok().flatten().is_none() {
                    break;
                }
                discarded += 1;
            }
        }
    }
    if discarded > 0 {
        debug!(discarded, "stray bytes before body");
    }
    discarded
}

/// Error details from a JSON error body: the OAuth form (`error` string plus
/// `error_description`) or the API form (`error.status`, `error.message`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: BoundedStr<64>,
    pub message: BoundedStr<160>,
}

impl ErrorBody {
    /// Most descriptive text available.
    pub fn reason(&self) -> Option<&str> {
        if !self.message.is_empty() {
            Some(self.message.as_str())
        } else if !self.error.is_empty() {
            Some(self.error.as_str())
        } else {
            None
        }
    }
}

impl FieldSink for ErrorBody {
    fn field(&mut self, path: &str, _indices: &[usize], value: Scalar<'_>) {
        match (path, value.as_str()) {
            ("error", Some(s)) => {
                self.error.set(s);
            }
            ("error.message" | "error_description", Some(s)) => {
                self.message.set(s);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;

    #[test]
    fn valid_status_lines() {
        assert_eq!(parse_status_line(b"HTTP/1.1 200 OK\r"), Some(200));
        assert_eq!(parse_status_line(b"HTTP/1.0 404 Not Found"), Some(404));
        assert_eq!(parse_status_line(b"HTTP/1.1 204"), Some(204));
        assert_eq!(parse_status_line(b"HTTP/1.1   503  Busy"), Some(503));
        for code in [100u16, 301, 429, 599, 999] {
            let line = format!("HTTP/1.1 {} Reason", code);
            assert_eq!(parse_status_line(line.as_bytes()), Some(code));
        }
    }

    #[test]
    fn invalid_status_lines() {
        let lines: [&[u8]; 10] = [
            b"",
            b"HTTP/2 200",
            b"HTTP/1.1",
            b"HTTP/1.1 abc OK",
            b"HTTP/1.1 20 OK",
            b"HTTP/1.1 2000 OK",
            b"ICY 200 OK",
            b"garbage",
            b"\xff\xfe 200",
            b"http/1.1 200 OK",
        ];
        for line in lines {
            assert_eq!(parse_status_line(line), None, "{:?}", line);
        }
    }

    #[test]
    fn matcher_primed_after_status_line() {
        let mut m = HeaderEndMatcher::after_line();
        assert!(!m.feed(b'\r'));
        assert!(m.feed(b'\n'));
    }

    #[test]
    fn matcher_restarts_on_cr() {
        let mut m = HeaderEndMatcher::default();
        let mut done = false;
        for &b in b"A: b\r\r\n\r\n" {
            done = m.feed(b);
        }
        assert!(done);
    }

    #[test]
    fn long_status_line_is_finished_by_header_skip() {
        let mut t = MemoryTransport::new();
        t.push_http(
            "HTTP/1.1 200 A Very Long Reason Phrase That Overflows",
            &[("Content-Type", "application/json")],
            "{}",
        );
        t.connect("h", 1).unwrap();
        let line = read_status_line(&mut t).unwrap();
        assert_eq!(line.code, 200);
        assert!(!line.terminated);
        skip_headers(&mut t, line.header_matcher()).unwrap();
        assert_eq!(t.peek(), Some(b'{'));
    }

    #[test]
    fn status_line_filling_the_buffer_on_cr() {
        let mut t = MemoryTransport::new();
        let head = "HTTP/1.1 204 No Content Here...";
        assert_eq!(head.len(), STATUS_LINE_CAPACITY - 1);
        t.push_response(format!("{head}\r\n\r\n[]"));
        t.connect("h", 1).unwrap();
        let line = read_status_line(&mut t).unwrap();
        assert_eq!(line.code, 204);
        assert!(!line.terminated);
        assert!(line.pending_cr);
        assert_eq!(skip_headers(&mut t, line.header_matcher()).unwrap(), 3);
        assert_eq!(t.peek(), Some(b'['));
    }

    #[test]
    fn missing_header_end_is_invalid_response() {
        let mut t = MemoryTransport::new();
        t.push_response("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n");
        t.connect("h", 1).unwrap();
        let line = read_status_line(&mut t).unwrap();
        let err = skip_headers(&mut t, HeaderEndMatcher::after_line()).unwrap_err();
        assert!(line.terminated);
        assert_eq!(err.status(), -4);
    }

    #[test]
    fn discard_stops_at_body_or_when_drained() {
        let mut t = MemoryTransport::new();
        t.push_response("5a\r\n[1]");
        t.connect("h", 1).unwrap();
        assert_eq!(discard_before_body(&mut t), 4);
        assert_eq!(t.peek(), Some(b'['));

        let mut t = MemoryTransport::new();
        t.push_response("\r\n");
        t.connect("h", 1).unwrap();
        assert_eq!(discard_before_body(&mut t), 2);
        assert_eq!(t.available(), 0);
    }
}
