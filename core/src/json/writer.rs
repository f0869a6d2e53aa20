/*
 * writer.rs
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

//! Compact JSON writer for request bodies, appending to a `BytesMut`.
//!
//! Request bodies here are small flat objects, so besides the `write_*` primitives the
//! writer has `field_*` helpers that emit a key and its value in one call.

use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,       // nothing written
    Open,       // just after '{' or '['
    AfterKey,   // key written, value follows
    AfterValue, // next item needs a comma
}

pub struct JsonWriter {
    buf: BytesMut,
    state: State,
    depth: usize,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            state: State::Init,
            depth: 0,
        }
    }

    pub fn buffer(&self) -> &BytesMut {
        &self.buf
    }

    /// Nesting depth of the open containers.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Take what was written, leaving the writer empty for reuse.
    pub fn take_buffer(&mut self) -> BytesMut {
        self.state = State::Init;
        self.depth = 0;
        std::mem::take(&mut self.buf)
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    fn separate(&mut self) {
        if self.state == State::AfterValue {
            self.buf.put_u8(b',');
        }
    }

    fn open(&mut self, bracket: u8) {
        self.separate();
        self.buf.put_u8(bracket);
        self.state = State::Open;
        self.depth += 1;
    }

    fn close(&mut self, bracket: u8) {
        self.depth = self.depth.saturating_sub(1);
        self.buf.put_u8(bracket);
        self.state = State::AfterValue;
    }

    fn scalar(&mut self, text: &[u8]) {
        self.separate();
        self.buf.put_slice(text);
        self.state = State::AfterValue;
    }

    pub fn write_start_object(&mut self) {
        self.open(b'{');
    }

    pub fn write_end_object(&mut self) {
        self.close(b'}');
    }

    pub fn write_start_array(&mut self) {
        self.open(b'[');
    }

    pub fn write_end_array(&mut self) {
        self.close(b']');
    }

    pub fn write_key(&mut self, key: &str) {
        self.separate();
        put_quoted(&mut self.buf, key);
        self.buf.put_u8(b':');
        self.state = State::AfterKey;
    }

    pub fn write_string(&mut self, value: &str) {
        self.separate();
        put_quoted(&mut self.buf, value);
        self.state = State::AfterValue;
    }

    pub fn write_i64(&mut self, value: i64) {
        self.scalar(value.to_string().as_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.scalar(value.to_string().as_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.scalar(if value { b"true" } else { b"false" });
    }

    pub fn write_null(&mut self) {
        self.scalar(b"null");
    }

    // ── Object members ────────────────────────────────────────────────

    pub fn field_str(&mut self, key: &str, value: &str) {
        self.write_key(key);
        self.write_string(value);
    }

    pub fn field_u64(&mut self, key: &str, value: u64) {
        self.write_key(key);
        self.write_u64(value);
    }

    pub fn field_bool(&mut self, key: &str, value: bool) {
        self.write_key(key);
        self.write_bool(value);
    }

    /// `"key":["a","b",...]`
    pub fn field_str_array(&mut self, key: &str, values: &[&str]) {
        self.write_key(key);
        self.write_start_array();
        for value in values {
            self.write_string(value);
        }
        self.write_end_array();
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape for byte `b`, if it needs one. Only ASCII is ever escaped, so multi-byte
/// sequences are copied through untouched.
fn escape(b: u8) -> Option<&'static [u8]> {
    match b {
        b'"' => Some(b"\\\""),
        b'\\' => Some(b"\\\\"),
        b'\n' => Some(b"\\n"),
        b'\r' => Some(b"\\r"),
        b'\t' => Some(b"\\t"),
        0x08 => Some(b"\\b"),
        0x0c => Some(b"\\f"),
        _ => None,
    }
}

fn put_quoted(buf: &mut BytesMut, s: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let bytes = s.as_bytes();
    buf.reserve(bytes.len() + 2);
    buf.put_u8(b'"');
    let mut run = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let short = escape(b);
        if short.is_none() && b >= 0x20 && b != 0x7f {
            continue;
        }
        buf.put_slice(&bytes[run..i]);
        match short {
            Some(seq) => buf.put_slice(seq),
            None => buf.put_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0x0f)],
            ]),
        }
        run = i + 1;
    }
    buf.put_slice(&bytes[run..]);
    buf.put_u8(b'"');
}
