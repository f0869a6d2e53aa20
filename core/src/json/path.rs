/*
 * path.rs
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

//! Path-addressed field events on top of the raw handler events.
//!
//! [`PathTracker`] keeps the dotted path of the current value (`item.album.images.#.url`,
//! where `#` stands for "some array element") together with the element indices along
//! that path, and hands every scalar to a [`FieldSink`]. Sinks then match on paths
//! instead of hand-rolling a state machine per document shape.

use crate::json::handler::JsonContentHandler;
use crate::json::number::JsonNumber;

/// A scalar value as decoded. Strings borrow the decoder's scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Str(&'a str),
    /// Prefix of a string too long for the decoder budget.
    Truncated(&'a str),
    Number(JsonNumber),
    Bool(bool),
    Null,
}

impl<'a> Scalar<'a> {
    /// Text of a (possibly truncated) string.
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Scalar::Str(s) | Scalar::Truncated(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Scalar::Truncated(_))
    }
}

/// Receiver of path-addressed scalars.
pub trait FieldSink {
    /// A scalar at `path`. `indices` holds the element index of each enclosing array,
    /// outermost first.
    fn field(&mut self, path: &str, indices: &[usize], value: Scalar<'_>);

    /// Element `index` of the array at `path` is about to be decoded. Returning false
    /// skips it.
    fn accept_element(&mut self, _path: &str, _index: usize) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object { base: usize },
    Array { base: usize },
}

/// Adapter from [`JsonContentHandler`] events to [`FieldSink`] calls.
pub struct PathTracker<S> {
    sink: S,
    path: String,
    frames: Vec<Frame>,
    indices: Vec<usize>,
}

impl<S: FieldSink> PathTracker<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            path: String::with_capacity(64),
            frames: Vec::with_capacity(8),
            indices: Vec::with_capacity(4),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self, value: Scalar<'_>) {
        self.sink.field(&self.path, &self.indices, value);
    }

    fn push_segment(&mut self, segment: &str) {
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(segment);
    }
}

impl<S: FieldSink> JsonContentHandler for PathTracker<S> {
    fn start_object(&mut self) {
        self.frames.push(Frame::Object {
            base: self.path.len(),
        });
    }

    fn end_object(&mut self) {
        if let Some(Frame::Object { base }) = self.frames.pop() {
            self.path.truncate(base);
        }
    }

    fn start_array(&mut self) {
        self.frames.push(Frame::Array {
            base: self.path.len(),
        });
        self.indices.push(0);
    }

    fn end_array(&mut self) {
        if let Some(Frame::Array { base }) = self.frames.pop() {
            self.path.truncate(base);
            self.indices.pop();
        }
    }

    fn number_value(&mut self, number: JsonNumber) {
        self.emit(Scalar::Number(number));
    }

    fn string_value(&mut self, value: &str) {
        self.emit(Scalar::Str(value));
    }

    fn truncated_string_value(&mut self, prefix: &str) {
        self.emit(Scalar::Truncated(prefix));
    }

    fn boolean_value(&mut self, value: bool) {
        self.emit(Scalar::Bool(value));
    }

    fn null_value(&mut self) {
        self.emit(Scalar::Null);
    }

    fn key(&mut self, key: &str) {
        if let Some(Frame::Object { base }) = self.frames.last().copied() {
            self.path.truncate(base);
            self.push_segment(key);
        }
    }

    fn start_element(&mut self, index: usize) -> bool {
        let Some(Frame::Array { base }) = self.frames.last().copied() else {
            return true;
        };
        self.path.truncate(base);
        if let Some(last) = self.indices.last_mut() {
            *last = index;
        }
        if !self.sink.accept_element(&self.path, index) {
            return false;
        }
        self.push_segment("#");
        true
    }
}
