/*
 * arena.rs
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

//! String arena backing borrowed list results.
//!
//! The client owns one arena, sized once from its configuration. A list call resets it,
//! copies the admitted strings of each element in, and hands callbacks views that borrow
//! it. The arena never grows: strings that do not fit are cut on a character boundary,
//! and the arena remembers it ran out so a caller can drop the partial element.

/// Location of a string inside a [`StringArena`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fixed-capacity byte arena for UTF-8 strings.
#[derive(Debug)]
pub struct StringArena {
    buf: Vec<u8>,
    capacity: usize,
    truncated: bool,
    exhausted: bool,
}

impl StringArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
            exhausted: false,
        }
    }

    /// Copy `s` in, keeping at most `max` bytes and never more than what is left.
    pub fn alloc(&mut self, s: &str, max: usize) -> Span {
        let wanted = s.len().min(max);
        if wanted > self.remaining() {
            self.exhausted = true;
        }
        let mut cut = wanted.min(self.remaining());
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut < s.len() {
            self.truncated = true;
        }
        let start = self.buf.len();
        self.buf.extend_from_slice(&s.as_bytes()[..cut]);
        Span { start, len: cut }
    }

    pub fn get(&self, span: Span) -> &str {
        self.buf
            .get(span.start..span.start + span.len)
            .and_then(|b| std::str::from_utf8(b).ok())
            .unwrap_or("")
    }

    /// Forget every string. Spans handed out earlier become invalid (they read as empty
    /// or as newer data, never out of bounds).
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.buf.clear();
        self.truncated = false;
        self.exhausted = false;
    }

    /// Drop every string allocated after `used` bytes were in use, and clear the
    /// exhausted state.
    pub fn rollback(&mut self, used: usize) {
        if used < self.buf.len() {
            self.buf[used..].fill(0);
            self.buf.truncate(used);
        }
        self.exhausted = false;
    }

    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True if any string since the last reset was cut short.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// True if a string was cut because the arena ran out of room, rather than by its
    /// own length limit.
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }
}
