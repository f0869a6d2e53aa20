/*
 * bounded.rs
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

//! Fixed-capacity containers for owned results: strings that truncate and a window
//! that keeps the last N elements.

use std::fmt;

/// String stored inline in `N` bytes. Holds at most `N - 1` bytes of text; the byte after
/// the text is always zero, and so is everything after it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedStr<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> BoundedStr<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }

    /// Most text bytes this string can hold.
    pub const fn capacity() -> usize {
        N.saturating_sub(1)
    }

    /// Replace the contents with `s`, truncated to the longest prefix of at most
    /// `N - 1` bytes that ends on a character boundary. Returns true if truncated.
    pub fn set(&mut self, s: &str) -> bool {
        let cap = Self::capacity();
        let mut cut = s.len().min(cap);
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf[..cut].copy_from_slice(&s.as_bytes()[..cut]);
        self.buf[cut..].fill(0);
        self.len = cut;
        cut < s.len()
    }

    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.len = 0;
    }

    pub fn as_str(&self) -> &str {
        // only whole characters are ever copied in
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Text plus its zero terminator (empty when `N` is 0).
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..(self.len + 1).min(N)]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for BoundedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<&str> for BoundedStr<N> {
    fn from(s: &str) -> Self {
        let mut b = Self::new();
        b.set(s);
        b
    }
}

impl<const N: usize> AsRef<str> for BoundedStr<N> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> PartialEq<str> for BoundedStr<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedStr<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> fmt::Debug for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps the last `N` elements pushed, in push order.
#[derive(Clone)]
pub struct Window<T, const N: usize> {
    slots: [T; N],
    start: usize,
    len: usize,
    seen: usize,
}

impl<T: Default, const N: usize> Window<T, N> {
    const NONZERO: () = assert!(N > 0, "Window capacity must be non-zero");

    pub fn new() -> Self {
        let () = Self::NONZERO;
        Self {
            slots: std::array::from_fn(|_| T::default()),
            start: 0,
            len: 0,
            seen: 0,
        }
    }

    /// Start a new element at the end, evicting the oldest when full. The returned slot
    /// is reset to its default.
    pub fn push(&mut self) -> &mut T {
        self.seen += 1;
        let index = if self.len == N {
            let oldest = self.start;
            self.start = (self.start + 1) % N;
            oldest
        } else {
            self.len += 1;
            (self.start + self.len - 1) % N
        };
        let slot = &mut self.slots[index];
        *slot = T::default();
        slot
    }

    pub fn push_value(&mut self, value: T) {
        *self.push() = value;
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
        self.seen = 0;
    }
}

impl<T, const N: usize> Window<T, N> {
    /// Most recently pushed element.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            return None;
        }
        Some(&mut self.slots[(self.start + self.len - 1) % N])
    }

    /// Element `i`, oldest first.
    pub fn get(&self, i: usize) -> Option<&T> {
        (i < self.len).then(|| &self.slots[(self.start + i) % N])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |i| &self.slots[(self.start + i) % N])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements pushed since creation or the last clear, evicted ones included.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Default, const N: usize> Default for Window<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq, const N: usize> PartialEq for Window<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for Window<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
