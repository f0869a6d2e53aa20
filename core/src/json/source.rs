/*
 * source.rs
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

//! Byte sources for the decoder: an in-memory slice, or a live transport.

use crate::json::error::DecodeError;
use crate::transport::Transport;

/// Single-pass byte input with one byte of lookahead.
pub trait ByteSource {
    /// Next byte, or `None` at end of input.
    fn next_byte(&mut self) -> Result<Option<u8>, DecodeError>;
    /// Next byte without consuming it.
    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError>;
}

impl<B: ByteSource + ?Sized> ByteSource for &mut B {
    fn next_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        (**self).next_byte()
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        (**self).peek_byte()
    }
}

/// Source over a complete in-memory document.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        let b = self.data.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        Ok(self.data.get(self.pos).copied())
    }
}

/// Source reading straight off a transport.
///
/// There is no timeout of its own: while the transport reports itself connected, a read
/// that times out is retried after yielding. A stalled but connected peer therefore blocks
/// the decode; closing the transport from outside is the way to abort it.
pub struct TransportSource<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    lookahead: Option<u8>,
}

impl<'t, T: Transport + ?Sized> TransportSource<'t, T> {
    pub fn new(transport: &'t mut T) -> Self {
        Self {
            transport,
            lookahead: None,
        }
    }

    fn fill(&mut self) -> Result<Option<u8>, DecodeError> {
        loop {
            if let Some(b) = self.transport.read_byte()? {
                return Ok(Some(b));
            }
            if !self.transport.connected() {
                return Ok(None);
            }
            std::thread::yield_now();
        }
    }
}

impl<T: Transport + ?Sized> ByteSource for TransportSource<'_, T> {
    fn next_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        match self.lookahead.take() {
            Some(b) => Ok(Some(b)),
            None => self.fill(),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        if self.lookahead.is_none() {
            self.lookahead = self.fill()?;
        }
        Ok(self.lookahead)
    }
}
