/*
 * mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Spindle, a memory-bounded JSON web API client.
 *
 * Spindle is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Spindle is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Spindle.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Transport capability: an already-connectable, bidirectional byte stream.
//!
//! The client never opens sockets, resolves names or negotiates TLS itself; the embedder
//! supplies a `Transport` that does. Reads are blocking with the transport's own read
//! timeout; the client sets that timeout before each request.

pub mod memory;

use std::io;
use std::time::Duration;

/// Byte stream the client drives. One request is in flight at a time.
pub trait Transport {
    /// Open a connection to `host:port`.
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// Read timeout applied to [`read_byte`](Self::read_byte).
    fn set_timeout(&mut self, timeout: Duration);

    /// Write bytes; returns how many were accepted. Zero means the transport rejected the send.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read one byte, waiting up to the read timeout. `None` on timeout or end of stream.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Next byte without consuming it, if one is already buffered.
    fn peek(&mut self) -> Option<u8>;

    /// Bytes that can be read without blocking.
    fn available(&self) -> usize;

    /// True while the peer may still send data (buffered bytes count as "still sending").
    fn connected(&self) -> bool;

    /// Close the connection. Closing an already-closed transport is a no-op.
    fn close(&mut self);

    /// Read into `buf` until `delimiter` (consumed, not stored), timeout, or `buf` is full.
    /// Returns the number of bytes stored and whether the delimiter was seen.
    fn read_until(&mut self, delimiter: u8, buf: &mut [u8]) -> io::Result<(usize, bool)> {
        let mut n = 0;
        while n < buf.len() {
            match self.read_byte()? {
                Some(b) if b == delimiter => return Ok((n, true)),
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok((n, false))
    }

    /// Write all of `data`, failing with `WriteZero` if any write is refused.
    fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match self.write(data)? {
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "transport accepted zero bytes",
                    ))
                }
                n => data = &data[n.min(data.len())..],
            }
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        (**self).connect(host, port)
    }
    fn set_timeout(&mut self, timeout: Duration) {
        (**self).set_timeout(timeout)
    }
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
    fn peek(&mut self) -> Option<u8> {
        (**self).peek()
    }
    fn available(&self) -> usize {
        (**self).available()
    }
    fn connected(&self) -> bool {
        (**self).connected()
    }
    fn close(&mut self) {
        (**self).close()
    }
}
