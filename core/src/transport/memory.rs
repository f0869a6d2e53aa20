/*
 * memory.rs
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

//! Scripted in-memory transport: each `connect` serves the next queued response and
//! records what the client wrote. Used for offline simulation and tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::transport::Transport;

/// In-memory transport. The peer "hangs up" once its scripted response is drained.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: VecDeque<Vec<u8>>,
    incoming: VecDeque<u8>,
    open: bool,
    requests: Vec<Vec<u8>>,
    connections: Vec<(String, u16)>,
    closes: usize,
    refuse_connect: bool,
    reject_writes: bool,
    timeout: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the raw bytes served on the next connection.
    pub fn push_response(&mut self, raw: impl Into<Vec<u8>>) -> &mut Self {
        self.responses.push_back(raw.into());
        self
    }

    /// Queue a response assembled from a status line, headers and body.
    pub fn push_http(&mut self, status_line: &str, headers: &[(&str, &str)], body: &str) -> &mut Self {
        let mut raw = String::with_capacity(64 + body.len());
        raw.push_str(status_line);
        raw.push_str("\r\n");
        for (name, value) in headers {
            raw.push_str(name);
            raw.push_str(": ");
            raw.push_str(value);
            raw.push_str("\r\n");
        }
        raw.push_str("\r\n");
        raw.push_str(body);
        self.push_response(raw)
    }

    /// Make every subsequent `connect` fail.
    pub fn refuse_connections(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Make every subsequent `write` report zero bytes accepted.
    pub fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Bytes written on each connection, in connection order.
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    /// Request written on connection `index`, lossily decoded.
    pub fn request_text(&self, index: usize) -> String {
        self.requests
            .get(index)
            .map(|r| String::from_utf8_lossy(r).into_owned())
            .unwrap_or_default()
    }

    /// Hosts and ports connected to, in order.
    pub fn connections(&self) -> &[(String, u16)] {
        &self.connections
    }

    /// Number of times an open connection was closed.
    pub fn close_count(&self) -> usize {
        self.closes
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Responses still queued for future connections.
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        if self.refuse_connect {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        self.open = true;
        self.incoming = self.responses.pop_front().unwrap_or_default().into();
        self.requests.push(Vec::new());
        self.connections.push((host.to_string(), port));
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "not connected"));
        }
        if self.reject_writes {
            return Ok(0);
        }
        if let Some(current) = self.requests.last_mut() {
            current.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.open {
            return Ok(None);
        }
        Ok(self.incoming.pop_front())
    }

    fn peek(&mut self) -> Option<u8> {
        if !self.open {
            return None;
        }
        self.incoming.front().copied()
    }

    fn available(&self) -> usize {
        if self.open {
            self.incoming.len()
        } else {
            0
        }
    }

    fn connected(&self) -> bool {
        self.open && !self.incoming.is_empty()
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.incoming.clear();
            self.closes += 1;
        }
    }
}
