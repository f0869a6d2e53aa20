/*
 * connection.rs
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

//! One request/response exchange over a fresh transport connection.
//!
//! [`send_request`] connects, writes the request and reads the status line, returning a
//! [`ResponseView`]. The view owns the connection until it is dropped: it skips the header
//! block on demand, decodes the body straight off the transport, and closes the
//! connection when it goes away, whichever path the caller takes.

use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::error::ClientError;
use crate::json::{decode_filtered, DecodeBudget, Filter, JsonContentHandler, PathTracker, TransportSource};
use crate::protocol::http::request::RequestDescriptor;
use crate::protocol::http::response::{
    discard_before_body, read_status_line, skip_headers, ErrorBody, HeaderEndMatcher,
};
use crate::transport::Transport;

/// Connection parameters shared by every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeOptions {
    pub port: u16,
    pub read_timeout: Duration,
    /// Drop stray bytes between the header block and the body.
    pub discard_before_body: bool,
}

/// Response positioned after the status line. Closes the connection on drop.
pub struct ResponseView<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    status: u16,
    matcher: HeaderEndMatcher,
    headers_skipped: bool,
    discard_before_body: bool,
}

/// Connect to `request.host`, send the request and read the status line.
pub fn send_request<'t, T: Transport + ?Sized>(
    transport: &'t mut T,
    request: &RequestDescriptor<'_>,
    options: ExchangeOptions,
) -> Result<ResponseView<'t, T>, ClientError> {
    transport.set_timeout(options.read_timeout);
    if let Err(source) = transport.connect(request.host, options.port) {
        transport.close();
        debug!(host = request.host, port = options.port, error = %source, "connect failed");
        return Err(ClientError::Connection {
            host: request.host.to_string(),
            port: options.port,
            source,
        });
    }
    let mut view = ResponseView {
        transport,
        status: 0,
        matcher: HeaderEndMatcher::default(),
        headers_skipped: false,
        discard_before_body: options.discard_before_body,
    };

    let mut buf = BytesMut::new();
    request.encode(&mut buf);
    debug!(
        method = request.method.as_str(),
        host = request.host,
        path = request.path,
        bytes = buf.len(),
        "sending request"
    );
    view.transport.write_all(&buf).map_err(ClientError::Send)?;

    let line = read_status_line(&mut *view.transport)?;
    view.status = line.code;
    view.matcher = line.header_matcher();
    debug!(status = line.code, "response status");
    Ok(view)
}

impl<'t, T: Transport + ?Sized> ResponseView<'t, T> {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Consume the header block. Later calls do nothing.
    pub fn skip_headers(&mut self) -> Result<(), ClientError> {
        if self.headers_skipped {
            return Ok(());
        }
        let consumed = skip_headers(&mut *self.transport, self.matcher)?;
        trace!(consumed, "headers skipped");
        self.headers_skipped = true;
        if self.discard_before_body {
            discard_before_body(&mut *self.transport);
        }
        Ok(())
    }

    /// Decode the body with `filter`, delivering admitted values to `handler`.
    pub fn decode<H: JsonContentHandler + ?Sized>(
        &mut self,
        filter: &Filter,
        budget: DecodeBudget,
        handler: &mut H,
    ) -> Result<(), ClientError> {
        self.skip_headers()?;
        decode_filtered(
            TransportSource::new(&mut *self.transport),
            filter,
            budget,
            handler,
        )?;
        Ok(())
    }

    /// Decode a JSON error body if one has already arrived. Never waits for the peer.
    pub fn error_body(&mut self, budget: DecodeBudget) -> Option<ErrorBody> {
        self.skip_headers().ok()?;
        if self.transport.peek() != Some(b'{') {
            return None;
        }
        let filter = Filter::object()
            .child("error", Filter::accept())
            .field("error_description");
        let mut tracker = PathTracker::new(ErrorBody::default());
        self.decode(&filter, budget, &mut tracker).ok()?;
        Some(tracker.into_sink())
    }

    /// Close now instead of at drop.
    pub fn close(self) {}
}

impl<T: Transport + ?Sized> Drop for ResponseView<'_, T> {
    fn drop(&mut self) {
        self.transport.close();
        trace!("connection closed");
    }
}
