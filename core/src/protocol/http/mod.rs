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

//! HTTP/1.1 over a caller-supplied transport.
//!
//! Design:
//! - One connection per request, closed when the [`ResponseView`] is dropped.
//! - Request heads are assembled in a `BytesMut` and written in one go, headers in a
//!   fixed order.
//! - The status line is read into a 32-byte buffer; headers are skipped, never stored.
//! - Bodies are not buffered: the JSON decoder reads them straight off the transport.

mod connection;
mod request;
mod response;

pub use connection::{send_request, ExchangeOptions, ResponseView};
pub use request::{Method, PathBuilder, RequestDescriptor, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
pub use response::{parse_status_line, read_status_line, ErrorBody, StatusLine, STATUS_LINE_CAPACITY};

pub(crate) use request::QUERY_VALUE;
