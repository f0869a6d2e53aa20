/*
 * request.rs
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

//! HTTP request: method, target, optional authorization and body, serialized in the fixed
//! header order servers expect.

use bytes::{BufMut, BytesMut};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// RFC 3986 unreserved characters pass through; everything else is escaped.
pub(crate) const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// One request, borrowed from the caller for the duration of the send.
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub method: Method,
    pub host: &'a str,
    /// Path including any query string.
    pub path: &'a str,
    /// Full `Authorization` value (`Bearer ...` or `Basic ...`). Empty means none.
    pub authorization: Option<&'a str>,
    pub content_type: &'a str,
    /// Request body. `Some(b"")` still sends `Content-Length: 0`.
    pub body: Option<&'a [u8]>,
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(method: Method, host: &'a str, path: &'a str) -> Self {
        Self {
            method,
            host,
            path,
            authorization: None,
            content_type: CONTENT_TYPE_JSON,
            body: None,
        }
    }

    pub fn get(host: &'a str, path: &'a str) -> Self {
        Self::new(Method::Get, host, path)
    }

    pub fn post(host: &'a str, path: &'a str) -> Self {
        Self::new(Method::Post, host, path)
    }

    pub fn put(host: &'a str, path: &'a str) -> Self {
        Self::new(Method::Put, host, path)
    }

    pub fn with_authorization(mut self, value: &'a str) -> Self {
        self.authorization = Some(value);
        self
    }

    pub fn with_body(mut self, content_type: &'a str, body: &'a [u8]) -> Self {
        self.content_type = content_type;
        self.body = Some(body);
        self
    }

    /// Append the serialized request (head and body) to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(160 + self.path.len() + self.body.map_or(0, <[u8]>::len));
        put_str(buf, self.method.as_str());
        buf.put_u8(b' ');
        put_target(buf, self.path);
        put_str(buf, " HTTP/1.1\r\n");
        header(buf, "Host", self.host);
        header(buf, "Accept", CONTENT_TYPE_JSON);
        header(buf, "Content-Type", self.content_type);
        if let Some(auth) = self.authorization.filter(|a| !a.is_empty()) {
            header(buf, "Authorization", auth);
        }
        header(buf, "Cache-Control", "no-cache");
        if let Some(body) = self.body {
            header(buf, "Content-Length", &body.len().to_string());
        }
        put_str(buf, "\r\n");
        if let Some(body) = self.body {
            buf.put_slice(body);
        }
    }
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
}

/// Request target: control bytes dropped, spaces escaped, so it stays one token.
fn put_target(buf: &mut BytesMut, path: &str) {
    for &b in path.as_bytes() {
        match b {
            b' ' => buf.put_slice(b"%20"),
            b if b.is_ascii_control() => {}
            b => buf.put_u8(b),
        }
    }
}

/// Header line. Control bytes other than tab are dropped from the value so it cannot
/// end the line early.
fn header(buf: &mut BytesMut, name: &str, value: &str) {
    put_str(buf, name);
    put_str(buf, ": ");
    for run in value
        .as_bytes()
        .split(|&b| b.is_ascii_control() && b != b'\t')
    {
        buf.put_slice(run);
    }
    put_str(buf, "\r\n");
}

/// Builds a request path with query parameters, remembering whether `?` was emitted.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    buf: String,
    has_query: bool,
}

impl PathBuilder {
    /// Start from `base`, which may already carry a query string.
    pub fn new(base: &str) -> Self {
        Self {
            buf: base.to_string(),
            has_query: base.contains('?'),
        }
    }

    /// Append `name=value`, percent-encoding both.
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.buf.push(if self.has_query { '&' } else { '?' });
        self.has_query = true;
        self.buf.extend(utf8_percent_encode(name, QUERY_VALUE));
        self.buf.push('=');
        self.buf.extend(utf8_percent_encode(value, QUERY_VALUE));
        self
    }

    /// Append the parameter only when a value is present.
    pub fn query_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn build(self) -> String {
        self.buf
    }
}
