/*
 * error.rs
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

//! Client error taxonomy. Every failure is a value; each also maps to a status code so
//! callers that branch on integers can do so.

use std::io;

use thiserror::Error;

use crate::json::DecodeError;

pub const STATUS_CONNECTION: i32 = -1;
pub const STATUS_SEND: i32 = -2;
pub const STATUS_MALFORMED_STATUS_LINE: i32 = -3;
pub const STATUS_INVALID_RESPONSE: i32 = -4;
pub const STATUS_DECODE: i32 = -5;
pub const STATUS_REFRESH_FAILED: i32 = -6;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not reach the host. Retrying later may help.
    #[error("connection to {host}:{port} failed: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Writing the request failed; the connection is unusable.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// The first response line was not `HTTP/1.x <3-digit code> ...`.
    #[error("malformed status line")]
    MalformedStatusLine,

    /// The response was garbled past the status line (e.g. no end of headers).
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),

    /// The body did not decode. Partially populated output must not be used.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The credential could not be refreshed; the previous one is still in place.
    #[error("credential refresh failed: {0}")]
    RefreshFailed(#[from] RefreshFailure),

    /// A well-formed response with a status the operation does not accept.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

impl ClientError {
    /// Negative sentinel for transport and protocol failures, the HTTP code otherwise.
    pub fn status(&self) -> i32 {
        match self {
            ClientError::Connection { .. } => STATUS_CONNECTION,
            ClientError::Send(_) => STATUS_SEND,
            ClientError::MalformedStatusLine => STATUS_MALFORMED_STATUS_LINE,
            ClientError::InvalidResponse(_) => STATUS_INVALID_RESPONSE,
            ClientError::Decode(_) => STATUS_DECODE,
            ClientError::RefreshFailed(_) => STATUS_REFRESH_FAILED,
            ClientError::UnexpectedStatus(code) => i32::from(*code),
        }
    }

    /// True for failures where a fresh connection may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connection { .. }
                | ClientError::Send(_)
                | ClientError::MalformedStatusLine
                | ClientError::InvalidResponse(_)
        )
    }
}

/// Why a credential refresh or code exchange did not install a new credential.
#[derive(Debug, Error)]
pub enum RefreshFailure {
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("no client credentials configured")]
    NoClientCredentials,

    /// Earlier failures suppress attempts for a while.
    #[error("refresh suppressed after earlier failures; next attempt in {retry_in_ms} ms")]
    BackingOff { retry_in_ms: u64 },

    /// The token endpoint answered with a non-200 status.
    #[error("token endpoint answered {status}: {}", reason.as_deref().unwrap_or("no reason given"))]
    Rejected { status: u16, reason: Option<String> },

    #[error("token response has no access_token")]
    MissingAccessToken,

    #[error("access token longer than {limit} bytes")]
    AccessTokenTooLong { limit: usize },

    #[error("token response did not decode: {0}")]
    Decode(DecodeError),

    /// The exchange itself failed before a status was read.
    #[error("token request failed: {0}")]
    Exchange(#[source] Box<ClientError>),
}
