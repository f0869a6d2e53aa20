/*
 * flow.rs
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

//! OAuth2 grants: refresh-token and authorization-code requests against the token
//! endpoint, and decoding of the token response.

use percent_encoding::utf8_percent_encode;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{ClientError, RefreshFailure};
use crate::json::{DecodeBudget, Filter, JsonContentHandler, JsonNumber};
use crate::oauth::provider::TokenEndpoint;
use crate::protocol::http::{send_request, ExchangeOptions, RequestDescriptor, CONTENT_TYPE_FORM, QUERY_VALUE};
use crate::transport::Transport;

/// Lifetime assumed when the token response has no `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Successful token response.
pub struct TokenResponse {
    pub access_token: Zeroizing<String>,
    pub expires_in: u64,
    /// Rotated refresh token, when the server sent one.
    pub refresh_token: Option<Zeroizing<String>>,
}

/// `application/x-www-form-urlencoded` body, wiped on drop.
struct FormBody {
    buf: Zeroizing<String>,
}

impl FormBody {
    fn new() -> Self {
        Self {
            buf: Zeroizing::new(String::with_capacity(256)),
        }
    }

    fn pair(mut self, name: &str, value: &str) -> Self {
        if !self.buf.is_empty() {
            self.buf.push('&');
        }
        self.buf.push_str(name);
        self.buf.push('=');
        self.buf.extend(utf8_percent_encode(value, QUERY_VALUE));
        self
    }

    fn client(self, endpoint: &TokenEndpoint) -> Self {
        match endpoint.form_credentials() {
            Some((id, secret)) => self.pair("client_id", id).pair("client_secret", secret),
            None => self,
        }
    }

    fn finish(self) -> Zeroizing<String> {
        self.buf
    }
}

/// Form body for the refresh-token grant.
pub fn refresh_grant_body(endpoint: &TokenEndpoint, refresh_token: &str) -> Zeroizing<String> {
    FormBody::new()
        .pair("grant_type", "refresh_token")
        .pair("refresh_token", refresh_token)
        .client(endpoint)
        .finish()
}

/// Form body for the authorization-code grant.
pub fn code_grant_body(endpoint: &TokenEndpoint, code: &str, redirect_uri: &str) -> Zeroizing<String> {
    FormBody::new()
        .pair("grant_type", "authorization_code")
        .pair("code", code)
        .pair("redirect_uri", redirect_uri)
        .client(endpoint)
        .finish()
}

fn token_filter() -> Filter {
    Filter::object()
        .field("access_token")
        .field("refresh_token")
        .field("expires_in")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKey {
    AccessToken,
    RefreshToken,
    ExpiresIn,
}

/// Handler for token JSON responses. Extracts `access_token`, `refresh_token`, `expires_in`.
struct TokenJsonHandler {
    max_access_token_len: usize,
    depth: usize,
    current_key: Option<TokenKey>,
    access_token: Option<Zeroizing<String>>,
    access_token_too_long: bool,
    refresh_token: Option<Zeroizing<String>>,
    refresh_token_truncated: bool,
    expires_in: Option<u64>,
}

impl TokenJsonHandler {
    fn new(max_access_token_len: usize) -> Self {
        Self {
            max_access_token_len,
            depth: 0,
            current_key: None,
            access_token: None,
            access_token_too_long: false,
            refresh_token: None,
            refresh_token_truncated: false,
            expires_in: None,
        }
    }

    fn token(&mut self, value: &str, truncated: bool) {
        match self.current_key.take() {
            Some(TokenKey::AccessToken) => {
                if truncated || value.len() > self.max_access_token_len {
                    self.access_token_too_long = true;
                } else {
                    self.access_token = Some(Zeroizing::new(value.to_string()));
                }
            }
            Some(TokenKey::RefreshToken) => {
                if truncated {
                    self.refresh_token_truncated = true;
                } else if !value.is_empty() {
                    self.refresh_token = Some(Zeroizing::new(value.to_string()));
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<TokenResponse, RefreshFailure> {
        if self.access_token_too_long {
            return Err(RefreshFailure::AccessTokenTooLong {
                limit: self.max_access_token_len,
            });
        }
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshFailure::MissingAccessToken)?;
        if self.refresh_token_truncated {
            // keep the old refresh token rather than install a cut one
            warn!("rotated refresh token exceeded the decode budget; ignored");
        }
        Ok(TokenResponse {
            access_token,
            expires_in: self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            refresh_token: self.refresh_token,
        })
    }
}

impl JsonContentHandler for TokenJsonHandler {
    fn start_object(&mut self) {
        self.depth += 1;
        self.current_key = None;
    }

    fn end_object(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn start_array(&mut self) {
        self.current_key = None;
    }

    fn end_array(&mut self) {}

    fn key(&mut self, key: &str) {
        self.current_key = if self.depth == 1 {
            match key {
                "access_token" => Some(TokenKey::AccessToken),
                "refresh_token" => Some(TokenKey::RefreshToken),
                "expires_in" => Some(TokenKey::ExpiresIn),
                _ => None,
            }
        } else {
            None
        };
    }

    fn string_value(&mut self, value: &str) {
        self.token(value, false);
    }

    fn truncated_string_value(&mut self, prefix: &str) {
        self.token(prefix, true);
    }

    fn number_value(&mut self, number: JsonNumber) {
        if self.current_key.take() == Some(TokenKey::ExpiresIn) {
            self.expires_in = number.as_u64();
        }
    }

    fn boolean_value(&mut self, _value: bool) {
        self.current_key = None;
    }

    fn null_value(&mut self) {
        self.current_key = None;
    }
}

/// Post a grant to the token endpoint and decode the response.
pub(crate) fn post_token_request<T: Transport + ?Sized>(
    transport: &mut T,
    options: ExchangeOptions,
    endpoint: &TokenEndpoint,
    form_body: &str,
    budget: DecodeBudget,
    max_access_token_len: usize,
) -> Result<TokenResponse, RefreshFailure> {
    let basic = endpoint.basic_authorization();
    let mut request = RequestDescriptor::post(endpoint.host(), endpoint.token_path())
        .with_body(CONTENT_TYPE_FORM, form_body.as_bytes());
    if let Some(value) = basic.as_deref() {
        request = request.with_authorization(value);
    }

    let mut view = send_request(transport, &request, options)
        .map_err(|e| RefreshFailure::Exchange(Box::new(e)))?;
    let status = view.status();
    if status != 200 {
        let reason = view
            .error_body(budget)
            .and_then(|body| body.reason().map(str::to_string));
        warn!(status, reason = reason.as_deref(), "token endpoint rejected the request");
        return Err(RefreshFailure::Rejected { status, reason });
    }

    let mut handler = TokenJsonHandler::new(max_access_token_len);
    view.decode(&token_filter(), budget, &mut handler)
        .map_err(|e| match e {
            ClientError::Decode(d) => RefreshFailure::Decode(d),
            other => RefreshFailure::Exchange(Box::new(other)),
        })?;
    let response = handler.finish()?;
    debug!(
        token_len = response.access_token.len(),
        expires_in = response.expires_in,
        rotated = response.refresh_token.is_some(),
        "token response accepted"
    );
    Ok(response)
}
