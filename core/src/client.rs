/*
 * client.rs
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

//! Authenticated API client.
//!
//! `ApiClient` owns one transport, one credential manager and one string arena. Every
//! call is synchronous and runs one request at a time over a fresh connection. Before
//! each API request the credential gate refreshes a stale token; if that fails the
//! request still goes out with the previous token.

use tracing::{debug, warn};

use crate::arena::StringArena;
use crate::config::ClientConfig;
use crate::dispatch::{Dispatch, ElementRef, Flow, ListCollector, ListShape};
use crate::error::ClientError;
use crate::json::{DecodeBudget, Filter, JsonContentHandler, PathTracker};
use crate::oauth::{Clock, CredentialManager, MonotonicClock};
use crate::protocol::http::{
    send_request, ExchangeOptions, Method, RequestDescriptor, ResponseView, CONTENT_TYPE_JSON,
};
use crate::transport::Transport;

pub struct ApiClient<T: Transport, C: Clock = MonotonicClock> {
    transport: T,
    config: ClientConfig,
    credentials: CredentialManager<C>,
    arena: StringArena,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_clock(transport, config, MonotonicClock::new())
    }
}

impl<T: Transport, C: Clock> ApiClient<T, C> {
    pub fn with_clock(transport: T, config: ClientConfig, clock: C) -> Self {
        let credentials = CredentialManager::new(clock, &config);
        let arena = StringArena::with_capacity(config.arena_bytes);
        Self {
            transport,
            config,
            credentials,
            arena,
        }
    }

    /// Use a fixed bearer token that is never refreshed.
    pub fn with_static_bearer(mut self, token: impl Into<String>) -> Self {
        self.credentials.set_static_bearer(token);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn credentials(&self) -> &CredentialManager<C> {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut CredentialManager<C> {
        &mut self.credentials
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        self.credentials.set_refresh_token(token);
    }

    fn options(&self) -> ExchangeOptions {
        ExchangeOptions {
            port: self.config.port,
            read_timeout: self.config.read_timeout(),
            discard_before_body: self.config.discard_before_body,
        }
    }

    /// Refresh the credential if it is missing or stale. Returns whether a refresh ran.
    pub fn ensure_valid_credential(&mut self) -> Result<bool, ClientError> {
        let options = self.options();
        let budget = self.config.decode_budget();
        Ok(self
            .credentials
            .ensure_valid(&mut self.transport, options, budget)?)
    }

    /// Refresh now, fresh or not (backoff still applies).
    pub fn refresh_credential(&mut self) -> Result<(), ClientError> {
        let options = self.options();
        let budget = self.config.decode_budget();
        Ok(self
            .credentials
            .refresh(&mut self.transport, options, budget)?)
    }

    /// Exchange an authorization code for the first credential and refresh token.
    pub fn request_access_tokens(&mut self, code: &str, redirect_uri: &str) -> Result<(), ClientError> {
        let options = self.options();
        let budget = self.config.decode_budget();
        Ok(self.credentials.request_access_tokens(
            &mut self.transport,
            options,
            budget,
            code,
            redirect_uri,
        )?)
    }

    /// Send `request` as is (no gate, no authorization added) and read the status line.
    pub fn send_request(&mut self, request: &RequestDescriptor<'_>) -> Result<ResponseView<'_, T>, ClientError> {
        let options = self.options();
        send_request(&mut self.transport, request, options)
    }

    fn gate(&mut self) {
        if !self.config.auto_refresh {
            return;
        }
        let options = self.options();
        let budget = self.config.decode_budget();
        if let Err(failure) = self
            .credentials
            .ensure_valid(&mut self.transport, options, budget)
        {
            warn!(error = %failure, "using previous credential");
        }
    }

    /// Gate, authorize and send a request to the API host, then hand the response to
    /// `on_response`. With `retry_on_unauthorized`, a 401 forces one refresh and one
    /// resend.
    pub(crate) fn exchange<R>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        on_response: impl FnOnce(&mut ResponseView<'_, T>, &mut StringArena, DecodeBudget) -> Result<R, ClientError>,
    ) -> Result<R, ClientError> {
        self.gate();
        let options = self.options();
        let budget = self.config.decode_budget();
        let mut retried = false;
        loop {
            let authorization = self.credentials.authorization_header();
            let mut request = RequestDescriptor::new(method, &self.config.api_host, path);
            if let Some(value) = authorization.as_deref() {
                request = request.with_authorization(value);
            }
            if let Some(body) = body {
                request = request.with_body(CONTENT_TYPE_JSON, body);
            }

            let mut view = send_request(&mut self.transport, &request, options)?;
            let status = view.status();
            if status == 401 && self.config.retry_on_unauthorized && !retried {
                drop(view);
                retried = true;
                debug!(path, "unauthorized; refreshing once and retrying");
                self.credentials
                    .refresh(&mut self.transport, options, budget)?;
                continue;
            }
            if !view.is_success() {
                let error = view.error_body(budget);
                warn!(
                    status,
                    path,
                    reason = error.as_ref().and_then(|e| e.reason()),
                    "request failed"
                );
            }
            return on_response(&mut view, &mut self.arena, budget);
        }
    }

    /// GET `path` from the API host and, on 200, decode the body with `filter` into
    /// `handler`. Returns the HTTP status.
    pub fn decode_filtered<H: JsonContentHandler + ?Sized>(
        &mut self,
        path: &str,
        filter: &Filter,
        handler: &mut H,
    ) -> Result<u16, ClientError> {
        self.exchange(Method::Get, path, None, |view, _, budget| {
            let status = view.status();
            if status == 200 {
                view.decode(filter, budget, handler)?;
            }
            Ok(status)
        })
    }

    /// GET a list from `path` and call `callback(element, index, total)` for up to
    /// `limit` elements (never more than `max_list_results`). Elements are views into
    /// the client arena and must not escape the callback.
    pub fn for_each_result<S, F>(
        &mut self,
        path: &str,
        shape: &ListShape<S>,
        limit: usize,
        callback: F,
    ) -> Result<Dispatch, ClientError>
    where
        S: Default,
        F: FnMut(ElementRef<'_, S>, usize, usize) -> Flow,
    {
        let limit = limit.min(self.config.max_list_results);
        self.exchange(Method::Get, path, None, |view, arena, budget| {
            let status = view.status();
            if status != 200 {
                return Ok(Dispatch {
                    status,
                    delivered: 0,
                    total: 0,
                    truncated: false,
                });
            }
            let mut tracker = PathTracker::new(ListCollector::new(shape, arena, limit));
            view.decode(&shape.filter, budget, &mut tracker)?;
            let collector = tracker.into_sink();
            let total = collector.total();
            let truncated = collector.overflowed();
            let delivered = collector.dispatch(callback);
            debug!(path, total, delivered, truncated, "list dispatched");
            Ok(Dispatch {
                status,
                delivered,
                total,
                truncated,
            })
        })
    }

    /// Send a control request with `body` (possibly empty). True for any 2xx; the
    /// response body is never decoded.
    pub fn control(&mut self, method: Method, path: &str, body: &[u8]) -> Result<bool, ClientError> {
        self.exchange(method, path, Some(body), |view, _, _| Ok(view.is_success()))
    }
}

impl<T: Transport + std::fmt::Debug, C: Clock> std::fmt::Debug for ApiClient<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport)
            .field("api_host", &self.config.api_host)
            .field("credentials", &self.credentials)
            .finish()
    }
}
