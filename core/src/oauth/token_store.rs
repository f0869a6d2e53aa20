/*
 * token_store.rs
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

//! Credential lifecycle: holds the bearer credential and refresh token, and refreshes
//! proactively against the token endpoint.
//!
//! `ensure_valid` is the single gate: a fresh credential is used as is, a stale one is
//! refreshed first. A failed refresh leaves the previous credential in place and starts
//! a backoff during which no further attempt touches the network.

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::error::RefreshFailure;
use crate::json::DecodeBudget;
use crate::oauth::clock::{Clock, MonotonicClock};
use crate::oauth::credential::{Credential, CredentialState, RefreshBackoff};
use crate::oauth::flow::{code_grant_body, post_token_request, refresh_grant_body, TokenResponse};
use crate::oauth::provider::TokenEndpoint;
use crate::protocol::http::ExchangeOptions;
use crate::transport::Transport;

/// Owns the credential, the refresh token and the refresh policy of one client.
pub struct CredentialManager<C: Clock = MonotonicClock> {
    clock: C,
    credential: Option<Credential>,
    refresh_token: Option<Zeroizing<String>>,
    endpoint: Option<TokenEndpoint>,
    safety_margin_ms: u64,
    max_access_token_len: usize,
    backoff: RefreshBackoff,
    last_refresh_failed: bool,
}

impl<C: Clock> CredentialManager<C> {
    /// Manager with the token endpoint and stored refresh token taken from `config`.
    pub fn new(clock: C, config: &ClientConfig) -> Self {
        let refresh_token = config
            .oauth
            .as_ref()
            .and_then(|o| o.refresh_token.as_deref())
            .filter(|t| !t.is_empty())
            .map(|t| Zeroizing::new(t.to_string()));
        Self {
            clock,
            credential: None,
            refresh_token,
            endpoint: TokenEndpoint::from_config(config),
            safety_margin_ms: config.token_safety_margin_ms,
            max_access_token_len: config.max_access_token_len,
            backoff: RefreshBackoff::new(
                config.refresh_backoff_initial_ms,
                config.refresh_backoff_max_ms,
            ),
            last_refresh_failed: false,
        }
    }

    /// Replace the token endpoint, e.g. one using a pre-encoded Basic credential.
    pub fn set_endpoint(&mut self, endpoint: TokenEndpoint) {
        self.endpoint = Some(endpoint);
    }

    pub fn endpoint(&self) -> Option<&TokenEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        let token = Zeroizing::new(token.into());
        self.refresh_token = (!token.is_empty()).then_some(token);
    }

    /// Install a fixed bearer token that never goes stale.
    pub fn set_static_bearer(&mut self, token: impl Into<String>) {
        self.credential = Some(Credential::non_expiring(Zeroizing::new(token.into())));
        self.last_refresh_failed = false;
        self.backoff.succeeded();
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credential.as_ref().map(Credential::token)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().map(String::as_str)
    }

    pub fn state(&self) -> CredentialState {
        if self.last_refresh_failed {
            return CredentialState::RefreshFailed;
        }
        match &self.credential {
            None => CredentialState::Unset,
            Some(c) if c.is_fresh(self.clock.now_ms()) => CredentialState::Valid,
            Some(_) => CredentialState::Stale,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|c| c.is_fresh(self.clock.now_ms()))
    }

    /// `Authorization` value for the current credential, fresh or not.
    pub fn authorization_header(&self) -> Option<Zeroizing<String>> {
        self.credential.as_ref().map(Credential::bearer)
    }

    /// Refresh when the credential is missing or stale. Returns whether a refresh
    /// happened.
    pub fn ensure_valid<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        options: ExchangeOptions,
        budget: DecodeBudget,
    ) -> Result<bool, RefreshFailure> {
        if self.is_fresh() {
            return Ok(false);
        }
        self.refresh(transport, options, budget)?;
        Ok(true)
    }

    /// Exchange the refresh token for a new credential, unless backing off.
    pub fn refresh<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        options: ExchangeOptions,
        budget: DecodeBudget,
    ) -> Result<(), RefreshFailure> {
        let now = self.clock.now_ms();
        if let Some(retry_in_ms) = self.backoff.wait_ms(now) {
            debug!(retry_in_ms, "refresh suppressed by backoff");
            return Err(RefreshFailure::BackingOff { retry_in_ms });
        }
        let result = match (&self.endpoint, &self.refresh_token) {
            (_, None) => Err(RefreshFailure::NoRefreshToken),
            (None, _) => Err(RefreshFailure::NoClientCredentials),
            (Some(endpoint), Some(refresh_token)) => {
                let body = refresh_grant_body(endpoint, refresh_token);
                debug!(host = endpoint.host(), "refreshing access token");
                post_token_request(
                    transport,
                    options,
                    endpoint,
                    &body,
                    budget,
                    self.max_access_token_len,
                )
            }
        };
        self.settle(result, now)
    }

    /// Exchange an authorization code for the first credential and refresh token.
    pub fn request_access_tokens<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        options: ExchangeOptions,
        budget: DecodeBudget,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(), RefreshFailure> {
        let now = self.clock.now_ms();
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(RefreshFailure::NoClientCredentials)?;
        let body = code_grant_body(endpoint, code, redirect_uri);
        debug!(host = endpoint.host(), "exchanging authorization code");
        let result = post_token_request(
            transport,
            options,
            endpoint,
            &body,
            budget,
            self.max_access_token_len,
        );
        self.settle(result, now)
    }

    fn settle(
        &mut self,
        result: Result<TokenResponse, RefreshFailure>,
        issued_at_ms: u64,
    ) -> Result<(), RefreshFailure> {
        match result {
            Ok(response) => {
                self.install(response, issued_at_ms);
                Ok(())
            }
            Err(failure) => {
                self.last_refresh_failed = true;
                if !matches!(
                    failure,
                    RefreshFailure::NoRefreshToken | RefreshFailure::NoClientCredentials
                ) {
                    self.backoff.failed(self.clock.now_ms());
                }
                warn!(error = %failure, "credential refresh failed; keeping previous credential");
                Err(failure)
            }
        }
    }

    fn install(&mut self, response: TokenResponse, issued_at_ms: u64) {
        let credential = Credential::new(
            response.access_token,
            issued_at_ms,
            response.expires_in,
            self.safety_margin_ms,
        );
        info!(
            ttl_ms = credential.ttl_ms(),
            rotated = response.refresh_token.is_some(),
            "credential installed"
        );
        self.credential = Some(credential);
        if let Some(rotated) = response.refresh_token {
            self.refresh_token = Some(rotated);
        }
        self.backoff.succeeded();
        self.last_refresh_failed = false;
    }
}

impl<C: Clock> std::fmt::Debug for CredentialManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("state", &self.state())
            .field("credential", &self.credential)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
