/*
 * credential.rs
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

//! Bearer credential, its lifecycle state and the refresh backoff.

use std::fmt;

use zeroize::Zeroizing;

/// Bearer token with its validity window.
#[derive(Clone)]
pub struct Credential {
    token: Zeroizing<String>,
    issued_at_ms: u64,
    /// None for a credential that never goes stale.
    ttl_ms: Option<u64>,
}

impl Credential {
    /// Credential issued at `issued_at_ms` for a token the server says expires in
    /// `expires_in_secs`, shortened by `safety_margin_ms`.
    pub fn new(token: Zeroizing<String>, issued_at_ms: u64, expires_in_secs: u64, safety_margin_ms: u64) -> Self {
        Self {
            token,
            issued_at_ms,
            ttl_ms: Some(
                expires_in_secs
                    .saturating_mul(1000)
                    .saturating_sub(safety_margin_ms),
            ),
        }
    }

    /// Credential that never goes stale.
    pub fn non_expiring(token: Zeroizing<String>) -> Self {
        Self {
            token,
            issued_at_ms: 0,
            ttl_ms: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at_ms(&self) -> u64 {
        self.issued_at_ms
    }

    pub fn ttl_ms(&self) -> Option<u64> {
        self.ttl_ms
    }

    /// Fresh while `now - issued < ttl`; always fresh without a ttl.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        self.ttl_ms
            .map_or(true, |ttl| now_ms.saturating_sub(self.issued_at_ms) < ttl)
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> Zeroizing<String> {
        let mut value = Zeroizing::new(String::with_capacity(7 + self.token.len()));
        value.push_str("Bearer ");
        value.push_str(&self.token);
        value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token_len", &self.token.len())
            .field("issued_at_ms", &self.issued_at_ms)
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

/// Where the credential lifecycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// No credential was ever installed.
    Unset,
    Valid,
    /// Expired by the clock; the next gate check refreshes it.
    Stale,
    /// The last refresh failed. Any previous credential is still held.
    RefreshFailed,
}

/// Exponential backoff between failed refresh attempts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefreshBackoff {
    initial_ms: u64,
    max_ms: u64,
    current_ms: u64,
    not_before_ms: Option<u64>,
}

impl RefreshBackoff {
    pub(crate) fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial_ms,
            max_ms,
            current_ms: 0,
            not_before_ms: None,
        }
    }

    /// Milliseconds until another attempt is allowed, if one is not allowed now.
    pub(crate) fn wait_ms(&self, now_ms: u64) -> Option<u64> {
        self.not_before_ms
            .filter(|&t| now_ms < t)
            .map(|t| t - now_ms)
    }

    pub(crate) fn failed(&mut self, now_ms: u64) {
        if self.initial_ms == 0 {
            return;
        }
        self.current_ms = if self.current_ms == 0 {
            self.initial_ms
        } else {
            self.current_ms.saturating_mul(2).min(self.max_ms)
        };
        self.not_before_ms = Some(now_ms.saturating_add(self.current_ms));
    }

    pub(crate) fn succeeded(&mut self) {
        self.current_ms = 0;
        self.not_before_ms = None;
    }
}
