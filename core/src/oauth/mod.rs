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

//! OAuth2 credential lifecycle.
//!
//! - `provider`: token endpoint and client authentication (form body or Basic).
//! - `flow`: refresh-token and authorization-code grants, token response decoding.
//! - `credential`: bearer credential with its validity window, refresh backoff.
//! - `token_store`: `CredentialManager`, the "ensure valid" gate.
//! - `clock`: monotonic and manual millisecond clocks.

pub mod clock;
mod credential;
mod flow;
mod provider;
mod token_store;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use credential::{Credential, CredentialState};
pub use flow::{code_grant_body, refresh_grant_body, TokenResponse, DEFAULT_EXPIRES_IN_SECS};
pub use provider::{TokenEndpoint, TOKEN_PATH};
pub use token_store::CredentialManager;
