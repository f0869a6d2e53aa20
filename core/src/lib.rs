/*
 * lib.rs
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

//! Spindle core: an authenticated HTTP/JSON client for small, fixed memory budgets.
//!
//! One request at a time over a caller-supplied [`Transport`]. Response bodies are
//! decoded straight off the connection through an allowlist [`json::Filter`], so only
//! the fields a caller asked for are ever materialized, into fixed-capacity strings
//! or a per-client arena. OAuth2 access tokens are refreshed before they go stale.
//!
//! - `json`: streaming filtered decoder and JSON writer
//! - `protocol::http`: request encoding, status line, header skipping, response view
//! - `protocol::player`: player endpoints on [`ApiClient`]
//! - `oauth`: credential lifecycle and token endpoint grants
//! - `transport`: the byte-stream capability plus an in-memory implementation

pub mod arena;
pub mod bounded;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod json;
pub mod oauth;
pub mod protocol;
pub mod transport;

pub use arena::{Span, StringArena};
pub use bounded::{BoundedStr, Window};
pub use client::ApiClient;
pub use config::{ClientAuthMode, ClientConfig, ConfigError, OAuthSettings};
pub use dispatch::{Dispatch, ElementRef, Flow, ListShape};
pub use error::{ClientError, RefreshFailure};
pub use oauth::{Clock, CredentialManager, CredentialState, ManualClock, MonotonicClock};
pub use protocol::http::{Method, RequestDescriptor};
pub use transport::Transport;
