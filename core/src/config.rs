/*
 * config.rs
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

//! Client configuration: hosts, timeouts, memory budgets and OAuth settings, loadable
//! from TOML. Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! read_timeout_ms = 5000
//! max_list_results = 20
//! client_auth = "basic"
//!
//! [oauth]
//! client_id = "abc"
//! client_secret = "shh"
//! refresh_token = "AQ..."
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::json::DecodeBudget;

/// Largest safety margin accepted, in milliseconds.
const MAX_SAFETY_MARGIN_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Where the client id and secret go on token requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMode {
    /// `client_id` and `client_secret` form fields.
    #[default]
    Body,
    /// `Authorization: Basic base64(id:secret)`.
    Basic,
}

/// OAuth client registration and an optional stored refresh token.
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct OAuthSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Host serving the data API.
    pub api_host: String,
    /// Host serving the token endpoint.
    pub accounts_host: String,
    pub port: u16,
    /// Read timeout for the status line and header phases.
    pub read_timeout_ms: u64,
    /// Subtracted from the reported token lifetime.
    pub token_safety_margin_ms: u64,
    pub max_access_token_len: usize,
    /// Refresh a stale credential before each request.
    pub auto_refresh: bool,
    /// Decoder scratch buffer size.
    pub scratch_bytes: usize,
    pub max_depth: usize,
    /// Size of the string arena backing list results.
    pub arena_bytes: usize,
    /// Hard cap on elements decoded per list call.
    pub max_list_results: usize,
    pub refresh_backoff_initial_ms: u64,
    pub refresh_backoff_max_ms: u64,
    /// Force one refresh and one retry after a 401.
    pub retry_on_unauthorized: bool,
    /// Drop stray bytes between the header block and the body.
    pub discard_before_body: bool,
    pub client_auth: ClientAuthMode,
    pub oauth: Option<OAuthSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: "api.spotify.com".to_string(),
            accounts_host: "accounts.spotify.com".to_string(),
            port: 443,
            read_timeout_ms: 2000,
            token_safety_margin_ms: 2000,
            max_access_token_len: 309,
            auto_refresh: true,
            scratch_bytes: 512,
            max_depth: 10,
            arena_bytes: 4096,
            max_list_results: 50,
            refresh_backoff_initial_ms: 1000,
            refresh_backoff_max_ms: 60_000,
            retry_on_unauthorized: false,
            discard_before_body: true,
            client_auth: ClientAuthMode::Body,
            oauth: None,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.api_host.is_empty() {
            return invalid("api_host", "must not be empty");
        }
        if self.accounts_host.is_empty() {
            return invalid("accounts_host", "must not be empty");
        }
        if self.port == 0 {
            return invalid("port", "must not be zero");
        }
        if self.scratch_bytes == 0 {
            return invalid("scratch_bytes", "must not be zero");
        }
        if self.max_depth == 0 {
            return invalid("max_depth", "must not be zero");
        }
        if self.arena_bytes == 0 {
            return invalid("arena_bytes", "must not be zero");
        }
        if self.max_list_results == 0 {
            return invalid("max_list_results", "must not be zero");
        }
        if self.max_access_token_len == 0 {
            return invalid("max_access_token_len", "must not be zero");
        }
        if self.token_safety_margin_ms > MAX_SAFETY_MARGIN_MS {
            return invalid("token_safety_margin_ms", "must not exceed 60000");
        }
        if self.refresh_backoff_max_ms < self.refresh_backoff_initial_ms {
            return invalid("refresh_backoff_max_ms", "must not be below the initial backoff");
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn decode_budget(&self) -> DecodeBudget {
        DecodeBudget {
            scratch_bytes: self.scratch_bytes,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let c = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(c.api_host, "api.spotify.com");
        assert_eq!(c.port, 443);
        assert_eq!(c.max_access_token_len, 309);
        assert_eq!(c.decode_budget(), DecodeBudget::default());
        assert!(c.oauth.is_none());
        assert_eq!(c.client_auth, ClientAuthMode::Body);
    }

    #[test]
    fn overrides_and_oauth_table() {
        let c = ClientConfig::from_toml_str(
            r#"
            read_timeout_ms = 5000
            client_auth = "basic"
            retry_on_unauthorized = true

            [oauth]
            client_id = "id"
            client_secret = "secret"
            refresh_token = "rt"
            "#,
        )
        .unwrap();
        assert_eq!(c.read_timeout(), Duration::from_secs(5));
        assert_eq!(c.client_auth, ClientAuthMode::Basic);
        assert!(c.retry_on_unauthorized);
        let oauth = c.oauth.as_ref().unwrap();
        assert_eq!(oauth.refresh_token.as_deref(), Some("rt"));
        let shown = format!("{:?}", oauth);
        assert!(!shown.contains("secret\""));
        assert!(!shown.contains("rt"));
    }

    #[test]
    fn partial_oauth_table() {
        let c = ClientConfig::from_toml_str("[oauth]\nclient_id = \"only-id\"").unwrap();
        let oauth = c.oauth.as_ref().unwrap();
        assert_eq!(oauth.client_id, "only-id");
        assert!(oauth.client_secret.is_empty());
        assert_eq!(oauth.refresh_token, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_toml_str("scratch_bytes = 0"),
            Err(ConfigError::Invalid { field: "scratch_bytes", .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("token_safety_margin_ms = 90000"),
            Err(ConfigError::Invalid { field: "token_safety_margin_ms", .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("no_such_key = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_host = \"localhost\"\nport = 8080").unwrap();
        let c = ClientConfig::load(file.path()).unwrap();
        assert_eq!(c.api_host, "localhost");
        assert_eq!(c.port, 8080);
        assert!(matches!(
            ClientConfig::load("/nonexistent/spindle.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
