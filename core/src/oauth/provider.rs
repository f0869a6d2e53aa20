/*
 * provider.rs
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

//! OAuth2 token endpoint: where to post grants and how the client authenticates.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::Zeroizing;

use crate::config::{ClientAuthMode, ClientConfig};

/// Default token endpoint path on the accounts host.
pub const TOKEN_PATH: &str = "/api/token";

#[derive(Clone)]
enum ClientCredentials {
    /// Id and secret, sent in the form body or as Basic per the mode.
    IdSecret {
        client_id: String,
        client_secret: Zeroizing<String>,
        mode: ClientAuthMode,
    },
    /// Caller-supplied `base64(id:secret)`.
    Encoded(Zeroizing<String>),
}

/// Token endpoint plus the client registration used against it.
#[derive(Clone)]
pub struct TokenEndpoint {
    host: String,
    path: String,
    credentials: ClientCredentials,
}

impl TokenEndpoint {
    pub fn new(host: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: TOKEN_PATH.to_string(),
            credentials: ClientCredentials::IdSecret {
                client_id: client_id.into(),
                client_secret: Zeroizing::new(client_secret.into()),
                mode: ClientAuthMode::Body,
            },
        }
    }

    /// Endpoint authenticated with an already encoded Basic credential.
    pub fn with_encoded_basic(host: impl Into<String>, encoded: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: TOKEN_PATH.to_string(),
            credentials: ClientCredentials::Encoded(Zeroizing::new(encoded.into())),
        }
    }

    /// Endpoint described by `config`, if it carries an `[oauth]` table with a client id.
    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        let oauth = config.oauth.as_ref().filter(|o| !o.client_id.is_empty())?;
        Some(
            Self::new(
                config.accounts_host.clone(),
                oauth.client_id.clone(),
                oauth.client_secret.clone(),
            )
            .client_auth(config.client_auth),
        )
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Choose where id and secret go. Ignored for pre-encoded credentials.
    pub fn client_auth(mut self, auth: ClientAuthMode) -> Self {
        if let ClientCredentials::IdSecret { ref mut mode, .. } = self.credentials {
            *mode = auth;
        }
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token_path(&self) -> &str {
        &self.path
    }

    /// `Authorization` value when the client authenticates with Basic.
    pub(crate) fn basic_authorization(&self) -> Option<Zeroizing<String>> {
        let encoded = match &self.credentials {
            ClientCredentials::IdSecret {
                client_id,
                client_secret,
                mode: ClientAuthMode::Basic,
            } => {
                let joined = Zeroizing::new(format!("{}:{}", client_id, client_secret.as_str()));
                Zeroizing::new(BASE64.encode(joined.as_bytes()))
            }
            ClientCredentials::IdSecret { .. } => return None,
            ClientCredentials::Encoded(encoded) => encoded.clone(),
        };
        let mut value = Zeroizing::new(String::with_capacity(6 + encoded.len()));
        value.push_str("Basic ");
        value.push_str(&encoded);
        Some(value)
    }

    /// Id and secret to append to the form body, when they go there.
    pub(crate) fn form_credentials(&self) -> Option<(&str, &str)> {
        match &self.credentials {
            ClientCredentials::IdSecret {
                client_id,
                client_secret,
                mode: ClientAuthMode::Body,
            } => Some((client_id.as_str(), client_secret.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for TokenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match &self.credentials {
            ClientCredentials::IdSecret { mode, .. } => format!("{:?}", mode),
            ClientCredentials::Encoded(_) => "Encoded".to_string(),
        };
        f.debug_struct("TokenEndpoint")
            .field("host", &self.host)
            .field("path", &self.path)
            .field("auth", &auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_mode_puts_credentials_in_form() {
        let e = TokenEndpoint::new("accounts.example", "id", "secret");
        assert_eq!(e.form_credentials(), Some(("id", "secret")));
        assert!(e.basic_authorization().is_none());
        assert_eq!(e.token_path(), "/api/token");
    }

    #[test]
    fn basic_mode_encodes_id_and_secret() {
        let e = TokenEndpoint::new("accounts.example", "id", "secret").client_auth(ClientAuthMode::Basic);
        assert!(e.form_credentials().is_none());
        assert_eq!(e.basic_authorization().unwrap().as_str(), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn pre_encoded_basic() {
        let e = TokenEndpoint::with_encoded_basic("accounts.example", "aWQ6c2VjcmV0").client_auth(ClientAuthMode::Body);
        assert_eq!(e.basic_authorization().unwrap().as_str(), "Basic aWQ6c2VjcmV0");
        assert!(!format!("{:?}", e).contains("aWQ6"));
    }

    #[test]
    fn from_config_requires_client_id() {
        let mut config = ClientConfig::default();
        assert!(TokenEndpoint::from_config(&config).is_none());
        config = ClientConfig::from_toml_str("client_auth = \"basic\"\n[oauth]\nclient_id = \"id\"\nclient_secret = \"secret\"").unwrap();
        let e = TokenEndpoint::from_config(&config).unwrap();
        assert_eq!(e.host(), "accounts.spotify.com");
        assert!(e.basic_authorization().is_some());
    }
}
