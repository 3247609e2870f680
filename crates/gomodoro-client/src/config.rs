//! Environment-driven configuration.
//!
//! The app keeps no local files; everything configurable comes from the
//! environment with localhost defaults matching the gomodoro server.

use serde::{Deserialize, Serialize};

const DEFAULT_HTTP_URL: &str = "http://localhost:8080/graphql";
const DEFAULT_BACKEND_BIN: &str = "gomodoro";

/// Run mode, gating stack-trace exposure in bridge error envelopes
/// and devtools in the desktop shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    pub fn is_development(self) -> bool {
        self == RunMode::Development
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub http_url: String,
    pub ws_url: String,
    /// Program spawned when the server is unreachable at startup.
    pub backend_bin: String,
    pub run_mode: RunMode,
}

impl ClientConfig {
    /// Read configuration from the environment.
    ///
    /// `GOMODORO_GRAPHQL_WS_URL` falls back to the HTTP URL with the scheme
    /// rewritten to `ws`/`wss`.
    pub fn from_env() -> Self {
        let http_url = std::env::var("GOMODORO_GRAPHQL_HTTP_URL")
            .unwrap_or_else(|_| DEFAULT_HTTP_URL.to_string());
        let ws_url = std::env::var("GOMODORO_GRAPHQL_WS_URL")
            .unwrap_or_else(|_| derive_ws_url(&http_url));
        let backend_bin = std::env::var("GOMODORO_BACKEND_BIN")
            .unwrap_or_else(|_| DEFAULT_BACKEND_BIN.to_string());
        let run_mode = match std::env::var("GOMODORO_ENV").as_deref() {
            Ok("production") => RunMode::Production,
            _ => RunMode::Development,
        };
        Self {
            http_url,
            ws_url,
            backend_bin,
            run_mode,
        }
    }

    /// Check that both endpoints parse as URLs before any network use.
    pub fn validate(&self) -> Result<(), crate::error::TransportError> {
        url::Url::parse(&self.http_url)?;
        url::Url::parse(&self.ws_url)?;
        Ok(())
    }
}

/// `http://` -> `ws://`, `https://` -> `wss://`; anything already `ws`-schemed
/// passes through.
pub fn derive_ws_url(http_url: &str) -> String {
    if http_url.starts_with("ws") {
        http_url.to_string()
    } else if let Some(rest) = http_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = http_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        http_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_ws_url_plain() {
        assert_eq!(
            derive_ws_url("http://localhost:8080/graphql"),
            "ws://localhost:8080/graphql"
        );
    }

    #[test]
    fn test_derive_ws_url_tls() {
        assert_eq!(
            derive_ws_url("https://timer.example.com/graphql"),
            "wss://timer.example.com/graphql"
        );
    }

    #[test]
    fn test_validate_rejects_garbage_urls() {
        let config = ClientConfig {
            http_url: "not a url".into(),
            ws_url: "ws://localhost:8080/graphql".into(),
            backend_bin: "gomodoro".into(),
            run_mode: RunMode::Development,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derive_ws_url_passthrough() {
        assert_eq!(
            derive_ws_url("ws://localhost:8080/graphql"),
            "ws://localhost:8080/graphql"
        );
    }
}
