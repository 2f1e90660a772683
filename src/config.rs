//! Configuration for the Gmail MCP bridge
//!
//! Handles environment variables, paths for the setup flow, and Gmail API
//! constants.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::gmail::auth::GmailCredentials;

/// Runtime configuration for the bridge
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Webhook credentials, taken from the environment at startup
    pub webhook_credentials: Option<GmailCredentials>,

    /// Optional bearer token required by the webhook
    pub webhook_token: Option<String>,

    /// OAuth callback port for the setup flow
    pub oauth_callback_port: u16,

    /// Gmail API scopes requested during setup
    pub scopes: Vec<String>,
}

impl Config {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidConfig {
                message: "BIND_ADDR must be a socket address like 127.0.0.1:8080".to_string(),
            })?;

        let webhook_credentials = match (
            std::env::var("GMAIL_CLIENT_ID"),
            std::env::var("GMAIL_CLIENT_SECRET"),
            std::env::var("GMAIL_REFRESH_TOKEN"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(refresh_token)) => Some(GmailCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => None,
        };

        let webhook_token = std::env::var("WEBHOOK_TOKEN").ok();

        let oauth_callback_port = std::env::var("GMAIL_OAUTH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            bind_addr,
            webhook_credentials,
            webhook_token,
            oauth_callback_port,
            scopes: vec!["https://www.googleapis.com/auth/gmail.modify".to_string()],
        })
    }

    /// Webhook credentials, or a config error naming the missing variable
    pub fn webhook_credentials(&self) -> Result<&GmailCredentials> {
        self.webhook_credentials.as_ref().ok_or_else(|| {
            ConfigError::MissingEnvVar {
                var: "GMAIL_CLIENT_ID / GMAIL_CLIENT_SECRET / GMAIL_REFRESH_TOKEN".to_string(),
            }
            .into()
        })
    }

    /// OAuth callback URL for the setup flow
    pub fn oauth_callback_url(&self) -> String {
        format!("http://localhost:{}/oauth2callback", self.oauth_callback_port)
    }

    /// Directory where the setup flow saves connection configuration
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| ConfigError::DirNotFound {
                path: "~".to_string(),
            })?
            .join(".gmail-mcp");

        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }

        Ok(dir)
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for the Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// OAuth token endpoint
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// OAuth consent endpoint used by the setup flow
    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

    /// Maximum IDs forwarded to a single bulk call
    pub const BATCH_LIMIT: usize = 50;

    /// Default and maximum result counts for searches
    pub const DEFAULT_MAX_RESULTS: u32 = 10;
    pub const SEARCH_RESULTS_CAP: u32 = 100;

    /// System label IDs
    pub mod labels {
        pub const INBOX: &str = "INBOX";
        pub const TRASH: &str = "TRASH";
        pub const STARRED: &str = "STARRED";
        pub const IMPORTANT: &str = "IMPORTANT";
        pub const UNREAD: &str = "UNREAD";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.oauth_callback_port, 3000);
        assert_eq!(config.scopes.len(), 1);
    }

    #[test]
    fn test_missing_webhook_credentials_is_config_error() {
        let config = Config {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            webhook_credentials: None,
            webhook_token: None,
            oauth_callback_port: 3000,
            scopes: vec![],
        };
        assert!(config.webhook_credentials().is_err());
    }
}
