//! OAuth credential handling
//!
//! Credentials arrive per request in a header (or per process from the
//! environment for the webhook) and are exchanged for a short-lived access
//! token on every request. Nothing is persisted while serving; the only
//! durable secret is the refresh token the setup flow produces.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{gmail, Config};
use crate::error::{AuthError, Result};

/// Scheme prefix expected on the credential header
const HEADER_SCHEME: &str = "GMAIL ";

/// The OAuth credential triple for one Gmail account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl GmailCredentials {
    /// Parse a credential header of the form
    /// `GMAIL client_id=<id>&client_secret=<secret>&refresh_token=<token>`.
    pub fn from_header(value: &str) -> Result<Self> {
        let rest = value
            .strip_prefix(HEADER_SCHEME)
            .ok_or_else(|| AuthError::MalformedCredentials {
                message: "missing GMAIL scheme".to_string(),
            })?;

        let mut client_id = None;
        let mut client_secret = None;
        let mut refresh_token = None;

        for pair in rest.split('&') {
            let (key, val) = pair.split_once('=').ok_or_else(|| {
                AuthError::MalformedCredentials {
                    message: format!("'{}' is not a key=value pair", pair),
                }
            })?;
            match key {
                "client_id" => client_id = Some(val.to_string()),
                "client_secret" => client_secret = Some(val.to_string()),
                "refresh_token" => refresh_token = Some(val.to_string()),
                _ => {}
            }
        }

        match (client_id, client_secret, refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token))
                if !client_id.is_empty()
                    && !client_secret.is_empty()
                    && !refresh_token.is_empty() =>
            {
                Ok(Self {
                    client_id,
                    client_secret,
                    refresh_token,
                })
            }
            _ => Err(AuthError::MalformedCredentials {
                message: "client_id, client_secret and refresh_token are all required".to_string(),
            }
            .into()),
        }
    }

    /// The header value carrying this credential triple
    pub fn to_header(&self) -> String {
        format!(
            "{}client_id={}&client_secret={}&refresh_token={}",
            HEADER_SCHEME, self.client_id, self.client_secret, self.refresh_token
        )
    }
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a refresh token for a short-lived access token.
/// The access token is used for the current request and dropped.
pub async fn exchange_refresh_token(
    http_client: &reqwest::Client,
    credentials: &GmailCredentials,
) -> Result<String> {
    let params = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("refresh_token", credentials.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = http_client
        .post(gmail::TOKEN_URL)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenRefreshFailed { message: text }.into());
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

/// One-time interactive setup flow: browser consent, local redirect
/// listener, code-for-refresh-token exchange. Operator tooling only.
pub struct SetupFlow {
    config: Config,
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl SetupFlow {
    pub fn new(config: Config, client_id: String, client_secret: String) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            client_id,
            client_secret,
        }
    }

    /// Consent URL the operator must visit
    pub fn consent_url(&self) -> String {
        let scopes = self.config.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            gmail::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.config.oauth_callback_url()),
            urlencoding::encode(&scopes)
        )
    }

    /// Exchange an authorization code for credentials
    async fn exchange_code(&self, code: &str) -> Result<GmailCredentials> {
        #[derive(Deserialize)]
        struct CodeResponse {
            #[serde(default)]
            refresh_token: Option<String>,
        }

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.config.oauth_callback_url()),
        ];

        let response = self
            .http_client
            .post(gmail::TOKEN_URL)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchangeFailed { message: text }.into());
        }

        let token: CodeResponse = response.json().await?;
        let refresh_token = token.refresh_token.ok_or(AuthError::TokenExchangeFailed {
            message: "token endpoint returned no refresh token".to_string(),
        })?;

        Ok(GmailCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token,
        })
    }

    /// Run the full flow: open the browser, wait for the redirect, exchange
    /// the code, save and print the connection configuration.
    pub async fn run(&self) -> Result<GmailCredentials> {
        use axum::{extract::Query, response::Html, routing::get, Router};
        use std::collections::HashMap;
        use tokio::sync::oneshot;

        let consent_url = self.consent_url();
        eprintln!("\nPlease visit this URL to authorize the bridge:");
        eprintln!("{}\n", consent_url);

        if let Err(e) = open::that(&consent_url) {
            eprintln!("Could not open browser automatically: {}", e);
            eprintln!("Please open the URL manually.");
        }

        let (tx, rx) = oneshot::channel::<String>();
        let tx = Arc::new(std::sync::Mutex::new(Some(tx)));

        let tx_clone = tx.clone();
        let callback = move |Query(params): Query<HashMap<String, String>>| async move {
            if let Some(code) = params.get("code") {
                if let Some(tx) = tx_clone.lock().unwrap().take() {
                    let _ = tx.send(code.clone());
                }
                Html("<html><body><h1>Authorization complete</h1><p>You can close this window.</p></body></html>")
            } else {
                Html("<html><body><h1>Authorization failed</h1><p>No authorization code received.</p></body></html>")
            }
        };

        let app = Router::new().route("/oauth2callback", get(callback));
        let addr =
            std::net::SocketAddr::from(([127, 0, 0, 1], self.config.oauth_callback_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        eprintln!(
            "Waiting for the authorization redirect on port {}...",
            self.config.oauth_callback_port
        );

        let server = axum::serve(listener, app);

        let credentials = tokio::select! {
            result = server => {
                if let Err(e) = result {
                    return Err(AuthError::CallbackError { message: e.to_string() }.into());
                }
                return Err(AuthError::NoAuthCode.into());
            }
            code = rx => {
                match code {
                    Ok(code) => {
                        eprintln!("Received authorization code, exchanging for tokens...");
                        self.exchange_code(&code).await?
                    }
                    Err(_) => return Err(AuthError::NoAuthCode.into()),
                }
            }
        };

        self.save_connection(&credentials)?;
        Ok(credentials)
    }

    /// Persist the connection configuration under ~/.gmail-mcp/
    fn save_connection(&self, credentials: &GmailCredentials) -> Result<()> {
        let path = Config::config_dir()?.join("connection.json");
        let content = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&path, content)?;
        eprintln!("Connection configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_header_round_trip() {
        let creds = GmailCredentials {
            client_id: "id-1".to_string(),
            client_secret: "secret-1".to_string(),
            refresh_token: "1//refresh".to_string(),
        };
        let parsed = GmailCredentials::from_header(&creds.to_header()).unwrap();
        assert_eq!(parsed.client_id, "id-1");
        assert_eq!(parsed.client_secret, "secret-1");
        assert_eq!(parsed.refresh_token, "1//refresh");
    }

    #[test]
    fn test_header_missing_scheme_is_rejected() {
        let err = GmailCredentials::from_header("client_id=a&client_secret=b&refresh_token=c")
            .unwrap_err();
        assert!(matches!(err, BridgeError::Auth(_)));
    }

    #[test]
    fn test_header_missing_field_is_rejected() {
        let err =
            GmailCredentials::from_header("GMAIL client_id=a&client_secret=b").unwrap_err();
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn test_header_empty_value_is_rejected() {
        assert!(
            GmailCredentials::from_header("GMAIL client_id=&client_secret=b&refresh_token=c")
                .is_err()
        );
    }

    #[test]
    fn test_refresh_token_value_may_contain_equals() {
        let parsed = GmailCredentials::from_header(
            "GMAIL client_id=a&client_secret=b&refresh_token=tok==",
        )
        .unwrap();
        assert_eq!(parsed.refresh_token, "tok==");
    }
}
