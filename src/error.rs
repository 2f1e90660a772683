//! Error types for the Gmail MCP bridge
//!
//! This module defines the error hierarchy for all operations in the bridge.

use thiserror::Error;

/// Main error type for the Gmail MCP bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Credential header / OAuth errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// HTTP status the webhook surface maps this error to.
    ///
    /// 401 for credential problems, 400 for bad input, 500 for everything
    /// else (provider failures included).
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::Auth(_) => 401,
            BridgeError::Validation(_) => 400,
            _ => 500,
        }
    }
}

/// Credential and OAuth errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "Missing credentials. Pass an Authorization header of the form \
         'GMAIL client_id=<id>&client_secret=<secret>&refresh_token=<token>'"
    )]
    MissingCredentials,

    #[error(
        "Malformed credentials: {message}. Expected \
         'GMAIL client_id=<id>&client_secret=<secret>&refresh_token=<token>'"
    )]
    MalformedCredentials { message: String },

    #[error("Invalid webhook token. Pass 'Authorization: Bearer <WEBHOOK_TOKEN>'")]
    InvalidWebhookToken,

    #[error("Failed to exchange refresh token: {message}")]
    TokenRefreshFailed { message: String },

    #[error("OAuth callback error: {message}")]
    CallbackError { message: String },

    #[error("No authorization code provided")]
    NoAuthCode,

    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed { message: String },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("Message not found: {message_id}")]
    MessageNotFound { message_id: String },

    #[error("Thread not found: {thread_id}")]
    ThreadNotFound { thread_id: String },

    #[error("Draft not found: {draft_id}")]
    DraftNotFound { draft_id: String },

    #[error("Label not found: {label_id}")]
    LabelNotFound { label_id: String },

    #[error("Filter not found: {filter_id}")]
    FilterNotFound { filter_id: String },

    #[error("Attachment not found: {attachment_id}")]
    AttachmentNotFound { attachment_id: String },

    #[error("API request failed: {message}")]
    RequestFailed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Message content collides with the multipart boundary token")]
    BoundaryCollision,
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_guidance() {
        let err = AuthError::MissingCredentials;
        assert!(err.to_string().contains("client_id=<id>"));
    }

    #[test]
    fn test_error_conversion() {
        let auth_err = AuthError::NoAuthCode;
        let bridge_err: BridgeError = auth_err.into();
        assert!(matches!(bridge_err, BridgeError::Auth(_)));
    }

    #[test]
    fn test_http_status_mapping() {
        let auth: BridgeError = AuthError::MissingCredentials.into();
        let validation: BridgeError = ValidationError::MissingField {
            field: "to".to_string(),
        }
        .into();
        let provider: BridgeError = GmailApiError::RequestFailed {
            message: "rate limited".to_string(),
        }
        .into();

        assert_eq!(auth.http_status(), 401);
        assert_eq!(validation.http_status(), 400);
        assert_eq!(provider.http_status(), 500);
    }
}
