//! HTTP server
//!
//! Two endpoints. `POST /mcp` serves the MCP protocol with per-request
//! credentials carried in the Authorization header; no token state survives
//! a request. `POST /webhooks/send` is a plain send hook authenticated from
//! the process environment.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AuthError, BridgeError, Result, ValidationError};
use crate::gmail::auth::{exchange_refresh_token, GmailCredentials};
use crate::gmail::client::GmailClient;
use crate::gmail::mime::{AttachmentPart, OutboundMessage};
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::{
    methods, CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, RequestId, ServerCapabilities, ServerInfo, ToolsCapability, JSONRPC_VERSION,
    MCP_VERSION,
};

/// Shared server state
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
}

/// Build the application router
pub fn router(config: Config) -> Router {
    let state = Arc::new(AppState {
        config,
        http_client: reqwest::Client::new(),
    });

    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/webhooks/send", post(handle_send_webhook))
        .with_state(state)
}

/// Run the server until shutdown
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ==================== MCP Endpoint ====================

async fn handle_mcp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            let response = JsonRpcResponse::error(
                RequestId::Number(0),
                JsonRpcError::parse_error(e.to_string()),
            );
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    // Notifications get no response body
    let Some(id) = request.id.clone() else {
        debug!("notification: {}", request.method);
        return StatusCode::ACCEPTED.into_response();
    };

    let result = dispatch(&state, &headers, &request).await;

    let response = match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(DispatchError::Transport(e)) => {
            warn!("request failed: {}", e);
            let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(json!({"error": e.to_string()}))).into_response();
        }
        Err(DispatchError::Rpc(e)) => JsonRpcResponse::error(id, e),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Errors crossing the JSON-RPC boundary. Transport failures (auth, upstream)
/// surface as HTTP statuses; protocol failures stay inside the RPC envelope.
enum DispatchError {
    Transport(BridgeError),
    Rpc(JsonRpcError),
}

impl From<BridgeError> for DispatchError {
    fn from(e: BridgeError) -> Self {
        DispatchError::Transport(e)
    }
}

async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    request: &JsonRpcRequest,
) -> std::result::Result<Value, DispatchError> {
    match request.method.as_str() {
        methods::INITIALIZE => {
            let result = InitializeResult {
                protocol_version: MCP_VERSION.to_string(),
                server_info: ServerInfo {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability::default()),
                },
            };
            serde_json::to_value(result)
                .map_err(|e| DispatchError::Rpc(JsonRpcError::parse_error(e.to_string())))
        }

        methods::PING => Ok(json!({})),

        methods::LIST_TOOLS => {
            let result = ListToolsResult {
                tools: ToolHandler::list_tools(),
            };
            serde_json::to_value(result)
                .map_err(|e| DispatchError::Rpc(JsonRpcError::parse_error(e.to_string())))
        }

        methods::CALL_TOOL => {
            let params: CallToolParams = request
                .params
                .clone()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| DispatchError::Rpc(JsonRpcError::invalid_params(e.to_string())))?
                .ok_or_else(|| {
                    DispatchError::Rpc(JsonRpcError::invalid_params("missing params"))
                })?;

            let client = authenticated_client(state, headers).await?;
            let handler = ToolHandler::new(client);

            debug!("tool call: {}", params.name);
            let result = handler.call_tool(&params.name, params.arguments).await;

            serde_json::to_value(result)
                .map_err(|e| DispatchError::Rpc(JsonRpcError::parse_error(e.to_string())))
        }

        other => Err(DispatchError::Rpc(JsonRpcError::method_not_found(other))),
    }
}

/// Build a Gmail client from the request's Authorization header. The access
/// token is exchanged fresh on every call and dropped with the client.
async fn authenticated_client(state: &AppState, headers: &HeaderMap) -> Result<GmailClient> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let credentials = GmailCredentials::from_header(header)?;
    let access_token = exchange_refresh_token(&state.http_client, &credentials).await?;
    Ok(GmailClient::new(access_token))
}

// ==================== Send Webhook ====================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendWebhookRequest {
    to: String,
    subject: String,
    body: String,
    html_body: Option<String>,
    #[serde(default)]
    attachments: Vec<WebhookAttachment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookAttachment {
    filename: String,
    mime_type: String,
    content: String,
}

async fn handle_send_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    match send_webhook(&state, &headers, &body).await {
        Ok(message_id) => {
            info!("webhook send ok: {}", message_id);
            (
                StatusCode::OK,
                Json(json!({"ok": true, "messageId": message_id})),
            )
                .into_response()
        }
        Err(e) => {
            warn!("webhook send failed: {}", e);
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

async fn send_webhook(state: &AppState, headers: &HeaderMap, body: &str) -> Result<String> {
    // Optional shared-secret check, enabled by setting WEBHOOK_TOKEN
    if let Some(expected) = &state.config.webhook_token {
        let presented = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            return Err(AuthError::InvalidWebhookToken.into());
        }
    }

    let request: SendWebhookRequest = serde_json::from_str(body).map_err(|e| {
        BridgeError::from(ValidationError::InvalidParameter {
            name: "request body".to_string(),
            message: e.to_string(),
        })
    })?;

    for (field, value) in [
        ("to", &request.to),
        ("subject", &request.subject),
        ("body", &request.body),
    ] {
        if value.is_empty() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            }
            .into());
        }
    }

    let credentials = state.config.webhook_credentials()?;
    let access_token = exchange_refresh_token(&state.http_client, credentials).await?;
    let client = GmailClient::new(access_token);

    let message = OutboundMessage {
        to: request.to,
        subject: request.subject,
        plain_body: request.body,
        html_body: request.html_body,
        attachments: request
            .attachments
            .into_iter()
            .map(|a| AttachmentPart {
                filename: a.filename,
                mime_type: a.mime_type,
                content: a.content,
            })
            .collect(),
        ..Default::default()
    };

    let sent = client.send_email(&message, None).await?;
    Ok(sent.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_request_deserialize() {
        let json = r#"{"to":"a@b.com","subject":"Hi","body":"hello"}"#;
        let req: SendWebhookRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.to, "a@b.com");
        assert!(req.attachments.is_empty());
        assert!(req.html_body.is_none());
    }

    #[test]
    fn test_webhook_request_with_attachments() {
        let json = r#"{
            "to": "a@b.com",
            "subject": "Hi",
            "body": "see attached",
            "attachments": [{"filename": "r.pdf", "mimeType": "application/pdf", "content": "AAAA"}]
        }"#;
        let req: SendWebhookRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.attachments.len(), 1);
        assert_eq!(req.attachments[0].mime_type, "application/pdf");
    }
}
