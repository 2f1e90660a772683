//! Gmail API type definitions
//!
//! These types mirror the Gmail API request and response shapes. Fields the
//! bridge depends on are non-optional so a sparse provider response fails at
//! deserialization instead of propagating empty values.

use serde::{Deserialize, Serialize};

/// A Gmail message part (MIME part)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Filename, set for attachment parts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<MessagePartBody>,

    /// Nested parts for multipart messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

/// Header in a message part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Body of a message part
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    /// Set when the part data lives out-of-band as an attachment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,

    #[serde(default)]
    pub size: i64,

    /// Base64url-encoded data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A Gmail message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,

    /// Short preview text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// MIME structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePart>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_estimate: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
}

/// List of messages response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u32>,
}

/// Reference to a message (id and thread id only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    pub thread_id: String,
}

/// A conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A Gmail label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,

    /// "system" or "user"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_unread: Option<i32>,
}

/// List of labels response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelList {
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Request to create a label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,
}

/// Request to update a label
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,
}

/// Request to modify message labels
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_label_ids: Option<Vec<String>>,
}

/// Request body for the bulk modify endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchModifyRequest {
    pub ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_label_ids: Option<Vec<String>>,
}

/// Request body for the bulk delete endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

/// Gmail filter criteria
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Gmail filter action
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_label_ids: Option<Vec<String>>,
}

/// A Gmail filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub criteria: FilterCriteria,
    pub action: FilterAction,
}

/// List of filters response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterList {
    #[serde(default)]
    pub filter: Vec<Filter>,
}

/// A Gmail draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub message: Message,
}

/// List of drafts response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftList {
    #[serde(default)]
    pub drafts: Vec<DraftRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Reference to a draft in a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRef {
    pub id: String,
    pub message: MessageRef,
}

/// Request to send or create a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Raw RFC 2822 message, base64url encoded
    pub raw: String,

    /// Thread to attach the message to (replies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Request to create a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftRequest {
    pub message: SendMessageRequest,
}

/// Request to send an existing draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendDraftRequest {
    pub id: String,
}

/// Attachment data response from the attachments endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentBody {
    pub size: i64,

    /// Base64url-encoded payload
    pub data: String,
}

/// Attachment reference discovered in a payload tree
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialize() {
        let json = r#"{"id":"123","threadId":"456","labelIds":["INBOX"]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "123");
        assert_eq!(msg.thread_id, Some("456".to_string()));
        assert_eq!(msg.label_ids, vec!["INBOX".to_string()]);
    }

    #[test]
    fn test_message_without_id_fails_fast() {
        let json = r#"{"threadId":"456"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_thread_deserialize() {
        let json = r#"{"id":"t1","messages":[{"id":"m1","threadId":"t1"}]}"#;
        let thread: Thread = serde_json::from_str(json).unwrap();
        assert_eq!(thread.id, "t1");
        assert_eq!(thread.messages.len(), 1);
    }

    #[test]
    fn test_draft_list_defaults_to_empty() {
        let list: DraftList = serde_json::from_str("{}").unwrap();
        assert!(list.drafts.is_empty());
    }

    #[test]
    fn test_batch_modify_serializes_camel_case() {
        let req = BatchModifyRequest {
            ids: vec!["m1".to_string()],
            add_label_ids: Some(vec!["STARRED".to_string()]),
            remove_label_ids: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("addLabelIds"));
        assert!(!json.contains("removeLabelIds"));
    }

    #[test]
    fn test_filter_serialize() {
        let filter = Filter {
            id: None,
            criteria: FilterCriteria {
                from: Some("test@example.com".to_string()),
                ..Default::default()
            },
            action: FilterAction {
                add_label_ids: Some(vec!["TRASH".to_string()]),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&filter).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("TRASH"));
    }
}
