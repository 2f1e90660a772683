//! Gmail API client
//!
//! One client per request, bound to the access token obtained from that
//! request's credentials. Each method maps onto a single Gmail API call
//! (searches and draft listings add one metadata fetch per item).

use crate::config::gmail::{
    API_BASE_URL, BATCH_LIMIT, DEFAULT_MAX_RESULTS, SEARCH_RESULTS_CAP, USER_ID,
};
use crate::error::{GmailApiError, Result};
use crate::gmail::filters::FilterManager;
use crate::gmail::labels::{LabelListResult, LabelManager};
use crate::gmail::mime::{
    collect_attachments, encode_raw_message, extract_body, header_or_empty, OutboundMessage,
};
use crate::gmail::types::*;

/// Gmail API client for one authenticated request
pub struct GmailClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            access_token,
        }
    }

    fn messages_url() -> String {
        format!("{}/users/{}/messages", API_BASE_URL, USER_ID)
    }

    fn drafts_url() -> String {
        format!("{}/users/{}/drafts", API_BASE_URL, USER_ID)
    }

    fn threads_url() -> String {
        format!("{}/users/{}/threads", API_BASE_URL, USER_ID)
    }

    async fn fail(response: reqwest::Response, what: &str) -> crate::error::BridgeError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        GmailApiError::RequestFailed {
            message: format!("Failed to {} ({}): {}", what, status, text),
        }
        .into()
    }

    // ==================== Message Operations ====================

    /// Send an email
    pub async fn send_email(
        &self,
        message: &OutboundMessage,
        thread_id: Option<String>,
    ) -> Result<Message> {
        let request = SendMessageRequest {
            raw: encode_raw_message(message)?,
            thread_id,
        };

        let url = format!("{}/send", Self::messages_url());
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::fail(response, "send email").await)
        }
    }

    /// Get a message with the full payload tree
    pub async fn get_message(&self, message_id: &str) -> Result<Message> {
        let url = format!("{}/{}?format=full", Self::messages_url(), message_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "get message").await)
        }
    }

    /// Get a message and flatten it into headers, body and labels
    pub async fn read_message(&self, message_id: &str) -> Result<InboundMessage> {
        let message = self.get_message(message_id).await?;
        Ok(InboundMessage::from_message(message))
    }

    /// Search for messages, enriching each hit with its headers.
    /// `max_results` defaults to 10 and is capped at 100.
    pub async fn search_messages(
        &self,
        query: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<SearchHit>> {
        let max = max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .min(SEARCH_RESULTS_CAP);

        let url = format!(
            "{}?q={}&maxResults={}",
            Self::messages_url(),
            urlencoding::encode(query),
            max
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(response, "search messages").await);
        }

        let message_list: MessageList = response.json().await?;

        let mut hits = Vec::new();
        for msg_ref in message_list.messages {
            let url = format!(
                "{}/{}?format=metadata&metadataHeaders=Subject&metadataHeaders=From&metadataHeaders=To&metadataHeaders=Date",
                Self::messages_url(),
                msg_ref.id
            );

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::fail(response, "fetch search result").await);
            }

            let message: Message = response.json().await?;
            let payload = message.payload.unwrap_or_default();

            hits.push(SearchHit {
                id: message.id,
                thread_id: msg_ref.thread_id,
                subject: header_or_empty(&payload, "Subject"),
                from: header_or_empty(&payload, "From"),
                to: header_or_empty(&payload, "To"),
                date: header_or_empty(&payload, "Date"),
                snippet: message.snippet.unwrap_or_default(),
            });
        }

        Ok(hits)
    }

    /// Modify message labels
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<Message> {
        let url = format!("{}/{}/modify", Self::messages_url(), message_id);

        let request = ModifyMessageRequest {
            add_label_ids,
            remove_label_ids,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "modify message").await)
        }
    }

    /// Move a message to trash
    pub async fn trash_message(&self, message_id: &str) -> Result<()> {
        let url = format!("{}/{}/trash", Self::messages_url(), message_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Length", "0")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "trash message").await)
        }
    }

    /// Permanently delete a message
    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        let url = format!("{}/{}", Self::messages_url(), message_id);

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "delete message").await)
        }
    }

    /// List attachment references in a message's payload tree
    pub async fn list_attachments(&self, message_id: &str) -> Result<Vec<AttachmentInfo>> {
        let message = self.get_message(message_id).await?;
        Ok(message
            .payload
            .as_ref()
            .map(collect_attachments)
            .unwrap_or_default())
    }

    /// Download one attachment body
    pub async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentBody> {
        let url = format!(
            "{}/{}/attachments/{}",
            Self::messages_url(),
            message_id,
            attachment_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::AttachmentNotFound {
                attachment_id: attachment_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "get attachment").await)
        }
    }

    // ==================== Batch Operations ====================

    /// Bulk label modification. At most 50 IDs are forwarded to the
    /// underlying call; the returned count is what was actually submitted.
    pub async fn batch_modify_messages(
        &self,
        message_ids: &[String],
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<usize> {
        let ids = capped_ids(message_ids);
        let submitted = ids.len();

        let request = BatchModifyRequest {
            ids,
            add_label_ids,
            remove_label_ids,
        };

        let url = format!("{}/batchModify", Self::messages_url());
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(submitted)
        } else {
            Err(Self::fail(response, "batch modify messages").await)
        }
    }

    /// Bulk permanent delete, capped at 50 IDs like batch_modify_messages
    pub async fn batch_delete_messages(&self, message_ids: &[String]) -> Result<usize> {
        let ids = capped_ids(message_ids);
        let submitted = ids.len();

        let request = BatchDeleteRequest { ids };

        let url = format!("{}/batchDelete", Self::messages_url());
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(submitted)
        } else {
            Err(Self::fail(response, "batch delete messages").await)
        }
    }

    // ==================== Draft Operations ====================

    /// Create a draft
    pub async fn create_draft(
        &self,
        message: &OutboundMessage,
        thread_id: Option<String>,
    ) -> Result<Draft> {
        let request = CreateDraftRequest {
            message: SendMessageRequest {
                raw: encode_raw_message(message)?,
                thread_id,
            },
        };

        let response = self
            .http_client
            .post(Self::drafts_url())
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::fail(response, "create draft").await)
        }
    }

    /// List drafts, fetching each one's headers
    pub async fn list_drafts(&self, max_results: Option<u32>) -> Result<Vec<DraftSummary>> {
        let max = max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let url = format!("{}?maxResults={}", Self::drafts_url(), max);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(response, "list drafts").await);
        }

        let draft_list: DraftList = response.json().await?;

        let mut summaries = Vec::new();
        for draft_ref in draft_list.drafts {
            let url = format!("{}/{}?format=full", Self::drafts_url(), draft_ref.id);

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::fail(response, "fetch draft").await);
            }

            let draft: Draft = response.json().await?;
            let payload = draft.message.payload.unwrap_or_default();

            summaries.push(DraftSummary {
                id: draft.id,
                to: header_or_empty(&payload, "To"),
                subject: header_or_empty(&payload, "Subject"),
                snippet: draft.message.snippet.unwrap_or_default(),
            });
        }

        Ok(summaries)
    }

    /// Send an existing draft
    pub async fn send_draft(&self, draft_id: &str) -> Result<Message> {
        let request = SendDraftRequest {
            id: draft_id.to_string(),
        };

        let url = format!("{}/send", Self::drafts_url());
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::DraftNotFound {
                draft_id: draft_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "send draft").await)
        }
    }

    /// Delete a draft
    pub async fn delete_draft(&self, draft_id: &str) -> Result<()> {
        let url = format!("{}/{}", Self::drafts_url(), draft_id);

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::DraftNotFound {
                draft_id: draft_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "delete draft").await)
        }
    }

    // ==================== Thread Operations ====================

    /// Get a thread with all of its messages
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let url = format!("{}/{}?format=full", Self::threads_url(), thread_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::ThreadNotFound {
                thread_id: thread_id.to_string(),
            }
            .into())
        } else {
            Err(Self::fail(response, "get thread").await)
        }
    }

    // ==================== Label Operations ====================

    pub async fn list_labels(&self) -> Result<LabelListResult> {
        LabelManager::new(&self.http_client, &self.access_token)
            .list()
            .await
    }

    pub async fn create_label(&self, request: CreateLabelRequest) -> Result<Label> {
        LabelManager::new(&self.http_client, &self.access_token)
            .create(request)
            .await
    }

    pub async fn update_label(&self, label_id: &str, updates: UpdateLabelRequest) -> Result<Label> {
        LabelManager::new(&self.http_client, &self.access_token)
            .update(label_id, updates)
            .await
    }

    pub async fn delete_label(&self, label_id: &str) -> Result<()> {
        LabelManager::new(&self.http_client, &self.access_token)
            .delete(label_id)
            .await
    }

    // ==================== Filter Operations ====================

    pub async fn list_filters(&self) -> Result<Vec<Filter>> {
        FilterManager::new(&self.http_client, &self.access_token)
            .list()
            .await
    }

    pub async fn create_filter(
        &self,
        criteria: FilterCriteria,
        action: FilterAction,
    ) -> Result<Filter> {
        FilterManager::new(&self.http_client, &self.access_token)
            .create(criteria, action)
            .await
    }

    pub async fn delete_filter(&self, filter_id: &str) -> Result<()> {
        FilterManager::new(&self.http_client, &self.access_token)
            .delete(filter_id)
            .await
    }
}

/// IDs actually forwarded to a bulk call: the first BATCH_LIMIT of them
fn capped_ids(message_ids: &[String]) -> Vec<String> {
    message_ids.iter().take(BATCH_LIMIT).cloned().collect()
}

/// Flat view of a fetched message
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
    pub body: String,
    pub labels: Vec<String>,
}

impl InboundMessage {
    /// Flatten a full message into headers, decoded body and labels.
    /// Missing pieces degrade to empty values, never errors.
    pub fn from_message(message: Message) -> Self {
        let payload = message.payload.unwrap_or_default();

        Self {
            id: message.id,
            thread_id: message.thread_id.unwrap_or_default(),
            from: header_or_empty(&payload, "From"),
            to: header_or_empty(&payload, "To"),
            subject: header_or_empty(&payload, "Subject"),
            date: header_or_empty(&payload, "Date"),
            snippet: message.snippet.unwrap_or_default(),
            body: extract_body(&payload),
            labels: message.label_ids,
        }
    }
}

/// One search result enriched with headers
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub snippet: String,
}

/// One draft in a listing
#[derive(Debug, Clone)]
pub struct DraftSummary {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::types::{Header, MessagePart, MessagePartBody};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    #[test]
    fn test_bulk_calls_forward_at_most_fifty_ids() {
        let ids: Vec<String> = (0..75).map(|i| format!("m{}", i)).collect();
        let capped = capped_ids(&ids);
        assert_eq!(capped.len(), 50);
        assert_eq!(capped[0], "m0");
        assert_eq!(capped[49], "m49");

        let few: Vec<String> = (0..3).map(|i| format!("m{}", i)).collect();
        assert_eq!(capped_ids(&few).len(), 3);
    }

    #[test]
    fn test_inbound_message_from_sparse_message() {
        let message = Message {
            id: "m1".to_string(),
            thread_id: None,
            label_ids: vec![],
            snippet: None,
            payload: None,
            size_estimate: None,
            internal_date: None,
        };

        let inbound = InboundMessage::from_message(message);
        assert_eq!(inbound.id, "m1");
        assert_eq!(inbound.thread_id, "");
        assert_eq!(inbound.subject, "");
        assert_eq!(inbound.body, "");
        assert!(inbound.labels.is_empty());
    }

    #[test]
    fn test_inbound_message_decodes_body_and_headers() {
        let message = Message {
            id: "m2".to_string(),
            thread_id: Some("t2".to_string()),
            label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
            snippet: Some("preview".to_string()),
            payload: Some(MessagePart {
                headers: vec![
                    Header {
                        name: "From".to_string(),
                        value: "a@b.com".to_string(),
                    },
                    Header {
                        name: "subject".to_string(),
                        value: "Hi".to_string(),
                    },
                ],
                body: Some(MessagePartBody {
                    data: Some(URL_SAFE_NO_PAD.encode("hello body")),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            size_estimate: None,
            internal_date: None,
        };

        let inbound = InboundMessage::from_message(message);
        assert_eq!(inbound.from, "a@b.com");
        assert_eq!(inbound.subject, "Hi");
        assert_eq!(inbound.body, "hello body");
        assert_eq!(inbound.labels.len(), 2);
    }
}
