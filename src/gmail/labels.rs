//! Label management for Gmail

use crate::error::{GmailApiError, Result};
use crate::gmail::types::{CreateLabelRequest, Label, LabelList, UpdateLabelRequest};

/// Label manager bound to one access token
pub struct LabelManager<'a> {
    client: &'a reqwest::Client,
    access_token: &'a str,
}

impl<'a> LabelManager<'a> {
    pub fn new(client: &'a reqwest::Client, access_token: &'a str) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn base_url() -> String {
        format!("{}/users/me/labels", crate::config::gmail::API_BASE_URL)
    }

    /// Create a new Gmail label
    pub async fn create(&self, request: CreateLabelRequest) -> Result<Label> {
        let response = self
            .client
            .post(Self::base_url())
            .bearer_auth(self.access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to create label ({}): {}", status, text),
            }
            .into())
        }
    }

    /// Update an existing Gmail label
    pub async fn update(&self, label_id: &str, updates: UpdateLabelRequest) -> Result<Label> {
        let url = format!("{}/{}", Self::base_url(), label_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(self.access_token)
            .json(&updates)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::LabelNotFound {
                label_id: label_id.to_string(),
            }
            .into())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to update label ({}): {}", status, text),
            }
            .into())
        }
    }

    /// Delete a Gmail label
    pub async fn delete(&self, label_id: &str) -> Result<()> {
        let url = format!("{}/{}", Self::base_url(), label_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::LabelNotFound {
                label_id: label_id.to_string(),
            }
            .into())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to delete label ({}): {}", status, text),
            }
            .into())
        }
    }

    /// List all Gmail labels, split into system and user labels
    pub async fn list(&self) -> Result<LabelListResult> {
        let response = self
            .client
            .get(Self::base_url())
            .bearer_auth(self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            let label_list: LabelList = response.json().await?;

            let (system, user): (Vec<Label>, Vec<Label>) = label_list
                .labels
                .into_iter()
                .partition(|l| l.label_type.as_deref() == Some("system"));

            Ok(LabelListResult { system, user })
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to list labels ({}): {}", status, text),
            }
            .into())
        }
    }
}

/// Result of listing labels
#[derive(Debug, Clone)]
pub struct LabelListResult {
    pub system: Vec<Label>,
    pub user: Vec<Label>,
}

impl LabelListResult {
    pub fn total(&self) -> usize {
        self.system.len() + self.user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_list_result_counts() {
        let result = LabelListResult {
            system: vec![Label {
                id: "INBOX".to_string(),
                name: "INBOX".to_string(),
                label_type: Some("system".to_string()),
                message_list_visibility: None,
                label_list_visibility: None,
                messages_total: None,
                messages_unread: None,
            }],
            user: vec![],
        };
        assert_eq!(result.total(), 1);
    }
}
