//! Filter management for Gmail
//!
//! API calls for the settings/filters endpoints and the expansion of the
//! boolean shorthands the filter tools accept.

use crate::config::gmail::labels;
use crate::error::{GmailApiError, Result};
use crate::gmail::types::{Filter, FilterAction, FilterCriteria, FilterList};

/// Filter manager bound to one access token
pub struct FilterManager<'a> {
    client: &'a reqwest::Client,
    access_token: &'a str,
}

impl<'a> FilterManager<'a> {
    pub fn new(client: &'a reqwest::Client, access_token: &'a str) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn base_url() -> String {
        format!(
            "{}/users/me/settings/filters",
            crate::config::gmail::API_BASE_URL
        )
    }

    /// Create a new Gmail filter
    pub async fn create(&self, criteria: FilterCriteria, action: FilterAction) -> Result<Filter> {
        let filter = Filter {
            id: None,
            criteria,
            action,
        };

        let response = self
            .client
            .post(Self::base_url())
            .bearer_auth(self.access_token)
            .json(&filter)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to create filter ({}): {}", status, text),
            }
            .into())
        }
    }

    /// List all Gmail filters
    pub async fn list(&self) -> Result<Vec<Filter>> {
        let response = self
            .client
            .get(Self::base_url())
            .bearer_auth(self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            // An account with no filters answers with an empty object
            let text = response.text().await.unwrap_or_default();
            if text.is_empty() || text.trim() == "{}" {
                return Ok(vec![]);
            }

            let filter_list: FilterList =
                serde_json::from_str(&text).map_err(|e| GmailApiError::RequestFailed {
                    message: format!("Failed to parse filter list: {}", e),
                })?;
            Ok(filter_list.filter)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to list filters ({}): {}", status, text),
            }
            .into())
        }
    }

    /// Delete a Gmail filter
    pub async fn delete(&self, filter_id: &str) -> Result<()> {
        let url = format!("{}/{}", Self::base_url(), filter_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().as_u16() == 404 {
            Err(GmailApiError::FilterNotFound {
                filter_id: filter_id.to_string(),
            }
            .into())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(GmailApiError::RequestFailed {
                message: format!("Failed to delete filter ({}): {}", status, text),
            }
            .into())
        }
    }
}

/// Shorthand fields accepted by the create_filter tool
#[derive(Debug, Clone, Default)]
pub struct FilterShorthand {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub query: Option<String>,
    pub add_label_ids: Option<Vec<String>>,
    pub remove_label_ids: Option<Vec<String>>,
    pub star: bool,
    pub mark_important: bool,
    pub mark_read: bool,
    pub archive: bool,
    pub trash: bool,
}

/// Expand the boolean shorthands into criteria and label add/remove sets.
///
/// `star`, `markImportant` and `trash` add their labels; `markRead` removes
/// UNREAD and `archive` removes INBOX. Explicit label lists are kept and
/// extended, never replaced.
pub fn expand_filter_shorthand(shorthand: FilterShorthand) -> (FilterCriteria, FilterAction) {
    let criteria = FilterCriteria {
        from: shorthand.from,
        to: shorthand.to,
        subject: shorthand.subject,
        query: shorthand.query,
    };

    let mut add = shorthand.add_label_ids.unwrap_or_default();
    let mut remove = shorthand.remove_label_ids.unwrap_or_default();

    if shorthand.star {
        add.push(labels::STARRED.to_string());
    }
    if shorthand.mark_important {
        add.push(labels::IMPORTANT.to_string());
    }
    if shorthand.trash {
        add.push(labels::TRASH.to_string());
    }
    if shorthand.mark_read {
        remove.push(labels::UNREAD.to_string());
    }
    if shorthand.archive {
        remove.push(labels::INBOX.to_string());
    }

    let action = FilterAction {
        add_label_ids: if add.is_empty() { None } else { Some(add) },
        remove_label_ids: if remove.is_empty() { None } else { Some(remove) },
    };

    (criteria, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_and_archive_expand_to_removals() {
        let (criteria, action) = expand_filter_shorthand(FilterShorthand {
            from: Some("news@example.com".to_string()),
            mark_read: true,
            archive: true,
            ..Default::default()
        });

        assert_eq!(criteria.from, Some("news@example.com".to_string()));
        assert!(action.add_label_ids.is_none());
        let remove = action.remove_label_ids.unwrap();
        assert!(remove.contains(&"UNREAD".to_string()));
        assert!(remove.contains(&"INBOX".to_string()));
    }

    #[test]
    fn test_trash_extends_explicit_add_labels() {
        let (_, action) = expand_filter_shorthand(FilterShorthand {
            add_label_ids: Some(vec!["Label_7".to_string()]),
            trash: true,
            ..Default::default()
        });

        let add = action.add_label_ids.unwrap();
        assert!(add.contains(&"Label_7".to_string()));
        assert!(add.contains(&"TRASH".to_string()));
        assert!(action.remove_label_ids.is_none());
    }

    #[test]
    fn test_star_and_important_add_their_labels() {
        let (_, action) = expand_filter_shorthand(FilterShorthand {
            star: true,
            mark_important: true,
            ..Default::default()
        });

        let add = action.add_label_ids.unwrap();
        assert_eq!(add, vec!["STARRED".to_string(), "IMPORTANT".to_string()]);
    }

    #[test]
    fn test_no_shorthands_yield_empty_action() {
        let (criteria, action) = expand_filter_shorthand(FilterShorthand {
            subject: Some("invoice".to_string()),
            ..Default::default()
        });

        assert_eq!(criteria.subject, Some("invoice".to_string()));
        assert!(action.add_label_ids.is_none());
        assert!(action.remove_label_ids.is_none());
    }
}
