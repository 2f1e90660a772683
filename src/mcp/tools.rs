//! MCP tool definitions and handlers
//!
//! One tool per Gmail operation. Each handler validates its arguments,
//! makes the corresponding client call and renders a text payload. Empty
//! results are ordinary successes with a "no results" line.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ValidationError;
use crate::gmail::client::GmailClient;
use crate::gmail::filters::{expand_filter_shorthand, FilterShorthand};
use crate::gmail::mime::{decode_base64url, find_header, reply_subject, AttachmentPart, OutboundMessage};
use crate::gmail::types::{CreateLabelRequest, UpdateLabelRequest};
use crate::mcp::types::{CallToolResult, Tool};

/// Tool dispatcher bound to one request's Gmail client
pub struct ToolHandler {
    gmail_client: GmailClient,
}

/// Arguments shared by send_email and create_draft
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComposeArgs {
    to: String,
    subject: String,
    body: String,
    from: Option<String>,
    html_body: Option<String>,
    cc: Option<Vec<String>>,
    bcc: Option<Vec<String>>,
    thread_id: Option<String>,
    in_reply_to: Option<String>,
    references: Option<String>,
    attachments: Option<Vec<AttachmentArg>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentArg {
    filename: String,
    mime_type: String,
    /// Base64-encoded payload, inlined as-is
    content: String,
}

impl ComposeArgs {
    fn into_message(self) -> Result<(OutboundMessage, Option<String>), ValidationError> {
        for (field, value) in [
            ("to", &self.to),
            ("subject", &self.subject),
            ("body", &self.body),
        ] {
            if value.is_empty() {
                return Err(ValidationError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        let message = OutboundMessage {
            to: self.to,
            from: self.from,
            cc: self.cc.unwrap_or_default(),
            bcc: self.bcc.unwrap_or_default(),
            subject: self.subject,
            plain_body: self.body,
            html_body: self.html_body,
            in_reply_to: self.in_reply_to,
            references: self.references,
            attachments: self
                .attachments
                .unwrap_or_default()
                .into_iter()
                .map(|a| AttachmentPart {
                    filename: a.filename,
                    mime_type: a.mime_type,
                    content: a.content,
                })
                .collect(),
        };

        Ok((message, self.thread_id))
    }
}

/// For tools whose fields are all optional, absent arguments (JSON null)
/// mean the same as an empty object.
fn optional_args(args: Value) -> Value {
    if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    }
}

/// Parse tool arguments or produce the standard error result
macro_rules! parse_args {
    ($args:expr) => {
        match serde_json::from_value($args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        }
    };
}

impl ToolHandler {
    pub fn new(gmail_client: GmailClient) -> Self {
        Self { gmail_client }
    }

    /// The full tool catalog
    pub fn list_tools() -> Vec<Tool> {
        vec![
            tool_def("send_email", "Sends a new email", compose_schema()),
            tool_def("read_email", "Retrieves the content of a specific email", message_id_schema("ID of the email message to retrieve")),
            tool_def("search_emails", "Searches for emails using Gmail search syntax", search_emails_schema()),
            tool_def("delete_email", "Permanently deletes an email", message_id_schema("ID of the email message to delete")),
            tool_def("trash_email", "Moves an email to trash", message_id_schema("ID of the email message to trash")),
            tool_def("modify_email", "Adds and removes labels on an email", modify_email_schema()),
            tool_def("list_attachments", "Lists attachments of an email", message_id_schema("ID of the email message")),
            tool_def("download_attachment", "Downloads an email attachment to a specified location", download_attachment_schema()),
            tool_def("create_draft", "Creates a new email draft", compose_schema()),
            tool_def("list_drafts", "Lists email drafts", list_drafts_schema()),
            tool_def("send_draft", "Sends an existing draft", draft_id_schema("ID of the draft to send")),
            tool_def("delete_draft", "Deletes a draft", draft_id_schema("ID of the draft to delete")),
            tool_def("list_labels", "Retrieves all Gmail labels", empty_schema()),
            tool_def("create_label", "Creates a new Gmail label", create_label_schema()),
            tool_def("update_label", "Updates an existing Gmail label", update_label_schema()),
            tool_def("delete_label", "Deletes a Gmail label", label_id_schema("ID of the label to delete")),
            tool_def("batch_modify_emails", "Modifies labels for up to 50 emails in one call", batch_modify_schema()),
            tool_def("batch_delete_emails", "Permanently deletes up to 50 emails in one call", batch_delete_schema()),
            tool_def("list_filters", "Retrieves all Gmail filters", empty_schema()),
            tool_def("create_filter", "Creates a Gmail filter from criteria and action shorthands", create_filter_schema()),
            tool_def("delete_filter", "Deletes a Gmail filter", filter_id_schema()),
            tool_def("get_thread", "Retrieves a conversation thread with all its messages", thread_id_schema()),
            tool_def("reply_to_email", "Replies to an existing email within its thread", reply_schema()),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "send_email" => self.handle_compose(args, false).await,
            "read_email" => self.handle_read_email(args).await,
            "search_emails" => self.handle_search_emails(args).await,
            "delete_email" => self.handle_delete_email(args).await,
            "trash_email" => self.handle_trash_email(args).await,
            "modify_email" => self.handle_modify_email(args).await,
            "list_attachments" => self.handle_list_attachments(args).await,
            "download_attachment" => self.handle_download_attachment(args).await,
            "create_draft" => self.handle_compose(args, true).await,
            "list_drafts" => self.handle_list_drafts(args).await,
            "send_draft" => self.handle_send_draft(args).await,
            "delete_draft" => self.handle_delete_draft(args).await,
            "list_labels" => self.handle_list_labels().await,
            "create_label" => self.handle_create_label(args).await,
            "update_label" => self.handle_update_label(args).await,
            "delete_label" => self.handle_delete_label(args).await,
            "batch_modify_emails" => self.handle_batch_modify(args).await,
            "batch_delete_emails" => self.handle_batch_delete(args).await,
            "list_filters" => self.handle_list_filters().await,
            "create_filter" => self.handle_create_filter(args).await,
            "delete_filter" => self.handle_delete_filter(args).await,
            "get_thread" => self.handle_get_thread(args).await,
            "reply_to_email" => self.handle_reply(args).await,
            _ => CallToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    // ==================== Message Tools ====================

    async fn handle_compose(&self, args: Value, draft: bool) -> CallToolResult {
        let args: ComposeArgs = parse_args!(args);

        let (message, thread_id) = match args.into_message() {
            Ok(m) => m,
            Err(e) => return CallToolResult::error(e.to_string()),
        };

        if draft {
            match self.gmail_client.create_draft(&message, thread_id).await {
                Ok(d) => CallToolResult::text(format!("Draft created with ID: {}", d.id)),
                Err(e) => CallToolResult::error(e.to_string()),
            }
        } else {
            match self.gmail_client.send_email(&message, thread_id).await {
                Ok(m) => CallToolResult::text(format!("Email sent with ID: {}", m.id)),
                Err(e) => CallToolResult::error(e.to_string()),
            }
        }
    }

    async fn handle_read_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.read_message(&args.message_id).await {
            Ok(m) => CallToolResult::text(format!(
                "ID: {}\nThread ID: {}\nSubject: {}\nFrom: {}\nTo: {}\nDate: {}\nLabels: {}\n\n{}",
                m.id,
                m.thread_id,
                m.subject,
                m.from,
                m.to,
                m.date,
                m.labels.join(", "),
                m.body
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_search_emails(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            query: String,
            max_results: Option<u32>,
        }

        let args: Args = parse_args!(args);

        match self
            .gmail_client
            .search_messages(&args.query, args.max_results)
            .await
        {
            Ok(hits) if hits.is_empty() => CallToolResult::text("No messages matched the query."),
            Ok(hits) => {
                let text = hits
                    .iter()
                    .map(|h| {
                        format!(
                            "ID: {}\nThread ID: {}\nSubject: {}\nFrom: {}\nDate: {}\n{}\n",
                            h.id, h.thread_id, h.subject, h.from, h.date, h.snippet
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.delete_message(&args.message_id).await {
            Ok(()) => CallToolResult::text(format!("Email {} deleted", args.message_id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_trash_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.trash_message(&args.message_id).await {
            Ok(()) => CallToolResult::text(format!("Email {} moved to trash", args.message_id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_modify_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            #[serde(alias = "addLabels")]
            add_label_ids: Option<Vec<String>>,
            #[serde(alias = "removeLabels")]
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = parse_args!(args);

        match self
            .gmail_client
            .modify_message(&args.message_id, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(_) => CallToolResult::text(format!("Email {} labels updated", args.message_id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_list_attachments(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.list_attachments(&args.message_id).await {
            Ok(attachments) if attachments.is_empty() => {
                CallToolResult::text("No attachments found.")
            }
            Ok(attachments) => {
                let mut text = format!("Attachments ({}):\n", attachments.len());
                for a in &attachments {
                    text.push_str(&format!(
                        "- {} ({}, {} bytes, ID: {})\n",
                        a.filename, a.mime_type, a.size, a.id
                    ));
                }
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_download_attachment(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            attachment_id: String,
            filename: Option<String>,
            save_path: Option<String>,
        }

        let args: Args = parse_args!(args);

        let attachment = match self
            .gmail_client
            .get_attachment(&args.message_id, &args.attachment_id)
            .await
        {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(e.to_string()),
        };

        let data = match decode_base64url(&attachment.data) {
            Ok(d) => d,
            Err(e) => return CallToolResult::error(format!("Failed to decode attachment: {}", e)),
        };

        let filename = args
            .filename
            .unwrap_or_else(|| format!("attachment-{}", args.attachment_id));
        let save_dir = args.save_path.unwrap_or_else(|| ".".to_string());
        let full_path = std::path::Path::new(&save_dir).join(&filename);

        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return CallToolResult::error(format!("Failed to create directory: {}", e));
                }
            }
        }

        if let Err(e) = std::fs::write(&full_path, &data) {
            return CallToolResult::error(format!("Failed to write file: {}", e));
        }

        CallToolResult::text(format!(
            "Attachment saved to {} ({} bytes)",
            full_path.display(),
            data.len()
        ))
    }

    // ==================== Draft Tools ====================

    async fn handle_list_drafts(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            max_results: Option<u32>,
        }

        let args: Args = parse_args!(optional_args(args));

        match self.gmail_client.list_drafts(args.max_results).await {
            Ok(drafts) if drafts.is_empty() => CallToolResult::text("No drafts found."),
            Ok(drafts) => {
                let text = drafts
                    .iter()
                    .map(|d| {
                        format!(
                            "ID: {}\nTo: {}\nSubject: {}\n{}\n",
                            d.id, d.to, d.subject, d.snippet
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_send_draft(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            draft_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.send_draft(&args.draft_id).await {
            Ok(m) => CallToolResult::text(format!("Draft sent as message {}", m.id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_draft(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            draft_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.delete_draft(&args.draft_id).await {
            Ok(()) => CallToolResult::text(format!("Draft {} deleted", args.draft_id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Label Tools ====================

    async fn handle_list_labels(&self) -> CallToolResult {
        match self.gmail_client.list_labels().await {
            Ok(result) => {
                let mut text = format!(
                    "Found {} labels ({} system, {} user):\n\nSystem labels:\n",
                    result.total(),
                    result.system.len(),
                    result.user.len()
                );
                for label in &result.system {
                    text.push_str(&format!("- {} ({})\n", label.name, label.id));
                }
                text.push_str("\nUser labels:\n");
                for label in &result.user {
                    text.push_str(&format!("- {} ({})\n", label.name, label.id));
                }
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_create_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            name: String,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
        }

        let args: Args = parse_args!(args);

        let request = CreateLabelRequest {
            name: args.name,
            message_list_visibility: args.message_list_visibility,
            label_list_visibility: args.label_list_visibility,
        };

        match self.gmail_client.create_label(request).await {
            Ok(label) => {
                CallToolResult::text(format!("Label created: {} (ID: {})", label.name, label.id))
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_update_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            #[serde(alias = "labelId")]
            id: String,
            name: Option<String>,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
        }

        let args: Args = parse_args!(args);

        let updates = UpdateLabelRequest {
            name: args.name,
            message_list_visibility: args.message_list_visibility,
            label_list_visibility: args.label_list_visibility,
        };

        match self.gmail_client.update_label(&args.id, updates).await {
            Ok(label) => {
                CallToolResult::text(format!("Label updated: {} (ID: {})", label.name, label.id))
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(alias = "labelId")]
            id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.delete_label(&args.id).await {
            Ok(()) => CallToolResult::text(format!("Label {} deleted", args.id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Batch Tools ====================

    async fn handle_batch_modify(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_ids: Vec<String>,
            #[serde(alias = "addLabels")]
            add_label_ids: Option<Vec<String>>,
            #[serde(alias = "removeLabels")]
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = parse_args!(args);

        match self
            .gmail_client
            .batch_modify_messages(&args.message_ids, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(submitted) => {
                CallToolResult::text(format!("Labels updated on {} messages", submitted))
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_batch_delete(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_ids: Vec<String>,
        }

        let args: Args = parse_args!(args);

        match self
            .gmail_client
            .batch_delete_messages(&args.message_ids)
            .await
        {
            Ok(submitted) => CallToolResult::text(format!("Deleted {} messages", submitted)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Filter Tools ====================

    async fn handle_list_filters(&self) -> CallToolResult {
        match self.gmail_client.list_filters().await {
            Ok(filters) if filters.is_empty() => CallToolResult::text("No filters found."),
            Ok(filters) => {
                let mut text = format!("Found {} filters:\n\n", filters.len());
                for filter in &filters {
                    text.push_str(&format!("ID: {}\n", filter.id.as_deref().unwrap_or("")));

                    let criteria: Vec<String> = [
                        filter.criteria.from.as_ref().map(|v| format!("from: {}", v)),
                        filter.criteria.to.as_ref().map(|v| format!("to: {}", v)),
                        filter
                            .criteria
                            .subject
                            .as_ref()
                            .map(|v| format!("subject: {}", v)),
                        filter
                            .criteria
                            .query
                            .as_ref()
                            .map(|v| format!("query: {}", v)),
                    ]
                    .into_iter()
                    .flatten()
                    .collect();
                    text.push_str(&format!("Criteria: {}\n", criteria.join(", ")));

                    let actions: Vec<String> = [
                        filter
                            .action
                            .add_label_ids
                            .as_ref()
                            .map(|v| format!("add: {}", v.join(", "))),
                        filter
                            .action
                            .remove_label_ids
                            .as_ref()
                            .map(|v| format!("remove: {}", v.join(", "))),
                    ]
                    .into_iter()
                    .flatten()
                    .collect();
                    text.push_str(&format!("Actions: {}\n\n", actions.join("; ")));
                }
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_create_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            from: Option<String>,
            to: Option<String>,
            subject: Option<String>,
            query: Option<String>,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
            #[serde(default)]
            star: bool,
            #[serde(default)]
            mark_important: bool,
            #[serde(default)]
            mark_read: bool,
            #[serde(default)]
            archive: bool,
            #[serde(default)]
            trash: bool,
        }

        let args: Args = parse_args!(optional_args(args));

        let (criteria, action) = expand_filter_shorthand(FilterShorthand {
            from: args.from,
            to: args.to,
            subject: args.subject,
            query: args.query,
            add_label_ids: args.add_label_ids,
            remove_label_ids: args.remove_label_ids,
            star: args.star,
            mark_important: args.mark_important,
            mark_read: args.mark_read,
            archive: args.archive,
            trash: args.trash,
        });

        match self.gmail_client.create_filter(criteria, action).await {
            Ok(filter) => CallToolResult::text(format!(
                "Filter created with ID: {}",
                filter.id.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            filter_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.delete_filter(&args.filter_id).await {
            Ok(()) => CallToolResult::text(format!("Filter {} deleted", args.filter_id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Thread and Reply Tools ====================

    async fn handle_get_thread(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            thread_id: String,
        }

        let args: Args = parse_args!(args);

        match self.gmail_client.get_thread(&args.thread_id).await {
            Ok(thread) => {
                let mut text = format!(
                    "Thread {} ({} messages):\n\n",
                    thread.id,
                    thread.messages.len()
                );
                for message in thread.messages {
                    let inbound = crate::gmail::client::InboundMessage::from_message(message);
                    text.push_str(&format!(
                        "From: {}\nDate: {}\nSubject: {}\n\n{}\n\n---\n\n",
                        inbound.from, inbound.date, inbound.subject, inbound.body
                    ));
                }
                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_reply(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            body: String,
            html_body: Option<String>,
        }

        let args: Args = parse_args!(args);

        if args.body.is_empty() {
            return CallToolResult::error(
                ValidationError::MissingField {
                    field: "body".to_string(),
                }
                .to_string(),
            );
        }

        let original = match self.gmail_client.get_message(&args.message_id).await {
            Ok(m) => m,
            Err(e) => return CallToolResult::error(e.to_string()),
        };

        let payload = original.payload.unwrap_or_default();
        let original_from = find_header(&payload, "From").unwrap_or("").to_string();
        let original_subject = find_header(&payload, "Subject").unwrap_or("");
        let original_message_id = find_header(&payload, "Message-ID").map(str::to_string);

        // Thread the References chain: original references plus its own id
        let references = match (
            find_header(&payload, "References"),
            original_message_id.as_deref(),
        ) {
            (Some(refs), Some(id)) => Some(format!("{} {}", refs, id)),
            (None, Some(id)) => Some(id.to_string()),
            (Some(refs), None) => Some(refs.to_string()),
            (None, None) => None,
        };

        if original_from.is_empty() {
            return CallToolResult::error("Original message has no From header to reply to");
        }

        let reply = OutboundMessage {
            to: original_from,
            subject: reply_subject(original_subject),
            plain_body: args.body,
            html_body: args.html_body,
            in_reply_to: original_message_id,
            references,
            ..Default::default()
        };

        match self
            .gmail_client
            .send_email(&reply, original.thread_id)
            .await
        {
            Ok(m) => CallToolResult::text(format!("Reply sent with ID: {}", m.id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn message_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": description}
        },
        "required": ["messageId"]
    })
}

fn draft_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "draftId": {"type": "string", "description": description}
        },
        "required": ["draftId"]
    })
}

fn label_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": description}
        },
        "required": ["id"]
    })
}

fn filter_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filterId": {"type": "string", "description": "ID of the filter to delete"}
        },
        "required": ["filterId"]
    })
}

fn thread_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "threadId": {"type": "string", "description": "ID of the thread to retrieve"}
        },
        "required": ["threadId"]
    })
}

fn compose_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {"type": "string", "description": "Recipient email address"},
            "subject": {"type": "string", "description": "Email subject"},
            "body": {"type": "string", "description": "Plain-text body"},
            "from": {"type": "string", "description": "Sender address override"},
            "htmlBody": {"type": "string", "description": "HTML alternative body"},
            "cc": {"type": "array", "items": {"type": "string"}, "description": "CC recipients"},
            "bcc": {"type": "array", "items": {"type": "string"}, "description": "BCC recipients"},
            "threadId": {"type": "string", "description": "Thread to attach the message to"},
            "inReplyTo": {"type": "string", "description": "Message-ID being replied to"},
            "references": {"type": "string", "description": "Space-joined Message-ID chain"},
            "attachments": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "filename": {"type": "string"},
                        "mimeType": {"type": "string"},
                        "content": {"type": "string", "description": "Base64-encoded payload"}
                    },
                    "required": ["filename", "mimeType", "content"]
                }
            }
        },
        "required": ["to", "subject", "body"]
    })
}

fn search_emails_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": "Gmail search query"},
            "maxResults": {"type": "number", "description": "Maximum results (default 10, capped at 100)"}
        },
        "required": ["query"]
    })
}

fn modify_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email message to modify"},
            "addLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to add"},
            "removeLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to remove"}
        },
        "required": ["messageId"]
    })
}

fn download_attachment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email containing the attachment"},
            "attachmentId": {"type": "string", "description": "ID of the attachment"},
            "filename": {"type": "string", "description": "Filename to save as"},
            "savePath": {"type": "string", "description": "Directory to save to"}
        },
        "required": ["messageId", "attachmentId"]
    })
}

fn list_drafts_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "maxResults": {"type": "number", "description": "Maximum drafts to list (default 10)"}
        }
    })
}

fn create_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Name for the new label"},
            "messageListVisibility": {"type": "string", "enum": ["show", "hide"]},
            "labelListVisibility": {"type": "string", "enum": ["labelShow", "labelShowIfUnread", "labelHide"]}
        },
        "required": ["name"]
    })
}

fn update_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "ID of the label to update"},
            "name": {"type": "string", "description": "New name for the label"},
            "messageListVisibility": {"type": "string", "enum": ["show", "hide"]},
            "labelListVisibility": {"type": "string", "enum": ["labelShow", "labelShowIfUnread", "labelHide"]}
        },
        "required": ["id"]
    })
}

fn batch_modify_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageIds": {"type": "array", "items": {"type": "string"}, "description": "Message IDs (at most 50 are submitted)"},
            "addLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to add"},
            "removeLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to remove"}
        },
        "required": ["messageIds"]
    })
}

fn batch_delete_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageIds": {"type": "array", "items": {"type": "string"}, "description": "Message IDs (at most 50 are submitted)"}
        },
        "required": ["messageIds"]
    })
}

fn create_filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "from": {"type": "string", "description": "Sender to match"},
            "to": {"type": "string", "description": "Recipient to match"},
            "subject": {"type": "string", "description": "Subject to match"},
            "query": {"type": "string", "description": "Gmail search query to match"},
            "addLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Explicit label IDs to add"},
            "removeLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Explicit label IDs to remove"},
            "star": {"type": "boolean", "description": "Add the STARRED label"},
            "markImportant": {"type": "boolean", "description": "Add the IMPORTANT label"},
            "markRead": {"type": "boolean", "description": "Remove the UNREAD label"},
            "archive": {"type": "boolean", "description": "Remove the INBOX label"},
            "trash": {"type": "boolean", "description": "Add the TRASH label"}
        }
    })
}

fn reply_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the message to reply to"},
            "body": {"type": "string", "description": "Plain-text reply body"},
            "htmlBody": {"type": "string", "description": "HTML alternative reply body"}
        },
        "required": ["messageId", "body"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_tool_once() {
        let tools = ToolHandler::list_tools();
        assert_eq!(tools.len(), 23);

        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 23);

        for name in [
            "send_email",
            "reply_to_email",
            "get_thread",
            "batch_modify_emails",
            "list_filters",
        ] {
            assert!(names.contains(&name), "missing tool {}", name);
        }
    }

    #[test]
    fn test_compose_args_reject_empty_required_fields() {
        let args: ComposeArgs = serde_json::from_value(json!({
            "to": "", "subject": "Hi", "body": "x"
        }))
        .unwrap();
        assert!(args.into_message().is_err());

        let args: ComposeArgs = serde_json::from_value(json!({
            "to": "a@b.com", "subject": "Hi", "body": "x"
        }))
        .unwrap();
        let (message, thread_id) = args.into_message().unwrap();
        assert_eq!(message.to, "a@b.com");
        assert!(thread_id.is_none());
    }

    #[test]
    fn test_compose_args_carry_attachments() {
        let args: ComposeArgs = serde_json::from_value(json!({
            "to": "a@b.com",
            "subject": "Hi",
            "body": "see attached",
            "attachments": [
                {"filename": "r.pdf", "mimeType": "application/pdf", "content": "AAAA"}
            ]
        }))
        .unwrap();
        let (message, _) = args.into_message().unwrap();
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].filename, "r.pdf");
    }

    #[test]
    fn test_null_arguments_parse_for_optional_only_tools() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OptionalOnly {
            query: Option<String>,
            #[serde(default)]
            archive: bool,
        }

        // Absent params arrive as JSON null; they must parse like {}
        let parsed: OptionalOnly = serde_json::from_value(optional_args(Value::Null)).unwrap();
        assert!(parsed.query.is_none());
        assert!(!parsed.archive);

        // Real objects pass through untouched
        let parsed: OptionalOnly =
            serde_json::from_value(optional_args(json!({"archive": true}))).unwrap();
        assert!(parsed.archive);
    }

    #[test]
    fn test_every_tool_has_an_object_schema() {
        for tool in ToolHandler::list_tools() {
            assert_eq!(
                tool.input_schema["type"], "object",
                "tool {} schema is not an object",
                tool.name
            );
        }
    }
}
