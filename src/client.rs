//! Remote mail client: the seam between the label/message bookkeeping and the Gmail API

use async_trait::async_trait;
use chrono::DateTime;
use google_gmail1::{
    api::{Message as ApiMessage, MessagePart},
    hyper_rustls, hyper_util, Gmail,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::{GmailError, Result};
use crate::models::{DetailLevel, Header, LabelInfo, MessageContent, MessagePage, Profile};

/// Scope used for every call. Trashing and deleting need full mail access.
pub const MAIL_SCOPE: &str = "https://mail.google.com/";

/// Page size requested from `messages.list`
const PAGE_SIZE: u32 = 100;

/// Operations consumed from the mail provider
///
/// Every call is a single remote request. Nothing here retries; errors are
/// returned as-is to the caller.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// List all labels in the account
    async fn list_labels(&self, user_id: &str) -> Result<Vec<LabelInfo>>;

    /// Get a single label by ID
    async fn get_label(&self, user_id: &str, label_id: &str) -> Result<LabelInfo>;

    /// Delete a label by ID
    async fn delete_label(&self, user_id: &str, label_id: &str) -> Result<()>;

    /// Fetch one page of message IDs matching a query
    async fn list_messages(
        &self,
        user_id: &str,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage>;

    /// Get a message at the given detail level
    async fn get_message(
        &self,
        user_id: &str,
        message_id: &str,
        level: DetailLevel,
    ) -> Result<MessageContent>;

    /// Move a message to the trash
    async fn trash_message(&self, user_id: &str, message_id: &str) -> Result<()>;

    /// Get the account profile
    async fn get_profile(&self, user_id: &str) -> Result<Profile>;
}

pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Gmail API client backed by the generated `google_gmail1` hub
pub struct ProductionGmailClient {
    hub: GmailHub,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &GmailHub {
        &self.hub
    }
}

/// A 404 from a label endpoint means the label is gone, not a message
fn label_not_found(label_id: &str) -> impl FnOnce(GmailError) -> GmailError + '_ {
    move |e| match e {
        GmailError::MessageNotFound(_) => GmailError::LabelNotFound(label_id.to_string()),
        other => other,
    }
}

fn message_not_found(message_id: &str) -> impl FnOnce(GmailError) -> GmailError + '_ {
    move |e| match e {
        GmailError::MessageNotFound(_) => GmailError::MessageNotFound(message_id.to_string()),
        other => other,
    }
}

fn label_info_from_api(label: google_gmail1::api::Label) -> Option<LabelInfo> {
    match (label.id, label.name) {
        (Some(id), Some(name)) => Some(LabelInfo { id, name }),
        _ => None,
    }
}

/// Convert an API message into our content record
fn content_from_api(msg: ApiMessage) -> Result<MessageContent> {
    let id = msg
        .id
        .ok_or_else(|| GmailError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let headers = msg
        .payload
        .as_ref()
        .and_then(|p| p.headers.as_ref())
        .map(|headers| {
            headers
                .iter()
                .filter_map(|h| match (&h.name, &h.value) {
                    (Some(name), Some(value)) => Some(Header {
                        name: name.clone(),
                        value: value.clone(),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let body_text = msg.payload.as_ref().and_then(plain_text_body);

    Ok(MessageContent {
        id,
        thread_id: msg.thread_id,
        label_ids: msg.label_ids.unwrap_or_default(),
        snippet: msg.snippet,
        history_id: msg.history_id,
        internal_date: msg.internal_date.and_then(DateTime::from_timestamp_millis),
        size_estimate: msg.size_estimate,
        headers,
        body_text,
    })
}

/// Concatenate every text/plain part, depth first
fn plain_text_body(part: &MessagePart) -> Option<String> {
    let mut text = String::new();
    collect_plain_text(part, &mut text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn collect_plain_text(part: &MessagePart, out: &mut String) {
    let is_plain = part
        .mime_type
        .as_deref()
        .map(|m| m.eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false);

    if is_plain {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) {
            out.push_str(&String::from_utf8_lossy(data));
        }
    }

    for child in part.parts.iter().flatten() {
        collect_plain_text(child, out);
    }
}

#[async_trait]
impl MailClient for ProductionGmailClient {
    async fn list_labels(&self, user_id: &str) -> Result<Vec<LabelInfo>> {
        debug!("Calling Gmail API to list labels...");
        let (_, response) = self
            .hub
            .users()
            .labels_list(user_id)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(label_info_from_api)
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn get_label(&self, user_id: &str, label_id: &str) -> Result<LabelInfo> {
        let (_, label) = self
            .hub
            .users()
            .labels_get(user_id, label_id)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await
            .map_err(GmailError::from)
            .map_err(label_not_found(label_id))?;

        label_info_from_api(label).ok_or_else(|| {
            GmailError::ApiError(format!("Label {} returned without id or name", label_id))
        })
    }

    async fn delete_label(&self, user_id: &str, label_id: &str) -> Result<()> {
        self.hub
            .users()
            .labels_delete(user_id, label_id)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await
            .map_err(GmailError::from)
            .map_err(label_not_found(label_id))?;

        Ok(())
    }

    async fn list_messages(
        &self,
        user_id: &str,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage> {
        let mut call = self
            .hub
            .users()
            .messages_list(user_id)
            .q(query)
            .max_results(PAGE_SIZE);

        if let Some(token) = page_token.as_deref() {
            call = call.page_token(token);
        }

        debug!("Listing messages for query '{}' (page token: {:?})", query, page_token);
        let (_, response) = call.add_scope(MAIL_SCOPE).doit().await?;

        let message_ids = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg_ref| msg_ref.id)
            .collect();

        Ok(MessagePage {
            message_ids,
            next_page_token: response.next_page_token,
        })
    }

    async fn get_message(
        &self,
        user_id: &str,
        message_id: &str,
        level: DetailLevel,
    ) -> Result<MessageContent> {
        let Some(format) = level.api_format() else {
            return Ok(MessageContent {
                id: message_id.to_string(),
                ..Default::default()
            });
        };

        let (_, msg) = self
            .hub
            .users()
            .messages_get(user_id, message_id)
            .format(format)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await
            .map_err(GmailError::from)
            .map_err(message_not_found(message_id))?;

        content_from_api(msg)
    }

    async fn trash_message(&self, user_id: &str, message_id: &str) -> Result<()> {
        self.hub
            .users()
            .messages_trash(user_id, message_id)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await
            .map_err(GmailError::from)
            .map_err(message_not_found(message_id))?;

        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let (_, profile) = self
            .hub
            .users()
            .get_profile(user_id)
            .add_scope(MAIL_SCOPE)
            .doit()
            .await?;

        Ok(Profile {
            email_address: profile.email_address.unwrap_or_default(),
            messages_total: profile.messages_total,
        })
    }
}

// Implement MailClient for Arc<C> to allow shared ownership
#[async_trait]
impl<C: MailClient + ?Sized> MailClient for Arc<C> {
    async fn list_labels(&self, user_id: &str) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels(user_id).await
    }

    async fn get_label(&self, user_id: &str, label_id: &str) -> Result<LabelInfo> {
        self.as_ref().get_label(user_id, label_id).await
    }

    async fn delete_label(&self, user_id: &str, label_id: &str) -> Result<()> {
        self.as_ref().delete_label(user_id, label_id).await
    }

    async fn list_messages(
        &self,
        user_id: &str,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage> {
        self.as_ref().list_messages(user_id, query, page_token).await
    }

    async fn get_message(
        &self,
        user_id: &str,
        message_id: &str,
        level: DetailLevel,
    ) -> Result<MessageContent> {
        self.as_ref().get_message(user_id, message_id, level).await
    }

    async fn trash_message(&self, user_id: &str, message_id: &str) -> Result<()> {
        self.as_ref().trash_message(user_id, message_id).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.as_ref().get_profile(user_id).await
    }
}
