//! Label wrapper with an explicitly loaded message list

use tracing::{debug, info, warn};

use crate::client::MailClient;
use crate::error::{GmailError, Result};
use crate::hierarchy;
use crate::message::Message;
use crate::models::{BatchReport, DetailLevel, LabelInfo};

/// Whether a label's messages have been listed
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MessageList {
    #[default]
    NotLoaded,
    Loaded(Vec<Message>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    id: String,
    path: String,
    short_name: String,
    messages: MessageList,
    pub(crate) children: Vec<String>,
}

impl Label {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let short_name = hierarchy::short_name(&path).to_string();
        Self {
            id: id.into(),
            path,
            short_name,
            messages: MessageList::NotLoaded,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full `/`-delimited name, e.g. `Finance/Fidelity`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, e.g. `Fidelity`
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn depth(&self) -> usize {
        hierarchy::depth(&self.path)
    }

    /// IDs of the child labels from the last hierarchy build
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn message_list(&self) -> &MessageList {
        &self.messages
    }

    /// Loaded messages, `None` until [`Label::load_messages`] succeeds
    pub fn messages(&self) -> Option<&[Message]> {
        match &self.messages {
            MessageList::NotLoaded => None,
            MessageList::Loaded(messages) => Some(messages),
        }
    }

    pub fn messages_mut(&mut self) -> Option<&mut Vec<Message>> {
        match &mut self.messages {
            MessageList::NotLoaded => None,
            MessageList::Loaded(messages) => Some(messages),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.messages, MessageList::Loaded(_))
    }

    /// Search query selecting this label's messages. Gmail search writes
    /// spaces in label names as dashes.
    pub fn query(&self) -> String {
        format!("label:{}", self.short_name.replace(' ', "-"))
    }

    /// List every message matching [`Label::query`], following page tokens until
    /// the remote reports none, and build one [`Message`] per result at `level`.
    ///
    /// Always goes to the remote and replaces any earlier list. Pages are not a
    /// consistent snapshot: a message added or relabelled while paging may be
    /// missed or seen twice.
    pub async fn load_messages(
        &mut self,
        client: &dyn MailClient,
        user_id: &str,
        level: DetailLevel,
    ) -> Result<usize> {
        let query = self.query();
        let mut messages = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = client.list_messages(user_id, &query, page_token.take()).await?;
            pages += 1;

            for id in page.message_ids {
                messages.push(Message::fetch(client, user_id, id, level).await?);
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!(
            "Loaded {} messages for label '{}' in {} page(s)",
            messages.len(),
            self.path,
            pages
        );
        let count = messages.len();
        self.messages = MessageList::Loaded(messages);
        Ok(count)
    }

    /// Like [`Label::load_messages`], but a no-op when a list is already held
    pub async fn ensure_messages_loaded(
        &mut self,
        client: &dyn MailClient,
        user_id: &str,
        level: DetailLevel,
    ) -> Result<usize> {
        match &self.messages {
            MessageList::Loaded(messages) => Ok(messages.len()),
            MessageList::NotLoaded => self.load_messages(client, user_id, level).await,
        }
    }

    /// Bring every loaded message to `level`, one at a time. A message that fails
    /// to load stays at its current level and the rest are still attempted.
    /// Returns the number of failures.
    pub async fn load_message_contents(
        &mut self,
        client: &dyn MailClient,
        user_id: &str,
        level: DetailLevel,
    ) -> Result<usize> {
        let path = self.path.clone();
        let messages = self
            .messages_mut()
            .ok_or_else(|| GmailError::MessagesNotLoaded(path.clone()))?;

        let mut failures = 0;
        for message in messages.iter_mut() {
            if let Err(e) = message.load(client, user_id, level).await {
                warn!("Failed to load message {} at {}: {}", message.id(), level, e);
                failures += 1;
            }
        }

        if failures > 0 {
            debug!("{} message(s) in label '{}' kept at a lower level", failures, path);
        }
        Ok(failures)
    }

    /// Forget the loaded message list
    pub fn unload_messages(&mut self) {
        self.messages = MessageList::NotLoaded;
    }

    /// Trash every loaded message.
    ///
    /// Each trash call is independent: a failure is recorded in the report and the
    /// remaining messages are still attempted. Nothing is rolled back.
    pub async fn discard_messages(
        &self,
        client: &dyn MailClient,
        user_id: &str,
    ) -> Result<BatchReport> {
        let messages = self
            .messages()
            .ok_or_else(|| GmailError::MessagesNotLoaded(self.path.clone()))?;

        let mut report = BatchReport::new();
        for message in messages {
            if let Some(content) = message.content() {
                info!(
                    "Discarding message, subject={}, from={}",
                    content.subject().unwrap_or("<none>"),
                    content.sender().unwrap_or("<unknown>")
                );
            } else {
                info!("Discarding message {}", message.id());
            }

            let outcome = message.discard(client, user_id).await;
            if let Err(e) = &outcome {
                warn!("Failed to discard message {}: {}", message.id(), e);
            }
            report.record(message.id(), outcome);
        }

        info!(
            "Discarded {}/{} messages in label '{}'",
            report.succeeded.len(),
            report.total(),
            self.path
        );
        Ok(report)
    }

    /// Delete a label on the remote. Deleting twice behaves however the remote does.
    pub async fn delete(client: &dyn MailClient, user_id: &str, label_id: &str) -> Result<()> {
        client.delete_label(user_id, label_id).await
    }
}

impl From<LabelInfo> for Label {
    fn from(info: LabelInfo) -> Self {
        Label::new(info.id, info.name)
    }
}
