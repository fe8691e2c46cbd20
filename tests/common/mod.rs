//! Common test utilities and fixtures

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use gmail_labels::client::MailClient;
use gmail_labels::error::{GmailError, Result};
use gmail_labels::models::{DetailLevel, Header, LabelInfo, MessageContent, MessagePage, Profile};

pub fn label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// System labels plus a small user tree:
///
/// ```text
/// INBOX
/// Finance
///   Fidelity
///     Statements
///   Taxes
/// Offers
/// ```
pub fn finance_labels() -> Vec<LabelInfo> {
    vec![
        label_info("INBOX", "INBOX"),
        label_info("TRASH", "TRASH"),
        label_info("Label_1", "Finance"),
        label_info("Label_2", "Finance/Fidelity"),
        label_info("Label_3", "Finance/Fidelity/Statements"),
        label_info("Label_4", "Finance/Taxes"),
        label_info("Label_5", "Offers"),
    ]
}

pub fn test_content(id: &str, subject: &str, sender: &str) -> MessageContent {
    MessageContent {
        id: id.to_string(),
        thread_id: Some(format!("thread_{}", id)),
        label_ids: vec!["INBOX".to_string()],
        snippet: Some("Snippet...".to_string()),
        headers: vec![
            Header {
                name: "Subject".to_string(),
                value: subject.to_string(),
            },
            Header {
                name: "From".to_string(),
                value: sender.to_string(),
            },
        ],
        ..Default::default()
    }
}

/// Remote calls seen by a [`FakeMailbox`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Calls {
    pub list_labels: usize,
    pub list_messages: usize,
    pub get_message: usize,
    pub trash_message: usize,
    pub delete_label: usize,
}

/// In-memory mailbox: labels, messages per search query, paged results, and
/// configurable per-item failures. Trashed messages disappear from every query.
#[derive(Default)]
pub struct FakeMailbox {
    labels: Mutex<Vec<LabelInfo>>,
    queries: HashMap<String, Vec<String>>,
    page_size: usize,
    failing_trash: HashSet<String>,
    trashed: Mutex<Vec<String>>,
    calls: Mutex<Calls>,
}

impl FakeMailbox {
    pub fn new(labels: Vec<LabelInfo>) -> Self {
        Self {
            labels: Mutex::new(labels),
            page_size: 100,
            ..Default::default()
        }
    }

    pub fn with_messages(mut self, query: &str, ids: &[&str]) -> Self {
        self.queries.insert(
            query.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_trash(mut self, message_id: &str) -> Self {
        self.failing_trash.insert(message_id.to_string());
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn trashed(&self) -> Vec<String> {
        self.trashed.lock().unwrap().clone()
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }
}

#[async_trait]
impl MailClient for FakeMailbox {
    async fn list_labels(&self, _user_id: &str) -> Result<Vec<LabelInfo>> {
        self.calls.lock().unwrap().list_labels += 1;
        Ok(self.labels.lock().unwrap().clone())
    }

    async fn get_label(&self, _user_id: &str, label_id: &str) -> Result<LabelInfo> {
        self.labels
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == label_id)
            .cloned()
            .ok_or_else(|| GmailError::LabelNotFound(label_id.to_string()))
    }

    async fn delete_label(&self, _user_id: &str, label_id: &str) -> Result<()> {
        self.calls.lock().unwrap().delete_label += 1;
        let mut labels = self.labels.lock().unwrap();
        let before = labels.len();
        labels.retain(|l| l.id != label_id);
        if labels.len() == before {
            return Err(GmailError::LabelNotFound(label_id.to_string()));
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        _user_id: &str,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage> {
        self.calls.lock().unwrap().list_messages += 1;
        let trashed = self.trashed.lock().unwrap();
        let ids: Vec<String> = self
            .queries
            .get(query)
            .map(|ids| {
                ids.iter()
                    .filter(|id| !trashed.contains(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let start: usize = page_token
            .map(|t| t.parse().expect("fake page token"))
            .unwrap_or(0);
        let end = (start + self.page_size).min(ids.len());
        let next_page_token = (end < ids.len()).then(|| end.to_string());

        Ok(MessagePage {
            message_ids: ids[start..end].to_vec(),
            next_page_token,
        })
    }

    async fn get_message(
        &self,
        _user_id: &str,
        message_id: &str,
        level: DetailLevel,
    ) -> Result<MessageContent> {
        self.calls.lock().unwrap().get_message += 1;
        let mut content = test_content(
            message_id,
            &format!("Subject {}", message_id),
            "sender@example.com",
        );
        if level == DetailLevel::Minimal {
            content.headers.clear();
        }
        if level == DetailLevel::Full {
            content.body_text = Some(format!("Body of {}", message_id));
        }
        Ok(content)
    }

    async fn trash_message(&self, _user_id: &str, message_id: &str) -> Result<()> {
        self.calls.lock().unwrap().trash_message += 1;
        if self.failing_trash.contains(message_id) {
            return Err(GmailError::ServerError {
                status: 500,
                message: format!("backend error trashing {}", message_id),
            });
        }
        self.trashed.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn get_profile(&self, _user_id: &str) -> Result<Profile> {
        Ok(Profile {
            email_address: "someone@example.com".to_string(),
            messages_total: Some(42),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_labels_fixture() {
        let labels = finance_labels();
        assert_eq!(labels.len(), 7);
        assert!(labels.iter().any(|l| l.name == "Finance/Fidelity/Statements"));
    }

    #[test]
    fn test_content_fixture_headers() {
        let content = test_content("m1", "Hello", "a@example.com");
        assert_eq!(content.subject(), Some("Hello"));
        assert_eq!(content.sender(), Some("a@example.com"));
    }
}
