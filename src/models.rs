use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GmailError;

/// How much of a message to fetch, ordered by increasing payload richness
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Only the message ID, nothing is fetched
    IdOnly,
    /// ID, thread ID, label IDs, snippet, history ID, internal date, size estimate
    Minimal,
    /// Minimal plus the header list
    #[default]
    Metadata,
    /// Full message data including headers and body
    Full,
}

impl DetailLevel {
    /// Format string for the `messages.get` call, `None` when nothing is fetched
    pub fn api_format(&self) -> Option<&'static str> {
        match self {
            DetailLevel::IdOnly => None,
            DetailLevel::Minimal => Some("minimal"),
            DetailLevel::Metadata => Some("metadata"),
            DetailLevel::Full => Some("full"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::IdOnly => "id_only",
            DetailLevel::Minimal => "minimal",
            DetailLevel::Metadata => "metadata",
            DetailLevel::Full => "full",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = GmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "id_only" | "id" => Ok(DetailLevel::IdOnly),
            "minimal" => Ok(DetailLevel::Minimal),
            "metadata" => Ok(DetailLevel::Metadata),
            "full" => Ok(DetailLevel::Full),
            other => Err(GmailError::ConfigError(format!(
                "Invalid detail level: '{}'. Must be 'id_only', 'minimal', 'metadata' or 'full'",
                other
            ))),
        }
    }
}

/// Label as listed by the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// One page of a message search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub message_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Account profile returned by the remote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub email_address: String,
    pub messages_total: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Message content at a given detail level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    pub id: String,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub snippet: Option<String>,
    pub history_id: Option<u64>,
    pub internal_date: Option<DateTime<Utc>>,
    pub size_estimate: Option<i32>,
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Decoded text/plain body, only present at `Full`
    pub body_text: Option<String>,
}

impl MessageContent {
    /// Case-insensitive header lookup, first match wins
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    pub fn sender(&self) -> Option<&str> {
        self.header("From")
    }
}

/// Outcome of a fail-forward bulk operation
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Items the remote accepted
    pub succeeded: Vec<String>,
    /// Items that failed, with the error that was reported for each
    pub failed: Vec<(String, GmailError)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, item: impl Into<String>, outcome: crate::error::Result<()>) {
        let item = item.into();
        match outcome {
            Ok(()) => self.succeeded.push(item),
            Err(e) => self.failed.push((item, e)),
        }
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
