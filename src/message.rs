//! Single message wrapper with lazily fetched content

use tracing::debug;

use crate::client::MailClient;
use crate::error::Result;
use crate::models::{DetailLevel, MessageContent};

/// What is currently held for a message
///
/// There is no way to hold content at `IdOnly`: dropping to `IdOnly` discards it.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageState {
    IdOnly,
    Loaded {
        level: DetailLevel,
        content: MessageContent,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: String,
    state: MessageState,
}

impl Message {
    /// A message with nothing fetched yet
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: MessageState::IdOnly,
        }
    }

    /// Construct a message and bring it to `level` right away
    pub async fn fetch(
        client: &dyn MailClient,
        user_id: &str,
        id: impl Into<String>,
        level: DetailLevel,
    ) -> Result<Self> {
        let mut message = Self::new(id);
        message.load(client, user_id, level).await?;
        Ok(message)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &MessageState {
        &self.state
    }

    pub fn detail_level(&self) -> DetailLevel {
        match &self.state {
            MessageState::IdOnly => DetailLevel::IdOnly,
            MessageState::Loaded { level, .. } => *level,
        }
    }

    pub fn content(&self) -> Option<&MessageContent> {
        match &self.state {
            MessageState::IdOnly => None,
            MessageState::Loaded { content, .. } => Some(content),
        }
    }

    /// Move to `level`.
    ///
    /// The same level is a no-op, `IdOnly` clears content without a remote call,
    /// any other level is fetched in full. Returns whether a remote call was made.
    /// On error the previous state is kept.
    pub async fn load(
        &mut self,
        client: &dyn MailClient,
        user_id: &str,
        level: DetailLevel,
    ) -> Result<bool> {
        if level == self.detail_level() {
            return Ok(false);
        }

        if level == DetailLevel::IdOnly {
            debug!("Discarding content of message {}", self.id);
            self.state = MessageState::IdOnly;
            return Ok(false);
        }

        debug!("Fetching message {} at {}", self.id, level);
        let content = client.get_message(user_id, &self.id, level).await?;
        self.state = MessageState::Loaded { level, content };
        Ok(true)
    }

    /// Send the message to the trash
    pub async fn discard(&self, client: &dyn MailClient, user_id: &str) -> Result<()> {
        client.trash_message(user_id, &self.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::error::GmailError;
    use crate::models::Header;
    use mockall::predicate::eq;

    fn content(id: &str, subject: &str) -> MessageContent {
        MessageContent {
            id: id.to_string(),
            headers: vec![Header {
                name: "Subject".to_string(),
                value: subject.to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_new_message_holds_nothing() {
        let message = Message::new("m1");
        assert_eq!(message.id(), "m1");
        assert_eq!(message.detail_level(), DetailLevel::IdOnly);
        assert!(message.content().is_none());
    }

    #[tokio::test]
    async fn test_fetch_loads_requested_level() {
        let mut client = MockClient::new();
        client
            .expect_get_message()
            .with(eq("me"), eq("m1"), eq(DetailLevel::Metadata))
            .times(1)
            .returning(|_, id, _| Ok(content(id, "Hello")));

        let message = Message::fetch(&client, "me", "m1", DetailLevel::Metadata)
            .await
            .unwrap();

        assert_eq!(message.detail_level(), DetailLevel::Metadata);
        assert_eq!(message.content().unwrap().subject(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_same_level_is_noop() {
        let mut client = MockClient::new();
        client
            .expect_get_message()
            .times(1)
            .returning(|_, id, _| Ok(content(id, "Hello")));

        let mut message = Message::new("m1");
        assert!(message.load(&client, "me", DetailLevel::Minimal).await.unwrap());
        assert!(!message.load(&client, "me", DetailLevel::Minimal).await.unwrap());
        assert_eq!(message.detail_level(), DetailLevel::Minimal);
    }

    #[tokio::test]
    async fn test_id_only_clears_content_without_remote_call() {
        let mut client = MockClient::new();
        client
            .expect_get_message()
            .times(1)
            .returning(|_, id, _| Ok(content(id, "Hello")));

        let mut message = Message::new("m1");
        message.load(&client, "me", DetailLevel::Full).await.unwrap();
        assert!(message.content().is_some());

        let fetched = message.load(&client, "me", DetailLevel::IdOnly).await.unwrap();
        assert!(!fetched);
        assert_eq!(message.detail_level(), DetailLevel::IdOnly);
        assert!(message.content().is_none());
        assert_eq!(message.state(), &MessageState::IdOnly);
    }

    #[test]
    fn test_id_only_on_fresh_message_makes_no_call() {
        let client = MockClient::new();
        let mut message = Message::new("m1");

        let fetched =
            tokio_test::block_on(message.load(&client, "me", DetailLevel::IdOnly)).unwrap();
        assert!(!fetched);
        assert!(message.content().is_none());
    }

    #[tokio::test]
    async fn test_downgrade_between_loaded_levels_refetches() {
        let mut client = MockClient::new();
        client
            .expect_get_message()
            .with(eq("me"), eq("m1"), eq(DetailLevel::Full))
            .times(1)
            .returning(|_, id, _| Ok(content(id, "Full")));
        client
            .expect_get_message()
            .with(eq("me"), eq("m1"), eq(DetailLevel::Minimal))
            .times(1)
            .returning(|_, id, _| Ok(MessageContent {
                id: id.to_string(),
                ..Default::default()
            }));

        let mut message = Message::new("m1");
        message.load(&client, "me", DetailLevel::Full).await.unwrap();
        message.load(&client, "me", DetailLevel::Minimal).await.unwrap();

        assert_eq!(message.detail_level(), DetailLevel::Minimal);
        assert!(message.content().unwrap().headers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_state() {
        let mut client = MockClient::new();
        client
            .expect_get_message()
            .times(1)
            .returning(|_, id, _| Err(GmailError::MessageNotFound(id.to_string())));

        let mut message = Message::new("gone");
        let err = message
            .load(&client, "me", DetailLevel::Metadata)
            .await
            .unwrap_err();

        assert!(matches!(err, GmailError::MessageNotFound(_)));
        assert_eq!(message.detail_level(), DetailLevel::IdOnly);
    }

    #[tokio::test]
    async fn test_discard_trashes_by_id() {
        let mut client = MockClient::new();
        client
            .expect_trash_message()
            .with(eq("me"), eq("m7"))
            .times(1)
            .returning(|_, _| Ok(()));

        Message::new("m7").discard(&client, "me").await.unwrap();
    }
}
