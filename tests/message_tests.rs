//! Message listing, detail levels and fail-forward cleanup

mod common;

use std::sync::Arc;

use common::{finance_labels, FakeMailbox};
use gmail_labels::{Account, AccountSettings, DetailLevel, GmailError, Message};

async fn account_over(fake: &Arc<FakeMailbox>) -> Account {
    let mut account = Account::new(Box::new(Arc::clone(fake)), AccountSettings::default());
    account.load_labels().await.unwrap();
    account
}

#[tokio::test]
async fn test_listing_follows_every_page() {
    let fake = Arc::new(
        FakeMailbox::new(finance_labels())
            .with_messages("label:Taxes", &["m1", "m2", "m3", "m4", "m5"])
            .with_page_size(2),
    );
    let mut account = account_over(&fake).await;

    let count = account
        .load_label_messages("Label_4", DetailLevel::IdOnly)
        .await
        .unwrap();

    assert_eq!(count, 5);
    let ids: Vec<&str> = account
        .label_by_id("Label_4")
        .unwrap()
        .messages()
        .unwrap()
        .iter()
        .map(Message::id)
        .collect();
    assert_eq!(ids, vec!["m1", "m2", "m3", "m4", "m5"]);

    let calls = fake.calls();
    assert_eq!(calls.list_messages, 3);
    assert_eq!(calls.get_message, 0);
}

#[tokio::test]
async fn test_two_page_listing_at_metadata() {
    let fake = Arc::new(
        FakeMailbox::new(finance_labels())
            .with_messages("label:Offers", &["a", "b", "c"])
            .with_page_size(2),
    );
    let mut account = account_over(&fake).await;

    let count = account
        .load_label_messages("Label_5", DetailLevel::Metadata)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let calls = fake.calls();
    assert_eq!(calls.list_messages, 2);
    assert_eq!(calls.get_message, 3);

    let offers = account.label_by_name("offers").unwrap();
    let subjects: Vec<&str> = offers
        .messages()
        .unwrap()
        .iter()
        .filter_map(|m| m.content().and_then(|c| c.subject()))
        .collect();
    assert_eq!(subjects, vec!["Subject a", "Subject b", "Subject c"]);
}

#[tokio::test]
async fn test_same_level_load_makes_no_call() {
    let fake = Arc::new(FakeMailbox::new(finance_labels()));

    let mut message = Message::new("m1");
    message
        .load(fake.as_ref(), "me", DetailLevel::Full)
        .await
        .unwrap();
    message
        .load(fake.as_ref(), "me", DetailLevel::Full)
        .await
        .unwrap();
    assert_eq!(fake.calls().get_message, 1);
    assert_eq!(
        message.content().unwrap().body_text.as_deref(),
        Some("Body of m1")
    );

    message
        .load(fake.as_ref(), "me", DetailLevel::IdOnly)
        .await
        .unwrap();
    assert!(message.content().is_none());
    assert_eq!(fake.calls().get_message, 1);

    message
        .load(fake.as_ref(), "me", DetailLevel::Minimal)
        .await
        .unwrap();
    assert_eq!(fake.calls().get_message, 2);
    assert!(message.content().unwrap().headers.is_empty());
}

#[tokio::test]
async fn test_discard_continues_after_second_failure() {
    let fake = Arc::new(
        FakeMailbox::new(finance_labels())
            .with_messages("label:Offers", &["m1", "m2", "m3"])
            .failing_trash("m2"),
    );
    let mut account = account_over(&fake).await;

    account
        .load_label_messages("Label_5", DetailLevel::IdOnly)
        .await
        .unwrap();
    let report = account.discard_label_messages("Label_5").await.unwrap();

    assert_eq!(fake.calls().trash_message, 3);
    assert_eq!(report.succeeded, vec!["m1".to_string(), "m3".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "m2");
    assert!(matches!(
        report.failed[0].1,
        GmailError::ServerError { status: 500, .. }
    ));
    assert_eq!(fake.trashed(), vec!["m1".to_string(), "m3".to_string()]);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_discard_requires_loaded_messages() {
    let fake = Arc::new(FakeMailbox::new(finance_labels()));
    let account = account_over(&fake).await;

    let err = account.discard_label_messages("Label_5").await.unwrap_err();
    assert!(matches!(err, GmailError::MessagesNotLoaded(_)));
    assert_eq!(fake.calls().trash_message, 0);
}

#[tokio::test]
async fn test_discard_in_labels_then_relist_is_empty() {
    let fake = Arc::new(
        FakeMailbox::new(finance_labels())
            .with_messages("label:Taxes", &["t1", "t2"])
            .with_messages("label:Statements", &["s1"]),
    );
    let mut account = account_over(&fake).await;

    let report = account
        .discard_messages_in_labels(
            &["Finance/Taxes", "Finance/Missing", "Finance/Fidelity/Statements"],
            DetailLevel::Metadata,
        )
        .await;

    assert_eq!(report.succeeded, vec!["t1", "t2", "s1"]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, GmailError::LabelNotFound(_)));

    let count = account
        .load_label_messages("Label_4", DetailLevel::IdOnly)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_delete_labels_fail_forward_against_fake() {
    let fake = Arc::new(FakeMailbox::new(finance_labels()));
    let account = account_over(&fake).await;

    let report = account
        .delete_labels(&["Offers", "Nope", "finance/taxes"])
        .await;

    assert_eq!(report.succeeded, vec!["Offers", "finance/taxes"]);
    assert_eq!(report.failed[0].0, "Nope");
    assert_eq!(fake.calls().delete_label, 2);
    assert!(!fake.label_names().contains(&"Finance/Taxes".to_string()));
}

#[tokio::test]
async fn test_tree_counts_skip_system_labels() {
    let fake = Arc::new(
        FakeMailbox::new(finance_labels())
            .with_messages("label:Finance", &["f1", "f2"])
            .with_messages("label:Offers", &["o1"]),
    );
    let mut account = account_over(&fake).await;

    let counts = account.message_counts(&["INBOX", "TRASH"]).await;
    let rows: Vec<(usize, &str, usize)> = counts
        .iter()
        .map(|c| (c.depth, c.path.as_str(), *c.count.as_ref().unwrap()))
        .collect();

    assert_eq!(
        rows,
        vec![
            (0, "Finance", 2),
            (1, "Finance/Fidelity", 0),
            (2, "Finance/Fidelity/Statements", 0),
            (1, "Finance/Taxes", 0),
            (0, "Offers", 1),
        ]
    );
}
