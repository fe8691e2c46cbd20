//! Gmail Labels
//!
//! A convenience layer over the Gmail API for working with labels as a tree and
//! with the messages filed under them.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with token caching
//! - **Labels**: flat lookups by ID or full name, plus a hierarchy rebuilt from
//!   `/`-delimited names
//! - **Messages**: lazily fetched content at an explicit detail level
//! - **Cleanup**: trash messages and delete labels one at a time, continuing past
//!   individual failures
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_labels::{auth, client::ProductionGmailClient, config::Config, Account};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         &config.auth.credentials_path,
//!         &config.auth.token_cache_path,
//!     ).await?;
//!
//!     let client = ProductionGmailClient::new(hub);
//!     let account = Account::connect(Box::new(client), config.account_settings()).await?;
//!
//!     for (depth, label) in account.walk_hierarchy() {
//!         println!("{}{}", "  ".repeat(depth), label.short_name());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`account`] - Account aggregate: label indexes, tree and bulk operations
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`cli`] - Command-line interface
//! - [`client`] - Remote mail client trait and its Gmail implementation
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`hierarchy`] - Tree construction from `/`-delimited label names
//! - [`label`] - Label wrapper with its message list
//! - [`message`] - Message wrapper and detail-level transitions
//! - [`models`] - Core data structures

pub mod account;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod label;
pub mod message;
pub mod models;

pub use error::{ErrorKind, GmailError, Result};

pub use account::{Account, AccountSettings, LabelCount};
pub use client::{MailClient, ProductionGmailClient};
pub use hierarchy::{build_hierarchy, CollisionPolicy, Hierarchy, HierarchyOptions, OrphanPolicy};
pub use label::{Label, MessageList};
pub use message::{Message, MessageState};
pub use models::{BatchReport, DetailLevel, LabelInfo, MessageContent};
