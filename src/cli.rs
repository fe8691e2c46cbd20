//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::account::{Account, LabelCount};
use crate::auth;
use crate::client::ProductionGmailClient;
use crate::config::Config;
use crate::error::{GmailError, Result};
use crate::models::{BatchReport, DetailLevel};

#[derive(Parser, Debug)]
#[command(name = "gmail-labels")]
#[command(version = "0.1.0")]
#[command(about = "Browse and clean up Gmail labels and their messages", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file (overrides auth.credentials_path)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Path to token cache file (overrides auth.token_cache_path)
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// List every label as `id  name`
    Labels,

    /// Print the label hierarchy
    Tree {
        /// Load each label's message list and print its size
        #[arg(long)]
        counts: bool,
    },

    /// Print the messages under a label, one JSON record each
    Messages {
        /// Full label name, e.g. Finance/Fidelity
        label: String,

        /// id_only, minimal, metadata or full (defaults to messages.detail)
        #[arg(short, long)]
        detail: Option<DetailLevel>,
    },

    /// Delete a single label
    DeleteLabel {
        /// Full label name
        label: String,
    },

    /// Delete every label listed in a file, one name per line
    DeleteLabels {
        file: PathBuf,
    },

    /// Move every message under a label to the trash
    Discard {
        /// Full label name
        label: String,
    },

    /// Move the messages of every label listed in a file to the trash
    DiscardLabels {
        file: PathBuf,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn credentials_path(&self, config: &Config) -> PathBuf {
        self.credentials
            .clone()
            .unwrap_or_else(|| config.auth.credentials_path.clone())
    }

    pub fn token_cache_path(&self, config: &Config) -> PathBuf {
        self.token_cache
            .clone()
            .unwrap_or_else(|| config.auth.token_cache_path.clone())
    }
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Draw through an existing `MultiProgress`, e.g. one shared with the log writer
    pub fn with_multi(multi: MultiProgress) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar_style = ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        Self {
            multi,
            spinner_style,
            bar_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn add_progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(self.bar_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        println!("  ✓ {}", msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Authenticate and connect to the account the config points at
pub async fn connect_account(cli: &Cli, config: &Config) -> Result<Account> {
    let hub =
        auth::initialize_gmail_hub(&cli.credentials_path(config), &cli.token_cache_path(config))
            .await?;
    let client = ProductionGmailClient::new(hub);
    let mut account = Account::connect(Box::new(client), config.account_settings()).await?;
    // Every command resolves labels, even when eager loading is turned off
    account.ensure_labels_loaded().await?;
    Ok(account)
}

/// Label names from a file: one per line, blank lines and `#` comments ignored
pub async fn read_label_file(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Flat `id  name` listing, in remote order
pub fn render_labels(account: &Account) -> String {
    let width = account
        .all_labels()
        .iter()
        .map(|l| l.id().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for label in account.all_labels() {
        let _ = writeln!(out, "{:<width$}  {}", label.id(), label.path(), width = width);
    }
    out
}

/// Indented tree of short names, two spaces per level
pub fn render_tree(account: &Account) -> String {
    let mut out = String::new();
    for (depth, label) in account.walk_hierarchy() {
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), label.short_name());
    }
    out
}

/// Indented tree with message counts; failed counts are shown as `?`
pub fn render_counts(counts: &[LabelCount]) -> String {
    let mut out = String::new();
    for row in counts {
        let name = crate::hierarchy::short_name(&row.path);
        let indent = "  ".repeat(row.depth);
        match &row.count {
            Ok(n) => {
                let _ = writeln!(out, "{}{} ({})", indent, name, n);
            }
            Err(e) => {
                let _ = writeln!(out, "{}{} (? {})", indent, name, e);
            }
        }
    }
    out
}

pub async fn print_tree(
    account: &mut Account,
    config: &Config,
    counts: bool,
    reporter: &ProgressReporter,
) -> Result<()> {
    if !counts {
        print!("{}", render_tree(account));
        return Ok(());
    }

    let spinner = reporter.add_spinner("Counting messages per label...");
    let rows = account.message_counts(&config.labels.skip).await;
    reporter.finish_spinner(&spinner, &format!("Counted {} labels", rows.len()));

    print!("{}", render_counts(&rows));
    Ok(())
}

/// Print one JSON record per message under `path`
pub async fn show_messages(
    account: &mut Account,
    path: &str,
    level: DetailLevel,
    reporter: &ProgressReporter,
) -> Result<()> {
    let label_id = resolve_label(account, path)?;

    let spinner = reporter.add_spinner(&format!("Loading messages for {}...", path));
    let count = account.load_label_messages(&label_id, level).await?;
    reporter.finish_spinner(&spinner, &format!("Loaded {} messages", count));

    let label = account
        .label_by_id(&label_id)
        .ok_or_else(|| GmailError::LabelNotFound(label_id.clone()))?;
    for message in label.messages().unwrap_or_default() {
        match message.content() {
            Some(content) => println!("{}", serde_json::to_string(content)?),
            None => println!("{}", serde_json::json!({ "id": message.id() })),
        }
    }
    Ok(())
}

/// Delete one label by name. Errors propagate.
pub async fn delete_label(account: &Account, path: &str) -> Result<()> {
    let label_id = resolve_label(account, path)?;
    account.delete_label(&label_id).await?;
    println!("Deleted label {}", path);
    Ok(())
}

/// Delete each listed label, continuing past failures
pub async fn delete_labels(
    account: &Account,
    paths: &[String],
    reporter: &ProgressReporter,
) -> BatchReport {
    let pb = reporter.add_progress_bar(paths.len() as u64, "Deleting labels");

    let mut report = BatchReport::new();
    for path in paths {
        pb.set_message(path.clone());
        report.merge(account.delete_labels(std::slice::from_ref(path)).await);
        pb.inc(1);
    }
    pb.finish_and_clear();

    report
}

/// Trash every message under one label.
///
/// A missing label or a failed listing is returned as an error; individual trash
/// calls are fail-forward and end up in the report.
pub async fn discard_label(
    account: &mut Account,
    path: &str,
    level: DetailLevel,
    reporter: &ProgressReporter,
) -> Result<BatchReport> {
    let label_id = resolve_label(account, path)?;

    let spinner = reporter.add_spinner(&format!("Loading messages for {}...", path));
    let count = account
        .load_label_messages(&label_id, DetailLevel::IdOnly)
        .await?;
    account.load_message_contents(&label_id, level).await?;
    reporter.finish_spinner(&spinner, &format!("Discarding {} in label {}", count, path));

    account.discard_label_messages(&label_id).await
}

/// Trash the messages of each listed label, continuing past failures
pub async fn discard_labels(
    account: &mut Account,
    paths: &[String],
    level: DetailLevel,
    reporter: &ProgressReporter,
) -> BatchReport {
    let pb = reporter.add_progress_bar(paths.len() as u64, "Discarding messages");

    let mut report = BatchReport::new();
    for path in paths {
        pb.set_message(path.clone());
        report.merge(
            account
                .discard_messages_in_labels(std::slice::from_ref(path), level)
                .await,
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    report
}

/// Summary of a bulk run, one line per failure
pub fn render_report(action: &str, report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} succeeded, {} failed",
        action,
        report.succeeded.len(),
        report.failed.len()
    );
    for (item, e) in &report.failed {
        let _ = writeln!(out, "  ✗ {}: {}", item, e);
    }
    out
}

fn resolve_label(account: &Account, path: &str) -> Result<String> {
    account
        .label_by_name(path)
        .map(|l| l.id().to_string())
        .ok_or_else(|| GmailError::LabelNotFound(path.to_string()))
}

/// Write an example config unless one exists (or `force` is set)
pub async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(GmailError::ConfigError(format!(
            "{:?} already exists, use --force to overwrite",
            output
        )));
    }
    Config::create_example(output).await?;
    info!("Wrote example configuration to {:?}", output);
    Ok(())
}
