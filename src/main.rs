use anyhow::Result;
use clap::Parser;
use gmail_labels::cli::{self, Cli, Commands, ProgressReporter};
use gmail_labels::client::{MailClient, ProductionGmailClient};
use gmail_labels::config::Config;
use indicatif::MultiProgress;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress to avoid progress bar conflicts
#[derive(Clone)]
struct MultiProgressWriter {
    multi: Arc<MultiProgress>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log buffer poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log buffer poisoned"))?;
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                let _ = self.multi.println(msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: Arc<MultiProgress>,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(Arc::clone(&self.multi))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: gmail-labels --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in rustls; pick the provider explicitly.
    // aws-lc-rs everywhere except Windows, where ring avoids the NASM/CMake toolchain.
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_labels=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gmail_labels=info,warn"))
    };

    let multi_progress = Arc::new(MultiProgress::new());
    let make_writer = MultiProgressMakeWriter {
        multi: Arc::clone(&multi_progress),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let reporter = ProgressReporter::with_multi((*multi_progress).clone());

    if let Commands::InitConfig { output, force } = &cli.command {
        cli::init_config(output, *force).await?;
        println!("Created example configuration at {:?}", output);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;

    match &cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");
            let token_cache = cli.token_cache_path(&config);

            if let Some(parent) = token_cache.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if *force && token_cache.exists() {
                tokio::fs::remove_file(&token_cache).await?;
                tracing::info!("Removed existing token cache");
            }

            let hub = gmail_labels::auth::initialize_gmail_hub(
                &cli.credentials_path(&config),
                &token_cache,
            )
            .await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", token_cache);

            let client = ProductionGmailClient::new(hub);
            let profile = client.get_profile(&config.account.user_id).await?;
            println!("Connected to account: {}", profile.email_address);
        }

        Commands::Labels => {
            let account = cli::connect_account(&cli, &config).await?;
            print!("{}", cli::render_labels(&account));
        }

        Commands::Tree { counts } => {
            let mut account = cli::connect_account(&cli, &config).await?;
            cli::print_tree(&mut account, &config, *counts, &reporter).await?;
        }

        Commands::Messages { label, detail } => {
            let mut account = cli::connect_account(&cli, &config).await?;
            let level = detail.unwrap_or(config.messages.detail);
            cli::show_messages(&mut account, label, level, &reporter).await?;
        }

        Commands::DeleteLabel { label } => {
            let account = cli::connect_account(&cli, &config).await?;
            cli::delete_label(&account, label).await?;
        }

        Commands::DeleteLabels { file } => {
            let paths = cli::read_label_file(file).await?;
            let account = cli::connect_account(&cli, &config).await?;
            let report = cli::delete_labels(&account, &paths, &reporter).await;
            print!("{}", cli::render_report("Delete labels", &report));
        }

        Commands::Discard { label } => {
            let mut account = cli::connect_account(&cli, &config).await?;
            let report =
                cli::discard_label(&mut account, label, config.messages.detail, &reporter).await?;
            print!("{}", cli::render_report("Discard", &report));
        }

        Commands::DiscardLabels { file } => {
            let paths = cli::read_label_file(file).await?;
            let mut account = cli::connect_account(&cli, &config).await?;
            let report =
                cli::discard_labels(&mut account, &paths, config.messages.detail, &reporter).await;
            print!("{}", cli::render_report("Discard", &report));
        }

        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
