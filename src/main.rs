//! cloud-checkin - daily multi-account cloud storage check-in
//!
//! Logs every configured account in, performs the personal and family
//! check-ins, reports the storage gained and pushes the report to every
//! configured notification channel.
//!
//! Exit codes:
//!   0 - Run completed (individual accounts or channels may have failed)
//!   1 - Configuration error, or the run was aborted by a timeout

mod cli;
mod config;
mod models;
mod push;
mod report;
mod runner;
mod session;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use models::Role;
use push::Notifier;
use report::{DeltaReporter, ReportDocument, ReportLog};
use runner::AccountOrchestrator;
use session::{CloudConnector, Connector, SessionError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("cloud-checkin v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .cloud-checkin.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Add your accounts, the login endpoint and push credentials.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the check-in, then report and notify.
///
/// The notification is sent even when a timeout aborted the account loop;
/// the timeout is returned afterwards.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let notifier = Notifier::from_config(
        &config.push,
        Duration::from_secs(config.service.timeout_seconds),
    )?;

    if args.dry_run {
        handle_dry_run(&config, &notifier);
        return Ok(());
    }

    if config.accounts.is_empty() {
        warn!("No accounts configured");
    }

    let connector = CloudConnector::new(config.service.clone())?;

    let mut log = ReportLog::new();
    let aborted = run_checkin(&config, &connector, &mut log).await;

    let document = ReportDocument::assemble(&mut log);
    debug!("Report has {} lines", document.lines().len());
    let summary = notifier.notify(&document.title(), &document.body()).await;
    debug!(
        "Pushed to {} channel(s), {} failed",
        summary.attempted, summary.failed
    );

    info!("Done in {:.1}s", start_time.elapsed().as_secs_f64());

    match aborted {
        Some(e) => Err(e).context("Run aborted after a timeout"),
        None => Ok(()),
    }
}

/// Account loop followed by both capacity passes, all written to `log`.
///
/// Returns the timeout that stopped the account loop, if any.
async fn run_checkin(
    config: &Config,
    connector: &dyn Connector,
    log: &mut ReportLog,
) -> Option<SessionError> {
    let orchestrator =
        AccountOrchestrator::new(connector, config.tasks.clone(), config.families.clone());
    let outcome = orchestrator.run(&config.accounts, log).await;

    DeltaReporter::new(config.tasks.account_person)
        .report(&outcome.records, log)
        .await;

    outcome.aborted
}

/// Handle --dry-run: print what would be done, without any request.
fn handle_dry_run(config: &Config, notifier: &Notifier) {
    println!("\n🔍 Dry run: no request will be made.\n");

    let accounts: Vec<_> = config
        .accounts
        .iter()
        .enumerate()
        .filter(|(_, account)| account.is_complete())
        .collect();

    if accounts.is_empty() {
        println!("   No complete account configured.");
    } else {
        for (index, account) in accounts {
            let role = Role::of(index, config.tasks.account_person);
            println!("   {}. {} ({})", index + 1, account.masked_name(), role);
        }
    }

    println!(
        "\n   Family sign-ins per non-primary account: {}",
        config.tasks.exec_threshold
    );
    if !config.families.is_empty() {
        println!("   Family filter: {}", config.families.join(", "));
    }

    let channels = notifier.enabled_channels();
    if channels.is_empty() {
        println!("   Push channels: none");
    } else {
        println!("   Push channels: {}", channels.join(", "));
    }

    println!("\n✅ Dry run complete.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
