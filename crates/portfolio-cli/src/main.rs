//! Portfolio CLI
//!
//! Command-line front end for the portfolio client.
//!
//! # Usage
//!
//! ```bash
//! # Is the backend there?
//! portfolio probe
//!
//! # Send (or save locally) a contact message
//! portfolio contact --name Ada --email ada@example.com --subject Hi --message "Nice work"
//!
//! # Inspect submissions saved while offline
//! portfolio offline list
//! ```

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use portfolio_client::{
    AnalyticsEvent, Availability, BestEffort, ClientConfig, ContactForm, FileStore,
    KeyValueStore, PortfolioClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use output::ExitCode;

/// How long `track --beacon` waits for the detached send before exiting
const BEACON_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "portfolio")]
#[command(about = "Portfolio backend client with offline fallback")]
#[command(version)]
struct Cli {
    /// Config file (TOML, YAML or JSON). Overrides PORTFOLIO_* variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin
    #[arg(long, global = true, env = "PORTFOLIO_BASE_URL")]
    base_url: Option<String>,

    /// Directory for offline submissions
    #[arg(long, global = true, env = "PORTFOLIO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Availability probe timeout in milliseconds
    #[arg(long, global = true)]
    probe_timeout_ms: Option<u64>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe the backend and report the mode
    Probe,

    /// Backend health status
    Health,

    /// Submit a contact message, saving it locally when offline
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },

    /// Fetch portfolio content
    Portfolio,

    /// Record a page visit: probe, then report a page view when online
    Visit {
        #[arg(long, default_value = "/")]
        page: String,
    },

    /// Send one analytics event
    Track {
        #[arg(long)]
        page: String,
        #[arg(long)]
        action: String,
        /// Seconds spent, for time_spent events
        #[arg(long, default_value_t = 0)]
        duration: u64,
        /// Send fire-and-forget instead of waiting for the response
        #[arg(long)]
        beacon: bool,
    },

    /// Manage submissions saved while offline
    Offline {
        #[command(subcommand)]
        command: OfflineCommands,
    },
}

#[derive(Subcommand, Debug)]
enum OfflineCommands {
    /// List stored submissions
    List,
    /// Delete all stored submissions
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = load_config(&cli)?;
    let exit_code = run(cli, config).await?;
    std::process::exit(exit_code.into());
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(timeout) = cli.probe_timeout_ms {
        config.probe_timeout_ms = timeout;
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<ExitCode> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir.clone()));
    let json = cli.json;

    let code = match cli.command {
        // Listing and clearing the local log never needs the backend
        Commands::Offline { command } => {
            let client = PortfolioClient::new(&config, Availability::offline(), store)?;
            let log = client.submissions();
            match command {
                OfflineCommands::List => match log.entries() {
                    Ok(entries) => {
                        output::print_submissions(json, &entries)?;
                        ExitCode::Success
                    }
                    Err(e) => fail(json, &e),
                },
                OfflineCommands::Clear => match log.clear() {
                    Ok(removed) => {
                        output::print_value(json, "removed", &serde_json::json!(removed))?;
                        ExitCode::Success
                    }
                    Err(e) => fail(json, &e),
                },
            }
        }
        Commands::Visit { page } => {
            let client = PortfolioClient::start(&config, store, &page).await?;
            output::print_mode(json, client.api_base(), client.is_enabled())?;
            ExitCode::Success
        }
        Commands::Probe => {
            let client = connect(&config, store).await?;
            output::print_mode(json, client.api_base(), client.is_enabled())?;
            if client.is_enabled() {
                ExitCode::Success
            } else {
                ExitCode::Offline
            }
        }
        Commands::Health => {
            let client = connect(&config, store).await?;
            match client.health_check().await {
                Ok(outcome) => {
                    output::print_value(json, "health", &outcome.into_value())?;
                    ExitCode::Success
                }
                Err(e) => fail(json, &e),
            }
        }
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let client = connect(&config, store).await?;
            let form = ContactForm::new(name, email, subject, message);
            match client.submit_contact(&form).await {
                Ok(receipt) => {
                    let label = if receipt.is_saved_offline() {
                        "no backend detected, your message was saved locally"
                    } else {
                        "message sent"
                    };
                    output::print_value(json, label, &receipt.into_value())?;
                    ExitCode::Success
                }
                Err(e) => fail(json, &e),
            }
        }
        Commands::Portfolio => {
            let client = connect(&config, store).await?;
            match client.get_portfolio_data().await {
                Ok(outcome) => {
                    output::print_value(json, "portfolio", &outcome.into_value())?;
                    ExitCode::Success
                }
                Err(e) => fail(json, &e),
            }
        }
        Commands::Track {
            page,
            action,
            duration,
            beacon,
        } => {
            let client = connect(&config, store).await?;
            let event = AnalyticsEvent::new(page, action).with_duration(duration);
            if beacon {
                if let Some(handle) = client.beacon().send(event) {
                    let _ = tokio::time::timeout(BEACON_GRACE, handle).await;
                }
            } else {
                match BestEffort::from_result("analytics", client.track_event(&event).await) {
                    BestEffort::Delivered(body) => {
                        output::print_value(json, "tracked", &body)?;
                    }
                    BestEffort::Offline => {
                        output::print_value(json, "tracked", &serde_json::json!({"status": "offline"}))?;
                    }
                    // Analytics failures are not the user's problem
                    BestEffort::Dropped(_) => {}
                }
            }
            ExitCode::Success
        }
    };

    Ok(code)
}

/// Probe the backend and build a client for whichever mode it is in
async fn connect(
    config: &ClientConfig,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<PortfolioClient> {
    let client = PortfolioClient::connect(config, store).await?;
    tracing::debug!(mode = client.availability().mode(), "client ready");
    Ok(client)
}

fn fail(json: bool, err: &portfolio_client::ClientError) -> ExitCode {
    output::print_error(json, err);
    ExitCode::from_error(err)
}
