use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use supportdesk::config::validate_config;
use supportdesk::db::default_database_path;
use supportdesk::{load_config, Config, Database, SupportDesk};
use supportdesk_server::poller::spawn_poller;
use supportdesk_server::telemetry::init_tracing;
use supportdesk_server::{router, AppState};

/// Support inbox backend: mailbox ingestion, triage and reply drafting over
/// a REST API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON config file. Without one, defaults apply and mail fetching is off.
    #[arg(short, long, env = "SUPPORTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// SQLite file, overriding `database.path`.
    #[arg(long)]
    database: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    tracing::info!("Starting supportdesk v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            tracing::warn!("no config file given, using defaults");
            Config::default()
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    validate_config(&config)?;

    let db_path = cli
        .database
        .or_else(|| config.database.path.as_ref().map(PathBuf::from))
        .or_else(default_database_path)
        .context("no database path configured and no home directory found")?;
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let desk = SupportDesk::from_config(db, &config)?;

    if let Some(secs) = config.mail.as_ref().and_then(|m| m.poll_interval_secs) {
        spawn_poller(desk.clone(), Duration::from_secs(secs));
    }

    let app = router(AppState::new(desk), config.server.cors_origin.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(bind = %config.server.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
