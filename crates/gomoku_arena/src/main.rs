//! Gomoku Arena - server binary
//!
//! `serve` runs the HTTP server; `audit` replays a database and prints the
//! reconciliation report.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use gomoku_arena::{
    AppState, Arena, ArenaConfig, LedgerGateway, MemoryLedger, Repository, SessionStore, router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gomoku_arena=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ArenaConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            database_url,
        } => {
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if database_url.is_some() {
                config = config.with_database_url(database_url);
            }
            run_server(config).await
        }
        Command::Audit { database_url } => {
            if database_url.is_some() {
                config = config.with_database_url(database_url);
            }
            run_audit(config)
        }
    }
}

type Backends = (Arc<dyn LedgerGateway>, Option<Arc<dyn SessionStore>>);

/// Chooses the SQLite repository when a database is configured, else
/// in-memory state.
#[instrument(skip(config))]
fn backends(config: &ArenaConfig, migrate: bool) -> Result<Backends> {
    match config.database_url() {
        Some(url) => {
            let repo = Repository::new(url.clone());
            if migrate {
                repo.run_migrations().context("Failed to migrate database")?;
            }
            info!(database = %url, "Using SQLite persistence");
            let ledger: Arc<dyn LedgerGateway> = Arc::new(repo.clone());
            let store: Arc<dyn SessionStore> = Arc::new(repo);
            Ok((ledger, Some(store)))
        }
        None => {
            warn!("No database configured; accounts and sessions live in memory only");
            let ledger: Arc<dyn LedgerGateway> = Arc::new(MemoryLedger::new());
            Ok((ledger, None))
        }
    }
}

/// Run the HTTP server
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ArenaConfig) -> Result<()> {
    let (ledger, store) = backends(&config, true)?;
    let (arena, fan_out) = Arena::new(ledger, store, *config.rules());
    tokio::spawn(fan_out.run());

    let report = arena.restore(config.liveness_window())?;
    if !report.is_clean() {
        warn!(?report, "Restored sessions need attention");
    }

    let state = AppState::new(Arc::new(arena), *config.starting_balance());
    let app = router(state);

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Gomoku Arena listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Replay stored sessions and print the report as JSON
#[instrument(skip(config))]
fn run_audit(config: ArenaConfig) -> Result<()> {
    if config.database_url().is_none() {
        bail!("audit needs a database: pass --database-url or set database_url in the config");
    }
    let (ledger, store) = backends(&config, false)?;
    let (arena, _fan_out) = Arena::new(ledger, store, *config.rules());
    let report = arena.restore(config.liveness_window())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
