//! Noughts - unified CLI
//!
//! Runs the match server or maintains its database.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use noughts_server::{
    AppState, Collaborators, DbPersister, GameLogWriter, GameRepository, LogNotifier, Notifier,
    Persister, QuoteClient, ServerConfig, Session, SmtpNotifier, router, spawn_finish_worker,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    let config = ServerConfig::load(&cli.config)?;

    match cli.command {
        Command::Serve {
            port,
            host,
            db_path,
        } => {
            let mut config = config;
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(db_path) = db_path {
                config = config.with_db_path(db_path);
            }
            run_server(config).await
        }
        Command::Migrate { db_path } => {
            open_repository(&config, db_path)?;
            info!("Database is up to date");
            Ok(())
        }
        Command::Stats { db_path } => {
            let repository = open_repository(&config, db_path)?;
            let stats = tokio::task::spawn_blocking(move || repository.stats()).await??;
            println!(
                "games: {}  X wins: {}  O wins: {}  draws: {}  completed: {}",
                stats.total(),
                stats.x_wins(),
                stats.o_wins(),
                stats.draws(),
                stats.completed()
            );
            Ok(())
        }
    }
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,noughts_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Opens the repository and brings its schema up to date.
#[instrument(skip(config))]
fn open_repository(config: &ServerConfig, db_path: Option<String>) -> Result<GameRepository> {
    let db_path = db_path.unwrap_or_else(|| config.db_path().clone());
    let repository = GameRepository::new(db_path)?;
    repository.run_migrations()?;
    Ok(repository)
}

/// Picks SMTP delivery when configured, logging otherwise.
#[instrument(skip(config))]
fn build_notifier(config: &ServerConfig) -> Arc<dyn Notifier> {
    match config.smtp() {
        Some(smtp) => match SmtpNotifier::from_config(smtp) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!(error = %e, "SMTP misconfigured, falling back to log notifier");
                Arc::new(LogNotifier)
            }
        },
        None => {
            info!("No SMTP section, results will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

/// Run the HTTP game server
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let repository = open_repository(&config, None)?;

    let persisters: Vec<Arc<dyn Persister>> = vec![
        Arc::new(DbPersister::new(repository.clone())),
        Arc::new(GameLogWriter::new(config.game_log_dir().clone())),
    ];
    let collaborators = Collaborators::new(build_notifier(&config), persisters);
    let (sink, worker) = spawn_finish_worker(collaborators);

    let session = Arc::new(Session::new(sink));
    let quotes = QuoteClient::new(config.quote_url().clone())?;
    let app = router(AppState::new(session, repository, quotes));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    // The router (and with it the session's sender) is gone, so the worker drains and stops.
    worker.await?;
    info!("Server stopped");
    Ok(())
}
