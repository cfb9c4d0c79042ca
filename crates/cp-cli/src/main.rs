//! Chantier Planner command line
//!
//! Wires the file cache, the HTTP remote store and the sync engine, then
//! runs one subcommand.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cp_core::config::AppConfig;

mod cli;
mod commands;
mod export;

use cli::{Cli, Commands};
use commands::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.remote.base_url,
        cache = %config.cache.dir.display(),
        offline = cli.offline,
        "Starting Chantier Planner"
    );

    let app = App::from_config(config, cli.offline)?;
    match cli.command {
        Commands::List(args) => app.list(args.to_query()).await,
        Commands::Calendar { month } => app.calendar(month.as_deref()).await,
        Commands::Add(args) => app.add(args.into_draft()).await,
        Commands::Move { id, day } => app.move_job(&id, &day).await,
        Commands::Delete { id } => app.delete(&id).await,
        Commands::Sync => app.sync().await,
        Commands::SaveAll => app.save_all().await,
        Commands::Export { output } => app.export(&output).await,
        Commands::Watch => app.watch(shutdown_signal()).await,
    }
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cp_sync=debug,cp_store=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        }
    }
}
