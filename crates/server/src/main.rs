mod api;
mod router;
mod state;
mod store;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// How long shutdown waits for the ingestion backlog to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// cinedb: movie catalog API with queued bulk ingestion.
#[derive(Parser, Debug)]
#[command(name = "cinedb-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Print the effective configuration as JSON.
    Config,
}

fn load_config() -> cinedb_core::Config {
    cinedb_core::config::load_dotenv();
    cinedb_core::Config::from_env()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn serve(config: &cinedb_core::Config) -> anyhow::Result<()> {
    config.log_summary();

    let state = Arc::new(AppState::new(config.ingest.clone()));
    let app = router::build_router(state.clone(), &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Queued records are memory-only; give the worker a chance to finish them.
    let (pending, _) = state.movie_queue.activity();
    if pending > 0 {
        info!(pending, "Draining ingestion queue before exit");
    }
    if tokio::time::timeout(DRAIN_TIMEOUT, state.movie_queue.wait_idle())
        .await
        .is_err()
    {
        warn!(
            pending = state.movie_queue.activity().0,
            "Ingestion queue did not drain in time, remaining records are lost"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = load_config();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await?,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
        }
    }

    Ok(())
}
