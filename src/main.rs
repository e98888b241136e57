use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docstore_api::config::AppConfig;
use docstore_api::{router, AppState};

#[derive(Debug, Parser)]
#[command(name = "docstore-api", version, about = "Articles and users over a cached document store")]
struct Args {
    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Dotenv file to load before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load .env if present so cargo run picks up DATABASE_URL, REDIS_URL, etc.
    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting docstore-api in {:?} mode", config.environment);

    let port = config.server.port;
    let state = AppState::connect(config).await?;
    let app = router(state.clone());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
