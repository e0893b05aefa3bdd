//! Agora - two-player debate server
//!
//! Players open a room on a topic, a second player joins with the room key,
//! both argue in alternating rounds, and the finished debate is scored.

use std::path::PathBuf;

use agora_core::AgoraConfig;
use agora_net::Server;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod state;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen host (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides server.port)
    #[arg(long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log: String,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Core(#[from] agora_core::Error),

    #[error(transparent)]
    Net(#[from] agora_net::Error),
}

fn load_config(args: &Args) -> agora_core::Result<AgoraConfig> {
    let mut config = match &args.config {
        Some(path) => AgoraConfig::load(path)?,
        None => AgoraConfig::default(),
    };
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(config)
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = load_config(&args)?;
    let app_state = state::AppState::new(config)?;

    let server = Server::start(app_state.bind_addr()?, app_state.service.clone()).await?;
    tracing::info!(addr = %server.addr(), "Agora is accepting debaters");

    tokio::signal::ctrl_c()
        .await
        .map_err(agora_core::Error::from)?;

    tracing::info!("Ctrl-C received, shutting down");
    server.shutdown();
    app_state.service.flush_records().await;
    tracing::info!("Pending debate records written");
    Ok(())
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Starting Agora");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(args)) {
        tracing::error!("Agora stopped: {}", e);
        std::process::exit(1);
    }
}
