//! Lattice Agent CLI Entry Point
//!
//! This is the main entry point for the Lattice Agent binary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lattice_agent::agent::intake::CommandIntake;
use lattice_agent::agent::queue::CommandQueue;
use lattice_agent::agent::registration::RegistrationState;
use lattice_agent::cli::config::Config;
use lattice_agent::connection::transport::WsTransport;
use lattice_agent::connection::websocket::WebSocketClient;
use lattice_agent::status::host::HostSnapshotSource;
use lattice_agent::status::reporter::StatusReporter;

#[derive(Parser)]
#[command(name = "lattice-agent")]
#[command(author, version, about = "Lattice Agent - Host-side cluster management agent")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent
    Start,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Start => {
            start_agent(&cli.config).await?;
        }
        Commands::Version => {
            show_version();
        }
    }

    Ok(())
}

async fn start_agent(config_path: &PathBuf) -> Result<()> {
    info!("Starting Lattice Agent...");

    let config = Config::load(config_path)?;
    info!(agent_id = %config.agent_id, "Configuration loaded");

    // Shared state between the connection, the intake and the reporter
    let queue = Arc::new(CommandQueue::new());
    let registration = RegistrationState::new();
    let transport = WsTransport::new();
    let intake = CommandIntake::new(queue.clone());

    // Stop signal shared by the reporter and the connection loop
    let (stop_tx, stop_rx) = watch::channel(false);

    // Spawn the status reporting task
    let reporter = StatusReporter::new(
        Duration::from_secs(config.reporting.host_status_interval_secs),
        stop_rx.clone(),
        registration.clone(),
        Arc::new(HostSnapshotSource::new()),
        Arc::new(transport.clone()),
    );
    let reporter_handle = tokio::spawn(reporter.run());

    // Run the controller connection until shutdown
    let ws_url = format!("{}/{}", config.controller.url, config.agent_id);
    let mut ws_client = WebSocketClient::new(
        &ws_url,
        &config.agent_id,
        config.controller.reconnect_interval_ms,
        registration,
        transport,
        intake,
        stop_rx,
    );

    tokio::select! {
        result = ws_client.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    // Signal the reporter (and a still-running connection) to stop
    let _ = stop_tx.send(true);
    reporter_handle.await?;

    info!("Lattice Agent stopped");
    Ok(())
}

fn show_version() {
    println!("lattice-agent {}", env!("CARGO_PKG_VERSION"));
    println!("Host-side coordination agent for Lattice cluster management");
    println!();
    println!("Features:");
    println!("  - Change-only host status reporting");
    println!("  - Command and cancellation intake");
    println!("  - Auto-reconnection to the controller");
}
