//! Relay server and CLI entry point.
//!
//! Binary name: `relayd`
//!
//! Parses CLI arguments, initializes the database and orchestrator, then
//! either starts the WebSocket/HTTP server (with the background expiry
//! sweeper) or runs a one-shot command.

mod cli;
mod http;
mod push;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use relay_core::sweeper::run_sweeper;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = cli::log_filter(cli.verbose, cli.quiet);
    relay_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Initialize application state (config, DB, provider, orchestrator)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            serve(state, host, port).await?;
        }

        Commands::Sweep => {
            cli::sweep(&state).await?;
        }

        Commands::Tenants => {
            cli::tenants(&state, cli.json)?;
        }
    }

    relay_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.host.clone());
    let port = port.unwrap_or(state.config.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Background expiry sweeper, cancelled on shutdown.
    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(run_sweeper(
        state.session_store(),
        Duration::from_secs(state.config.sweep_interval_secs),
        shutdown.clone(),
    ));

    println!(
        "  {} Relay listening on {}",
        console::style("⚡").bold(),
        console::style(format!("ws://{addr}/ws/chat")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    let _ = sweeper.await;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
