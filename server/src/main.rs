//! Listkeeper Server - Main entry point.
//!
//! This binary starts the Listkeeper HTTP server with:
//! - Structured JSON logging
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//! - Background sweeping of expired sessions
//!
//! # Configuration
//!
//! See [`listkeeper_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! PORT=3000 LISTKEEPER_SESSION_TTL_SECS=3600 cargo run --bin listkeeper-server
//! ```

use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use listkeeper_server::config::Config;
use listkeeper_server::error::{Result, ServerError};
use listkeeper_server::routes::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => {
            info!("Server shutdown complete");
            ExitCode::SUCCESS
        }
        Err(ServerError::Config(err)) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  PORT                              - HTTP server port (default: 8080)");
            eprintln!("  LISTKEEPER_SESSION_TTL_SECS       - Session idle timeout (default: 86400)");
            eprintln!("  LISTKEEPER_MAX_SESSIONS           - Maximum live sessions (default: 10000)");
            eprintln!("  LISTKEEPER_CLEANUP_INTERVAL_SECS  - Expired session sweep interval (default: 60)");
            eprintln!("  RUST_LOG                          - Log level filter (default: info)");
            ExitCode::from(1)
        }
        Err(err) => {
            error!(error = %err, "Server error");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, binds the listener and serves until a shutdown
/// signal arrives.
async fn run() -> Result<()> {
    let config = Config::from_env()?;

    info!(
        port = config.port,
        session_ttl_secs = config.session_ttl.as_secs(),
        max_sessions = config.max_sessions,
        "Listkeeper server starting"
    );

    let state = AppState::new(config.clone());

    let cleanup_handle = state.sessions.spawn_cleanup_task(config.cleanup_interval);
    info!(
        interval_secs = config.cleanup_interval.as_secs(),
        "Session cleanup task started"
    );

    let app = create_router(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(port = config.port, address = %bind_addr, "Server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cleanup_handle.abort();
    info!("Session cleanup task stopped");

    served?;
    Ok(())
}

/// Initialize structured logging with tracing.
///
/// JSON output, filtered by `RUST_LOG` with a default of `info` for our
/// crates and `debug` for request traces.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,axum::rejection=trace"));

    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();
}

/// Resolves when SIGINT (Ctrl+C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
