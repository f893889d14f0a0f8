//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration and the food dataset, and runs
//! the configured transport until it ends or Ctrl-C is received.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use food_mcp_server::core::{Config, McpServer, TransportService};
use food_mcp_server::domains::store::{DocumentStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let store = load_store(&config).await?;

    // Create the MCP server
    let server = McpServer::new(config.clone(), store)?;
    let sessions = server.sessions().clone();
    let shutdown = sessions.shutdown_token();
    let reaper = sessions.spawn_reaper();

    info!("Server initialized");

    // Ctrl-C drains every session for the grace period, then fires the
    // shutdown token that stops the transport.
    let signalled = sessions.shutdown_on(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, draining sessions"),
            Err(e) => {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    let outcome = transport.run(server, shutdown).await;

    info!("Server shutting down");
    let mut report = sessions.shutdown().await;
    if signalled.is_finished() {
        if let Ok(drained) = signalled.await {
            report.in_flight += drained.in_flight;
            report.abandoned += drained.abandoned;
        }
    } else {
        signalled.abort();
    }
    if report.abandoned > 0 {
        warn!("{} in-flight call(s) abandoned at shutdown", report.abandoned);
    }
    reaper.await.ok();

    outcome?;
    Ok(())
}

/// Load the dataset from `MCP_DATA_PATH`, or the bundled sample.
async fn load_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    let store = match &config.data.path {
        Some(path) => MemoryStore::from_path(path)
            .await
            .with_context(|| format!("loading food data from {}", path.display()))?,
        None => {
            info!("MCP_DATA_PATH not set - using the bundled sample dataset");
            MemoryStore::sample().context("loading the bundled sample dataset")?
        }
    };
    Ok(Arc::new(store))
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the stdio transport.
fn init_logging(logging: &food_mcp_server::core::config::LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
