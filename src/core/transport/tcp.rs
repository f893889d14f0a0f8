//! TCP transport implementation.
//!
//! Raw TCP socket transport with JSON-RPC messages (line-delimited). Each
//! accepted connection is its own stateful session.

use rmcp::ServiceExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the TCP transport until `shutdown` fires.
    pub async fn run(self, server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        let connections = TaskTracker::new();

        // Accept multiple connections in a loop
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer_addr)) => {
                    info!("Accepted connection from {}", peer_addr);

                    // Set TCP_NODELAY to disable Nagle's algorithm
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }

                    connections.spawn(Self::handle_connection(
                        server.clone(),
                        stream,
                        peer_addr,
                        shutdown.child_token(),
                    ));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    // Small delay to avoid spinning on persistent errors
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }

        connections.close();
        connections.wait().await;
        info!("TCP transport stopped");
        Ok(())
    }

    /// Handle a single TCP connection.
    async fn handle_connection(
        server: McpServer,
        stream: tokio::net::TcpStream,
        peer_addr: std::net::SocketAddr,
        ct: CancellationToken,
    ) {
        let session = server.sessions().attach("tcp");

        // Initialize the MCP service for this connection
        match server.for_session(session.clone()).serve_with_ct(stream, ct).await {
            Ok(service) => {
                info!("Client {} connected, serving...", peer_addr);
                if let Err(e) = service.waiting().await {
                    warn!("Error while serving client {}: {}", peer_addr, e);
                } else {
                    info!("Client {} disconnected cleanly", peer_addr);
                }
            }
            Err(e) => {
                warn!("Failed to initialize service for {}: {}", peer_addr, e);
            }
        }

        let report = server.sessions().detach(&session).await;
        if report.abandoned > 0 {
            warn!(
                "Client {} left {} call(s) running past the grace period",
                peer_addr, report.abandoned
            );
        }
    }
}
