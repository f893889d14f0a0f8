//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! The whole process lifetime is one stateful session.

use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes or `shutdown` fires.
    pub async fn run(server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let session = server.sessions().attach("stdio");
        let service = server
            .for_session(session.clone())
            .serve_with_ct(rmcp::transport::stdio(), shutdown.child_token())
            .await
            .map_err(|e| TransportError::init(e.to_string()));

        let outcome = match service {
            Ok(service) => service
                .waiting()
                .await
                .map(|reason| info!("STDIO service ended: {:?}", reason))
                .map_err(|e| TransportError::ServiceError(e.to_string())),
            Err(e) => Err(e),
        };

        let report = server.sessions().detach(&session).await;
        info!(
            in_flight = report.in_flight,
            abandoned = report.abandoned,
            "STDIO transport finished"
        );
        outcome
    }
}
