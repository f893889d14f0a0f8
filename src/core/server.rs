//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] is the single entry point every transport hands tool
//! traffic to. It owns the frozen tool tables (through the [`Dispatcher`]),
//! the document store and the session table.
//!
//! **Adding a new tool does NOT require modifying this file!** Tools are
//! registered in `domains/tools/catalog.rs`.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::session::{Session, SessionError, SessionManager, negotiate_version};
use crate::domains::store::DocumentStore;
use crate::domains::tools::{
    CorrelationId, Dispatcher, FailureKind, InvocationRequest, ResponseEnvelope, ToolFailure,
    build_tool_catalog,
};

/// The main MCP server handler.
///
/// Cheap to clone. Connection-oriented transports give each connection its
/// own clone bound to a session via [`McpServer::for_session`].
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Routes validated calls to the tool handlers.
    dispatcher: Dispatcher,

    /// Backing document store, kept for health checks.
    store: Arc<dyn DocumentStore>,

    /// Every live session.
    sessions: Arc<SessionManager>,

    /// Session this clone serves, if bound to one connection.
    session: Option<Arc<Session>>,
}

impl McpServer {
    /// Create a new MCP server over `store`.
    ///
    /// Builds and freezes the tool tables; fails if two tools share a name.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let config = Arc::new(config);

        let (registry, handlers) = build_tool_catalog(store.clone())?.into_shared();
        let dispatcher = Dispatcher::new(registry, handlers, config.dispatch.tool_timeout);
        let sessions = Arc::new(SessionManager::new(config.session.clone()));

        Ok(Self {
            config,
            dispatcher,
            store,
            sessions,
            session: None,
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// A clone of this server that serves `session`.
    pub fn for_session(&self, session: Arc<Session>) -> Self {
        Self {
            session: Some(session),
            ..self.clone()
        }
    }

    /// Health summary: store reachability and session count.
    pub async fn health(&self) -> (bool, Value) {
        let (healthy, store) = match self.store.ping().await {
            Ok(()) => (true, json!("ok")),
            Err(err) => {
                warn!("Health check failed: {}", err);
                (false, json!(err.to_string()))
            }
        };
        let body = json!({
            "status": if healthy { "ok" } else { "degraded" },
            "server": self.name(),
            "version": self.version(),
            "store": store,
            "active_sessions": self.sessions.active_count(),
            "tools": self.dispatcher.registry().len(),
        });
        (healthy, body)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Run one tool call on `session`.
    ///
    /// `None` means the call was abandoned (session closing or cancelled).
    pub async fn invoke(
        &self,
        session: &Session,
        request: InvocationRequest,
    ) -> Option<ResponseEnvelope> {
        session.dispatch(&self.dispatcher, request).await
    }

    /// Answer one `tools/call` arriving through rmcp.
    ///
    /// Runs on the bound session, or a fresh ephemeral one when unbound.
    /// Unlike [`invoke`](Self::invoke) there is always an answer: a call
    /// dropped because the session is no longer open reports
    /// `SessionExpired`, and one cancelled by the client reports `Cancelled`.
    pub async fn call(
        &self,
        request: InvocationRequest,
        client_cancel: &CancellationToken,
    ) -> ResponseEnvelope {
        let session = match &self.session {
            Some(session) => session.clone(),
            None => self.sessions.ephemeral("rmcp"),
        };
        let id = request.id.clone();

        let envelope = tokio::select! {
            biased;
            _ = client_cancel.cancelled() => {
                info!("Tool call cancelled by client");
                None
            }
            envelope = self.invoke(&session, request) => envelope,
        };

        envelope.unwrap_or_else(|| {
            let failure = if session.is_open() {
                ToolFailure::new(FailureKind::Cancelled, "Tool call was cancelled")
            } else {
                let session_id = session.id().unwrap_or("ephemeral").to_string();
                debug!(session = %session_id, phase = ?session.phase(), "Call on a session that is no longer open");
                SessionError::SessionExpired(session_id).to_failure()
            };
            ResponseEnvelope::failed(id, failure)
        })
    }

    fn instructions() -> String {
        "Food taxonomy and nutrition lookups. Browse categories, subcategories and \
         items, search by keyword, locate an item in the hierarchy, and fetch \
         nutrition records by name."
            .to_string()
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(Self::instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip_all)]
    async fn initialize(
        &self,
        request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<InitializeResult, McpError> {
        let requested = serde_json::to_value(&request.protocol_version).ok();
        let requested = requested.as_ref().and_then(Value::as_str);

        let version = negotiate_version(requested).map_err(|err| {
            warn!("Rejecting initialize: {}", err);
            if let Some(session) = &self.session {
                session.reject();
            }
            McpError::invalid_params(err.to_string(), Some(err.to_failure().to_value()))
        })?;

        if let Some(session) = &self.session {
            let capabilities = serde_json::to_value(&request.capabilities).unwrap_or(Value::Null);
            if !session.open(Some(version.clone()), capabilities) {
                let err = SessionError::SessionExpired(session.id().unwrap_or_default().to_string());
                warn!(phase = ?session.phase(), "Rejecting initialize: {}", err);
                return Err(McpError::invalid_request(
                    err.to_string(),
                    Some(err.to_failure().to_value()),
                ));
            }
            debug!(session = ?session.id(), protocol_version = %version, "Handshake complete");
        }

        if context.peer.peer_info().is_none() {
            context.peer.set_peer_info(request);
        }

        let mut info = self.get_info();
        if let Ok(protocol_version) = serde_json::from_value(Value::String(version)) {
            info.protocol_version = protocol_version;
        }
        Ok(info)
    }

    #[instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("Listing tools");
        Ok(ListToolsResult {
            tools: self.dispatcher.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let id = serde_json::to_value(&context.id).unwrap_or(Value::Null);
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let invocation = InvocationRequest::new(CorrelationId::from(id), request.name, arguments);

        Ok(self.call(invocation, &context.ct).await.into_call_tool_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::MemoryStore;
    use crate::domains::tools::FailureKind;

    fn server() -> McpServer {
        McpServer::new(Config::default(), Arc::new(MemoryStore::sample().unwrap())).unwrap()
    }

    fn server_with_idle_timeout(idle: std::time::Duration) -> McpServer {
        let mut config = Config::default();
        config.session.idle_timeout = idle;
        config.session.grace_period = std::time::Duration::from_millis(50);
        McpServer::new(config, Arc::new(MemoryStore::sample().unwrap())).unwrap()
    }

    /// A connection-bound server, as stdio and tcp build it, past its handshake.
    fn connected(server: &McpServer, transport: &'static str) -> McpServer {
        let session = server.sessions().attach(transport);
        assert!(session.open(Some("2025-06-18".into()), json!({})));
        server.for_session(session)
    }

    fn categories(id: i64) -> InvocationRequest {
        InvocationRequest::new(id, "get_categories", json!({}))
    }

    #[test]
    fn test_server_info_advertises_tools_only() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
        assert_eq!(info.server_info.name, "food-mcp-server");
    }

    #[tokio::test]
    async fn test_invoke_through_ephemeral_session() {
        let server = server();
        let session = server.sessions().ephemeral("test");
        let envelope = server
            .invoke(
                &session,
                InvocationRequest::new(1_i64, "search_food", json!({ "keyword": "potato" })),
            )
            .await
            .unwrap();
        let payload = envelope.payload().unwrap();
        assert_eq!(payload["keyword"], "potato");
        assert!(payload["total_matches"].as_u64().unwrap() >= 4);
    }

    #[tokio::test]
    async fn test_invoke_reports_unknown_tool() {
        let server = server();
        let session = server.sessions().ephemeral("test");
        let envelope = server
            .invoke(&session, InvocationRequest::new("a", "drop_tables", json!({})))
            .await
            .unwrap();
        assert_eq!(envelope.failure().unwrap().kind, FailureKind::UnknownTool);
        assert_eq!(envelope.id, CorrelationId::from("a"));
    }

    #[tokio::test]
    async fn test_health_reports_store_and_sessions() {
        let server = server();
        let _session = server.sessions().attach("test");
        let (healthy, body) = server.health().await;
        assert!(healthy);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 1);
        assert_eq!(body["tools"], 11);
    }

    #[test]
    fn test_for_session_binds_without_sharing_state() {
        let server = server();
        let session = server.sessions().attach("tcp");
        let bound = server.for_session(session.clone());
        assert!(server.session().is_none());
        assert!(Arc::ptr_eq(bound.session().unwrap(), &session));
        assert!(Arc::ptr_eq(bound.sessions(), server.sessions()));
    }

    #[tokio::test]
    async fn test_connection_session_survives_idle_reaping() {
        let server = server_with_idle_timeout(std::time::Duration::from_millis(20));
        let bound = connected(&server, "stdio");

        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        assert_eq!(server.sessions().reap_idle(), 0);

        let envelope = bound.call(categories(1), &CancellationToken::new()).await;
        assert!(envelope.is_ok());
        assert_eq!(envelope.payload().unwrap()["total_count"], 4);
        assert_eq!(envelope.summary.as_deref().map(|s| s.starts_with("Found 4")), Some(true));
    }

    #[tokio::test]
    async fn test_call_after_session_closed_reports_expired() {
        let server = server();
        let bound = connected(&server, "tcp");
        let session = bound.session().unwrap().clone();

        server.sessions().detach(&session).await;

        let envelope = bound.call(categories(7), &CancellationToken::new()).await;
        assert_eq!(envelope.id, CorrelationId::from(7_i64));
        let failure = envelope.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::SessionExpired);
        assert!(failure.message.contains(session.id().unwrap()));

        let result = envelope.into_call_tool_result();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.structured_content.unwrap()["kind"], "SessionExpired");
    }

    #[tokio::test]
    async fn test_client_cancellation_reports_cancelled() {
        let server = server();
        let bound = connected(&server, "tcp");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let envelope = bound.call(categories(8), &cancel).await;
        assert_eq!(envelope.failure().unwrap().kind, FailureKind::Cancelled);
        assert!(bound.session().unwrap().is_open());
    }

    #[tokio::test]
    async fn test_concurrent_calls_on_one_connection() {
        let server = server();
        let bound = connected(&server, "tcp");
        let cancel = CancellationToken::new();

        let calls = (0..8_i64).map(|i| {
            let request = if i % 2 == 0 {
                InvocationRequest::new(i, "search_food", json!({ "keyword": "potato" }))
            } else {
                categories(i)
            };
            bound.call(request, &cancel)
        });
        let envelopes = futures::future::join_all(calls).await;

        for (i, envelope) in (0_i64..).zip(envelopes) {
            assert_eq!(envelope.id, CorrelationId::from(i));
            let payload = envelope.payload().unwrap();
            if i % 2 == 0 {
                assert_eq!(payload["keyword"], "potato");
            } else {
                assert_eq!(payload["total_count"], 4);
            }
        }
        assert_eq!(bound.session().unwrap().in_flight(), 0);
    }

    #[test]
    fn test_attached_session_waits_for_initialize() {
        let server = server();
        let session = server.sessions().attach("stdio");
        assert_eq!(session.phase(), crate::core::session::SessionPhase::Handshaking);
    }
}
