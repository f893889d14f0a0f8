//! HTTP transport implementation.
//!
//! HTTP server with JSON-RPC over POST requests. Runs either stateless
//! (every POST handled on a fresh session) or stateful (the id issued on
//! `initialize` travels in the `Mcp-Session-Id` header).

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use http::{HeaderMap, HeaderValue, StatusCode};
use rmcp::ServerHandler;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::session::{Session, SessionError, SessionMode};
use crate::domains::tools::{CorrelationId, InvocationRequest};

/// Header carrying the stateful session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

const TRANSPORT: &str = "http";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Server-defined JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Missing, unknown or expired session id.
    pub const SESSION_ERROR: i32 = -32001;
    /// Protocol version negotiation failed.
    pub const NEGOTIATION_FAILED: i32 = -32002;
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = Some(data);
        }
        self
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::error(None, codes::PARSE_ERROR, msg)
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, codes::METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, msg)
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_PARAMS, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, codes::INTERNAL_ERROR, msg)
    }

    /// Session or negotiation failure, carrying `{kind, message, details?}`.
    pub fn session_error(id: Option<Value>, err: &SessionError) -> Self {
        let code = match err {
            SessionError::NegotiationFailed { .. } => codes::NEGOTIATION_FAILED,
            _ => codes::SESSION_ERROR,
        };
        Self::error(id, code, err.to_string()).with_data(err.to_failure().to_value())
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Transport settings.
    config: Arc<HttpConfig>,
}

impl AppState {
    fn mode(&self) -> SessionMode {
        if self.config.stateful {
            SessionMode::Stateful
        } else {
            SessionMode::Stateless
        }
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until `shutdown` fires.
    pub async fn run(self, server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        if self.config.stateful {
            info!("  → Close:    DELETE {} (with {})", self.config.rpc_path, SESSION_HEADER);
        }
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

/// Build the HTTP router for `server`.
pub fn router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        server,
        config: Arc::new(config.clone()),
    };

    let mut app = Router::new()
        .route(&config.rpc_path, post(handle_rpc).delete(handle_delete))
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "session_mode": state.mode(),
        "endpoints": {
            "rpc": state.config.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": format!(
            "Send POST requests to {} with JSON-RPC messages",
            state.config.rpc_path
        )
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (healthy, mut body) = state.server.health().await;
    body["timestamp"] = json!(chrono::Utc::now().to_rfc3339());
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Handle a POST carrying one JSON-RPC message or a batch.
#[instrument(skip_all)]
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Unparseable JSON-RPC body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::parse_error(format!("Parse error: {e}"))),
            )
                .into_response();
        }
    };

    let (messages, is_batch) = match payload {
        Value::Array(items) if items.is_empty() => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::invalid_request(None, "Empty batch")),
            )
                .into_response();
        }
        Value::Array(items) => (items, true),
        single => (vec![single], false),
    };

    if !is_batch && method_of(&messages[0]) == Some("initialize") {
        return match messages.into_iter().next() {
            Some(message) => handle_initialize(&state, message),
            None => StatusCode::BAD_REQUEST.into_response(),
        };
    }

    let session = match resolve_session(&state, &headers) {
        Ok(session) => session,
        Err(err) => return session_error_response(&err),
    };

    let mut pending: FuturesUnordered<_> = messages
        .into_iter()
        .map(|message| process_message(&state, &session, message))
        .collect();

    // Answered in completion order; clients match by id.
    let mut responses = Vec::new();
    while let Some(response) = pending.next().await {
        if let Some(response) = response {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        return StatusCode::ACCEPTED.into_response();
    }
    if is_batch {
        Json(responses).into_response()
    } else {
        Json(responses.remove(0)).into_response()
    }
}

/// Close a stateful session.
#[instrument(skip_all)]
async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.config.stateful {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let id = match session_header(&headers) {
        Some(id) => id,
        None => return session_error_response(&SessionError::MissingSessionId),
    };

    match state.server.sessions().close(&id).await {
        Ok(report) => {
            info!(session = %id, "Session closed by client");
            Json(json!({
                "session_id": id,
                "closed": true,
                "in_flight": report.in_flight,
                "abandoned": report.abandoned,
            }))
            .into_response()
        }
        Err(err) => session_error_response(&err),
    }
}

/// Handshake: negotiate the protocol version and, in stateful mode, issue
/// a session id.
fn handle_initialize(state: &AppState, message: Value) -> Response {
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::invalid_request(None, e.to_string())),
            )
                .into_response();
        }
    };
    info!("Processing initialize request");

    let params = request.params.unwrap_or(Value::Null);
    let session = match state
        .server
        .sessions()
        .handshake(TRANSPORT, state.mode(), &params)
    {
        Ok(session) => session,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::session_error(request.id, &err)),
            )
                .into_response();
        }
    };

    let mut result = serde_json::to_value(state.server.get_info()).unwrap_or_else(|_| json!({}));
    result["protocolVersion"] = json!(session.protocol_version());

    let mut response = Json(JsonRpcResponse::success(request.id, result)).into_response();
    if let Some(id) = session.id() {
        match HeaderValue::from_str(id) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Err(e) => warn!("Session id is not a valid header value: {}", e),
        }
    }
    response
}

/// Find the session a POST belongs to.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<Arc<Session>, SessionError> {
    let sessions = state.server.sessions();
    match state.mode() {
        SessionMode::Stateless => Ok(sessions.ephemeral(TRANSPORT)),
        SessionMode::Stateful => {
            let id = session_header(headers).ok_or(SessionError::MissingSessionId)?;
            sessions.resolve(&id)
        }
    }
}

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn session_error_response(err: &SessionError) -> Response {
    let status = match err {
        SessionError::MissingSessionId | SessionError::NegotiationFailed { .. } => {
            StatusCode::BAD_REQUEST
        }
        SessionError::UnknownSession(_) | SessionError::SessionExpired(_) => StatusCode::NOT_FOUND,
    };
    debug!("Rejecting request: {}", err);
    (status, Json(JsonRpcResponse::session_error(None, err))).into_response()
}

fn method_of(message: &Value) -> Option<&str> {
    message.get("method").and_then(Value::as_str)
}

/// Process one JSON-RPC message. `None` means nothing is sent back.
async fn process_message(
    state: &AppState,
    session: &Session,
    message: Value,
) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_value(message.clone()) {
        Ok(request) => request,
        Err(e) => {
            let id = message.get("id").cloned();
            return Some(JsonRpcResponse::invalid_request(id, e.to_string()));
        }
    };

    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(
            request.id,
            "jsonrpc must be \"2.0\"",
        ));
    }

    let Some(id) = request.id.clone() else {
        handle_notification(session, &request);
        return None;
    };

    debug!(method = %request.method, "Received JSON-RPC request");
    let response = match request.method.as_str() {
        "initialize" => {
            JsonRpcResponse::invalid_request(Some(id), "initialize must be sent on its own")
        }
        "ping" => JsonRpcResponse::success(Some(id), json!({})),
        "tools/list" => handle_tools_list(state, id),
        "tools/call" => return handle_tools_call(state, session, id, request.params).await,
        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::method_not_found(Some(id), method)
        }
    };
    Some(response)
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, id: Value) -> JsonRpcResponse {
    let tools = state.server.dispatcher().list_tools();
    JsonRpcResponse::success(Some(id), json!({ "tools": tools }))
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handle tools/call request.
async fn handle_tools_call(
    state: &AppState,
    session: &Session,
    id: Value,
    params: Option<Value>,
) -> Option<JsonRpcResponse> {
    let params: CallParams = match params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        Some(Err(e)) => return Some(JsonRpcResponse::invalid_params(Some(id), e.to_string())),
        None => return Some(JsonRpcResponse::invalid_params(Some(id), "Missing params")),
    };

    let invocation =
        InvocationRequest::new(CorrelationId::from(id.clone()), params.name, params.arguments);
    let envelope = state.server.invoke(session, invocation).await?;

    let response = match serde_json::to_value(envelope.into_call_tool_result()) {
        Ok(result) => JsonRpcResponse::success(Some(id), result),
        Err(e) => JsonRpcResponse::internal_error(Some(id), e.to_string()),
    };
    Some(response)
}

/// Handle notifications (no response needed).
fn handle_notification(session: &Session, request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => {
            debug!(session = ?session.id(), "Client sent initialized notification");
            session.mark_initialized();
        }
        method => {
            debug!("Received notification: {}", method);
            session.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::store::MemoryStore;
    use axum::body::Body;
    use http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(stateful: bool) -> Router {
        let server =
            McpServer::new(Config::default(), Arc::new(MemoryStore::sample().unwrap())).unwrap();
        let config = HttpConfig {
            stateful,
            ..HttpConfig::default()
        };
        router(server, &config)
    }

    fn post(body: Value, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn initialize(version: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": version,
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "1.0" }
            }
        })
    }

    fn call(id: i64, tool: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": tool, "arguments": arguments }
        })
    }

    #[tokio::test]
    async fn test_stateless_initialize_issues_no_session() {
        let app = app(false);
        let (status, headers, body) = send(&app, post(initialize("2025-03-26"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(SESSION_HEADER).is_none());
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_unsupported_version_fails_negotiation() {
        let app = app(true);
        let (status, headers, body) = send(&app, post(initialize("1999-12-31"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers.get(SESSION_HEADER).is_none());
        assert_eq!(body["error"]["code"], codes::NEGOTIATION_FAILED);
        assert_eq!(body["error"]["data"]["kind"], "NegotiationFailed");
    }

    #[tokio::test]
    async fn test_tools_list_advertises_all_tools() {
        let app = app(false);
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });
        let (status, _, body) = send(&app, post(request, None)).await;
        assert_eq!(status, StatusCode::OK);
        let tools = body["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert_eq!(tools[0]["name"], "get_all_food_hierarchy");
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[tokio::test]
    async fn test_tools_call_success_and_failure() {
        let app = app(false);

        let (_, _, body) =
            send(&app, post(call(2, "get_food_nutrition", json!({ "name": "apple" })), None)).await;
        assert_eq!(body["id"], 2);
        assert_eq!(body["result"]["isError"], false);
        assert_eq!(body["result"]["structuredContent"]["found"], true);

        let (_, _, body) = send(&app, post(call(3, "delete_everything", json!({})), None)).await;
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(body["result"]["structuredContent"]["kind"], "UnknownTool");

        let (_, _, body) =
            send(&app, post(call(4, "get_subcategories", json!({ "category": 7 })), None)).await;
        assert_eq!(body["result"]["structuredContent"]["kind"], "InvalidArguments");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let app = app(false);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], codes::PARSE_ERROR);

        let (_, _, body) = send(
            &app,
            post(json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" }), None),
        )
        .await;
        assert_eq!(body["error"]["code"], codes::METHOD_NOT_FOUND);

        let (status, _, _) = send(&app, post(json!([]), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let app = app(false);
        let request = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        let (status, _, body) = send(&app, post(request, None)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_batch_answers_every_request() {
        let app = app(false);
        let batch = json!([
            call(10, "get_categories", json!({})),
            { "jsonrpc": "2.0", "method": "notifications/initialized" },
            call(11, "food_stats", json!({})),
            { "jsonrpc": "2.0", "id": 12, "method": "ping" }
        ]);
        let (status, _, body) = send(&app, post(batch, None)).await;
        assert_eq!(status, StatusCode::OK);

        let responses = body.as_array().unwrap();
        assert_eq!(responses.len(), 3);
        let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_stateful_session_lifecycle() {
        let app = app(true);

        let (status, headers, _) = send(&app, post(initialize("2025-06-18"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let id = headers
            .get(SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let list = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });

        let (status, _, _) = send(&app, post(list.clone(), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(&app, post(list.clone(), Some("not-a-session"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["data"]["kind"], "UnknownSession");

        let (status, _, body) = send(&app, post(list.clone(), Some(&id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 11);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/mcp")
            .header(SESSION_HEADER, &id)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["closed"], true);

        let (status, _, body) = send(&app, post(list, Some(&id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["data"]["kind"], "SessionExpired");
    }

    #[tokio::test]
    async fn test_stateful_session_serves_concurrent_requests() {
        let app = app(true);
        let (_, headers, _) = send(&app, post(initialize("2025-06-18"), None)).await;
        let id = headers.get(SESSION_HEADER).unwrap().to_str().unwrap().to_string();

        // Two POSTs in parallel on the same session, one of them a batch.
        let batch = json!([
            call(1, "get_all_food_hierarchy", json!({})),
            call(2, "search_food_nutrition", json!({ "keyword": "a" })),
            call(3, "find_food_category", json!({ "item": "Cheddar" })),
        ]);
        let single = call(4, "get_food_items", json!({ "category": "dairy", "subcategory": "cheese" }));
        let ((batch_status, _, batch_body), (single_status, _, single_body)) = tokio::join!(
            send(&app, post(batch, Some(&id))),
            send(&app, post(single, Some(&id)))
        );

        assert_eq!(batch_status, StatusCode::OK);
        let mut ids: Vec<i64> = batch_body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                assert_eq!(r["result"]["isError"], false);
                r["id"].as_i64().unwrap()
            })
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(single_status, StatusCode::OK);
        assert_eq!(single_body["id"], 4);
        assert_eq!(single_body["result"]["structuredContent"]["total_count"], 3);
        assert_eq!(
            single_body["result"]["content"][0]["text"],
            "Found 3 food items in 'dairy' → 'cheese'"
        );
    }

    #[tokio::test]
    async fn test_get_and_stateless_delete_are_not_allowed() {
        let app = app(false);
        for method in [Method::GET, Method::DELETE] {
            let request = Request::builder()
                .method(method)
                .uri("/mcp")
                .body(Body::empty())
                .unwrap();
            let (status, _, _) = send(&app, request).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = app(false);
        let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, health).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], "ok");

        let root = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (_, _, body) = send(&app, root).await;
        assert_eq!(body["endpoints"]["rpc"], "/mcp");
        assert_eq!(body["session_mode"], "stateless");
    }
}
