//! A single client session and its lifecycle.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::domains::tools::{Dispatcher, InvocationRequest, ResponseEnvelope};

/// How a session relates to the transport's requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Every request stands alone; nothing is kept between requests.
    Stateless,
    /// The session id issued on handshake is echoed by the client.
    Stateful,
}

/// `Handshaking → Open → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Handshaking,
    Open,
    Closing,
    Closed,
}

/// What happened to in-flight calls when a session closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CloseReport {
    /// Calls in flight when the close began.
    pub in_flight: usize,
    /// Calls still running after the grace period; their results are dropped.
    pub abandoned: usize,
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    last_activity: Instant,
    protocol_version: Option<String>,
    client_capabilities: Value,
    client_initialized: bool,
}

/// One logical client connection.
///
/// Owns its bookkeeping exclusively. In-flight calls are tracked so a close
/// can drain them, and all of them observe the session's cancellation token.
#[derive(Debug)]
pub struct Session {
    id: Option<String>,
    mode: SessionMode,
    transport: &'static str,
    /// Lives exactly as long as one transport connection.
    connection_bound: bool,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Session {
    pub(crate) fn new(
        id: Option<String>,
        mode: SessionMode,
        transport: &'static str,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            mode,
            transport,
            connection_bound: false,
            created_at: Utc::now(),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Handshaking,
                last_activity: Instant::now(),
                protocol_version: None,
                client_capabilities: Value::Null,
                client_initialized: false,
            }),
            cancel,
            tracker: TaskTracker::new(),
        }
    }

    /// Tie the session to one transport connection. Such a session ends
    /// with its connection and is never expired for idleness.
    #[must_use]
    pub(crate) fn bound_to_connection(mut self) -> Self {
        self.connection_bound = true;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn transport(&self) -> &'static str {
        self.transport
    }

    pub fn is_connection_bound(&self) -> bool {
        self.connection_bound
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    pub fn is_open(&self) -> bool {
        self.phase() == SessionPhase::Open
    }

    pub fn protocol_version(&self) -> Option<String> {
        self.state.lock().protocol_version.clone()
    }

    pub fn client_capabilities(&self) -> Value {
        self.state.lock().client_capabilities.clone()
    }

    pub fn is_client_initialized(&self) -> bool {
        self.state.lock().client_initialized
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of dispatches currently running on this session.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// `Handshaking → Open` with the negotiated parameters.
    ///
    /// Returns `false`, changing nothing, unless the session is still
    /// handshaking.
    pub(crate) fn open(&self, protocol_version: Option<String>, client_capabilities: Value) -> bool {
        let mut state = self.state.lock();
        if state.phase != SessionPhase::Handshaking {
            return false;
        }
        state.phase = SessionPhase::Open;
        state.protocol_version = protocol_version;
        state.client_capabilities = client_capabilities;
        state.last_activity = Instant::now();
        true
    }

    /// `Handshaking → Closed` after a failed negotiation.
    pub(crate) fn reject(&self) {
        self.state.lock().phase = SessionPhase::Closed;
        self.cancel.cancel();
    }

    /// Record the client's `notifications/initialized`.
    pub fn mark_initialized(&self) {
        let mut state = self.state.lock();
        state.client_initialized = true;
        state.last_activity = Instant::now();
    }

    pub fn touch(&self) {
        self.state.lock().last_activity = Instant::now();
    }

    /// Idle means nothing in flight and no activity for at least `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.tracker.is_empty() && self.state.lock().last_activity.elapsed() >= timeout
    }

    /// Dispatch one call on this session.
    ///
    /// Returns `None` if the session is not open or the call was abandoned
    /// because the session closed under it.
    pub async fn dispatch(
        &self,
        dispatcher: &Dispatcher,
        request: InvocationRequest,
    ) -> Option<ResponseEnvelope> {
        if !self.is_open() {
            debug!(session = ?self.id, "Dropping call on a session that is not open");
            return None;
        }

        self.touch();
        let request = request.in_session(self.id.clone());
        let response = self
            .tracker
            .track_future(dispatcher.dispatch(request, &self.cancel))
            .await;
        self.touch();
        response
    }

    /// `Open → Closing → Closed`.
    ///
    /// In-flight calls get up to `grace` to finish; whatever is still
    /// running afterwards is cancelled and its result discarded.
    pub async fn close(&self, grace: Duration) -> CloseReport {
        {
            let mut state = self.state.lock();
            if matches!(state.phase, SessionPhase::Closing | SessionPhase::Closed) {
                return CloseReport::default();
            }
            state.phase = SessionPhase::Closing;
        }

        let in_flight = self.tracker.len();
        self.tracker.close();

        let abandoned = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => 0,
            Err(_) => self.tracker.len(),
        };

        self.cancel.cancel();
        self.tracker.wait().await;
        self.state.lock().phase = SessionPhase::Closed;

        if abandoned > 0 {
            warn!(
                session = ?self.id,
                abandoned,
                "Session closed with calls still running after the grace period"
            );
        } else {
            info!(session = ?self.id, transport = self.transport, in_flight, "Session closed");
        }

        CloseReport {
            in_flight,
            abandoned,
        }
    }

    /// Close immediately, without draining. Used for idle sessions.
    pub(crate) fn expire(&self) {
        self.tracker.close();
        self.cancel.cancel();
        self.state.lock().phase = SessionPhase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::sleepy_dispatcher;
    use serde_json::json;
    use std::sync::Arc;

    fn open_session() -> Arc<Session> {
        let session = Arc::new(Session::new(
            Some("s-1".into()),
            SessionMode::Stateful,
            "test",
            CancellationToken::new(),
        ));
        assert!(session.open(Some("2025-06-18".into()), json!({})));
        session
    }

    fn sleep_call(id: i64, ms: u64) -> InvocationRequest {
        InvocationRequest::new(id, "sleep", json!({ "ms": ms }))
    }

    #[test]
    fn test_phase_transitions() {
        let session = Session::new(None, SessionMode::Stateless, "test", CancellationToken::new());
        assert_eq!(session.phase(), SessionPhase::Handshaking);
        session.open(Some("2024-11-05".into()), json!({ "roots": {} }));
        assert!(session.is_open());
        assert_eq!(session.protocol_version().as_deref(), Some("2024-11-05"));

        session.mark_initialized();
        assert!(session.is_client_initialized());

        session.reject();
        assert_eq!(session.phase(), SessionPhase::Closed);
        assert!(session.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_closed_session_cannot_reopen() {
        let session = open_session();
        assert!(!session.open(Some("2024-11-05".into()), json!({})));
        assert_eq!(session.protocol_version().as_deref(), Some("2025-06-18"));

        session.close(Duration::from_millis(10)).await;
        assert!(!session.open(Some("2025-06-18".into()), json!({})));
        assert_eq!(session.phase(), SessionPhase::Closed);

        let expired = Session::new(None, SessionMode::Stateless, "test", CancellationToken::new());
        expired.expire();
        assert!(!expired.open(None, Value::Null));
        assert!(!expired.is_open());
    }

    #[tokio::test]
    async fn test_slow_call_does_not_hold_up_fast_ones() {
        let dispatcher = sleepy_dispatcher();
        let session = open_session();
        let started = Instant::now();

        let slow = async {
            let envelope = session.dispatch(&dispatcher, sleep_call(1, 300)).await;
            (envelope, started.elapsed())
        };
        let fast = async {
            let mut finished = Vec::new();
            for id in 2..5 {
                let envelope = session.dispatch(&dispatcher, sleep_call(id, 5)).await;
                finished.push((envelope, started.elapsed(), session.in_flight()));
            }
            finished
        };
        let ((slow, slow_elapsed), fast) = tokio::join!(slow, fast);

        for (id, (envelope, elapsed, in_flight)) in (2_i64..).zip(fast) {
            let envelope = envelope.unwrap();
            assert_eq!(envelope.id, crate::domains::tools::CorrelationId::from(id));
            assert!(elapsed < Duration::from_millis(250), "fast call waited {elapsed:?}");
            // The slow call is still running alongside.
            assert!(in_flight >= 1);
        }
        assert_eq!(slow.unwrap().payload().unwrap()["slept_ms"], 300);
        assert!(slow_elapsed >= Duration::from_millis(300));
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_tags_request_with_session() {
        let dispatcher = sleepy_dispatcher();
        let session = open_session();
        let envelope = session
            .dispatch(&dispatcher, InvocationRequest::new(1_i64, "sleep", json!({ "ms": 1 })))
            .await
            .unwrap();
        assert!(envelope.is_ok());
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_close_drains_within_grace() {
        let dispatcher = Arc::new(sleepy_dispatcher());
        let session = open_session();

        let call = {
            let (session, dispatcher) = (session.clone(), dispatcher.clone());
            tokio::spawn(async move {
                session
                    .dispatch(&dispatcher, InvocationRequest::new(1_i64, "sleep", json!({ "ms": 20 })))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let report = session.close(Duration::from_secs(2)).await;
        assert_eq!(report, CloseReport { in_flight: 1, abandoned: 0 });
        assert!(call.await.unwrap().is_some());
        assert_eq!(session.phase(), SessionPhase::Closed);
    }

    #[tokio::test]
    async fn test_close_abandons_after_grace() {
        let dispatcher = Arc::new(sleepy_dispatcher());
        let session = open_session();

        let call = {
            let (session, dispatcher) = (session.clone(), dispatcher.clone());
            tokio::spawn(async move {
                session
                    .dispatch(&dispatcher, InvocationRequest::new(2_i64, "sleep", json!({ "ms": 5_000 })))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let report = session.close(Duration::from_millis(20)).await;
        assert_eq!(report.abandoned, 1);
        assert!(call.await.unwrap().is_none());
        assert_eq!(session.in_flight(), 0);

        // Closed sessions accept nothing further.
        let late = session
            .dispatch(&dispatcher, InvocationRequest::new(3_i64, "sleep", json!({ "ms": 1 })))
            .await;
        assert!(late.is_none());
    }

    #[tokio::test]
    async fn test_idle_requires_no_in_flight_calls() {
        let session = open_session();
        assert!(!session.is_idle(Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(session.is_idle(Duration::from_millis(10)));
    }
}
