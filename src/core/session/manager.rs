//! Session table, protocol negotiation and idle reaping.

use futures::future::join_all;
use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::SessionError;
use super::session::{CloseReport, Session, SessionMode};
use crate::core::config::SessionConfig;

/// Protocol versions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Ids of closed sessions remembered so late requests see `SessionExpired`.
const RETIRED_CAPACITY: usize = 4096;

/// Pick the protocol version for a handshake.
///
/// The client's requested version is accepted only if it is one of
/// [`SUPPORTED_PROTOCOL_VERSIONS`].
pub fn negotiate_version(requested: Option<&str>) -> Result<String, SessionError> {
    match requested {
        Some(version) if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => Ok(version.to_string()),
        _ => Err(SessionError::NegotiationFailed {
            requested: requested.map(str::to_string),
            supported: SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }),
    }
}

/// Owns every live session.
#[derive(Debug)]
pub struct SessionManager {
    config: SessionConfig,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    retired: Mutex<IndexSet<String>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            retired: Mutex::new(IndexSet::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Cancelled once the server starts shutting down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Perform the `initialize` handshake.
    ///
    /// `params` is the client's initialize params object. Stateful sessions
    /// are stored and receive a fresh id; stateless ones are returned to the
    /// caller only.
    pub fn handshake(
        &self,
        transport: &'static str,
        mode: SessionMode,
        params: &Value,
    ) -> Result<Arc<Session>, SessionError> {
        let requested = params.get("protocolVersion").and_then(Value::as_str);
        let capabilities = params.get("capabilities").cloned().unwrap_or(Value::Null);

        let id = match mode {
            SessionMode::Stateful => Some(Uuid::new_v4().to_string()),
            SessionMode::Stateless => None,
        };
        let session = Arc::new(Session::new(id, mode, transport, self.shutdown.child_token()));

        let version = match negotiate_version(requested) {
            Ok(version) => version,
            Err(err) => {
                session.reject();
                warn!(transport, requested = ?requested, "Protocol negotiation failed");
                return Err(err);
            }
        };

        session.open(Some(version.clone()), capabilities);
        self.store(&session);
        info!(
            transport,
            session = ?session.id(),
            protocol_version = %version,
            "Session opened"
        );
        Ok(session)
    }

    /// Register a session for one transport connection whose handshake is
    /// handled by the protocol layer itself.
    ///
    /// The session stays `Handshaking` until the connection's `initialize`
    /// opens or rejects it, and it is never reaped for idleness.
    pub fn attach(&self, transport: &'static str) -> Arc<Session> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(
            Session::new(
                Some(id),
                SessionMode::Stateful,
                transport,
                self.shutdown.child_token(),
            )
            .bound_to_connection(),
        );
        self.store(&session);
        info!(transport, session = ?session.id(), "Session attached");
        session
    }

    /// A one-request session that is never stored.
    pub fn ephemeral(&self, transport: &'static str) -> Arc<Session> {
        let session = Arc::new(Session::new(
            None,
            SessionMode::Stateless,
            transport,
            self.shutdown.child_token(),
        ));
        session.open(None, Value::Null);
        session
    }

    /// Look up a live session by id.
    ///
    /// A session idle past the configured timeout is expired on the spot.
    pub fn resolve(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        let found = self.sessions.read().get(id).cloned();
        match found {
            Some(session) if self.is_stale(&session) => {
                self.expire(id);
                Err(SessionError::SessionExpired(id.to_string()))
            }
            Some(session) if session.is_open() => {
                session.touch();
                Ok(session)
            }
            Some(_) => Err(SessionError::SessionExpired(id.to_string())),
            None if self.retired.lock().contains(id) => {
                Err(SessionError::SessionExpired(id.to_string()))
            }
            None => Err(SessionError::UnknownSession(id.to_string())),
        }
    }

    /// Close a session by id, draining in-flight calls for the grace period.
    pub async fn close(&self, id: &str) -> Result<CloseReport, SessionError> {
        let session = self.remove(id).ok_or_else(|| {
            if self.retired.lock().contains(id) {
                SessionError::SessionExpired(id.to_string())
            } else {
                SessionError::UnknownSession(id.to_string())
            }
        })?;
        Ok(session.close(self.config.grace_period).await)
    }

    /// Close a session whose transport connection went away.
    pub async fn detach(&self, session: &Session) -> CloseReport {
        if let Some(id) = session.id() {
            self.remove(id);
        }
        session.close(self.config.grace_period).await
    }

    /// Expire every idle session not bound to a live connection. Returns
    /// how many were reaped.
    pub fn reap_idle(&self) -> usize {
        let idle: Vec<String> = self
            .sessions
            .read()
            .iter()
            .filter(|(_, session)| self.is_stale(session))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &idle {
            self.expire(id);
        }
        if !idle.is_empty() {
            info!(reaped = idle.len(), "Expired idle sessions");
        }
        idle.len()
    }

    /// Run [`reap_idle`](Self::reap_idle) periodically until shutdown.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(manager.config.reap_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = manager.shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        manager.reap_idle();
                    }
                }
            }
            debug!("Session reaper stopped");
        })
    }

    /// Wait for `signal`, then [`shutdown`](Self::shutdown).
    ///
    /// Sessions drain before the shutdown token fires, so transports keep
    /// serving in-flight calls for the grace period.
    pub fn shutdown_on<F>(self: &Arc<Self>, signal: F) -> JoinHandle<CloseReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            signal.await;
            manager.shutdown().await
        })
    }

    /// Close every session, giving each the grace period, then cancel
    /// anything still tied to the shutdown token.
    pub async fn shutdown(&self) -> CloseReport {
        let sessions: Vec<Arc<Session>> = {
            let mut table = self.sessions.write();
            table.drain().map(|(_, session)| session).collect()
        };
        let count = sessions.len();

        let grace = self.config.grace_period;
        let reports = join_all(sessions.iter().map(|session| session.close(grace))).await;
        self.shutdown.cancel();

        let total = reports.into_iter().fold(CloseReport::default(), |acc, report| CloseReport {
            in_flight: acc.in_flight + report.in_flight,
            abandoned: acc.abandoned + report.abandoned,
        });
        info!(
            sessions = count,
            in_flight = total.in_flight,
            abandoned = total.abandoned,
            "All sessions closed"
        );
        total
    }

    fn is_stale(&self, session: &Session) -> bool {
        !session.is_connection_bound() && session.is_idle(self.config.idle_timeout)
    }

    fn store(&self, session: &Arc<Session>) {
        if let Some(id) = session.id() {
            self.sessions.write().insert(id.to_string(), Arc::clone(session));
        }
    }

    fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.write().remove(id)?;
        self.retire(id);
        Some(session)
    }

    fn expire(&self, id: &str) {
        if let Some(session) = self.remove(id) {
            session.expire();
            debug!(session = id, "Session expired");
        }
    }

    fn retire(&self, id: &str) {
        let mut retired = self.retired.lock();
        if retired.len() >= RETIRED_CAPACITY {
            retired.shift_remove_index(0);
        }
        retired.insert(id.to_string());
    }
}
