//! Session lifecycle: handshake, lookup, idle expiry and graceful close.
//!
//! - `session.rs` - one session's phase, activity and in-flight calls
//! - `manager.rs` - the session table, protocol negotiation and reaping
//! - `error.rs` - session errors and their client-facing kinds

mod error;
mod manager;
#[allow(clippy::module_inception)]
mod session;
#[cfg(test)]
pub(crate) mod test_support;

pub use error::SessionError;
pub use manager::{SUPPORTED_PROTOCOL_VERSIONS, SessionManager, negotiate_version};
pub use session::{CloseReport, Session, SessionMode, SessionPhase};
