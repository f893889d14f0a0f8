//! Configuration management for the MCP server.
//!
//! Values come from `MCP_*` environment variables (a `.env` file is honoured)
//! and fall back to the defaults below.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Where the food documents come from.
    pub data: DataConfig,

    /// Tool dispatch limits.
    pub dispatch: DispatchConfig,

    /// Session lifecycle timings.
    pub session: SessionConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Document store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file holding the `food_hierarchy` and `food_items` collections.
    /// The bundled sample data is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on a single tool invocation.
    pub tool_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// A session with no activity and nothing in flight for this long expires.
    pub idle_timeout: Duration,

    /// How long a closing session waits for in-flight calls.
    pub grace_period: Duration,

    /// How often idle sessions are swept.
    pub reap_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_millis(30_000),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(1800),
            grace_period: Duration::from_millis(5_000),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "food-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            data: DataConfig::default(),
            dispatch: DispatchConfig::default(),
            session: SessionConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_TOOL_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(path) = std::env::var("MCP_DATA_PATH") {
            info!("Food data will be loaded from {}", path);
            config.data.path = Some(PathBuf::from(path));
        }

        if let Some(ms) = parse_var::<u64>("MCP_TOOL_TIMEOUT_MS") {
            config.dispatch.tool_timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64>("MCP_SESSION_IDLE_TIMEOUT_SECS") {
            // Zero would expire every stateful session before its first call.
            config.session.idle_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(ms) = parse_var::<u64>("MCP_SESSION_GRACE_PERIOD_MS") {
            config.session.grace_period = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64>("MCP_SESSION_REAP_INTERVAL_SECS") {
            // A zero period would make the reaper's interval panic.
            config.session.reap_interval = Duration::from_secs(secs.max(1));
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config
    }
}

/// Read and parse an env var, warning when it is set but malformed.
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "MCP_DATA_PATH",
        "MCP_TOOL_TIMEOUT_MS",
        "MCP_SESSION_IDLE_TIMEOUT_SECS",
        "MCP_SESSION_GRACE_PERIOD_MS",
        "MCP_SESSION_REAP_INTERVAL_SECS",
    ];

    fn clear_vars() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.name, "food-mcp-server");
        assert_eq!(config.dispatch.tool_timeout, Duration::from_secs(30));
        assert_eq!(config.session.idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.session.grace_period, Duration::from_secs(5));
        assert_eq!(config.session.reap_interval, Duration::from_secs(60));
        assert!(config.data.path.is_none());
    }

    #[test]
    fn test_timings_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_vars();
        unsafe {
            std::env::set_var("MCP_TOOL_TIMEOUT_MS", "250");
            std::env::set_var("MCP_SESSION_IDLE_TIMEOUT_SECS", "90");
            std::env::set_var("MCP_SESSION_GRACE_PERIOD_MS", "100");
            std::env::set_var("MCP_SESSION_REAP_INTERVAL_SECS", "0");
            std::env::set_var("MCP_DATA_PATH", "/tmp/foods.json");
        }

        let config = Config::from_env();
        assert_eq!(config.dispatch.tool_timeout, Duration::from_millis(250));
        assert_eq!(config.session.idle_timeout, Duration::from_secs(90));
        assert_eq!(config.session.grace_period, Duration::from_millis(100));
        assert_eq!(config.session.reap_interval, Duration::from_secs(1));
        assert_eq!(config.data.path, Some(PathBuf::from("/tmp/foods.json")));

        clear_vars();
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_vars();
        unsafe {
            std::env::set_var("MCP_TOOL_TIMEOUT_MS", "soon");
        }

        let config = Config::from_env();
        assert_eq!(config.dispatch.tool_timeout, Duration::from_secs(30));

        clear_vars();
    }

    #[test]
    fn test_zero_idle_timeout_is_raised() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_vars();
        unsafe {
            std::env::set_var("MCP_SESSION_IDLE_TIMEOUT_SECS", "0");
        }

        let config = Config::from_env();
        assert_eq!(config.session.idle_timeout, Duration::from_secs(1));

        clear_vars();
    }
}
