//! Transport configuration types.
//!
//! `MCP_TRANSPORT` picks the transport (`stdio`, `tcp` or `http`); each
//! transport reads its own `MCP_TCP_*` / `MCP_HTTP_*` settings. Anything
//! unset or unparseable falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// TCP socket transport with JSON-RPC messages.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// HTTP transport with JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Issue `Mcp-Session-Id` on initialize and require it afterwards.
    /// When false every request is handled in a fresh, unstored session.
    #[serde(default)]
    pub stateful: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "tcp")]
impl TcpConfig {
    fn from_vars(vars: &Vars<'_>) -> Self {
        let defaults = Self::default();
        Self {
            port: vars.parse("MCP_TCP_PORT").unwrap_or(defaults.port),
            host: vars.get("MCP_TCP_HOST").unwrap_or(defaults.host),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            stateful: false,
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    fn from_vars(vars: &Vars<'_>) -> Self {
        let defaults = Self::default();
        Self {
            port: vars.parse("MCP_HTTP_PORT").unwrap_or(defaults.port),
            host: vars.get("MCP_HTTP_HOST").unwrap_or(defaults.host),
            rpc_path: vars.get("MCP_HTTP_PATH").unwrap_or(defaults.rpc_path),
            enable_cors: vars.flag("MCP_HTTP_CORS").unwrap_or(defaults.enable_cors),
            stateful: vars.flag("MCP_HTTP_STATEFUL").unwrap_or(defaults.stateful),
        }
    }
}

impl TransportConfig {
    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        let transport = vars.get("MCP_TRANSPORT").unwrap_or_default().to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => Self::Tcp(TcpConfig::from_vars(&vars)),
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_vars(&vars)),
            "" | "stdio" => Self::default(),
            other => {
                warn!("Unknown or disabled transport {:?}, using the default", other);
                Self::default()
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!(
                "HTTP on {}:{}{} ({})",
                cfg.host,
                cfg.port,
                cfg.rpc_path,
                if cfg.stateful { "stateful" } else { "stateless" }
            ),
        }
    }
}

/// Typed reads over a variable lookup.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

#[cfg_attr(not(any(feature = "tcp", feature = "http")), allow(dead_code))]
impl Vars<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring {}={:?}: not a valid value", key, raw);
                None
            }
        }
    }

    /// `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`, any case.
    fn flag(&self, key: &str) -> Option<bool> {
        let raw = self.get(key)?;
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                warn!("Ignoring {}={:?}: expected true or false", key, raw);
                None
            }
        }
    }
}
