// Core types for analytic server status probing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation name used when the caller does not ask for a specific one
pub const DEFAULT_OPERATION: &str = "AnalyticServerStatus";

/// Network location of an analytic server
///
/// Supplied by the caller (or resolved from a configured server record). The probe
/// reads `ip` and `port` as-is and does not re-validate them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub ip: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Socket address in `tcp://host:port` form
    ///
    /// IPv6 literals are wrapped in brackets: `tcp://[::1]:4000`.
    pub fn socket_address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("tcp://[{}]:{}", self.ip, self.port)
        } else {
            format!("tcp://{}:{}", self.ip, self.port)
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Reported state of the remote analytic process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum ServerStatus {
    /// The server answered `Running` with a numeric pid
    Running,
    /// Anything else: unreachable, slow, malformed, or a non-running answer
    #[default]
    Unknown,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Running => "Running",
            ServerStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of one status probe
///
/// `Unknown` always carries pid 0. The fields are private so that the only ways to
/// build a result are [`StatusResult::running`] and [`StatusResult::unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct StatusResult {
    status: ServerStatus,
    pid: u32,
}

impl StatusResult {
    pub fn running(pid: u32) -> Self {
        Self {
            status: ServerStatus::Running,
            pid,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: ServerStatus::Unknown,
            pid: 0,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.status == ServerStatus::Running
    }
}

impl fmt::Display for StatusResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ServerStatus::Running => write!(f, "Running (pid {})", self.pid),
            ServerStatus::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Where the decoded reply came from, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Bytes received from the remote server
    Remote,
    /// The synthetic fallback document, used when no reply was obtained
    Fallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Remote => "remote",
            ReplySource::Fallback => "fallback",
        }
    }
}

/// Local timezone RFC 3339 timestamp used across diagnostics
pub fn get_local_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
