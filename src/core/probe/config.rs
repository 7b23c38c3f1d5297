//! Probe Transport Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Socket options applied to every transport session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeOptions {
    /// Upper bound for connecting and handing the request to the socket, together
    /// Default: 10000ms
    pub send_timeout_ms: u64,

    /// Upper bound for waiting on the reply once the request is sent
    /// Default: 10000ms
    pub receive_timeout_ms: u64,

    /// How long close may wait for pending data before discarding it
    /// Default: 0 (discard immediately)
    pub linger_ms: u64,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            send_timeout_ms: 10_000,
            receive_timeout_ms: 10_000,
            linger_ms: 0,
        }
    }
}

impl ProbeOptions {
    /// Custom send/receive timeouts with zero linger
    pub fn with_timeouts(send_timeout_ms: u64, receive_timeout_ms: u64) -> Self {
        Self {
            send_timeout_ms,
            receive_timeout_ms,
            ..Self::default()
        }
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }

    /// Longest a single probe can block
    pub fn worst_case(&self) -> Duration {
        self.send_timeout() + self.receive_timeout() + self.linger()
    }
}
