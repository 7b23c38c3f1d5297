use crate::core::probe::{DiagnosticsOptions, ProbeOptions, ServerEndpoint};
use serde::{Deserialize, Serialize};

/// Application configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operation sent when the command line does not name one
    pub default_operation: String,
    pub probe: ProbeOptions,
    pub diagnostics: DiagnosticsOptions,
    /// Known analytic servers, addressable by name
    pub servers: Vec<ServerRecord>,
}

/// Read-only view of a stored analytic server record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl ServerRecord {
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.ip.clone(), self.port)
    }
}
