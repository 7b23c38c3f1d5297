// Built-in configuration used when no config file exists

use super::types::Config;
use crate::core::probe::{DiagnosticsOptions, ProbeOptions, DEFAULT_OPERATION};

impl Default for Config {
    fn default() -> Self {
        Config {
            default_operation: DEFAULT_OPERATION.to_string(),
            probe: ProbeOptions::default(),
            diagnostics: DiagnosticsOptions::default(),
            servers: Vec::new(),
        }
    }
}
