use super::types::{Config, ServerRecord};
use crate::core::probe::ServerEndpoint;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Overrides the config file location
pub const CONFIG_ENV_VAR: &str = "ANALYTIC_PROBE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Config read error ({path}): {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config parse error ({path}): {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config write error ({path}): {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("No server named '{0}' in configuration")]
    UnknownServer(String),
}

impl Config {
    /// `$ANALYTIC_PROBE_CONFIG`, else `~/.analytic-probe/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(home.join(".analytic-probe").join("config.toml"))
    }

    /// Load from the default location; a missing file yields the defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the default config file unless one already exists
    pub fn init() -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        Self::init_at(&path)?;
        Ok(path)
    }

    /// Returns `true` when a new file was written
    pub fn init_at(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(write_error)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn print(&self) -> Result<(), ConfigError> {
        print!("{}", self.to_toml()?);
        Ok(())
    }

    /// Validate probe settings and server records
    ///
    /// Server records need a unique non-empty name, a non-empty ip, a non-zero
    /// port, and an `(ip, port)` pair not used by another record.
    pub fn check(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.default_operation.trim().is_empty() {
            problems.push("default_operation must not be empty".to_string());
        }
        if self.probe.send_timeout_ms == 0 {
            problems.push("probe.send_timeout_ms must be greater than 0".to_string());
        }
        if self.probe.receive_timeout_ms == 0 {
            problems.push("probe.receive_timeout_ms must be greater than 0".to_string());
        }

        let mut names = HashSet::new();
        let mut addresses = HashSet::new();
        for (index, server) in self.servers.iter().enumerate() {
            problems.extend(Self::check_server(index, server));
            if !server.name.trim().is_empty() && !names.insert(server.name.as_str()) {
                problems.push(format!("server name '{}' is used more than once", server.name));
            }
            if !addresses.insert((server.ip.as_str(), server.port)) {
                problems.push(format!(
                    "port {} is already taken for ip '{}'",
                    server.port, server.ip
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    fn check_server(index: usize, server: &ServerRecord) -> Vec<String> {
        let mut problems = Vec::new();
        if server.name.trim().is_empty() {
            problems.push(format!("servers[{}]: name must not be empty", index));
        }
        if server.ip.trim().is_empty() {
            problems.push(format!("servers[{}]: ip must not be empty", index));
        }
        if server.port == 0 {
            problems.push(format!("servers[{}]: port must not be 0", index));
        }
        problems
    }

    pub fn find_server(&self, name: &str) -> Result<ServerEndpoint, ConfigError> {
        self.servers
            .iter()
            .find(|server| server.name == name)
            .map(ServerRecord::endpoint)
            .ok_or_else(|| ConfigError::UnknownServer(name.to_string()))
    }
}
