use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::probe::config::ProbeOptions;
use crate::core::probe::transport::TransportError;
use crate::core::probe::types::{get_local_timestamp, ReplySource, ServerEndpoint, StatusResult};

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: usize = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

/// Environment switch for the JSON-lines debug log
pub const DEBUG_ENV_VAR: &str = "ANALYTIC_PROBE_DEBUG";

const COMPONENT: &str = "StatusProbe";

/// Diagnostics settings, embedded in the `[diagnostics]` config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsOptions {
    /// Echo transport failures to stderr
    pub stderr: bool,
    /// Write the JSON-lines debug log (also enabled by `ANALYTIC_PROBE_DEBUG`)
    pub debug_log: bool,
    /// Override for the debug log location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl Default for DiagnosticsOptions {
    fn default() -> Self {
        Self {
            stderr: true,
            debug_log: false,
            log_path: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub component: String,
    pub event: String,
    pub message: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, Value>,
}

struct RotatingLogger {
    log_path: PathBuf,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        Self {
            log_path,
            write_count: AtomicU32::new(0),
        }
    }

    fn write_with_rotation(&self, json_line: &str) -> Result<(), std::io::Error> {
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "{}", json_line)
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        // Another process holding the lock is already rotating
        if lock_file.try_lock_exclusive().is_ok() {
            if self.needs_rotation()? {
                self.perform_rotation()?;
            }
            let _ = std::fs::remove_file(&lock_path);
        }
        Ok(())
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.log_path.exists() {
            return Ok(false);
        }
        let metadata = std::fs::metadata(&self.log_path)?;
        Ok(metadata.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
    }

    fn log_dir(&self) -> &Path {
        self.log_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn base_name(&self) -> String {
        self.log_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "analytic-probe-debug".to_string())
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let archive_path = self
            .log_dir()
            .join(format!("{}.{}.gz", self.base_name(), timestamp));

        let temp_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &temp_path)?;

        let source_file = File::open(&temp_path)?;
        let target_file = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target_file, Compression::default());
        std::io::copy(&mut BufReader::new(source_file), &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives();
        Ok(())
    }

    fn cleanup_old_archives(&self) -> Result<(), std::io::Error> {
        let prefix = format!("{}.", self.base_name());

        let mut archives = Vec::new();
        for entry in std::fs::read_dir(self.log_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > MAX_ARCHIVES {
            let to_remove = archives.len() - MAX_ARCHIVES;
            for (path, _) in archives.iter().take(to_remove) {
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(())
    }
}

/// Advisory diagnostics for status probes
///
/// Transport failures go to stderr (when enabled) in the
/// `Operation failed, code [..] description [..]` form. Every probe event is
/// also appended to a JSON-lines log when debug logging is on. Nothing here can
/// fail a probe: write errors are dropped.
pub struct DebugLogger {
    enabled: bool,
    stderr: bool,
    rotating_logger: Option<Arc<Mutex<RotatingLogger>>>,
    session_id: String,
}

impl DebugLogger {
    /// Logger driven by `ANALYTIC_PROBE_DEBUG`, writing to the default log path
    pub fn new() -> Self {
        Self::from_options(&DiagnosticsOptions::default())
    }

    pub fn from_options(options: &DiagnosticsOptions) -> Self {
        let enabled = options.debug_log || Self::parse_debug_enabled();
        let log_path = options.log_path.clone().unwrap_or_else(Self::default_log_path);
        Self::with_path(log_path, enabled, options.stderr)
    }

    pub fn with_path(log_path: PathBuf, enabled: bool, stderr: bool) -> Self {
        let rotating_logger = if enabled {
            Some(Arc::new(Mutex::new(RotatingLogger::new(log_path))))
        } else {
            None
        };

        Self {
            enabled,
            stderr,
            rotating_logger,
            session_id: new_correlation_id(),
        }
    }

    /// Logger that writes nothing anywhere
    pub fn silent() -> Self {
        Self {
            enabled: false,
            stderr: false,
            rotating_logger: None,
            session_id: new_correlation_id(),
        }
    }

    /// Accepts true/false, 1/0, yes/no, on/off (case insensitive)
    fn parse_debug_enabled() -> bool {
        env::var(DEBUG_ENV_VAR)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    pub fn default_log_path() -> PathBuf {
        let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        log_path.push(".analytic-probe");
        log_path.push("analytic-probe-debug.log");
        log_path
    }

    fn log_sync(
        &self,
        level: &str,
        event: &str,
        message: &str,
        correlation_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: get_local_timestamp(),
            level: level.to_string(),
            component: COMPONENT.to_string(),
            event: event.to_string(),
            message: message.to_string(),
            correlation_id: Some(
                correlation_id
                    .map(str::to_string)
                    .unwrap_or_else(|| self.session_id.clone()),
            ),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let Ok(logger) = logger.lock() {
                if let Ok(json_line) = serde_json::to_string(&entry) {
                    let _ = logger.write_with_rotation(&json_line);
                }
            }
        }
    }

    pub fn debug_sync(&self, event: &str, message: &str) {
        self.log_sync("DEBUG", event, message, None, HashMap::new());
    }

    pub fn error_sync(&self, event: &str, message: &str) {
        self.log_sync("ERROR", event, message, None, HashMap::new());
    }

    pub fn probe_start(
        &self,
        endpoint: &ServerEndpoint,
        operation: &str,
        options: &ProbeOptions,
        correlation_id: &str,
    ) {
        let mut fields = HashMap::new();
        fields.insert("endpoint".to_string(), Value::String(endpoint.socket_address()));
        fields.insert("operation".to_string(), Value::String(operation.to_string()));
        fields.insert("send_timeout_ms".to_string(), options.send_timeout_ms.into());
        fields.insert("receive_timeout_ms".to_string(), options.receive_timeout_ms.into());
        fields.insert(
            "worst_case_ms".to_string(),
            (options.worst_case().as_millis() as u64).into(),
        );

        self.log_sync(
            "PROBE",
            "probe_start",
            &format!("Probing {} for {}", endpoint, operation),
            Some(correlation_id),
            fields,
        );
    }

    pub fn transport_failure(
        &self,
        error: &TransportError,
        endpoint: &ServerEndpoint,
        correlation_id: &str,
    ) {
        if self.stderr {
            eprintln!(
                "Operation failed, code [{}] description [{}]",
                error.code(),
                error
            );
        }

        let mut fields = HashMap::new();
        fields.insert("code".to_string(), Value::String(error.code().to_string()));
        fields.insert("endpoint".to_string(), Value::String(endpoint.socket_address()));
        fields.insert("timeout".to_string(), Value::Bool(error.is_timeout()));

        self.log_sync(
            "ERROR",
            "transport_failure",
            &error.to_string(),
            Some(correlation_id),
            fields,
        );
    }

    pub fn decode_fallback(&self, reason: &str, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("reason".to_string(), Value::String(reason.to_string()));

        self.log_sync(
            "PROBE",
            "decode_fallback",
            &format!("Reply could not be read: {}", reason),
            Some(correlation_id),
            fields,
        );
    }

    pub fn probe_end(
        &self,
        result: &StatusResult,
        source: ReplySource,
        duration_ms: u64,
        correlation_id: &str,
    ) {
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), Value::String(result.status().to_string()));
        fields.insert("pid".to_string(), result.pid().into());
        fields.insert("reply_source".to_string(), Value::String(source.as_str().to_string()));
        fields.insert("duration_ms".to_string(), duration_ms.into());

        self.log_sync(
            "PROBE",
            "probe_end",
            &format!("Probe completed: {} ({}ms)", result, duration_ms),
            Some(correlation_id),
            fields,
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Short id tying together the log records of one probe
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

pub fn get_debug_logger() -> DebugLogger {
    DebugLogger::new()
}
