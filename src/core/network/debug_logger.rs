use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::network::types::{CycleReport, ProbeOutcome, ProbeResponse};

// Rotation policy
const DEFAULT_ROTATION_BYTES: u64 = 8 * 1024 * 1024;
pub const MAX_ARCHIVES: usize = 5;

pub const DEBUG_ENV_VAR: &str = "ALERTR_DEBUG";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,                          // ISO-8601 with timezone
    pub level: String,                              // INFO, ERROR, PROBE, ALERT, DEBUG
    pub component: String,                          // Component name
    pub event: String,                              // Event type
    pub message: String,                            // Human readable message (redacted)
    pub correlation_id: Option<String>,             // Run or probe id
    pub fields: HashMap<String, serde_json::Value>, // Structured data
}

/// Append-only JSONL file that is gzipped away once it reaches `max_bytes`
struct RotatingLogger {
    log_path: PathBuf,
    max_bytes: u64,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        Self {
            log_path,
            max_bytes: DEFAULT_ROTATION_BYTES,
        }
    }

    fn append(&self, json_line: &str) -> io::Result<()> {
        if self.current_size() >= self.max_bytes {
            // A failed rotation must not lose the line
            let _ = self.rotate();
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json_line)
    }

    fn current_size(&self) -> u64 {
        std::fs::metadata(&self.log_path)
            .map(|meta| meta.len())
            .unwrap_or(0)
    }

    /// Scheduler runs may overlap: the process holding the lock rotates, the
    /// others keep appending to whichever file is current.
    fn rotate(&self) -> io::Result<()> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.log_path.with_extension("lock"))?;
        if lock.try_lock_exclusive().is_err() {
            return Ok(());
        }

        let result = if self.current_size() >= self.max_bytes {
            self.archive_current()
        } else {
            Ok(())
        };
        let _ = FileExt::unlock(&lock);
        result
    }

    fn archive_current(&self) -> io::Result<()> {
        let staging = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &staging)?;

        let mut encoder = GzEncoder::new(File::create(self.next_archive_path())?, Compression::default());
        io::copy(&mut BufReader::new(File::open(&staging)?), &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&staging)?;

        self.prune_archives()
    }

    fn base_name(&self) -> String {
        self.log_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "alertr-debug".to_string())
    }

    fn log_dir(&self) -> &Path {
        self.log_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// `<stem>.<timestamp>.gz`; names sort oldest first
    fn next_archive_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();
        let base = self.base_name();
        let mut path = self.log_dir().join(format!("{}.{}.gz", base, stamp));
        let mut n = 1;
        while path.exists() {
            path = self.log_dir().join(format!("{}.{}_{:03}.gz", base, stamp, n));
            n += 1;
        }
        path
    }

    fn archives(&self) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{}.", self.base_name());
        let mut archives: Vec<PathBuf> = std::fs::read_dir(self.log_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy())
                    .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".gz"))
            })
            .collect();
        archives.sort();
        Ok(archives)
    }

    fn prune_archives(&self) -> io::Result<()> {
        let archives = self.archives()?;
        let excess = archives.len().saturating_sub(MAX_ARCHIVES);
        for path in &archives[..excess] {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

/// Probe lifecycle logger
///
/// Every event is echoed as a plain `YYYY/MM/DD HH:MM:SS message` line on
/// stderr. With `ALERTR_DEBUG` enabled, events are also appended as JSON Lines
/// to `~/.alertr/alertr-debug.log`.
pub struct EventLogger {
    stderr: bool,
    rotating_logger: Option<Mutex<RotatingLogger>>,
    run_id: String,
    redaction_patterns: Vec<(Regex, &'static str)>,
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogger {
    pub fn new() -> Self {
        let log_path = if Self::parse_debug_enabled() {
            Some(Self::default_log_path())
        } else {
            None
        };
        Self::build(true, log_path)
    }

    /// Logger writing JSON Lines to `log_path` regardless of `ALERTR_DEBUG`
    pub fn with_log_path(log_path: PathBuf) -> Self {
        Self::build(true, Some(log_path))
    }

    /// Logger that drops everything
    pub fn silent() -> Self {
        Self::build(false, None)
    }

    /// Disable the stderr echo
    pub fn without_stderr(mut self) -> Self {
        self.stderr = false;
        self
    }

    /// Rotate the log file once it reaches `max_bytes` (default 8 MB)
    pub fn with_rotation_size(mut self, max_bytes: u64) -> Self {
        if let Some(logger) = self.rotating_logger.as_mut() {
            if let Ok(logger) = logger.get_mut() {
                logger.max_bytes = max_bytes;
            }
        }
        self
    }

    fn build(stderr: bool, log_path: Option<PathBuf>) -> Self {
        Self {
            stderr,
            rotating_logger: log_path.map(|path| Mutex::new(RotatingLogger::new(path))),
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    /// Supports: true/false, 1/0, yes/no, on/off (case insensitive)
    fn parse_debug_enabled() -> bool {
        env::var(DEBUG_ENV_VAR)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn default_log_path() -> PathBuf {
        let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        log_path.push(".alertr");
        log_path.push("alertr-debug.log");
        log_path
    }

    fn compile_redaction_patterns() -> Vec<(Regex, &'static str)> {
        let patterns = [
            (r"hooks\.slack\.com/services/[^\s)]+", "hooks.slack.com/services/[REDACTED]"),
            (r"://[^/\s:@]+:[^/\s@]+@", "://[REDACTED]@"),
            (r"(?i)bearer[:\s]+[^\s]+", "[REDACTED]"),
            (r"(?i)token[=:\s]+[^\s&]+", "[REDACTED]"),
            (r"(?i)password[=:\s]+[^\s&]+", "[REDACTED]"),
            (r"(?i)secret[=:\s]+[^\s&]+", "[REDACTED]"),
        ];

        patterns
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| (regex, *replacement))
            })
            .collect()
    }

    /// Strip webhook paths, URL credentials and token-like values
    pub fn redact(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for (regex, replacement) in &self.redaction_patterns {
            redacted = regex.replace_all(&redacted, *replacement).to_string();
        }
        redacted
    }

    fn log(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, serde_json::Value>,
    ) {
        let message = self.redact(message);

        // DEBUG events only go to the file
        if self.stderr && level != "DEBUG" {
            eprintln!("{} {}", Local::now().format("%Y/%m/%d %H:%M:%S"), message);
        }

        let Some(logger) = &self.rotating_logger else {
            return;
        };

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message,
            correlation_id: correlation_id.or_else(|| Some(self.run_id.clone())),
            fields,
        };

        if let Ok(logger) = logger.lock() {
            if let Ok(json_line) = serde_json::to_string(&entry) {
                let _ = logger.append(&json_line); // Don't crash on logging errors
            }
        }
    }

    pub fn info(&self, component: &str, event: &str, message: &str) {
        self.log("INFO", component, event, message, None, HashMap::new());
    }

    pub fn error(&self, component: &str, event: &str, message: &str) {
        self.log("ERROR", component, event, message, None, HashMap::new());
    }

    // Typed methods for probe lifecycle events

    pub fn probe_start(&self, target: &str, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("target".to_string(), serde_json::Value::String(self.redact(target)));

        self.log(
            "PROBE",
            "ProbeExecutor",
            "probe_start",
            &format!("Checking {}", target),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn probe_retry(&self, target: &str, attempt: u32, error: &str, delay_ms: u64, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("attempt".to_string(), serde_json::Value::Number(attempt.into()));
        fields.insert("delay_ms".to_string(), serde_json::Value::Number(delay_ms.into()));

        self.log(
            "PROBE",
            "ProbeExecutor",
            "probe_retry",
            &format!(
                "Attempt {} fetching {} failed: {} (retrying in {}ms)",
                attempt, target, error, delay_ms
            ),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    /// Per-attempt response details, file only
    pub fn probe_response(&self, target: &str, response: &ProbeResponse, correlation_id: &str) {
        let response_ms = response.duration.as_millis() as u64;
        let mut fields = HashMap::new();
        fields.insert("http_status".to_string(), serde_json::Value::Number(response.status_code.into()));
        fields.insert("response_ms".to_string(), serde_json::Value::Number(response_ms.into()));
        if let Some(error) = &response.body_error {
            fields.insert("body_error".to_string(), serde_json::Value::String(self.redact(error)));
        }

        let message = match &response.body_error {
            Some(error) => format!(
                "{} answered {} in {}ms, body not drained: {}",
                target, response.status_code, response_ms, error
            ),
            None => format!("{} answered {} in {}ms", target, response.status_code, response_ms),
        };

        self.log(
            "DEBUG",
            "ProbeClient",
            "probe_response",
            &message,
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn probe_end(&self, target: &str, outcome: &ProbeOutcome, duration_ms: u64, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("outcome".to_string(), serde_json::Value::String(outcome.label().to_string()));
        fields.insert("duration_ms".to_string(), serde_json::Value::Number(duration_ms.into()));
        if let Some(code) = outcome.status_code() {
            fields.insert("http_status".to_string(), serde_json::Value::Number(code.into()));
        }
        if let ProbeOutcome::TransportFailure { attempts, .. } = outcome {
            fields.insert("attempts".to_string(), serde_json::Value::Number((*attempts).into()));
        }

        let (level, message) = match outcome {
            ProbeOutcome::Success { status } => (
                "PROBE",
                format!("Fetched {}: status {} ({}ms)", target, status, duration_ms),
            ),
            ProbeOutcome::TransportFailure { error, .. } => {
                ("ERROR", format!("Error fetching {}: {}", target, error))
            }
            ProbeOutcome::HttpError { status } => (
                "ERROR",
                format!("Error fetching {}: got status {}", target, status),
            ),
        };

        self.log(
            level,
            "ProbeExecutor",
            "probe_end",
            &message,
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn alert_failed(&self, error: &str, correlation_id: &str) {
        self.log(
            "ERROR",
            "AlertSink",
            "alert_failed",
            &format!("Error posting webhook: {}", error),
            Some(correlation_id.to_string()),
            HashMap::new(),
        );
    }

    pub fn alert_sent(&self, correlation_id: &str) {
        self.log(
            "ALERT",
            "AlertSink",
            "alert_sent",
            "Alert delivered",
            Some(correlation_id.to_string()),
            HashMap::new(),
        );
    }

    pub fn cycle_summary(&self, report: &CycleReport) {
        let mut fields = HashMap::new();
        fields.insert("probed".to_string(), serde_json::Value::Number(report.probed.into()));
        fields.insert("failures".to_string(), serde_json::Value::Number(report.failures.into()));
        fields.insert("alerts_sent".to_string(), serde_json::Value::Number(report.alerts_sent.into()));
        fields.insert("alerts_failed".to_string(), serde_json::Value::Number(report.alerts_failed.into()));

        self.log(
            "INFO",
            "ProbeExecutor",
            "cycle_complete",
            &format!(
                "Checked {} endpoints: {} failing, {} alerts sent, {} alerts failed",
                report.probed, report.failures, report.alerts_sent, report.alerts_failed
            ),
            None,
            fields,
        );
    }

    pub fn is_file_enabled(&self) -> bool {
        self.rotating_logger.is_some()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

// Factory function mirroring the env-driven default
pub fn get_debug_logger() -> EventLogger {
    EventLogger::new()
}
