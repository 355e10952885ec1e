// Core types for endpoint probing
use std::fmt;
use std::time::Duration;

/// Transport-level probe failure. These are the only errors the retry loop retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Override hostname could not be resolved to a socket address
    #[error("resolving override address {host}: {reason}")]
    Resolve { host: String, reason: String },
    /// Connection, TLS, timeout or any other failure before a response arrived
    #[error("{0}")]
    Transport(String),
}

/// Response obtained by a single probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status_code: u16,
    /// Time to response headers
    pub duration: Duration,
    /// Set when the body could not be read to the end; the status still counts
    pub body_error: Option<String>,
}

/// Classified result of one probe cycle for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A response with status < 400
    Success { status: u16 },
    /// No response before the backoff ceiling; carries the last error
    TransportFailure { error: ProbeError, attempts: u32 },
    /// A response with status >= 400
    HttpError { status: u16 },
}

impl ProbeOutcome {
    /// Classify an obtained response by status code
    pub fn from_status(status: u16) -> Self {
        if status >= 400 {
            ProbeOutcome::HttpError { status }
        } else {
            ProbeOutcome::Success { status }
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Success { status } | ProbeOutcome::HttpError { status } => Some(*status),
            ProbeOutcome::TransportFailure { .. } => None,
        }
    }

    /// Short label used in structured log fields
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Success { .. } => "success",
            ProbeOutcome::TransportFailure { .. } => "transport_failure",
            ProbeOutcome::HttpError { .. } => "http_error",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success { status } => write!(f, "got status {}", status),
            ProbeOutcome::TransportFailure { error, .. } => write!(f, "{}", error),
            ProbeOutcome::HttpError { status } => write!(f, "got status {}", status),
        }
    }
}

/// Totals for one pass over all targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub probed: usize,
    pub failures: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}
