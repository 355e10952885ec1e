//! Endpoint Spec Parsing
//!
//! Turns the `ENDPOINTS` configuration string into an ordered list of probe
//! targets:
//! - `https://host/path` probes the URL directly
//! - `https://host/path;addr=10.0.0.1` probes the URL but connects to `addr`

use std::fmt;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("splitting {entry} on ; didn't give 1 or 2 results (got {parts})")]
    InvalidSplit { entry: String, parts: usize },
    #[error("parsing {entry}: {source}")]
    InvalidUrl {
        entry: String,
        #[source]
        source: url::ParseError,
    },
    #[error("parsing {entry}: unsupported scheme {scheme:?}, expected http or https")]
    UnsupportedScheme { entry: String, scheme: String },
    #[error("parsing {entry}: missing host")]
    MissingHost { entry: String },
}

/// A single endpoint to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    url: Url,
    override_addr: Option<String>,
}

impl ProbeTarget {
    /// Create a target, dropping an empty override address
    pub fn new(url: Url, override_addr: Option<String>) -> Self {
        Self {
            url,
            override_addr: override_addr.filter(|addr| !addr.is_empty()),
        }
    }

    /// Logical request target (Host header and TLS identity)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Address the TCP connection should land on instead of the URL host
    pub fn override_addr(&self) -> Option<&str> {
        self.override_addr.as_deref()
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.override_addr {
            Some(addr) => write!(f, "{} (addr: {})", self.url, addr),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Parse a comma-separated endpoint list
///
/// # Format
/// `entry(,entry)*` where `entry := URL | URL;key=value(&key=value)*`.
/// Only the `addr` key is interpreted; other keys are ignored.
///
/// # Returns
/// * `Ok(Vec<ProbeTarget>)` - Targets in input order, duplicates preserved
/// * `Err(EndpointError)` - First malformed entry
pub fn parse_endpoints(spec: &str) -> Result<Vec<ProbeTarget>, EndpointError> {
    spec.split(',').map(parse_entry).collect()
}

fn parse_entry(raw: &str) -> Result<ProbeTarget, EndpointError> {
    let entry = raw.trim();
    let parts: Vec<&str> = entry.split(';').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(EndpointError::InvalidSplit {
            entry: entry.to_string(),
            parts: parts.len(),
        });
    }

    let url = Url::parse(parts[0]).map_err(|source| EndpointError::InvalidUrl {
        entry: entry.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(EndpointError::UnsupportedScheme {
            entry: entry.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(EndpointError::MissingHost {
            entry: entry.to_string(),
        });
    }

    let override_addr = parts.get(1).and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "addr")
            .map(|(_, value)| value.into_owned())
    });

    Ok(ProbeTarget::new(url, override_addr))
}
