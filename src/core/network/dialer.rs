//! Dialer Resolution
//!
//! Decides where a probe's TCP connection lands:
//! - Direct: resolve the URL host as usual
//! - Override: connect to `addr:port` while keeping the URL host for Host/SNI
//! - Proxied: tunnel through a SOCKS5 proxy, override still used as destination

use crate::core::network::client::{IsahcProbeClient, ProbeClient, ProbeClientFactory};
use crate::core::network::endpoint::ProbeTarget;
use crate::core::network::types::ProbeError;
use isahc::config::{Configurable, RedirectPolicy};
use isahc::http::Uri;
use isahc::HttpClient;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const MAX_REDIRECTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum DialerError {
    #[error("invalid SOCKS5 proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },
    #[error("creating probe HTTP client: {0}")]
    ClientBuild(String),
}

/// Host half of an override address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideHost {
    Ip(IpAddr),
    Name(String),
}

/// Address a probe's TCP connection is made to when an override is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    host: OverrideHost,
    port: u16,
}

impl DialTarget {
    pub fn new(override_addr: &str, port: u16) -> Self {
        let trimmed = override_addr.trim_start_matches('[').trim_end_matches(']');
        let host = match trimmed.parse::<IpAddr>() {
            Ok(ip) => OverrideHost::Ip(ip),
            Err(_) => OverrideHost::Name(override_addr.to_string()),
        };
        Self { host, port }
    }

    /// Dial target for a probe, or `None` when it has no override address
    ///
    /// The port is the URL's explicit port, else 443 for https and 80 otherwise.
    pub fn for_target(target: &ProbeTarget) -> Option<Self> {
        let addr = target.override_addr()?;
        let url = target.url();
        let port = url
            .port()
            .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });
        Some(Self::new(addr, port))
    }

    pub fn host(&self) -> &OverrideHost {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to a concrete socket address, looking up hostnames if needed
    pub async fn socket_addr(&self) -> Result<SocketAddr, ProbeError> {
        match &self.host {
            OverrideHost::Ip(ip) => Ok(SocketAddr::new(*ip, self.port)),
            OverrideHost::Name(name) => {
                let mut addrs = tokio::net::lookup_host((name.as_str(), self.port))
                    .await
                    .map_err(|e| ProbeError::Resolve {
                        host: name.clone(),
                        reason: e.to_string(),
                    })?;
                addrs.next().ok_or_else(|| ProbeError::Resolve {
                    host: name.clone(),
                    reason: "no addresses returned".to_string(),
                })
            }
        }
    }
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            OverrideHost::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            OverrideHost::Ip(IpAddr::V4(ip)) => write!(f, "{}:{}", ip, self.port),
            OverrideHost::Name(name) => write!(f, "{}:{}", name, self.port),
        }
    }
}

/// Validated SOCKS5 proxy address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySpec {
    host: String,
    port: u16,
}

impl ProxySpec {
    /// Parse `host:port`, `socks5://host:port` or `socks5h://host:port`
    pub fn parse(raw: &str) -> Result<Self, DialerError> {
        let invalid = |reason: &str| DialerError::InvalidProxy {
            proxy: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let authority = match trimmed.split_once("://") {
            Some((scheme, rest)) => {
                if !scheme.eq_ignore_ascii_case("socks5") && !scheme.eq_ignore_ascii_case("socks5h")
                {
                    return Err(invalid(&format!("unsupported scheme {:?}", scheme)));
                }
                rest.trim_end_matches('/')
            }
            None => trimmed,
        };

        if authority.contains(['/', '@', '?', '#']) {
            return Err(invalid("expected host:port"));
        }
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("invalid port"))?;
        if port == 0 {
            return Err(invalid("invalid port"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Proxy URI handed to curl. `socks5h` keeps name resolution on the proxy.
    pub fn uri(&self) -> Result<Uri, DialerError> {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("socks5h://{}:{}", host, self.port)
            .parse::<Uri>()
            .map_err(|e| DialerError::InvalidProxy {
                proxy: self.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for ProxySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Builds per-target probe clients sharing one configured isahc client
pub struct DialerResolver {
    client: HttpClient,
    proxy: Option<ProxySpec>,
    timeout: Duration,
}

impl DialerResolver {
    /// Construct the shared probe client
    ///
    /// # Errors
    /// Returns `DialerError` if the proxy URI or the client cannot be built.
    /// This is a startup failure, never a per-probe condition.
    pub fn new(proxy: Option<ProxySpec>, timeout: Duration) -> Result<Self, DialerError> {
        let mut builder = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect_policy(RedirectPolicy::Limit(MAX_REDIRECTS));

        if let Some(proxy) = &proxy {
            builder = builder.proxy(Some(proxy.uri()?));
        }

        let client = builder.build().map_err(|e| match &proxy {
            Some(proxy) => DialerError::InvalidProxy {
                proxy: proxy.to_string(),
                reason: e.to_string(),
            },
            None => DialerError::ClientBuild(e.to_string()),
        })?;

        Ok(Self {
            client,
            proxy,
            timeout,
        })
    }

    pub fn proxy(&self) -> Option<&ProxySpec> {
        self.proxy.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe client bound to `target`'s dial address
    pub fn build_client(&self, target: &ProbeTarget) -> IsahcProbeClient {
        IsahcProbeClient::new(self.client.clone(), DialTarget::for_target(target))
    }
}

impl ProbeClientFactory for DialerResolver {
    fn client_for(&self, target: &ProbeTarget) -> Box<dyn ProbeClient> {
        Box::new(self.build_client(target))
    }
}
