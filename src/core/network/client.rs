//! Probe HTTP Client Abstraction
//!
//! `ProbeClient` is the seam between the executor and the network: the isahc
//! implementation performs a real GET, tests substitute scripted clients.

use crate::core::network::dialer::DialTarget;
use crate::core::network::endpoint::ProbeTarget;
use crate::core::network::types::{ProbeError, ProbeResponse};
use isahc::config::{Configurable, Dialer};
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use std::time::Instant;
use url::Url;

/// HTTP client abstraction for dependency injection and testing
#[async_trait::async_trait]
pub trait ProbeClient: Send + Sync {
    /// Issue a single GET. Any response, whatever its status, is `Ok`.
    async fn get(&self, url: &Url) -> Result<ProbeResponse, ProbeError>;
}

/// Builds the client used to probe one target
pub trait ProbeClientFactory: Send + Sync {
    fn client_for(&self, target: &ProbeTarget) -> Box<dyn ProbeClient>;
}

/// Production probe client using isahc, optionally pinned to a dial address
pub struct IsahcProbeClient {
    client: HttpClient,
    dial: Option<DialTarget>,
}

impl IsahcProbeClient {
    /// `client` carries the timeout and proxy; `dial` overrides the TCP destination
    pub fn new(client: HttpClient, dial: Option<DialTarget>) -> Self {
        Self { client, dial }
    }

    pub fn dial_target(&self) -> Option<&DialTarget> {
        self.dial.as_ref()
    }
}

#[async_trait::async_trait]
impl ProbeClient for IsahcProbeClient {
    async fn get(&self, url: &Url) -> Result<ProbeResponse, ProbeError> {
        let start = Instant::now();

        let mut builder = Request::get(url.as_str());
        if let Some(dial) = &self.dial {
            // CONNECT_TO only swaps the socket address; Host and SNI stay on the URL host
            let addr = dial.socket_addr().await?;
            builder = builder.dial(Dialer::ip_socket(addr));
        }
        let request = builder
            .body(())
            .map_err(|e| ProbeError::Transport(format!("creating request: {}", e)))?;

        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status_code = response.status().as_u16();
        let duration = start.elapsed();

        // Drain the body so curl can finish the transfer cleanly
        let body_error = response.bytes().await.err().map(|e| e.to_string());

        Ok(ProbeResponse {
            status_code,
            duration,
            body_error,
        })
    }
}
