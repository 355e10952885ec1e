/*!
Probe execution: one GET per target with bounded retry, outcome
classification and alert dispatch.

## Sequencing

Targets are probed one at a time in configuration order. A slow target delays
the rest; nothing is cancelled because an earlier target failed.

## Classification

- Transport failure until the backoff ceiling: `TransportFailure` (alert)
- Response with status >= 400: `HttpError` (alert, never retried)
- Any other response: `Success`

Alert delivery failures are logged and counted, never propagated.
*/

use crate::core::alert::AlertSink;
use crate::core::network::client::ProbeClientFactory;
use crate::core::network::debug_logger::EventLogger;
use crate::core::network::endpoint::ProbeTarget;
use crate::core::network::retry::{retry_notify, BackoffPolicy};
use crate::core::network::types::{CycleReport, ProbeOutcome};
use std::time::Instant;
use uuid::Uuid;

/// Format the alert text for a failed outcome; `None` for success
///
/// An empty mention drops the prefix entirely.
pub fn alert_message(mention: &str, target: &ProbeTarget, outcome: &ProbeOutcome) -> Option<String> {
    let body = match outcome {
        ProbeOutcome::Success { .. } => return None,
        ProbeOutcome::TransportFailure { error, .. } => {
            format!("Error fetching {}: {}", target, error)
        }
        ProbeOutcome::HttpError { status } => {
            format!("Error fetching {}, got status {}", target, status)
        }
    };

    let mention = mention.trim();
    if mention.is_empty() {
        Some(body)
    } else {
        Some(format!("{} {}", mention, body))
    }
}

/// Runs probe cycles against a client factory and alert sink
pub struct ProbeExecutor {
    clients: Box<dyn ProbeClientFactory>,
    sink: Box<dyn AlertSink>,
    logger: EventLogger,
    policy: BackoffPolicy,
    mention: String,
}

impl ProbeExecutor {
    pub fn new(clients: Box<dyn ProbeClientFactory>, sink: Box<dyn AlertSink>) -> Self {
        Self {
            clients,
            sink,
            logger: EventLogger::silent(),
            policy: BackoffPolicy::default(),
            mention: String::new(),
        }
    }

    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Override the backoff policy (tests use short ceilings)
    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        self.mention = mention.into();
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Probe a target and classify the result, without alerting
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        self.probe_with_id(target, self.logger.run_id()).await
    }

    async fn probe_with_id(&self, target: &ProbeTarget, correlation_id: &str) -> ProbeOutcome {
        let client = self.clients.client_for(target);
        let label = target.to_string();

        let result = retry_notify(
            &self.policy,
            || client.get(target.url()),
            |attempt, error, delay| {
                self.logger.probe_retry(
                    &label,
                    attempt,
                    &error.to_string(),
                    delay.as_millis() as u64,
                    correlation_id,
                );
            },
        )
        .await;

        match result {
            Ok(response) => {
                self.logger.probe_response(&label, &response, correlation_id);
                ProbeOutcome::from_status(response.status_code)
            }
            Err(exhausted) => ProbeOutcome::TransportFailure {
                error: exhausted.last_error,
                attempts: exhausted.attempts,
            },
        }
    }

    /// Probe one target and alert on failure
    ///
    /// # Returns
    /// The outcome plus whether an alert was attempted and delivered:
    /// `None` for success, `Some(true)` delivered, `Some(false)` sink failed.
    pub async fn check(&self, target: &ProbeTarget) -> (ProbeOutcome, Option<bool>) {
        let correlation_id = Uuid::new_v4().to_string()[..8].to_string();
        let label = target.to_string();
        let start = Instant::now();

        self.logger.probe_start(&label, &correlation_id);
        let outcome = self.probe_with_id(target, &correlation_id).await;
        self.logger.probe_end(
            &label,
            &outcome,
            start.elapsed().as_millis() as u64,
            &correlation_id,
        );

        let Some(message) = alert_message(&self.mention, target, &outcome) else {
            return (outcome, None);
        };

        let delivered = match self.sink.notify(&message).await {
            Ok(()) => {
                self.logger.alert_sent(&correlation_id);
                true
            }
            Err(e) => {
                self.logger.alert_failed(&e.to_string(), &correlation_id);
                false
            }
        };

        (outcome, Some(delivered))
    }

    /// Probe every target once, in order
    pub async fn run_cycle(&self, targets: &[ProbeTarget]) -> CycleReport {
        let mut report = CycleReport::default();

        for target in targets {
            let (outcome, alert) = self.check(target).await;
            report.probed += 1;
            if outcome.is_failure() {
                report.failures += 1;
            }
            match alert {
                Some(true) => report.alerts_sent += 1,
                Some(false) => report.alerts_failed += 1,
                None => {}
            }
        }

        self.logger.cycle_summary(&report);
        report
    }
}
