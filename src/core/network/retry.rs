/*!
Exponential backoff retry with jitter and an elapsed-time ceiling.

`retry` knows nothing about HTTP: it re-runs any async operation returning a
`Result` until it succeeds or the policy gives up. Timing uses tokio's clock,
so tests can drive the full 30 second ceiling under paused time.
*/

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Backoff configuration for a single probe
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure (before jitter)
    pub initial_interval: Duration,
    /// Cap for the un-jittered delay
    pub max_interval: Duration,
    /// Growth factor applied after every failure
    pub multiplier: f64,
    /// Jitter range: delay is picked from `[d * (1 - r), d * (1 + r)]`
    pub randomization_factor: f64,
    /// Ceiling measured from the first attempt
    pub max_elapsed_time: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
            randomization_factor: 0.5,
            max_elapsed_time: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Policy parameterised by base interval, cap and ceiling with default jitter
    pub fn new(initial_interval: Duration, max_interval: Duration, max_elapsed_time: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            max_elapsed_time,
            ..Self::default()
        }
    }

    /// Same policy without jitter, for deterministic delays
    pub fn without_jitter(mut self) -> Self {
        self.randomization_factor = 0.0;
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_interval)
    }

    fn jittered(&self, interval: Duration) -> Duration {
        if self.randomization_factor <= 0.0 {
            return interval;
        }
        let delta = interval.as_secs_f64() * self.randomization_factor;
        let low = (interval.as_secs_f64() - delta).max(0.0);
        let high = interval.as_secs_f64() + delta;
        Duration::from_secs_f64(rand::thread_rng().gen_range(low..=high))
    }
}

/// Retry loop gave up; carries the error of the final attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted<E> {
    pub last_error: E,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `operation` until it succeeds or `policy` gives up
///
/// After each failure the next delay is computed; if sleeping it would push the
/// total elapsed time past `max_elapsed_time`, the loop stops and returns the
/// last error. `on_retry` is called before every sleep with the attempt
/// number, the error and the upcoming delay.
pub async fn retry_notify<T, E, F, Fut, N>(
    policy: &BackoffPolicy,
    mut operation: F,
    mut on_retry: N,
) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(u32, &E, Duration),
{
    let start = Instant::now();
    let mut interval = policy.initial_interval;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let delay = policy.jittered(interval);
        let elapsed = start.elapsed();
        if elapsed + delay > policy.max_elapsed_time {
            return Err(Exhausted {
                last_error: error,
                attempts,
                elapsed,
            });
        }

        on_retry(attempts, &error, delay);
        tokio::time::sleep(delay).await;
        interval = policy.next_interval(interval);
    }
}

/// `retry_notify` without a retry callback
pub async fn retry<T, E, F, Fut>(policy: &BackoffPolicy, operation: F) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_notify(policy, operation, |_, _, _| {}).await
}
