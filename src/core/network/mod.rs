pub mod client;
pub mod debug_logger;
pub mod dialer;
pub mod endpoint;
pub mod executor;
pub mod retry;
pub mod types;

// Re-export commonly used items
pub use client::{IsahcProbeClient, ProbeClient, ProbeClientFactory};
pub use debug_logger::{get_debug_logger, EventLogger};
pub use dialer::{DialTarget, DialerError, DialerResolver, ProxySpec};
pub use endpoint::{parse_endpoints, EndpointError, ProbeTarget};
pub use executor::{alert_message, ProbeExecutor};
pub use retry::{retry, retry_notify, BackoffPolicy, Exhausted};
pub use types::*;
