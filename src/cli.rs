use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "alertr")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Probe HTTP(S) endpoints and alert a chat webhook on failure")]
pub struct Cli {
    /// Slack webhook URL
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub webhook: Option<String>,

    /// Channel to notify
    #[arg(long, env = "SLACK_CHANNEL")]
    pub channel: Option<String>,

    /// Who to mention in the message
    #[arg(long, env = "MENTION")]
    pub mention: Option<String>,

    /// URLs to monitor: url[;addr=override](,url[;addr=override])*
    #[arg(long, env = "ENDPOINTS")]
    pub endpoints: Option<String>,

    /// SOCKS5 proxy to test via (host:port)
    #[arg(long = "test-via", env = "TEST_VIA")]
    pub test_via: Option<String>,

    /// Timeout for testing, e.g. 20s or 1m30s
    #[arg(long = "test-timeout", env = "TEST_TIMEOUT")]
    pub test_timeout: Option<String>,

    /// TOML config file (default: ~/.config/alertr/config.toml if present)
    #[arg(short = 'c', long, env = "ALERTR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Validate configuration, list targets and exit without probing
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
