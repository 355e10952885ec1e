/*!
Runtime configuration.

Values come from command-line flags, their environment variables, and an
optional TOML file. Precedence is flag > environment > file > default, with
empty strings treated as unset. Everything is validated up front: any error
here is fatal and no probe runs.
*/

pub mod duration;

use crate::cli::Cli;
use crate::core::network::dialer::{DialerError, ProxySpec};
use crate::core::network::endpoint::{parse_endpoints, EndpointError, ProbeTarget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use duration::{parse_duration, DurationError};

pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required (flag, environment variable or config file)")]
    MissingRequired(&'static str),
    #[error("parsing endpoints: {0}")]
    Endpoint(#[from] EndpointError),
    #[error("parsing duration {input}: {source}")]
    Duration {
        input: String,
        #[source]
        source: DurationError,
    },
    #[error("test timeout must be greater than zero (got {0:?})")]
    ZeroTimeout(String),
    #[error(transparent)]
    Dialer(#[from] DialerError),
    #[error("reading config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk configuration, every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub webhook: Option<String>,
    pub channel: Option<String>,
    pub mention: Option<String>,
    pub endpoints: Option<String>,
    pub test_via: Option<String>,
    pub test_timeout: Option<String>,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
}

impl FileConfig {
    /// Default location: `~/.config/alertr/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("alertr").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit path, else the default path if it exists, else nothing
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Fully validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub webhook_url: String,
    pub channel: String,
    pub mention: String,
    pub targets: Vec<ProbeTarget>,
    pub proxy: Option<ProxySpec>,
    pub test_timeout: Duration,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
}

fn pick(flag: &Option<String>, file: &Option<String>) -> Option<String> {
    flag.as_deref()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file.as_deref().filter(|v| !v.trim().is_empty()))
        .map(|v| v.trim().to_string())
}

impl Settings {
    /// Merge CLI (flags and env) over file values and validate
    pub fn resolve(cli: &Cli, file: &FileConfig) -> Result<Self, ConfigError> {
        let webhook_url =
            pick(&cli.webhook, &file.webhook).ok_or(ConfigError::MissingRequired("webhook"))?;
        let endpoints =
            pick(&cli.endpoints, &file.endpoints).ok_or(ConfigError::MissingRequired("endpoints"))?;

        let test_timeout = match pick(&cli.test_timeout, &file.test_timeout) {
            Some(raw) => {
                let timeout = parse_duration(&raw).map_err(|source| ConfigError::Duration {
                    input: raw.clone(),
                    source,
                })?;
                if timeout.is_zero() {
                    return Err(ConfigError::ZeroTimeout(raw));
                }
                timeout
            }
            None => DEFAULT_TEST_TIMEOUT,
        };

        let proxy = pick(&cli.test_via, &file.test_via)
            .map(|raw| ProxySpec::parse(&raw))
            .transpose()?;

        Ok(Self {
            webhook_url,
            channel: pick(&cli.channel, &file.channel).unwrap_or_default(),
            mention: pick(&cli.mention, &file.mention).unwrap_or_default(),
            targets: parse_endpoints(&endpoints)?,
            proxy,
            test_timeout,
            username: file.username.clone(),
            icon_emoji: file.icon_emoji.clone(),
        })
    }

    /// Load the config file named by the CLI (or the default) and resolve
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::discover(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }
}
