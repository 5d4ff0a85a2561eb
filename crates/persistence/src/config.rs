//! Repository and connection configuration.
//!
//! Options can be built programmatically, deserialized with serde, or read
//! from the environment with [`ElasticOptions::from_env`].
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ELASTIC_URI` | http://localhost:9200 | Node URL |
//! | `ELASTIC_CLOUD_ID` | | Elastic Cloud deployment id (takes precedence over the URI) |
//! | `ELASTIC_USERNAME` | | Basic auth user |
//! | `ELASTIC_PASSWORD` | | Basic auth password |
//! | `ELASTIC_REQUEST_TIMEOUT_MS` | 120000 | Request timeout |
//! | `ELASTIC_INDEX` | | Index (or rollover alias) name |
//! | `ELASTIC_USE_ROLLOVER_ALIAS` | false | Write through a rollover alias |
//! | `ELASTIC_PATTERN` | index | Physical index name pattern |
//! | `ELASTIC_MAX_SIZE_GB` | 10 | Rollover size threshold |
//! | `ELASTIC_MAX_DOCUMENTS` | | Rollover document threshold |
//! | `ELASTIC_MAX_INNER_RESULT_WINDOW` | 1000 | Inner hits window |
//! | `ELASTIC_RETRIES` | 5 | Attempts per engine call |
//! | `ELASTIC_BULK_CHUNK_SIZE` | 50000 | Documents per bulk request |
//! | `ELASTIC_REFRESH_INTERVAL_MS` | 1000 | Refresh interval restored after bulk loads |
//! | `ELASTIC_RETRY_TRANSIENT_ONLY` | false | Retry only transport, 429 and 5xx errors |

use std::time::Duration;

use clap::{Args, Parser};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Connection settings for the engine client.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct ConnectionConfig {
    /// Node URL.
    #[arg(long = "uri", env = "ELASTIC_URI", default_value = "http://localhost:9200")]
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Elastic Cloud deployment id. Requires basic credentials.
    #[arg(long = "cloud-id", env = "ELASTIC_CLOUD_ID")]
    #[serde(default)]
    pub cloud_id: Option<String>,

    /// Basic auth user.
    #[arg(long = "username", env = "ELASTIC_USERNAME")]
    #[serde(default)]
    pub user_name: Option<String>,

    /// Basic auth password.
    #[arg(long = "password", env = "ELASTIC_PASSWORD")]
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "ELASTIC_REQUEST_TIMEOUT_MS", default_value = "120000")]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_uri() -> String {
    "http://localhost:9200".to_string()
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            cloud_id: None,
            user_name: None,
            password: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the basic credentials when both parts are set and non-empty.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (self.user_name.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }

    /// Validates the connection settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.cloud_id.as_deref() {
            Some(cloud_id) if !cloud_id.is_empty() => {
                if self.basic_credentials().is_none() {
                    return Err(ConfigError::MissingField {
                        field: "user_name/password",
                    });
                }
            }
            _ => {
                if self.uri.trim().is_empty() {
                    return Err(ConfigError::MissingField { field: "uri" });
                }
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                message: "cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Options consumed by a repository.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct RepositoryOptions {
    /// Index name, or the rollover alias when `use_rollover_alias` is set.
    #[arg(long, env = "ELASTIC_INDEX", default_value = "")]
    #[serde(default)]
    pub index: String,

    /// Write through a rollover alias spanning several physical indices.
    #[arg(long, env = "ELASTIC_USE_ROLLOVER_ALIAS", default_value_t = false)]
    #[serde(default)]
    pub use_rollover_alias: bool,

    /// Physical index name pattern (default: the index name).
    #[arg(long, env = "ELASTIC_PATTERN")]
    #[serde(default)]
    pub pattern: Option<String>,

    /// Rollover size threshold in gigabytes.
    #[arg(long, env = "ELASTIC_MAX_SIZE_GB", default_value = "10")]
    #[serde(default = "default_max_size_gb")]
    pub max_size_gb: u32,

    /// Rollover document count threshold.
    #[arg(long, env = "ELASTIC_MAX_DOCUMENTS")]
    #[serde(default)]
    pub max_documents: Option<u64>,

    /// Inner hits window for nested queries (`index.max_inner_result_window`).
    #[arg(long, env = "ELASTIC_MAX_INNER_RESULT_WINDOW", default_value = "1000")]
    #[serde(default = "default_max_inner_result_window")]
    pub max_inner_result_window: u32,

    /// Attempts per engine call.
    #[arg(long, env = "ELASTIC_RETRIES", default_value = "5")]
    #[serde(default = "default_nb_retries_call")]
    pub nb_retries_call: u32,

    /// Documents per bulk request.
    #[arg(long, env = "ELASTIC_BULK_CHUNK_SIZE", default_value = "50000")]
    #[serde(default = "default_bulk_chunk_size")]
    pub bulk_chunk_size: usize,

    /// Refresh interval restored after bulk loads, in milliseconds.
    #[arg(long, env = "ELASTIC_REFRESH_INTERVAL_MS", default_value = "1000")]
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Retry only transport, throttling and server errors.
    #[arg(long, env = "ELASTIC_RETRY_TRANSIENT_ONLY", default_value_t = false)]
    #[serde(default)]
    pub retry_transient_only: bool,
}

/// Rendered `max_docs` when no document threshold is configured.
pub const DEFAULT_MAX_DOCUMENTS: u64 = 2_147_483_647;

fn default_max_size_gb() -> u32 {
    10
}

fn default_max_inner_result_window() -> u32 {
    1000
}

fn default_nb_retries_call() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_bulk_chunk_size() -> usize {
    50_000
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            index: String::new(),
            use_rollover_alias: false,
            pattern: None,
            max_size_gb: default_max_size_gb(),
            max_documents: None,
            max_inner_result_window: default_max_inner_result_window(),
            nb_retries_call: default_nb_retries_call(),
            bulk_chunk_size: default_bulk_chunk_size(),
            refresh_interval_ms: default_refresh_interval_ms(),
            retry_transient_only: false,
        }
    }
}

impl RepositoryOptions {
    /// Creates options for the given index with every other value defaulted.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    /// Returns the physical index pattern (the index name when unset).
    pub fn pattern(&self) -> &str {
        match self.pattern.as_deref() {
            Some(pattern) if !pattern.is_empty() => pattern,
            _ => &self.index,
        }
    }

    /// Returns the refresh interval restored after bulk loads.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Validates the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "index" });
        }

        if self.index.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidValue {
                field: "index",
                message: format!("index names must be lowercase, got {}", self.index),
            });
        }

        if self.bulk_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bulk_chunk_size",
                message: "cannot be 0".to_string(),
            });
        }

        if self.use_rollover_alias && self.max_size_gb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_size_gb",
                message: "cannot be 0 with a rollover alias".to_string(),
            });
        }

        Ok(())
    }
}

/// Complete configuration surface: connection plus repository options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "lumen")]
#[command(about = "Elasticsearch repository configuration")]
pub struct ElasticOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub connection: ConnectionConfig,

    #[command(flatten)]
    #[serde(flatten)]
    pub repository: RepositoryOptions,
}

impl ElasticOptions {
    /// Reads the configuration from `ELASTIC_*` environment variables.
    ///
    /// Unset variables take their default. A variable that cannot be parsed
    /// is reported instead of being dropped.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(["lumen"])
    }

    /// Parses command line style arguments, with `ELASTIC_*` variables
    /// filling what the arguments leave out.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| ConfigError::InvalidValue {
            field: "environment",
            message: e.to_string().trim().to_string(),
        })
    }

    /// Validates both halves of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.validate()?;
        self.repository.validate()
    }
}
