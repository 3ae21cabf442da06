//! For reading application configuration.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

/// Application configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The environment the service runs in.
    pub environment: Environment,
    /// Server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub log: LogConfig,
}

/// The name of the environment the service runs in, such as `development` or `production`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
    /// The environment in which error details are shown to clients.
    pub const DEVELOPMENT: &'static str = "development";

    /// Constructs an environment with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The environment name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether error responses may include the underlying error message.
    pub fn discloses_error_details(&self) -> bool {
        self.0 == Self::DEVELOPMENT
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(Self::DEVELOPMENT)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address.
    pub address: String,
    /// Server http port.
    pub port: u16,
    /// How long a request may take before it is aborted.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Maximum number of requests handled at once.
    pub max_concurrent_requests: usize,
}

impl ServerConfig {
    /// The `address:port` pair to bind to.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(10),
            body_limit: 100 * 1024,
            max_concurrent_requests: 500,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// An [`EnvFilter`](tracing_subscriber::EnvFilter) directive. `RUST_LOG` takes precedence.
    pub filter: String,
    /// Output format on stdout.
    pub format: LogFormat,
    /// If set, logs are also written as JSON to hourly rolling files in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug,item_store=debug".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Retrieve [`Config`].
///
/// Sources, lowest precedence first: built-in defaults, an optional `config` file,
/// `APP__`-prefixed environment variables, and finally `PORT` and `ENVIRONMENT`.
/// A `.env` file is loaded into the environment first, if present.
#[tracing::instrument]
pub fn load_config() -> Result<Config, config::ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(config::ConfigError::Foreign(Box::new(e)));
        }
    }
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("app")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.port", std::env::var("PORT").ok())?
        .set_override_option("environment", std::env::var("ENVIRONMENT").ok())?
        .build()?
        .try_deserialize()?;
    Ok(config)
}
