//! Configuration management for the relay.
//!
//! Layered the same way throughout: defaults < YAML file < environment
//! variables < CLI arguments. Verbosity is a configuration value threaded
//! into subscriber setup, not process-global mutable state.

use crate::core::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default product descriptions to fetch when none are given.
pub const DEFAULT_PRODUCTS: &str = "Linux/UNIX (Amazon VPC), Windows (Amazon VPC)";

/// Default metric-name prefix.
pub const DEFAULT_PREFIX: &str = "aws.ec2.spot-price";

/// Complete configuration for one relay invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS session and region settings.
    pub aws: AwsConfig,
    /// Price-history fetch settings.
    pub fetch: FetchConfig,
    /// Graphite collector settings.
    pub graphite: GraphiteConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Debug mode (forces debug-level logging).
    #[serde(skip)]
    pub debug: bool,
}

/// AWS session and region settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Explicit access key ID, overriding the environment and profile.
    pub access_key_id: Option<String>,
    /// Explicit secret access key, overriding the environment and profile.
    pub secret_access_key: Option<String>,
    /// Shared-credentials profile to use when no explicit keys are set.
    pub profile: Option<String>,
    /// Region whose EC2 endpoint is queried.
    pub region: String,
}

/// Price-history fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Window size in minutes back from now.
    pub interval_minutes: u64,
    /// Product descriptions to fetch prices for.
    pub products: Vec<String>,
    /// Timeout for each HTTP request to the pricing API.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

/// Graphite collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphiteConfig {
    /// Host running the pickle receiver.
    pub host: String,
    /// Pickle receiver port.
    pub port: u16,
    /// Prefix prepended to every metric path. Empty disables the prefix.
    pub prefix: String,
    /// Timeout for establishing the collector connection.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level threshold.
    pub level: LogLevel,
}

/// Log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(RelayError::config(format!("unknown log level: {other}"))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            aws: AwsConfig::default(),
            fetch: FetchConfig::default(),
            graphite: GraphiteConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        AwsConfig {
            access_key_id: None,
            secret_access_key: None,
            profile: None,
            region: "us-east-1".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            interval_minutes: 1,
            products: DEFAULT_PRODUCTS
                .split(',')
                .map(|p| p.trim().to_string())
                .collect(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for GraphiteConfig {
    fn default() -> Self {
        GraphiteConfig {
            host: "localhost".to_string(),
            port: 2004,
            prefix: DEFAULT_PREFIX.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Error,
        }
    }
}

impl Config {
    /// Create new config with defaults.
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.interval_minutes == 0 {
            return Err(RelayError::config("interval must be at least 1 minute"));
        }

        if self.fetch.products.is_empty() {
            return Err(RelayError::config(
                "at least one product description is required",
            ));
        }

        if self.fetch.products.iter().any(|p| p.trim().is_empty()) {
            return Err(RelayError::config("product descriptions must be non-empty"));
        }

        if self.aws.region.is_empty() {
            return Err(RelayError::config("region must be non-empty"));
        }

        if self.graphite.host.is_empty() {
            return Err(RelayError::config("graphite host must be non-empty"));
        }

        if self.graphite.port == 0 {
            return Err(RelayError::config("graphite port must be non-zero"));
        }

        // Explicit credentials must come as a pair.
        match (&self.aws.access_key_id, &self.aws.secret_access_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(RelayError::config(
                    "access key ID and secret access key must both be set or both be unset",
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// EC2 Query API endpoint host for the configured region.
    pub fn ec2_endpoint(&self) -> String {
        format!("ec2.{}.amazonaws.com", self.aws.region)
    }
}

/// Configuration builder for programmatic construction.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| RelayError::config(format!("failed to parse YAML config: {e}")))?;
        Ok(self)
    }

    /// Set the explicit AWS access key ID.
    pub fn access_key_id(mut self, key: impl Into<String>) -> Self {
        self.config.aws.access_key_id = Some(key.into());
        self
    }

    /// Set the explicit AWS secret access key.
    pub fn secret_access_key(mut self, key: impl Into<String>) -> Self {
        self.config.aws.secret_access_key = Some(key.into());
        self
    }

    /// Set the shared-credentials profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config.aws.profile = Some(profile.into());
        self
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.aws.region = region.into();
        self
    }

    /// Set the fetch window in minutes.
    pub fn interval_minutes(mut self, minutes: u64) -> Self {
        self.config.fetch.interval_minutes = minutes;
        self
    }

    /// Set the product filter from a comma-separated list.
    pub fn products_csv(mut self, csv: &str) -> Self {
        self.config.fetch.products = csv
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Set the Graphite host.
    pub fn graphite_host(mut self, host: impl Into<String>) -> Self {
        self.config.graphite.host = host.into();
        self
    }

    /// Set the Graphite port.
    pub fn graphite_port(mut self, port: u16) -> Self {
        self.config.graphite.port = port;
        self
    }

    /// Set the metric-name prefix.
    pub fn graphite_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.graphite.prefix = prefix.into();
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the final configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
