//! Command-line interface for the relay.
//!
//! One invocation runs one fetch→transform→encode→deliver cycle; scheduling
//! repeats is left to cron or a systemd timer.

use crate::core::{config::ConfigBuilder, Config, LogLevel, RelayError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Pull EC2 spot price history out of AWS and push it into Graphite.
#[derive(Parser, Debug)]
#[command(name = "spotrelay")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// AWS access key ID, overriding the environment and shared credentials
    #[arg(long, value_name = "KEY")]
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key, overriding the environment and shared credentials
    #[arg(long, value_name = "SECRET")]
    pub aws_secret_access_key: Option<String>,

    /// Shared-credentials profile to use (default: the default profile)
    #[arg(long, env = "SPOTRELAY_PROFILE")]
    pub profile: Option<String>,

    /// AWS region to query
    #[arg(long, env = "SPOTRELAY_REGION")]
    pub region: Option<String>,

    /// Minutes back from now to gather prices for
    #[arg(long, env = "SPOTRELAY_INTERVAL")]
    pub interval: Option<u64>,

    /// Comma-separated product descriptions to fetch
    #[arg(long, env = "SPOTRELAY_PRODUCTS")]
    pub products: Option<String>,

    /// Log level threshold (trace, debug, info, warn, error)
    #[arg(long, env = "SPOTRELAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Graphite host to send the metrics to
    #[arg(long, env = "SPOTRELAY_GRAPHITE_HOST")]
    pub graphite_host: Option<String>,

    /// Graphite pickle-receiver port
    #[arg(long, env = "SPOTRELAY_GRAPHITE_PORT")]
    pub graphite_port: Option<u16>,

    /// Prefix to prepend to every metric name
    #[arg(long, env = "SPOTRELAY_GRAPHITE_PREFIX")]
    pub graphite_prefix: Option<String>,

    /// Configuration file path (default: ~/.config/spotrelay/config.yaml)
    #[arg(short, long, env = "SPOTRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "SPOTRELAY_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Show version information
    #[arg(short = 'V', long = "show-version")]
    pub version: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("spotrelay").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/spotrelay/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
                tracing::info!("loaded configuration from {:?}", config_path);
            }
            Err(e) if self.config.is_some() => {
                // User explicitly asked for a config file that can't be read.
                return Err(RelayError::config(format!(
                    "failed to read config file {config_path:?}: {e}"
                )));
            }
            Err(_) => {
                tracing::debug!("no config file at {:?}, using defaults", config_path);
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(key) = &self.aws_access_key_id {
            builder = builder.access_key_id(key);
        }
        if let Some(key) = &self.aws_secret_access_key {
            builder = builder.secret_access_key(key);
        }
        if let Some(profile) = &self.profile {
            builder = builder.profile(profile);
        }
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        if let Some(interval) = self.interval {
            builder = builder.interval_minutes(interval);
        }
        if let Some(products) = &self.products {
            builder = builder.products_csv(products);
        }
        if let Some(level) = &self.log_level {
            builder = builder.log_level(level.parse::<LogLevel>()?);
        }
        if let Some(host) = &self.graphite_host {
            builder = builder.graphite_host(host);
        }
        if let Some(port) = self.graphite_port {
            builder = builder.graphite_port(port);
        }
        if let Some(prefix) = &self.graphite_prefix {
            builder = builder.graphite_prefix(prefix);
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging from the CLI flags.
    ///
    /// Runs before config loading so that load failures are logged too;
    /// `--log-level` and `--debug` are already known at this point.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let level = if self.debug {
            "debug".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| LogLevel::Error.as_str().to_string())
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| RelayError::config(format!("failed to initialize logging: {e}")))?;

        Ok(())
    }
}

/// Execute one relay invocation.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.version {
        println!("spotrelay {}", env!("CARGO_PKG_VERSION"));
        println!("EC2 spot-price history to Graphite relay");
        return Ok(());
    }

    cli.init_logging()?;

    let config = cli.load_config().await?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Region: {}", config.aws.region);
        println!("  Interval: {} minute(s)", config.fetch.interval_minutes);
        println!("  Products: {}", config.fetch.products.join(", "));
        println!(
            "  Graphite: {}:{} (prefix {:?})",
            config.graphite.host, config.graphite.port, config.graphite.prefix
        );
        return Ok(());
    }

    match crate::pipeline::run(&config).await {
        Ok(report) => {
            tracing::info!(
                records = report.records,
                samples = report.samples,
                "relay cycle complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("relay cycle failed: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_cli() -> Cli {
        Cli {
            aws_access_key_id: None,
            aws_secret_access_key: None,
            profile: None,
            region: None,
            interval: None,
            products: None,
            log_level: None,
            graphite_host: None,
            graphite_port: None,
            graphite_prefix: None,
            config: None,
            debug: false,
            check_config: false,
            version: false,
        }
    }

    #[test]
    fn defaults_build_a_valid_config() {
        let config = bare_cli().build_config_from_args(ConfigBuilder::new()).unwrap();
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.fetch.interval_minutes, 1);
        assert_eq!(config.graphite.host, "localhost");
        assert_eq!(config.graphite.port, 2004);
        assert_eq!(config.graphite.prefix, "aws.ec2.spot-price");
    }

    #[test]
    fn flags_override_defaults() {
        let mut cli = bare_cli();
        cli.region = Some("eu-west-1".to_string());
        cli.interval = Some(5);
        cli.products = Some("Linux/UNIX".to_string());
        cli.graphite_port = Some(2014);
        let config = cli.build_config_from_args(ConfigBuilder::new()).unwrap();
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.fetch.interval_minutes, 5);
        assert_eq!(config.fetch.products, vec!["Linux/UNIX"]);
        assert_eq!(config.graphite.port, 2014);
    }

    #[tokio::test]
    async fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "graphite:\n  port: 2014\n").unwrap();
        let mut cli = bare_cli();
        cli.config = Some(path);
        let config = cli.load_config().await.unwrap();
        assert_eq!(config.graphite.port, 2014);
    }

    #[tokio::test]
    async fn missing_explicit_config_file_is_an_error() {
        let mut cli = bare_cli();
        cli.config = Some(PathBuf::from("/nonexistent/spotrelay.yaml"));
        let err = cli.load_config().await.unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn bad_log_level_is_a_config_error() {
        let mut cli = bare_cli();
        cli.log_level = Some("loud".to_string());
        let err = cli.build_config_from_args(ConfigBuilder::new()).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
