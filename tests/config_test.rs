//! Configuration system tests.

use spotrelay::core::{Config, ConfigBuilder, LogLevel};
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.aws.region, "us-east-1");
    assert_eq!(config.fetch.interval_minutes, 1);
    assert_eq!(
        config.fetch.products,
        vec!["Linux/UNIX (Amazon VPC)", "Windows (Amazon VPC)"]
    );
    assert_eq!(config.graphite.host, "localhost");
    assert_eq!(config.graphite.port, 2004);
    assert_eq!(config.graphite.prefix, "aws.ec2.spot-price");
    assert_eq!(config.logging.level, LogLevel::Error);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .region("eu-central-1")
        .interval_minutes(10)
        .products_csv("Linux/UNIX, SUSE Linux")
        .graphite_host("carbon.internal")
        .graphite_port(2014)
        .graphite_prefix("cloud.spot")
        .log_level(LogLevel::Debug)
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(config.aws.region, "eu-central-1");
    assert_eq!(config.fetch.interval_minutes, 10);
    assert_eq!(config.fetch.products, vec!["Linux/UNIX", "SUSE Linux"]);
    assert_eq!(config.graphite.host, "carbon.internal");
    assert_eq!(config.graphite.port, 2014);
    assert_eq!(config.graphite.prefix, "cloud.spot");
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.debug);
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
aws:
  region: ap-southeast-2
  profile: metrics
fetch:
  interval_minutes: 5
  products:
    - "Linux/UNIX (Amazon VPC)"
  request_timeout: 15s
graphite:
  host: graphite.example.com
  port: 2104
  prefix: aws.spot
  connect_timeout: 3s
logging:
  level: info
"#;

    let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

    assert_eq!(config.aws.region, "ap-southeast-2");
    assert_eq!(config.aws.profile.as_deref(), Some("metrics"));
    assert_eq!(config.fetch.interval_minutes, 5);
    assert_eq!(config.fetch.products, vec!["Linux/UNIX (Amazon VPC)"]);
    assert_eq!(config.fetch.request_timeout, Duration::from_secs(15));
    assert_eq!(config.graphite.host, "graphite.example.com");
    assert_eq!(config.graphite.port, 2104);
    assert_eq!(config.graphite.prefix, "aws.spot");
    assert_eq!(config.graphite.connect_timeout, Duration::from_secs(3));
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let yaml = "graphite:\n  host: carbon.internal\n";
    let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();
    assert_eq!(config.graphite.host, "carbon.internal");
    assert_eq!(config.graphite.port, 2004);
    assert_eq!(config.aws.region, "us-east-1");
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    // Zero interval
    assert!(ConfigBuilder::new().interval_minutes(0).build().is_err());

    // Empty product list
    assert!(ConfigBuilder::new().products_csv("").build().is_err());

    // Zero port
    assert!(ConfigBuilder::new().graphite_port(0).build().is_err());

    // Half a credential pair
    assert!(ConfigBuilder::new().access_key_id("AKID").build().is_err());

    // Full credential pair is fine
    assert!(ConfigBuilder::new()
        .access_key_id("AKID")
        .secret_access_key("secret")
        .build()
        .is_ok());
}

#[test]
fn test_invalid_yaml_is_rejected() {
    assert!(ConfigBuilder::new().from_yaml("graphite: [not a map").is_err());
}
