//! Core domain models, configuration, and error taxonomy for the relay.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use error::{RelayError, Result};
pub use types::{HistoryPage, MetricBatch, MetricSample, RawPriceRecord};
