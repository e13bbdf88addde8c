//! spotrelay - EC2 spot-price history to Graphite relay.
//!
//! Fetches spot-price history from the EC2 API for a short trailing window,
//! normalizes each record into a dot-delimited Graphite metric path, and
//! delivers the batch to carbon's pickle receiver as one length-prefixed
//! message.
//!
//! # Architecture
//!
//! - `aws`: query contract, paginated fetch loop, signed EC2 client,
//!   credential resolution
//! - `metrics`: name sanitization, path building, record transformation
//! - `graphite`: pickle protocol-2 encoding, framing, TCP delivery
//! - `pipeline`: one fetch→transform→encode→deliver cycle
//! - `core`: configuration, errors, domain types
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use spotrelay::core::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let report = spotrelay::pipeline::run(&config).await?;
//!     println!("delivered {} samples", report.samples);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod aws;
pub mod cli;
pub mod core;
pub mod graphite;
pub mod metrics;
pub mod pipeline;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
