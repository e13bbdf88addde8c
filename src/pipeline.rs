//! One relay cycle: fetch, transform, encode, deliver.
//!
//! Strictly sequential; the only I/O suspension points are the pricing API
//! calls and the collector socket. Any failure aborts the cycle.

use crate::aws::{self, Ec2Client, FetchWindow, PriceHistorySource};
use crate::core::{Config, Result};
use crate::graphite::GraphiteClient;
use crate::metrics;

/// What one completed cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Raw records fetched across all pages.
    pub records: usize,
    /// Samples delivered to the collector.
    pub samples: usize,
}

/// Run one cycle with production wiring.
pub async fn run(config: &Config) -> Result<CycleReport> {
    let credentials = aws::credentials::resolve(&config.aws).await?;
    let client = Ec2Client::new(config, credentials)?;
    run_with_source(&client, config).await
}

/// Run one cycle against any price-history source.
pub async fn run_with_source<S: PriceHistorySource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<CycleReport> {
    let window = FetchWindow::last_minutes(config.fetch.interval_minutes);
    let records = aws::fetch_history(source, &window, &config.fetch.products).await?;
    tracing::info!(records = records.len(), "fetched spot price history");

    let batch = metrics::transform_batch(&records, Some(&config.graphite.prefix))?;

    let graphite = GraphiteClient::new(
        &config.graphite.host,
        config.graphite.port,
        config.graphite.connect_timeout,
    );
    graphite.send(&batch).await?;
    tracing::info!(
        samples = batch.len(),
        host = %config.graphite.host,
        port = config.graphite.port,
        "relayed batch to graphite"
    );

    Ok(CycleReport {
        records: records.len(),
        samples: batch.len(),
    })
}
