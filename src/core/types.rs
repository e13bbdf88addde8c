//! Domain types shared across the relay pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One raw spot-price record as returned by the pricing API.
///
/// Field names map onto the `spotPriceHistorySet/item` elements of the EC2
/// `DescribeSpotPriceHistory` response. The price stays a decimal string
/// until the transformer parses it, so a malformed value surfaces as a
/// `ParseError` and not as a deserialization failure of the whole page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRecord {
    /// Availability zone the price applies to, e.g. `us-east-1a`.
    pub availability_zone: String,
    /// Instance type, e.g. `m5.large`.
    pub instance_type: String,
    /// Product description, e.g. `Linux/UNIX (Amazon VPC)`.
    pub product_description: String,
    /// Instant the price was recorded, UTC.
    pub timestamp: DateTime<Utc>,
    /// Spot price in USD as a decimal string.
    pub spot_price: String,
}

/// One normalized metric sample ready for the collector.
///
/// `path` holds only `[a-z0-9_\-.]`; consecutive dots can occur only through
/// the documented empty-segment quirk of the path builder.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Dot-delimited hierarchical metric identifier.
    pub path: String,
    /// Whole seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Parsed spot price.
    pub value: f64,
}

/// Ordered batch of samples, preserving input order.
///
/// The collector doesn't require an order, but a deterministic one keeps the
/// encoded payload reproducible for a given input.
pub type MetricBatch = Vec<MetricSample>;

/// One page of spot-price history from the pricing API.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    /// Records in this page, in API order.
    pub records: Vec<RawPriceRecord>,
    /// Continuation token; `None` when this is the last page.
    pub next_token: Option<String>,
}
