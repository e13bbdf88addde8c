//! Metric-name normalization and record transformation.
//!
//! Turns raw spot-price records into `(path, timestamp, value)` samples
//! filed under a dot-delimited Graphite hierarchy:
//! `[prefix.]availability_zone.instance_type.product_description`.

use crate::core::{MetricBatch, MetricSample, RawPriceRecord, RelayError, Result};

/// Sanitize a label into a collector-safe path segment.
///
/// Four stages, in order: whitespace (and literal dots, unless `keep_dots`)
/// become `_`; `/` becomes `-`; anything outside `[A-Za-z_\-0-9.]` is
/// dropped; the result is lowercased. Total function, defined for any input
/// including the empty string.
pub fn sanitize(input: &str, keep_dots: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let ch = if ch.is_whitespace() || (ch == '.' && !keep_dots) {
            '_'
        } else if ch == '/' {
            '-'
        } else {
            ch
        };
        match ch {
            'A'..='Z' => out.push(ch.to_ascii_lowercase()),
            'a'..='z' | '0'..='9' | '_' | '-' | '.' => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Compose the full metric path for one record.
///
/// The prefix keeps its dots (it is itself a hierarchy); the three record
/// dimensions do not. An empty or absent prefix is skipped entirely.
///
/// Segments that sanitize to the empty string stay in the path and yield
/// consecutive dots. That matches the reference behavior and is left for
/// product owners to rule on, not silently corrected here.
pub fn build_path(prefix: Option<&str>, zone: &str, instance_type: &str, product: &str) -> String {
    let mut path = String::new();
    if let Some(prefix) = prefix {
        if !prefix.is_empty() {
            path.push_str(&sanitize(prefix, true));
            path.push('.');
        }
    }
    path.push_str(&sanitize(zone, false));
    path.push('.');
    path.push_str(&sanitize(instance_type, false));
    path.push('.');
    path.push_str(&sanitize(product, false));
    path
}

/// Transform one raw record into a metric sample.
///
/// The timestamp is truncated to whole seconds since the epoch in UTC,
/// independent of the local timezone. A non-numeric price is a `ParseError`.
pub fn transform(record: &RawPriceRecord, prefix: Option<&str>) -> Result<MetricSample> {
    let path = build_path(
        prefix,
        &record.availability_zone,
        &record.instance_type,
        &record.product_description,
    );
    let timestamp = record.timestamp.timestamp();
    let value: f64 = record.spot_price.parse().map_err(|_| {
        RelayError::parse(format!(
            "spot price {:?} for {} is not a number",
            record.spot_price, path
        ))
    })?;
    tracing::debug!(%path, timestamp, value, "transformed sample");
    Ok(MetricSample {
        path,
        timestamp,
        value,
    })
}

/// Transform a full fetch result into an ordered batch.
pub fn transform_batch(records: &[RawPriceRecord], prefix: Option<&str>) -> Result<MetricBatch> {
    records
        .iter()
        .map(|record| transform(record, prefix))
        .collect()
}
