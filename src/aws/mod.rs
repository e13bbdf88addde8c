//! Spot-price history retrieval.
//!
//! The pricing API is an external collaborator consumed through one narrow
//! contract: a paginated query over a time window. `Ec2Client` is the
//! production implementation against the EC2 Query API; tests substitute
//! their own source behind the same trait.

pub mod client;
pub mod credentials;
pub mod sigv4;

pub use client::Ec2Client;
pub use credentials::Credentials;

use crate::core::{HistoryPage, RawPriceRecord, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// The time window one fetch cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Window start, inclusive.
    pub start: DateTime<Utc>,
    /// Window end, inclusive.
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// The window `[now - minutes, now]`.
    pub fn last_minutes(minutes: u64) -> Self {
        let end = Utc::now();
        FetchWindow {
            start: end - Duration::minutes(minutes as i64),
            end,
        }
    }
}

/// One-page query contract against the pricing-history collaborator.
#[async_trait]
pub trait PriceHistorySource {
    /// Fetch one page of history for the window, optionally continuing from
    /// a token returned by the previous page.
    async fn query(
        &self,
        window: &FetchWindow,
        products: &[String],
        next_token: Option<&str>,
    ) -> Result<HistoryPage>;
}

/// Fetch the complete history for a window, following continuation tokens.
///
/// Pages are concatenated in order. Any query error aborts the whole fetch;
/// partial results are never delivered.
pub async fn fetch_history<S: PriceHistorySource + ?Sized>(
    source: &S,
    window: &FetchWindow,
    products: &[String],
) -> Result<Vec<RawPriceRecord>> {
    let mut records = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source.query(window, products, next_token.as_deref()).await?;
        pages += 1;
        tracing::debug!(page = pages, records = page.records.len(), "fetched history page");
        records.extend(page.records);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(pages, records = records.len(), "history fetch complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RelayError;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct PagedSource {
        pages: Mutex<Vec<HistoryPage>>,
    }

    #[async_trait]
    impl PriceHistorySource for PagedSource {
        async fn query(
            &self,
            _window: &FetchWindow,
            _products: &[String],
            next_token: Option<&str>,
        ) -> Result<HistoryPage> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Err(RelayError::query(format!(
                    "unexpected query with token {next_token:?}"
                )));
            }
            Ok(pages.remove(0))
        }
    }

    fn record(zone: &str) -> RawPriceRecord {
        RawPriceRecord {
            availability_zone: zone.to_string(),
            instance_type: "m5.large".to_string(),
            product_description: "Linux/UNIX (Amazon VPC)".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 27, 8, 0, 0).unwrap(),
            spot_price: "0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn follows_tokens_and_concatenates_in_order() {
        let source = PagedSource {
            pages: Mutex::new(vec![
                HistoryPage {
                    records: vec![record("us-east-1a")],
                    next_token: Some("page2".to_string()),
                },
                HistoryPage {
                    records: vec![record("us-east-1b"), record("us-east-1c")],
                    next_token: None,
                },
            ]),
        };
        let window = FetchWindow::last_minutes(1);
        let records = fetch_history(&source, &window, &[]).await.unwrap();
        let zones: Vec<&str> = records.iter().map(|r| r.availability_zone.as_str()).collect();
        assert_eq!(zones, ["us-east-1a", "us-east-1b", "us-east-1c"]);
    }

    #[tokio::test]
    async fn empty_token_ends_pagination() {
        let source = PagedSource {
            pages: Mutex::new(vec![HistoryPage {
                records: vec![record("us-east-1a")],
                next_token: Some(String::new()),
            }]),
        };
        let window = FetchWindow::last_minutes(1);
        let records = fetch_history(&source, &window, &[]).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn zero_records_yield_an_empty_result() {
        let source = PagedSource {
            pages: Mutex::new(vec![HistoryPage::default()]),
        };
        let window = FetchWindow::last_minutes(1);
        let records = fetch_history(&source, &window, &[]).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn query_error_aborts_the_fetch() {
        let source = PagedSource {
            pages: Mutex::new(Vec::new()),
        };
        let window = FetchWindow::last_minutes(1);
        let err = fetch_history(&source, &window, &[]).await.unwrap_err();
        assert!(matches!(err, RelayError::Query(_)));
    }

    #[test]
    fn window_spans_the_requested_minutes() {
        let window = FetchWindow::last_minutes(5);
        assert_eq!(window.end - window.start, Duration::minutes(5));
    }
}
