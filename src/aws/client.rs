//! EC2 Query API client for `DescribeSpotPriceHistory`.
//!
//! One signed POST per page: form-encoded Query-API body, SigV4
//! `Authorization` header, XML response. Version 2016-11-15.

use crate::aws::credentials::Credentials;
use crate::aws::sigv4;
use crate::aws::{FetchWindow, PriceHistorySource};
use crate::core::{Config, HistoryPage, RawPriceRecord, RelayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const API_VERSION: &str = "2016-11-15";
const ACTION: &str = "DescribeSpotPriceHistory";
const SERVICE: &str = "ec2";

/// Client for the EC2 Query API.
pub struct Ec2Client {
    http: reqwest::Client,
    endpoint: String,
    host: String,
    region: String,
    credentials: Credentials,
}

impl Ec2Client {
    /// Create a client against the regional EC2 endpoint.
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        let host = config.ec2_endpoint();
        let endpoint = format!("https://{host}/");
        Self::with_endpoint(config, credentials, &endpoint)
    }

    /// Create a client against a non-standard endpoint (VPC endpoints,
    /// local test servers). The `Host` used for signing is derived from the
    /// URL, port included.
    pub fn with_endpoint(
        config: &Config,
        credentials: Credentials,
        endpoint: &str,
    ) -> Result<Self> {
        let host = endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        if host.is_empty() || host.contains('/') {
            return Err(RelayError::config(format!("invalid EC2 endpoint: {endpoint}")));
        }
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.fetch.request_timeout)
            .build()
            .map_err(|e| RelayError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Ec2Client {
            http,
            endpoint: endpoint.to_string(),
            host,
            region: config.aws.region.clone(),
            credentials,
        })
    }

    /// SigV4 `Authorization` header value and the signed header list for one
    /// request body at one instant.
    fn authorization(&self, body: &str, now: DateTime<Utc>) -> (String, String, String) {
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = sigv4::sha256_hex(body.as_bytes());

        // Canonical headers must be sorted by name; the token slots in last.
        let mut canonical_headers = format!(
            "content-type:application/x-www-form-urlencoded\nhost:{}\nx-amz-date:{}\n",
            self.host, date_time
        );
        let mut signed_headers = "content-type;host;x-amz-date".to_string();
        if let Some(token) = &self.credentials.session_token {
            canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
            signed_headers.push_str(";x-amz-security-token");
        }

        let canonical_request =
            sigv4::canonical_request("POST", "/", "", &canonical_headers, &signed_headers, &payload_hash);
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let string_to_sign = sigv4::string_to_sign(&canonical_request, &date_time, &scope);
        let key = sigv4::signing_key(&self.credentials.secret_access_key, &date, &self.region, SERVICE);
        let signature = sigv4::sign(&key, &string_to_sign);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        );
        (authorization, date_time, signed_headers)
    }

    fn request_body(
        &self,
        window: &FetchWindow,
        products: &[String],
        next_token: Option<&str>,
    ) -> String {
        let mut params: Vec<(String, String)> = vec![
            ("Action".to_string(), ACTION.to_string()),
            ("Version".to_string(), API_VERSION.to_string()),
            (
                "StartTime".to_string(),
                window.start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
            (
                "EndTime".to_string(),
                window.end.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ),
        ];
        for (i, product) in products.iter().enumerate() {
            params.push((format!("ProductDescription.{}", i + 1), product.clone()));
        }
        if let Some(token) = next_token {
            params.push(("NextToken".to_string(), token.to_string()));
        }
        sigv4::form_urlencode(&params)
    }
}

#[async_trait]
impl PriceHistorySource for Ec2Client {
    async fn query(
        &self,
        window: &FetchWindow,
        products: &[String],
        next_token: Option<&str>,
    ) -> Result<HistoryPage> {
        let body = self.request_body(window, products, next_token);
        let (authorization, date_time, _) = self.authorization(&body, Utc::now());

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("X-Amz-Date", &date_time)
            .header("Authorization", authorization);
        if let Some(token) = &self.credentials.session_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| RelayError::query(format!("request to {} failed: {e}", self.host)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::query(format!("reading response from {} failed: {e}", self.host)))?;

        if !status.is_success() {
            return Err(RelayError::query(api_error_message(status.as_u16(), &text)));
        }

        let parsed: DescribeSpotPriceHistoryResponse = quick_xml::de::from_str(&text)
            .map_err(|e| RelayError::query(format!("malformed spot price history response: {e}")))?;

        Ok(HistoryPage {
            records: parsed.spot_price_history_set.item,
            next_token: parsed.next_token.filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeSpotPriceHistoryResponse {
    #[serde(default)]
    spot_price_history_set: SpotPriceHistorySet,
    next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpotPriceHistorySet {
    #[serde(default)]
    item: Vec<RawPriceRecord>,
}

/// EC2 error envelope: `<Response><Errors><Error>...`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    errors: ErrorList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorList {
    error: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    code: String,
    message: String,
}

fn api_error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = quick_xml::de::from_str::<ErrorResponse>(body) {
        if let Some(first) = parsed.errors.error.first() {
            return format!("EC2 returned {status} {}: {}", first.code, first.message);
        }
    }
    let snippet: String = body.chars().take(200).collect();
    format!("EC2 returned {status}: {snippet}")
}
