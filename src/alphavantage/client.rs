// =============================================================================
// Alpha Vantage REST client — daily time series
// =============================================================================
//
// SECURITY: the API key travels as a query parameter (the provider offers no
// header alternative). It is never logged, is redacted from `Debug`, and
// reqwest errors are stripped of their URL before they become messages.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::alphavantage::response::parse_daily_series;
use crate::error::PipelineError;
use crate::market_data::{MarketDataSource, MarketSeries};
use crate::types::{Granularity, OutputSize};

/// Public production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage client for the daily-adjusted time series.
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    granularity: Granularity,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key`: provider key, read from the environment by the caller.
    /// * `base_url`: scheme + host, e.g. [`DEFAULT_BASE_URL`]; no trailing path.
    /// * `timeout`: whole-request timeout; expiry surfaces as `NetworkFailure`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "AlphaVantageClient initialised");

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            granularity: Granularity::DailyAdjusted,
            client,
        })
    }

    /// GET /query?function=TIME_SERIES_DAILY_ADJUSTED: one request, no retry.
    #[instrument(skip(self), name = "alphavantage::fetch_daily")]
    pub async fn get_daily_series(
        &self,
        symbol: &str,
        output_size: OutputSize,
    ) -> Result<MarketSeries, PipelineError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(PipelineError::InvalidInput("symbol must not be empty".into()));
        }

        let url = format!("{}/query", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("function", self.granularity.function_name()),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
                ("outputsize", output_size.as_query_value()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(symbol, %status, "provider returned non-success status");
            return Err(PipelineError::NetworkFailure(format!(
                "GET /query returned {status}"
            )));
        }

        let text = resp.text().await?;
        let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            PipelineError::data_unavailable(symbol, format!("response is not JSON: {e}"))
        })?;

        let series = parse_daily_series(symbol, self.granularity, &body)?;
        debug!(symbol, %output_size, count = series.len(), "daily series fetched");
        Ok(series)
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    async fn fetch_daily(
        &self,
        symbol: &str,
        output_size: OutputSize,
    ) -> Result<MarketSeries, PipelineError> {
        self.get_daily_series(symbol, output_size).await
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("granularity", &self.granularity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Router};

    /// Fake provider: behaviour selected by the `symbol` query parameter.
    async fn fake_query(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        assert_eq!(params.get("function").map(String::as_str), Some("TIME_SERIES_DAILY_ADJUSTED"));
        assert_eq!(params.get("apikey").map(String::as_str), Some("test-key"));

        match params.get("symbol").map(String::as_str) {
            Some("AAPL") => {
                let size = params.get("outputsize").cloned().unwrap_or_default();
                axum::Json(serde_json::json!({
                    "Meta Data": { "5. Output Size": size },
                    "Time Series (Daily)": {
                        "2024-03-04": { "4. close": "20.0", "5. adjusted close": "20.0", "6. volume": "100" },
                        "2024-03-01": { "4. close": "10.0", "5. adjusted close": "10.0", "6. volume": "100" }
                    }
                }))
                .into_response()
            }
            Some("LIMIT") => axum::Json(serde_json::json!({
                "Note": "API call frequency is 5 calls per minute"
            }))
            .into_response(),
            Some("INFO") => axum::Json(serde_json::json!({
                "Information": "Thank you for using Alpha Vantage! This is a premium endpoint."
            }))
            .into_response(),
            Some("SLOW") => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::OK, "late").into_response()
            }
            Some("HTML") => "<html>maintenance</html>".into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        }
    }

    async fn spawn_fake_provider() -> String {
        let app = Router::new().route("/query", get(fake_query));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> AlphaVantageClient {
        AlphaVantageClient::new("test-key", base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_normalises_series() {
        let base = spawn_fake_provider().await;
        let series = client(&base)
            .fetch_daily("AAPL", OutputSize::Compact)
            .await
            .unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.closes(), vec![10.0, 20.0]);
        assert_eq!(series.volumes(), vec![100.0, 100.0]);
    }

    #[tokio::test]
    async fn rate_limit_payload_is_data_unavailable() {
        let base = spawn_fake_provider().await;
        let err = client(&base)
            .fetch_daily("LIMIT", OutputSize::Compact)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
        assert!(err.to_string().contains("5 calls per minute"));
    }

    #[tokio::test]
    async fn information_notice_is_data_unavailable() {
        let base = spawn_fake_provider().await;
        let err = client(&base)
            .fetch_daily("INFO", OutputSize::Full)
            .await
            .unwrap_err();
        match err {
            PipelineError::DataUnavailable { symbol, reason } => {
                assert_eq!(symbol, "INFO");
                assert!(reason.contains("premium endpoint"));
            }
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_network_failure() {
        let base = spawn_fake_provider().await;
        let c = AlphaVantageClient::new("test-key", base.as_str(), Duration::from_millis(200)).unwrap();

        let started = std::time::Instant::now();
        let err = c.fetch_daily("SLOW", OutputSize::Compact).await.unwrap_err();

        assert!(matches!(err, PipelineError::NetworkFailure(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn non_json_body_is_data_unavailable() {
        let base = spawn_fake_provider().await;
        let err = client(&base)
            .fetch_daily("HTML", OutputSize::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn server_error_is_network_failure() {
        let base = spawn_fake_provider().await;
        let err = client(&base)
            .fetch_daily("BOOM", OutputSize::Compact)
            .await
            .unwrap_err();
        match err {
            PipelineError::NetworkFailure(msg) => assert!(msg.contains("500")),
            other => panic!("expected NetworkFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_network_failure_without_key() {
        // Grab a free port, then release it so nothing is listening there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .fetch_daily("AAPL", OutputSize::Compact)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NetworkFailure(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn empty_symbol_is_rejected_before_any_request() {
        let err = client("http://127.0.0.1:1")
            .fetch_daily("   ", OutputSize::Compact)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = client(DEFAULT_BASE_URL);
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("test-key"));
    }
}
