//! Snapshot service client.

use super::traits::SnapshotSource;
use crate::exposure::{Address, ExposureError, SnapshotSet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches snapshots from `GET {base_url}/snapshots/{address}`.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    base_url: String,
}

impl HttpSnapshotSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn snapshot_url(&self, user: &Address) -> String {
        format!("{}/snapshots/{user}", self.base_url)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self), name = "http_fetch_snapshots")]
    async fn fetch_snapshots(&self, user: &Address) -> Result<SnapshotSet, ExposureError> {
        let url = self.snapshot_url(user);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExposureError::DataUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExposureError::DataUnavailable(format!(
                "snapshot service error {status}: {body}"
            )));
        }

        let snapshots: SnapshotSet = response
            .json()
            .await
            .map_err(|e| ExposureError::DataUnavailable(format!("decode failed: {e}")))?;

        debug!(
            markets = snapshots.market.len(),
            user_markets = snapshots.user.len(),
            "Fetched snapshots"
        );

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{MarketId, Side};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER: &str = "0x0142a8bff8d887fc4f04469fca6c66f5e9936ea7";

    fn user() -> Address {
        USER.parse().unwrap()
    }

    fn body() -> serde_json::Value {
        serde_json::json!({
            "market": {
                "btc": {
                    "marketId": "btc",
                    "latestPrice": "65000.5",
                    "currentPosition": { "maker": "2", "long": "1", "short": "1.5" },
                    "nextPosition": { "maker": "2", "long": "1", "short": "1.5" }
                }
            },
            "user": {
                "btc": {
                    "marketId": "btc",
                    "market": "0x1111111111111111111111111111111111111111",
                    "side": "maker",
                    "collateral": "10000",
                    "nextPosition": { "maker": "0.5", "long": "0", "short": "0" },
                    "nextLeverage": "3.25"
                }
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_snapshots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/snapshots/{USER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body()))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSnapshotSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let snapshots = source.fetch_snapshots(&user()).await.unwrap();

        let btc = MarketId::new("btc");
        assert_eq!(snapshots.user[&btc].side, Side::Maker);
        assert_eq!(snapshots.market[&btc].latest_price.to_float_string(), "65000.5");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("lens offline"))
            .mount(&server)
            .await;

        let source = HttpSnapshotSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = source.fetch_snapshots(&user()).await.unwrap_err();

        match err {
            ExposureError::DataUnavailable(reason) => {
                assert!(reason.contains("503"));
                assert!(reason.contains("lens offline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_bad_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let source = HttpSnapshotSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.fetch_snapshots(&user()).await,
            Err(ExposureError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_snapshot_url_trims_slash() {
        let source =
            HttpSnapshotSource::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.snapshot_url(&user()),
            format!("http://localhost:8080/snapshots/{USER}")
        );
    }
}
