use crate::core::cache::Cache;
use crate::core::config::RequestConfig;
use crate::core::price::{MarketDataProvider, NavSeries, PriceObservation, SchemeMeta};
use crate::providers::util::{RETRY_DELAY_MS, http_client, with_retry};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// NAV history from an mfapi.in compatible service.
pub struct MfApiProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    cache: Arc<Cache<String, NavSeries>>,
}

impl MfApiProvider {
    pub fn new(
        base_url: &str,
        request: &RequestConfig,
        cache: Arc<Cache<String, NavSeries>>,
    ) -> Result<Self> {
        Ok(MfApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(request)?,
            retries: request.retries,
            cache,
        })
    }

    async fn request_series(&self, scheme_code: &str) -> Result<NavSeries> {
        let url = format!("{}/mf/{}", self.base_url, scheme_code);
        debug!("Requesting NAV history from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .with_context(|| format!("Failed to send request for scheme code: {scheme_code}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Error fetching data for scheme code: {scheme_code} (HTTP {status})"
            ));
        }

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for scheme code: {scheme_code}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!(
                "Received empty response for scheme code: {}",
                scheme_code
            ));
        }

        let parsed: MfApiResponse = serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse NAV response for scheme code: {scheme_code}")
        })?;

        Ok(parsed.into_series(scheme_code))
    }
}

#[derive(Debug, Deserialize)]
struct MfApiResponse {
    #[serde(default)]
    meta: MfApiMeta,
    #[serde(default)]
    data: Vec<MfApiNav>,
}

#[derive(Debug, Default, Deserialize)]
struct MfApiMeta {
    scheme_name: Option<String>,
    fund_house: Option<String>,
    scheme_type: Option<String>,
    scheme_category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MfApiNav {
    date: String,
    nav: String,
}

impl MfApiResponse {
    /// Drops rows that violate the observation contract so the returns
    /// engine only ever sees valid prices.
    fn into_series(self, scheme_code: &str) -> NavSeries {
        let total = self.data.len();
        let observations: Vec<PriceObservation> = self
            .data
            .into_iter()
            .filter_map(|row| match PriceObservation::parse(&row.date, &row.nav) {
                Ok(obs) => Some(obs),
                Err(e) => {
                    warn!(scheme_code, error = %e, "Skipping malformed NAV row");
                    None
                }
            })
            .collect();

        debug!(
            scheme_code,
            kept = observations.len(),
            total,
            "Decoded NAV history"
        );

        NavSeries {
            meta: SchemeMeta {
                scheme_name: self.meta.scheme_name,
                fund_house: self.meta.fund_house,
                scheme_type: self.meta.scheme_type,
                scheme_category: self.meta.scheme_category,
            },
            observations,
        }
    }
}

#[async_trait]
impl MarketDataProvider for MfApiProvider {
    async fn fetch_series(&self, scheme_code: &str) -> Result<NavSeries> {
        self.cache
            .get_or_try_fetch(scheme_code.to_string(), || self.request_series(scheme_code))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCHEME_CODE: &str = "122639";

    async fn create_mfapi_mock_server(
        scheme_code: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        let expected_path = format!("/mf/{scheme_code}");

        Mock::given(method("GET"))
            .and(path(&expected_path))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(uri: &str) -> MfApiProvider {
        let request = RequestConfig {
            timeout_secs: 5,
            retries: 0,
        };
        MfApiProvider::new(uri, &request, Arc::new(Cache::new())).unwrap()
    }

    #[tokio::test]
    async fn test_successful_nav_history_fetch() {
        let mock_response = r#"{
            "meta": {
                "fund_house": "PPFAS Mutual Fund",
                "scheme_type": "Open Ended Schemes",
                "scheme_category": "Equity Scheme - Flexi Cap Fund",
                "scheme_code": 122639,
                "scheme_name": "Parag Parikh Flexi Cap Fund - Direct Plan - Growth"
            },
            "data": [
                {"date": "31-12-2024", "nav": "86.12340"},
                {"date": "30-12-2024", "nav": "85.90000"}
            ],
            "status": "SUCCESS"
        }"#;
        let mock_server = create_mfapi_mock_server(SCHEME_CODE, mock_response, 200).await;

        let series = provider(&mock_server.uri())
            .fetch_series(SCHEME_CODE)
            .await
            .unwrap();

        assert_eq!(
            series.meta.scheme_name.as_deref(),
            Some("Parag Parikh Flexi Cap Fund - Direct Plan - Growth")
        );
        assert_eq!(series.meta.fund_house.as_deref(), Some("PPFAS Mutual Fund"));
        assert_eq!(series.observations.len(), 2);
        assert_eq!(
            series.observations[0].date,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(
            series.observations[0].price,
            Decimal::from_str("86.1234").unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let mock_response = r#"{
            "meta": {"scheme_name": "Test Fund"},
            "data": [
                {"date": "31-12-2024", "nav": "10.5"},
                {"date": "2024-12-30", "nav": "10.4"},
                {"date": "29-12-2024", "nav": "N.A."},
                {"date": "28-12-2024", "nav": "0.00000"}
            ]
        }"#;
        let mock_server = create_mfapi_mock_server(SCHEME_CODE, mock_response, 200).await;

        let series = provider(&mock_server.uri())
            .fetch_series(SCHEME_CODE)
            .await
            .unwrap();

        assert_eq!(series.observations.len(), 1);
        assert_eq!(
            series.observations[0].price,
            Decimal::from_str("10.5").unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_empty_series() {
        let mock_response = r#"{"meta": {}, "data": [], "status": "SUCCESS"}"#;
        let mock_server = create_mfapi_mock_server(SCHEME_CODE, mock_response, 200).await;

        let series = provider(&mock_server.uri())
            .fetch_series(SCHEME_CODE)
            .await
            .unwrap();

        assert!(series.is_empty());
        assert!(series.meta.scheme_name.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock_server = create_mfapi_mock_server(SCHEME_CODE, "Server Error", 500).await;

        let result = provider(&mock_server.uri()).fetch_series(SCHEME_CODE).await;

        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.starts_with(&format!("Error fetching data for scheme code: {SCHEME_CODE}")),
            "{error_msg}"
        );
        assert!(error_msg.contains("500"));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let mock_server = create_mfapi_mock_server(SCHEME_CODE, "", 200).await;

        let result = provider(&mock_server.uri()).fetch_series(SCHEME_CODE).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            format!("Received empty response for scheme code: {SCHEME_CODE}")
        );
    }

    #[tokio::test]
    async fn test_series_is_cached_per_session() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/mf/{SCHEME_CODE}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"meta": {}, "data": [{"date": "31-12-2024", "nav": "10"}]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server.uri());
        provider.fetch_series(SCHEME_CODE).await.unwrap();
        let second = provider.fetch_series(SCHEME_CODE).await.unwrap();
        assert_eq!(second.observations.len(), 1);
    }
}
