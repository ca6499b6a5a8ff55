//! REST client for a sunshine data backend
//!
//! Endpoints, relative to the base URL:
//! - `GET /locations/{id}/hourly` and `GET /locations/{id}/daily` return
//!   `{ "data": [...], "metadata": {...} }`
//! - `GET /locations/{id}` and `GET /locations` return station information
//! - `GET /health` returns a health report

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::DataProvider;
use crate::data::{
    all_stations, resolve_location, DailyPoint, HealthReport, HourlyPoint, LocationInfo,
    SeriesResponse,
};
use crate::error::FetchError;

/// Default backend location
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Per-request timeout applied by the HTTP client
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for fetching sunshine data over HTTP
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpProvider {
    /// Create a provider talking to [`DEFAULT_BASE_URL`]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a provider talking to a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(HTTP_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: HTTP_TIMEOUT,
        }
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(
                status.as_u16(),
                format!("{} returned {}: {}", path, status, body.trim()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Unknown(format!("Failed to parse response from {}: {}", path, e)))
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn fetch_hourly(
        &self,
        location_id: &str,
    ) -> Result<SeriesResponse<HourlyPoint>, FetchError> {
        self.get_json(&format!("/locations/{}/hourly", location_id))
            .await
    }

    async fn fetch_daily(&self, location_id: &str) -> Result<SeriesResponse<DailyPoint>, FetchError> {
        self.get_json(&format!("/locations/{}/daily", location_id))
            .await
    }

    async fn fetch_location(&self, location_id: &str) -> LocationInfo {
        match self
            .get_json::<LocationInfo>(&format!("/locations/{}", location_id))
            .await
        {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(location = location_id, error = %e, "Using registry location");
                resolve_location(location_id)
            }
        }
    }

    async fn available_locations(&self) -> Vec<LocationInfo> {
        match self.get_json::<Vec<LocationInfo>>("/locations").await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list locations, using registry");
                all_stations().iter().map(|s| s.to_location_info()).collect()
            }
        }
    }

    async fn check_health(&self) -> Result<HealthReport, FetchError> {
        self.get_json("/health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const METADATA: &str = r#"{
        "location": "station-001",
        "lastUpdated": "2025-08-28T10:00:00Z",
        "source": "NOAA Weather API v2.1.3",
        "accuracy": 99.1,
        "completeness": 99.3,
        "status": "operational"
    }"#;

    fn hourly_body() -> String {
        let points: Vec<String> = (0..24)
            .map(|h| {
                format!(
                    r#"{{"time":"{:02}:00","duration":12.5,"uvIndex":3.0,"timestamp":"2025-08-28T{:02}:00:00Z"}}"#,
                    h, h
                )
            })
            .collect();
        format!(r#"{{"data":[{}],"metadata":{}}}"#, points.join(","), METADATA)
    }

    #[tokio::test]
    async fn test_fetch_hourly_parses_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/station-001/hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_string(hourly_body()))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(server.uri());
        let response = provider.fetch_hourly("station-001").await.unwrap();

        assert_eq!(response.data.len(), 24);
        assert_eq!(response.data[7].time, "07:00");
        assert_eq!(response.metadata.location, "station-001");
    }

    #[tokio::test]
    async fn test_status_codes_map_to_error_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/station-001/hourly"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/station-001/daily"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/nowhere/hourly"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(server.uri());

        let err = provider.fetch_hourly("station-001").await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::ServerError);

        let err = provider.fetch_daily("station-001").await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::ServiceUnavailable);

        let err = provider.fetch_hourly("nowhere").await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::LocationNotFound);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unknown_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/station-001/daily"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(server.uri());
        let err = provider.fetch_daily("station-001").await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_fetch_location_falls_back_to_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/unknown-id"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(server.uri());
        let info = provider.fetch_location("unknown-id").await;
        assert_eq!(info, resolve_location("station-001"));
    }

    #[tokio::test]
    async fn test_available_locations_falls_back_when_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(server.uri());
        let ids: Vec<String> = provider
            .available_locations()
            .await
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["station-001", "station-002", "station-003"]);
    }

    #[tokio::test]
    async fn test_check_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":"healthy","timestamp":"2025-08-28T10:00:00Z","uptime":"99.9%"}"#,
            ))
            .mount(&server)
            .await;

        let provider = HttpProvider::with_base_url(format!("{}/", server.uri()));
        let report = provider.check_health().await.unwrap();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.uptime, "99.9%");
    }

    #[tokio::test]
    async fn test_client_timeout_reports_configured_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/station-001/hourly"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(hourly_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider =
            HttpProvider::with_base_url(server.uri()).with_timeout(Duration::from_millis(100));
        let err = provider.fetch_hourly("station-001").await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout(limit) if limit == Duration::from_millis(100)));
        assert_eq!(err.to_string(), "Request timed out after 100ms");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider = HttpProvider::with_base_url("http://example.test/api/");
        assert_eq!(provider.base_url(), "http://example.test/api");
    }
}
