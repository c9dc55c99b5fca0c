//! Directions API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::RouteProvider;
use super::error::RoutingError;
use super::types::{DirectionsResponse, RawRoute, RouteQuery};

/// Default Directions API endpoint.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the directions client.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    /// API key; requests fail with a configuration error without one
    pub api_key: Option<String>,
    /// Endpoint URL
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl DirectionsConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// Client for the Directions API.
#[derive(Debug, Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    config: DirectionsConfig,
}

impl DirectionsClient {
    /// Create a new directions client.
    pub fn new(http: reqwest::Client, config: DirectionsConfig) -> Self {
        Self { http, config }
    }

    /// Query parameters for a route request.
    fn query_params(&self, query: &RouteQuery, key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("origin", query.origin.clone()),
            ("destination", query.destination.clone()),
        ];
        if !query.waypoints.is_empty() {
            params.push(("waypoints", query.waypoints.join("|")));
        }
        params.push(("language", "ja".to_string()));
        params.push(("region", "jp".to_string()));
        params.push(("key", key.to_string()));
        params
    }

    async fn request(&self, query: &RouteQuery, key: &str) -> Result<RawRoute, RoutingError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&self.query_params(query, key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        let parsed: DirectionsResponse =
            serde_json::from_str(&body).map_err(|e| RoutingError::Json {
                message: e.to_string(),
            })?;

        if parsed.status != "OK" {
            return Err(RoutingError::Status {
                status: parsed.status,
                message: parsed.error_message,
            });
        }

        parsed
            .routes
            .first()
            .map(|r| r.to_raw_route())
            .ok_or_else(|| RoutingError::Status {
                status: "ZERO_RESULTS".to_string(),
                message: None,
            })
    }
}

#[async_trait]
impl RouteProvider for DirectionsClient {
    async fn fetch_route(&self, query: &RouteQuery) -> Result<RawRoute, RoutingError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RoutingError::MissingApiKey)?;

        debug!(
            origin = %query.origin,
            destination = %query.destination,
            waypoints = query.waypoints.len(),
            "requesting directions"
        );

        let limit = Duration::from_millis(self.config.timeout_ms);
        tokio::time::timeout(limit, self.request(query, key))
            .await
            .map_err(|_| RoutingError::Timeout {
                timeout_ms: self.config.timeout_ms,
            })?
    }
}
