//! Remote fetch seam.
//!
//! The coordinator only sees the [`Fetcher`] trait. [`HttpFetcher`] is the
//! production implementation over `reqwest`; tests substitute their own.
//! Timeouts are a transport concern and live on the `reqwest` client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::adapters::AdaptError;
use crate::domains::DomainKind;
use crate::models::QueryParams;

// ---

/// Why a fetch did not produce usable records.
#[derive(Debug, Error)]
pub enum FetchError {
    // ---
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Adapt(#[from] AdaptError),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Adapt(AdaptError::MalformedPayload(e.to_string()))
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Issues one read-only request for a domain and returns the raw body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, kind: DomainKind, params: &QueryParams) -> Result<Value, FetchError>;
}

/// `reqwest`-backed fetcher against the weather/prediction API.
pub struct HttpFetcher {
    // ---
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    // ---
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, kind: DomainKind) -> String {
        format!("{}{}", self.base_url, kind.path())
    }
}

/// Query string for one request; `days` only where the endpoint takes it.
pub fn query_pairs(kind: DomainKind, params: &QueryParams) -> Vec<(&'static str, String)> {
    // ---
    let mut pairs = vec![
        ("latitude", params.point.latitude().to_string()),
        ("longitude", params.point.longitude().to_string()),
    ];
    if kind.uses_horizon() {
        pairs.push(("days", params.horizon.days().to_string()));
    }
    pairs
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, kind: DomainKind, params: &QueryParams) -> Result<Value, FetchError> {
        // ---
        let url = self.url_for(kind);
        let query = query_pairs(kind, params);
        debug!("Fetching {} from {} with {:?}", kind.label(), url, query);

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        debug!("{} responded {}", url, status);

        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_query_pairs_include_days_only_with_horizon() {
        // ---
        let params = QueryParams::new(14.7167, -17.4677, 14).unwrap();

        let current = query_pairs(DomainKind::WeatherCurrent, &params);
        assert_eq!(current.len(), 2);
        assert_eq!(current[0], ("latitude", "14.7167".to_string()));
        assert_eq!(current[1], ("longitude", "-17.4677".to_string()));

        let forecast = query_pairs(DomainKind::WeatherForecast, &params);
        assert_eq!(forecast.last(), Some(&("days", "14".to_string())));
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        // ---
        let fetcher = HttpFetcher::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            fetcher.url_for(DomainKind::DiseaseRisk),
            "http://localhost:8000/api/predictions/disease-risk"
        );
    }

    #[test]
    fn test_status_error_message() {
        // ---
        let err = FetchError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "upstream returned 503 Service Unavailable");

        let err = FetchError::from(AdaptError::MalformedPayload("missing 'alerts' array".into()));
        assert_eq!(err.to_string(), "malformed payload: missing 'alerts' array");
    }
}
