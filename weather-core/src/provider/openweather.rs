use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::{config::UpstreamConfig, error::ExternalApiError};

use super::{RawCityListPayload, RawWeatherPayload, UpstreamRequest, WeatherProvider};

/// OpenWeatherMap client. Issues exactly one GET per call, never retries.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid upstream base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Upstream base URL cannot carry a path: {}", config.base_url);
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            http,
        })
    }

    /// Full provider URL for `request`, query values escaped.
    pub fn build_url(&self, request: &UpstreamRequest<'_>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(request.path());
        }
        url.query_pairs_mut()
            .extend_pairs(request.query_pairs(&self.api_key));
        url
    }

    async fn fetch(&self, request: UpstreamRequest<'_>) -> Result<Value, ExternalApiError> {
        let resource = request.resource();
        let url = self.build_url(&request);

        tracing::debug!(resource = %resource, "requesting upstream provider");

        let res = self.http.get(url).send().await.map_err(|err| {
            let reason = if err.is_timeout() {
                "request timed out"
            } else if err.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            tracing::error!(resource = %resource, error = %err, "OpenWeatherMap {reason}");
            ExternalApiError::new(&resource, reason)
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|err| {
            tracing::error!(resource = %resource, error = %err, "failed to read OpenWeatherMap body");
            ExternalApiError::new(&resource, "failed to read response body")
        })?;

        if !status.is_success() {
            tracing::error!(
                resource = %resource,
                status = %status,
                body = %truncate_body(&body),
                "OpenWeatherMap returned an error status"
            );
            return Err(ExternalApiError::new(&resource, format!("status {status}")));
        }

        serde_json::from_str(&body).map_err(|err| {
            tracing::error!(resource = %resource, error = %err, "OpenWeatherMap body is not JSON");
            ExternalApiError::new(&resource, "response body is not JSON")
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_weather(
        &self,
        external_city_id: i64,
        language: &str,
    ) -> Result<RawWeatherPayload, ExternalApiError> {
        self.fetch(UpstreamRequest::Weather {
            city_id: external_city_id,
            language,
        })
        .await
    }

    async fn fetch_cities(
        &self,
        query: &str,
        language: &str,
    ) -> Result<RawCityListPayload, ExternalApiError> {
        self.fetch(UpstreamRequest::Cities { query, language }).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
