use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{error::ExternalApiError, model::ResourceKind};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Weather body exactly as the provider returned it.
pub type RawWeatherPayload = Value;

/// City search body exactly as the provider returned it.
pub type RawCityListPayload = Value;

/// One upstream call. Each variant knows its path and query parameters; the fetch and
/// error translation are shared by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRequest<'a> {
    Weather { city_id: i64, language: &'a str },
    Cities { query: &'a str, language: &'a str },
}

impl UpstreamRequest<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            UpstreamRequest::Weather { .. } => ResourceKind::Weather,
            UpstreamRequest::Cities { .. } => ResourceKind::Cities,
        }
    }

    /// Path segment appended to the provider base URL.
    pub fn path(&self) -> &'static str {
        match self {
            UpstreamRequest::Weather { .. } => "weather",
            UpstreamRequest::Cities { .. } => "find",
        }
    }

    /// Query parameters in the order the provider documents them. Values are unescaped.
    pub fn query_pairs(&self, api_key: &str) -> Vec<(&'static str, String)> {
        match *self {
            UpstreamRequest::Weather { city_id, language } => vec![
                ("id", city_id.to_string()),
                ("lang", language.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ],
            UpstreamRequest::Cities { query, language } => vec![
                ("q", query.to_string()),
                ("lang", language.to_string()),
                ("appid", api_key.to_string()),
            ],
        }
    }

    /// Identifier used in logs and errors, e.g. `weather:2950159`. Never includes the key.
    pub fn resource(&self) -> String {
        match self {
            UpstreamRequest::Weather { city_id, .. } => format!("{}:{city_id}", self.kind()),
            UpstreamRequest::Cities { query, .. } => format!("{}:{query}", self.kind()),
        }
    }
}

/// Source of raw weather and city data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather(
        &self,
        external_city_id: i64,
        language: &str,
    ) -> Result<RawWeatherPayload, ExternalApiError>;

    async fn fetch_cities(
        &self,
        query: &str,
        language: &str,
    ) -> Result<RawCityListPayload, ExternalApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_request_uses_metric_units() {
        let req = UpstreamRequest::Weather {
            city_id: 1,
            language: "en",
        };
        assert_eq!(req.path(), "weather");
        assert_eq!(req.kind(), ResourceKind::Weather);
        assert!(req.query_pairs("k").contains(&("units", "metric".to_string())));
        assert_eq!(req.resource(), "weather:1");
    }

    #[test]
    fn city_request_has_no_units() {
        let req = UpstreamRequest::Cities {
            query: "Berlin",
            language: "de",
        };
        let pairs = req.query_pairs("k");
        assert_eq!(req.path(), "find");
        assert!(pairs.iter().all(|(name, _)| *name != "units"));
        assert_eq!(pairs[0], ("q", "Berlin".to_string()));
        assert_eq!(req.resource(), "cities:Berlin");
    }
}
