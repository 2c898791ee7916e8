use serde::{Deserialize, Serialize};
use std::fmt;

/// The two resources the API proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Weather,
    Cities,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Weather => "weather",
            ResourceKind::Cities => "cities",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated request for current weather in one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    /// Internal city id, always positive.
    pub city_id: i64,
    pub language: String,
}

/// Validated free-text city search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    /// Trimmed, never empty.
    pub query: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    pub average: String,
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: String,
    pub direction: String,
}

/// Public shape of a weather response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,
    pub description: String,
    pub temperature: Temperature,
    pub pressure: String,
    pub humidity: String,
    pub wind: Wind,
}

/// One match of a city search, labelled "Name, CountryCode".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    /// Provider city id.
    pub id: i64,
    pub name: String,
}

pub type CityListResult = Vec<CityEntry>;
