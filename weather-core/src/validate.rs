//! Request parameter validation.
//!
//! Everything here is a pure function of its input; the only collaborator is the
//! city lookup used by [`resolve_external_id`].

use std::collections::HashMap;

use crate::{
    config::LanguageConfig,
    error::ValidationError,
    lookup::CityLookup,
    model::{CityQuery, WeatherQuery},
};

/// Raw query string parameters of an inbound request.
pub type Params = HashMap<String, String>;

/// Validate the weather endpoint's path id and query parameters.
pub fn validate_weather(
    city_id: Option<&str>,
    params: &Params,
    languages: &LanguageConfig,
) -> Result<WeatherQuery, ValidationError> {
    let city_id = parse_city_id(city_id)?;
    let language = validate_language(params.get("language").map(String::as_str), languages)?;

    Ok(WeatherQuery { city_id, language })
}

/// Validate the city search endpoint's query parameters.
pub fn validate_cities(
    params: &Params,
    languages: &LanguageConfig,
) -> Result<CityQuery, ValidationError> {
    let query = params
        .get("query")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .ok_or(ValidationError::InvalidQuery)?
        .to_string();
    let language = validate_language(params.get("language").map(String::as_str), languages)?;

    Ok(CityQuery { query, language })
}

/// Parse a positive integer city id.
pub fn parse_city_id(raw: Option<&str>) -> Result<i64, ValidationError> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(ValidationError::InvalidCityId)
}

/// Exact, case-sensitive match against the supported set. Absent means the default.
pub fn validate_language(
    raw: Option<&str>,
    languages: &LanguageConfig,
) -> Result<String, ValidationError> {
    match raw {
        None => Ok(languages.default.clone()),
        Some(lang) if languages.is_supported(lang) => Ok(lang.to_string()),
        Some(lang) => Err(ValidationError::InvalidLanguage(lang.to_string())),
    }
}

/// Map an internal city id to the provider's id.
pub async fn resolve_external_id(
    city_id: i64,
    lookup: &dyn CityLookup,
) -> Result<i64, ValidationError> {
    lookup
        .resolve_external_id(city_id)
        .await
        .ok_or(ValidationError::CityNotFound(city_id))
}
