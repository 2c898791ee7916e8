//! Mapping from provider JSON to the public response shapes.
//!
//! No I/O happens here. A payload that lacks a required field is reported as a
//! [`TransformError`] instead of being patched over.

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::{
    error::TransformError,
    model::{CityEntry, CityListResult, Temperature, WeatherResult, Wind},
};

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Compass label for a wind bearing in degrees, in 22.5° sectors starting at north.
pub fn wind_direction(degree: f64) -> &'static str {
    let index = (degree / 22.5 + 0.5).floor() as i64;
    COMPASS[index.rem_euclid(16) as usize]
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: Number,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Number,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    id: i64,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    sys: Option<OwSys>,
}

pub fn transform_weather(payload: &Value) -> Result<WeatherResult, TransformError> {
    let parsed = OwCurrentResponse::deserialize(payload)?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or(TransformError::Missing("weather[0].description"))?;

    Ok(WeatherResult {
        city: parsed.name,
        description,
        temperature: Temperature {
            average: celsius(parsed.main.temp),
            min: celsius(parsed.main.temp_min),
            max: celsius(parsed.main.temp_max),
        },
        // Number keeps the provider's rendering, so 3.0 stays "3.0" and 997 stays "997".
        pressure: format!("{} hPa", parsed.main.pressure),
        humidity: format!("{}%", parsed.main.humidity.trunc() as i64),
        wind: Wind {
            speed: format!("{} m/s", parsed.wind.speed),
            direction: wind_direction(parsed.wind.deg).to_string(),
        },
    })
}

/// Accepts the provider's `{"list": [...]}` envelope or a bare array of cities.
pub fn transform_cities(payload: &Value) -> Result<CityListResult, TransformError> {
    let list = payload.get("list").unwrap_or(payload);
    let cities = Vec::<OwCity>::deserialize(list)?;

    cities
        .into_iter()
        .map(|city| {
            let country = city
                .sys
                .map(|sys| sys.country)
                .or(city.country)
                .ok_or(TransformError::Missing("country"))?;

            Ok(CityEntry {
                id: city.id,
                name: format!("{}, {}", city.name, country),
            })
        })
        .collect()
}

fn celsius(value: f64) -> String {
    format!("{}°C", value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dubai() -> Value {
        json!({
            "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02n"}],
            "main": {"temp": 32, "feels_like": 38.18, "temp_min": 32, "temp_max": 33, "pressure": 997, "humidity": 79},
            "wind": {"speed": 3.1, "deg": 150},
            "name": "Dubai"
        })
    }

    #[test]
    fn weather_payload_is_shaped() {
        let actual = transform_weather(&dubai()).expect("transform");

        let expected = WeatherResult {
            city: "Dubai".into(),
            description: "few clouds".into(),
            temperature: Temperature {
                average: "32°C".into(),
                min: "32°C".into(),
                max: "33°C".into(),
            },
            pressure: "997 hPa".into(),
            humidity: "79%".into(),
            wind: Wind {
                speed: "3.1 m/s".into(),
                direction: "SSE".into(),
            },
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn temperatures_are_truncated() {
        let mut payload = dubai();
        payload["main"]["temp"] = json!(21.9);
        payload["main"]["temp_min"] = json!(-3.7);

        let result = transform_weather(&payload).unwrap();
        assert_eq!(result.temperature.average, "21°C");
        assert_eq!(result.temperature.min, "-3°C");
    }

    #[test]
    fn pressure_and_speed_keep_provider_text() {
        let mut payload = dubai();
        payload["wind"]["speed"] = json!(3.0);
        payload["main"]["pressure"] = json!(1013.25);

        let result = transform_weather(&payload).unwrap();
        assert_eq!(result.wind.speed, "3.0 m/s");
        assert_eq!(result.pressure, "1013.25 hPa");

        payload["wind"]["speed"] = json!(0);
        assert_eq!(transform_weather(&payload).unwrap().wind.speed, "0 m/s");
    }

    #[test]
    fn non_numeric_speed_is_malformed() {
        let mut payload = dubai();
        payload["wind"]["speed"] = json!("fast");
        assert!(matches!(
            transform_weather(&payload),
            Err(TransformError::Malformed(_))
        ));
    }

    #[test]
    fn missing_fields_fail_loudly() {
        let mut payload = dubai();
        payload["main"].as_object_mut().unwrap().remove("pressure");
        assert!(matches!(
            transform_weather(&payload),
            Err(TransformError::Malformed(_))
        ));

        let mut payload = dubai();
        payload["weather"] = json!([]);
        assert!(matches!(
            transform_weather(&payload),
            Err(TransformError::Missing(_))
        ));
    }

    #[test]
    fn wind_direction_sectors() {
        assert_eq!(wind_direction(150.0), "SSE");
        assert_eq!(wind_direction(135.0), "SE");
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(359.0), "N");
        assert_eq!(wind_direction(11.24), "N");
        assert_eq!(wind_direction(11.25), "NNE");
        assert_eq!(wind_direction(90.0), "E");
        assert_eq!(wind_direction(180.0), "S");
        assert_eq!(wind_direction(270.0), "W");
        assert_eq!(wind_direction(337.5), "NNW");
    }

    #[test]
    fn bare_city_list_preserves_order() {
        let payload = json!([
            {"name": "Berlin", "id": 100, "country": "DE"},
            {"name": "Berlin", "id": 200, "country": "US"},
            {"name": "Berlin", "id": 100, "country": "DE"}
        ]);

        let actual = transform_cities(&payload).unwrap();
        let ids: Vec<i64> = actual.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![100, 200, 100]);
        assert_eq!(actual[0].name, "Berlin, DE");
        assert_eq!(actual[1].name, "Berlin, US");
    }

    #[test]
    fn find_envelope_uses_sys_country() {
        let payload = json!({
            "message": "accurate",
            "count": 1,
            "list": [{"id": 1, "name": "Berlin", "sys": {"country": "DE"}}]
        });

        let actual = transform_cities(&payload).unwrap();
        assert_eq!(
            actual,
            vec![CityEntry {
                id: 1,
                name: "Berlin, DE".into()
            }]
        );
    }

    #[test]
    fn city_without_country_is_an_error() {
        let payload = json!([{"name": "Atlantis", "id": 9}]);
        assert!(matches!(
            transform_cities(&payload),
            Err(TransformError::Missing("country"))
        ));
    }
}
