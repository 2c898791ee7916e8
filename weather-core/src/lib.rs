//! Core library for the weather finder API.
//!
//! This crate defines:
//! - Configuration loading and validation
//! - Input validation for the weather and city endpoints
//! - The OpenWeatherMap client and response shaping
//! - The cache-backed request pipeline tying them together
//!
//! It is used by `weather-api`, but can also be embedded in other services.

pub mod cache;
pub mod config;
pub mod error;
pub mod i18n;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod service;
pub mod transform;
pub mod validate;

pub use cache::{CacheKey, CacheStore, InMemoryCache};
pub use config::Config;
pub use error::{ExternalApiError, ServiceError, TransformError, ValidationError};
pub use lookup::{CityLookup, InMemoryCityLookup, PassthroughLookup};
pub use model::{CityEntry, CityListResult, ResourceKind, WeatherResult};
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use service::WeatherService;
pub use validate::Params;
