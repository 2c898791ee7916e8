//! The cache-backed request pipeline:
//! validate → cache read → upstream fetch → transform → cache write.

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::{future::Future, sync::Arc};

use crate::{
    cache::{self, CacheKey, CacheStore, InMemoryCache},
    config::Config,
    error::ServiceError,
    lookup::{CityLookup, InMemoryCityLookup, PassthroughLookup},
    model::{CityListResult, WeatherResult},
    provider::{OpenWeatherClient, WeatherProvider},
    transform,
    validate::{self, Params},
};

/// Handles weather and city requests. Cheap to clone and share between workers.
#[derive(Debug, Clone)]
pub struct WeatherService {
    config: Arc<Config>,
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn CacheStore>,
    lookup: Arc<dyn CityLookup>,
}

impl WeatherService {
    pub fn new(
        config: Config,
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<dyn CacheStore>,
        lookup: Arc<dyn CityLookup>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            cache,
            lookup,
        }
    }

    /// Wire the OpenWeatherMap client, an in-process cache and the configured city table.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = Arc::new(OpenWeatherClient::new(&config.upstream)?);

        let table = config.city_table();
        let lookup: Arc<dyn CityLookup> = if table.is_empty() {
            Arc::new(PassthroughLookup)
        } else {
            tracing::info!(cities = table.len(), "using configured city lookup table");
            Arc::new(table.into_iter().collect::<InMemoryCityLookup>())
        };

        let store = Arc::new(InMemoryCache::with_capacity(config.cache.max_entries));

        Ok(Self::new(config, provider, store, lookup))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Language to render error messages in: the requested one if supported, else the default.
    pub fn message_language(&self, params: &Params) -> String {
        params
            .get("language")
            .filter(|lang| self.config.languages.is_supported(lang))
            .cloned()
            .unwrap_or_else(|| self.config.languages.default.clone())
    }

    /// Current weather for the city identified by the `city_id` path parameter.
    pub async fn weather(
        &self,
        city_id: Option<&str>,
        params: &Params,
    ) -> Result<WeatherResult, ServiceError> {
        let query = validate::validate_weather(city_id, params, &self.config.languages)
            .inspect_err(|err| tracing::debug!(error = %err, "rejected weather request"))?;
        let external_id = validate::resolve_external_id(query.city_id, self.lookup.as_ref())
            .await
            .inspect_err(|err| tracing::debug!(error = %err, "rejected weather request"))?;

        let key = CacheKey::weather(query.city_id, &query.language);
        self.cached(key, || async {
            let raw = self
                .provider
                .fetch_weather(external_id, &query.language)
                .await?;
            Ok::<_, ServiceError>(transform::transform_weather(&raw)?)
        })
        .await
    }

    /// Cities matching the free-text `query` parameter.
    pub async fn cities(&self, params: &Params) -> Result<CityListResult, ServiceError> {
        let query = validate::validate_cities(params, &self.config.languages)
            .inspect_err(|err| tracing::debug!(error = %err, "rejected city search"))?;

        let key = CacheKey::cities(&query.query, &query.language);
        self.cached(key, || async {
            let raw = self
                .provider
                .fetch_cities(&query.query, &query.language)
                .await?;
            Ok::<_, ServiceError>(transform::transform_cities(&raw)?)
        })
        .await
    }

    /// Serve `key` from cache, or run `fetch` and cache its result.
    ///
    /// Nothing is written when `fetch` fails. Cache faults degrade to a miss.
    async fn cached<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let policy = self.config.cache_policy(key.kind());

        match cache::get_json::<T>(self.cache.as_ref(), &key, policy.version).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "cache hit");
                return Ok(hit);
            }
            Ok(None) => tracing::debug!(key = %key, "cache miss"),
            Err(err) => tracing::warn!(key = %key, error = %err, "cache read failed, fetching"),
        }

        let value = fetch().await.inspect_err(|err| {
            if let ServiceError::Transform(err) = err {
                tracing::error!(key = %key, error = %err, "upstream payload broke the response contract");
            }
        })?;

        if let Err(err) =
            cache::set_json(self.cache.as_ref(), &key, &value, policy.ttl(), policy.version).await
        {
            tracing::warn!(key = %key, error = %err, "cache write failed");
        }

        Ok(value)
    }
}
