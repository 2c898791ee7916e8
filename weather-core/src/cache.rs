//! Response cache: key construction, the store interface, and an in-process store.

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fmt,
    fmt::Debug,
    time::{Duration, Instant},
};

use crate::{error::CacheError, model::ResourceKind};

/// Identity of a cached response. The identifier is lowercased so free-text queries
/// differing only in case share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ResourceKind,
    language: String,
    identifier: String,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, language: &str, identifier: &str) -> Self {
        Self {
            kind,
            language: language.to_string(),
            identifier: identifier.trim().to_lowercase(),
        }
    }

    pub fn weather(city_id: i64, language: &str) -> Self {
        Self::new(ResourceKind::Weather, language, &city_id.to_string())
    }

    pub fn cities(query: &str, language: &str) -> Self {
        Self::new(ResourceKind::Cities, language, query)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.language, self.identifier)
    }
}

/// Shared key/value store with per-entry TTL and version tags.
///
/// Entries written under one version are invisible to reads under any other.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    async fn get(&self, key: &str, version: u32) -> Result<Option<String>, CacheError>;

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        version: u32,
    ) -> Result<(), CacheError>;
}

/// Read and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &CacheKey,
    version: u32,
) -> Result<Option<T>, CacheError> {
    match store.get(&key.to_string(), version).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(CacheError::Decode),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub async fn set_json<T: Serialize>(
    store: &dyn CacheStore,
    key: &CacheKey,
    value: &T,
    ttl: Duration,
    version: u32,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value).map_err(CacheError::Encode)?;
    store.set(&key.to_string(), raw, ttl, version).await
}

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with. A rewrite restarts the clock.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local store, bounded in size. Expired entries are evicted in the
/// background whether or not they are read again.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    entries: Cache<String, Entry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }

    /// Number of live entries, after pending evictions have been applied.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn versioned(key: &str, version: u32) -> String {
        format!(":{version}:{key}")
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str, version: u32) -> Result<Option<String>, CacheError> {
        let entry = self.entries.get(&Self::versioned(key, version)).await;
        Ok(entry.map(|entry| entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        version: u32,
    ) -> Result<(), CacheError> {
        self.entries
            .insert(Self::versioned(key, version), Entry { value, ttl })
            .await;
        Ok(())
    }
}
