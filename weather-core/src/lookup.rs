//! Internal-to-provider city id resolution.

use async_trait::async_trait;
use std::{collections::HashMap, fmt::Debug};

#[async_trait]
pub trait CityLookup: Send + Sync + Debug {
    /// `None` if the internal id is unknown.
    async fn resolve_external_id(&self, internal_id: i64) -> Option<i64>;
}

/// Used when no lookup table is configured: internal and provider ids coincide.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughLookup;

#[async_trait]
impl CityLookup for PassthroughLookup {
    async fn resolve_external_id(&self, internal_id: i64) -> Option<i64> {
        Some(internal_id)
    }
}

/// Fixed table, typically loaded from the `[cities]` config section.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCityLookup {
    ids: HashMap<i64, i64>,
}

impl InMemoryCityLookup {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<(i64, i64)> for InMemoryCityLookup {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CityLookup for InMemoryCityLookup {
    async fn resolve_external_id(&self, internal_id: i64) -> Option<i64> {
        self.ids.get(&internal_id).copied()
    }
}
