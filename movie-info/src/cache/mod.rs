//! Single-flight caches.
//!
//! [`ValueCache`] memoizes one asynchronous computation and [`KeyedValueCache`]
//! does the same independently for every key. Concurrent callers asking for a
//! value that is being produced attach to the running producer instead of
//! starting another one, and all of them receive the same outcome. Failures are
//! handed to the attached callers and then forgotten, so the next call starts
//! the producer again.

mod entry;
mod keyed;
mod value;

pub use keyed::KeyedValueCache;
pub use value::ValueCache;

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "graphql")]
use async_graphql::SimpleObject;

/// Retention policy of a cache.
///
/// Both limits are off by default: resolved values live as long as the cache
/// and the number of keys is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a resolved value stays valid
    #[serde(rename = "ttl_seconds", deserialize_with = "ttl_from_seconds")]
    pub ttl: Option<Duration>,
    /// Maximum number of resolved values kept by a keyed cache
    pub max_entries: Option<usize>,
}

impl CacheConfig {
    /// Cache that never expires nor evicts anything
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

fn ttl_from_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = Option::<i64>::deserialize(deserializer)?;
    Ok(seconds.map(Duration::seconds))
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
pub struct CacheStats {
    pub total_entries: usize,
    pub resolved_entries: usize,
    pub in_flight_entries: usize,
    pub max_entries: Option<usize>,
}
