use super::entry::{self, Attach, CacheEntry, Joined};
use super::{CacheConfig, CacheStats};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type Producer<K, V, E> = Box<dyn Fn(K) -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

/// Cache partitioned by key, every key behaving like its own
/// [`ValueCache`](super::ValueCache).
///
/// Looking up an entry and deciding whether to start the producer happen under
/// the entry lock of the underlying map, so two callers racing for a brand new
/// key still start a single fetch. Keys never block each other.
///
/// Without `max_entries` the store only grows; resolved values are evicted
/// oldest first once the limit is exceeded.
pub struct KeyedValueCache<K, V, E>
where
    K: Hash + Eq,
{
    inner: Arc<Inner<K, V, E>>,
}

struct Inner<K, V, E>
where
    K: Hash + Eq,
{
    name: String,
    config: CacheConfig,
    entries: DashMap<K, CacheEntry<V, E>>,
    producer: Producer<K, V, E>,
}

impl<K, V, E> Clone for KeyedValueCache<K, V, E>
where
    K: Hash + Eq,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E> KeyedValueCache<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, producer: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self::with_config(name, CacheConfig::default(), producer)
    }

    pub fn with_config<F, Fut>(name: impl Into<String>, config: CacheConfig, producer: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                config,
                entries: DashMap::new(),
                producer: Box::new(move |key| producer(key).boxed()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the value cached for `key`, producing it if needed.
    ///
    /// # Panics
    ///
    /// Panics when the producer this call waited for panicked. See
    /// [`try_value`](Self::try_value) for a non-panicking variant.
    pub async fn value(&self, key: K) -> Result<V, E> {
        self.join(key).wait(&self.inner.name).await
    }

    /// Same as [`value`](Self::value), but yields `None` when the producer
    /// panicked.
    pub async fn try_value(&self, key: K) -> Option<Result<V, E>> {
        self.join(key).try_wait().await
    }

    fn join(&self, key: K) -> Joined<V, E> {
        let attach = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::Empty)
            .attach(self.inner.config.ttl);

        match attach {
            Attach::Hit(value) => {
                log::debug!("Cache hit in '{}' for key: {:?}", self.inner.name, key);
                Joined::Ready(value)
            }
            Attach::Wait(rx) => {
                log::debug!(
                    "Joining in-flight fetch in '{}' for key: {:?}",
                    self.inner.name,
                    key
                );
                Joined::Pending(rx)
            }
            Attach::Lead(rx) => {
                log::debug!("Cache miss in '{}' for key: {:?}", self.inner.name, key);
                self.spawn_producer(key);
                Joined::Pending(rx)
            }
        }
    }

    /// Forgets the value resolved for `key`. A fetch already running for it
    /// still resolves its waiters, but its value is not kept.
    pub fn invalidate(&self, key: &K) {
        let mut invalidated = false;
        self.inner.entries.remove_if_mut(key, |_, entry| {
            invalidated = entry.invalidate();
            entry.is_empty()
        });
        if invalidated {
            log::debug!("Invalidated key in '{}': {:?}", self.inner.name, key);
        }
    }

    /// Forgets every resolved value. Running fetches are kept, their values
    /// won't be.
    pub fn clear(&self) {
        self.inner.entries.retain(|_, entry| {
            entry.invalidate();
            !entry.is_empty()
        });
        log::info!("Cache '{}' cleared", self.inner.name);
    }

    /// Number of keys either resolved or being fetched
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let (mut resolved_entries, mut in_flight_entries) = (0, 0);
        for entry in self.inner.entries.iter() {
            if entry.value().is_in_flight() {
                in_flight_entries += 1;
            } else if entry.value().resolved_at().is_some() {
                resolved_entries += 1;
            }
        }

        CacheStats {
            total_entries: resolved_entries + in_flight_entries,
            resolved_entries,
            in_flight_entries,
            max_entries: self.inner.config.max_entries,
        }
    }

    // The future is built inside the task so a panicking producer always
    // resets its entry.
    fn spawn_producer(&self, key: K) {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let produced = AssertUnwindSafe(async { (inner.producer)(key.clone()).await })
                .catch_unwind()
                .await;
            match produced {
                Ok(result) => inner.complete(key, result),
                Err(_) => {
                    log::warn!("Producer of '{}' panicked for key: {:?}", inner.name, key);
                    inner.entries.remove(&key);
                }
            }
        });
    }
}

impl<K, V, E> Inner<K, V, E>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
    E: Clone,
{
    fn complete(&self, key: K, result: Result<V, E>) {
        let waiters = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let waiters = occupied.get_mut().resolve(&result);
                if occupied.get().is_empty() {
                    occupied.remove();
                }
                waiters
            }
            Entry::Vacant(_) => Vec::new(),
        };

        match &result {
            Ok(_) => log::debug!(
                "Stored value in '{}' for key: {:?}, notifying {} waiters",
                self.name,
                key,
                waiters.len()
            ),
            Err(_) => log::warn!(
                "Fetch in '{}' failed for key: {:?}, notifying {} waiters",
                self.name,
                key,
                waiters.len()
            ),
        }
        if result.is_ok() {
            self.enforce_capacity();
        }
        entry::notify(waiters, &result);
    }

    fn enforce_capacity(&self) {
        let Some(max_entries) = self.config.max_entries else {
            return;
        };
        if self.resolved_count() <= max_entries {
            return;
        }

        self.evict_expired();

        let mut resolved: Vec<_> = self
            .entries
            .iter()
            .filter_map(|entry| entry.value().resolved_at().map(|at| (entry.key().clone(), at)))
            .collect();
        if resolved.len() <= max_entries {
            return;
        }

        // Oldest first
        resolved.sort_by_key(|(_, created_at)| *created_at);
        let to_remove = resolved.len() - max_entries;
        for (key, _) in resolved.into_iter().take(to_remove) {
            self.entries
                .remove_if(&key, |_, entry| entry.resolved_at().is_some());
        }

        log::debug!("Evicted {} oldest entries from '{}'", to_remove, self.name);
    }

    fn evict_expired(&self) {
        let ttl = self.config.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl));

        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            log::debug!("Evicted {} expired entries from '{}'", evicted, self.name);
        }
    }

    fn resolved_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().resolved_at().is_some())
            .count()
    }
}
