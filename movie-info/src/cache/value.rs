use super::entry::{self, Attach, CacheEntry, Joined};
use super::{CacheConfig, CacheStats};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type Producer<V, E> = Box<dyn Fn() -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

/// Lazily computed value shared by every consumer.
///
/// The producer runs at most once at a time. Its value is kept for the
/// lifetime of the cache (or until the configured TTL runs out), its errors are
/// only delivered to the callers that were waiting for it.
pub struct ValueCache<V, E> {
    inner: Arc<Inner<V, E>>,
}

struct Inner<V, E> {
    name: String,
    config: CacheConfig,
    entry: Mutex<CacheEntry<V, E>>,
    producer: Producer<V, E>,
}

impl<V, E> Clone for ValueCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> ValueCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self::with_config(name, CacheConfig::default(), producer)
    }

    pub fn with_config<F, Fut>(name: impl Into<String>, config: CacheConfig, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                config,
                entry: Mutex::new(CacheEntry::Empty),
                producer: Box::new(move || producer().boxed()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the cached value, producing it if needed.
    ///
    /// # Panics
    ///
    /// Panics when the producer this call waited for panicked. See
    /// [`try_value`](Self::try_value) for a non-panicking variant.
    pub async fn value(&self) -> Result<V, E> {
        self.join().wait(&self.inner.name).await
    }

    /// Same as [`value`](Self::value), but yields `None` when the producer
    /// panicked. The entry is reset either way.
    pub async fn try_value(&self) -> Option<Result<V, E>> {
        self.join().try_wait().await
    }

    fn join(&self) -> Joined<V, E> {
        let attach = self.inner.entry.lock().attach(self.inner.config.ttl);

        match attach {
            Attach::Hit(value) => {
                log::debug!("Cache hit for '{}'", self.inner.name);
                Joined::Ready(value)
            }
            Attach::Wait(rx) => {
                log::debug!("Joining in-flight fetch for '{}'", self.inner.name);
                Joined::Pending(rx)
            }
            Attach::Lead(rx) => {
                log::debug!("Cache miss for '{}', fetching", self.inner.name);
                self.spawn_producer();
                Joined::Pending(rx)
            }
        }
    }

    /// Forgets the resolved value, if any. A fetch already running still
    /// resolves its waiters, but its value is not kept.
    pub fn invalidate(&self) {
        if self.inner.entry.lock().invalidate() {
            log::info!("Cache '{}' invalidated", self.inner.name);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entry = self.inner.entry.lock();
        let resolved = usize::from(entry.resolved_at().is_some());
        let in_flight = usize::from(entry.is_in_flight());

        CacheStats {
            total_entries: resolved + in_flight,
            resolved_entries: resolved,
            in_flight_entries: in_flight,
            max_entries: Some(1),
        }
    }

    // Runs detached so the waiters are resolved even if the leading caller
    // stops polling. Building the future happens in the task too, so a panic
    // there resets the entry as well.
    fn spawn_producer(&self) {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let produced = AssertUnwindSafe(async { (inner.producer)().await })
                .catch_unwind()
                .await;
            match produced {
                Ok(result) => {
                    let waiters = inner.entry.lock().resolve(&result);
                    match &result {
                        Ok(_) => log::debug!(
                            "Stored value for '{}', notifying {} waiters",
                            inner.name,
                            waiters.len()
                        ),
                        Err(_) => log::warn!(
                            "Fetch for '{}' failed, notifying {} waiters",
                            inner.name,
                            waiters.len()
                        ),
                    }
                    entry::notify(waiters, &result);
                }
                Err(_) => {
                    log::warn!("Producer of '{}' panicked", inner.name);
                    // Dropping the waiters wakes them up with the failure.
                    *inner.entry.lock() = CacheEntry::Empty;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use tokio::sync::Notify;

    fn counting_cache(
        execution_count: Arc<AtomicUsize>,
        delay: StdDuration,
    ) -> ValueCache<u32, String> {
        ValueCache::new("test", move || {
            let execution_count = execution_count.clone();
            async move {
                let run = execution_count.fetch_add(1, Ordering::SeqCst) as u32;
                tokio::time::sleep(delay).await;
                Ok(run + 100)
            }
        })
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(execution_count.clone(), StdDuration::from_millis(50));

        let results = join_all((0..10).map(|_| cache.value())).await;

        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|result| *result == Ok(100)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_across_tasks() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(execution_count.clone(), StdDuration::from_millis(50));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.value().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(100));
        }
        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolved_value_is_reused() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(execution_count.clone(), StdDuration::ZERO);

        assert_eq!(cache.value().await, Ok(100));
        assert_eq!(cache.value().await, Ok(100));
        assert_eq!(execution_count.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.resolved_entries, 1);
        assert_eq!(stats.in_flight_entries, 0);
    }

    #[tokio::test]
    async fn test_error_is_not_sticky() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let count = execution_count.clone();
        let cache: ValueCache<u32, String> = ValueCache::new("flaky", move || {
            let run = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if run == 0 {
                    Err("offline".to_string())
                } else {
                    Ok(7)
                }
            }
        });

        assert_eq!(cache.value().await, Err("offline".to_string()));
        assert_eq!(cache.stats().total_entries, 0);
        assert_eq!(cache.value().await, Ok(7));
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_is_shared_by_all_waiters() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let count = execution_count.clone();
        let cache: ValueCache<u32, String> = ValueCache::new("failing", move || {
            count.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(StdDuration::from_millis(30)).await;
                Err("timeout".to_string())
            }
        });

        let results = join_all((0..4).map(|_| cache.value())).await;

        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
        assert!(results
            .iter()
            .all(|result| *result == Err("timeout".to_string())));
    }

    #[tokio::test]
    async fn test_invalidate_produces_again() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(execution_count.clone(), StdDuration::ZERO);

        assert_eq!(cache.value().await, Ok(100));
        cache.invalidate();
        assert_eq!(cache.value().await, Ok(101));
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ttl_expires_value() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let count = execution_count.clone();
        let cache: ValueCache<usize, String> = ValueCache::with_config(
            "short-lived",
            CacheConfig::default().with_ttl(chrono::Duration::milliseconds(20)),
            move || {
                let run = count.fetch_add(1, Ordering::SeqCst);
                async move { Ok(run) }
            },
        );

        assert_eq!(cache.value().await, Ok(0));
        assert_eq!(cache.value().await, Ok(0));
        tokio::time::sleep(StdDuration::from_millis(40)).await;
        assert_eq!(cache.value().await, Ok(1));
    }

    #[tokio::test]
    async fn test_fetch_completes_when_leader_is_dropped() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let (count, producer_started, producer_release) =
            (execution_count.clone(), started.clone(), release.clone());
        let cache: ValueCache<u32, String> = ValueCache::new("detached", move || {
            count.fetch_add(1, Ordering::SeqCst);
            let (started, release) = (producer_started.clone(), producer_release.clone());
            async move {
                started.notify_one();
                release.notified().await;
                Ok(5)
            }
        });

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.value().await })
        };
        started.notified().await;
        leader.abort();
        release.notify_one();

        assert_eq!(cache.value().await, Ok(5));
        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_producer_resets_entry() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let count = execution_count.clone();
        let cache: ValueCache<u32, String> = ValueCache::new("panicky", move || {
            let run = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if run == 0 {
                    panic!("producer blew up");
                }
                Ok(9)
            }
        });

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.value().await })
        };
        assert!(first.await.unwrap_err().is_panic());

        assert_eq!(cache.value().await, Ok(9));
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_factory_resets_entry() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let count = execution_count.clone();
        let cache: ValueCache<u32, String> = ValueCache::new("factory", move || {
            if count.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("could not build the fetch");
            }
            async { Ok(4) }
        });

        assert_eq!(cache.try_value().await, None);
        assert_eq!(cache.stats().total_entries, 0);

        let second = tokio::time::timeout(StdDuration::from_secs(1), cache.value()).await;
        assert_eq!(second, Ok(Ok(4)));
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_value_reports_panic_to_every_waiter() {
        let release = Arc::new(Notify::new());
        let gate = release.clone();
        let cache: ValueCache<u32, String> = ValueCache::new("panicky", move || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                panic!("producer blew up");
            }
        });

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.try_value().await })
            })
            .collect();
        tokio::task::yield_now().await;
        release.notify_one();

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), None);
        }
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_drops_its_value() {
        let execution_count = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let (count, producer_started, producer_release) =
            (execution_count.clone(), started.clone(), release.clone());
        let cache: ValueCache<usize, String> = ValueCache::new("outdated", move || {
            let run = count.fetch_add(1, Ordering::SeqCst);
            let (started, release) = (producer_started.clone(), producer_release.clone());
            async move {
                started.notify_one();
                if run == 0 {
                    release.notified().await;
                }
                Ok(run)
            }
        });

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.value().await })
        };
        started.notified().await;
        cache.invalidate();
        assert_eq!(cache.stats().in_flight_entries, 1);
        release.notify_one();

        // Waiters of the outdated fetch still get its outcome
        assert_eq!(first.await.unwrap(), Ok(0));
        assert_eq!(cache.stats().total_entries, 0);

        assert_eq!(cache.value().await, Ok(1));
        assert_eq!(cache.value().await, Ok(1));
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }
}
