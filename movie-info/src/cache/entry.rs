use chrono::{DateTime, Duration, Utc};
use tokio::sync::oneshot;

pub(crate) type Waiter<V, E> = oneshot::Sender<Result<V, E>>;

/// State of one cached value.
pub(crate) enum CacheEntry<V, E> {
    Empty,
    /// A producer is running; callers waiting for it, in attach order. A stale
    /// fetch was invalidated while running: its outcome is delivered but not
    /// kept.
    InFlight { waiters: Vec<Waiter<V, E>>, stale: bool },
    Resolved { value: V, created_at: DateTime<Utc> },
}

/// What a caller has to do after attaching to an entry.
pub(crate) enum Attach<V, E> {
    Hit(V),
    /// Someone else's producer is running.
    Wait(oneshot::Receiver<Result<V, E>>),
    /// The caller owns the entry and has to start the producer.
    Lead(oneshot::Receiver<Result<V, E>>),
}

/// Outcome of joining a cache: a fresh value or a running fetch to wait for.
pub(crate) enum Joined<V, E> {
    Ready(V),
    Pending(oneshot::Receiver<Result<V, E>>),
}

impl<V, E> Joined<V, E> {
    pub(crate) async fn wait(self, cache: &str) -> Result<V, E> {
        match self {
            Joined::Ready(value) => Ok(value),
            Joined::Pending(rx) => wait(rx, cache).await,
        }
    }

    pub(crate) async fn try_wait(self) -> Option<Result<V, E>> {
        match self {
            Joined::Ready(value) => Some(Ok(value)),
            Joined::Pending(rx) => try_wait(rx).await,
        }
    }
}

impl<V: Clone, E: Clone> CacheEntry<V, E> {
    /// Must be called under the lock guarding the entry: checking the state
    /// and installing the waiter list happen as one step.
    pub(crate) fn attach(&mut self, ttl: Option<Duration>) -> Attach<V, E> {
        if let CacheEntry::Resolved { value, created_at } = self {
            if is_fresh(created_at, ttl) {
                return Attach::Hit(value.clone());
            }
        }

        let (tx, rx) = oneshot::channel();
        match self {
            CacheEntry::InFlight { waiters, .. } => {
                waiters.push(tx);
                Attach::Wait(rx)
            }
            _ => {
                *self = CacheEntry::InFlight {
                    waiters: vec![tx],
                    stale: false,
                };
                Attach::Lead(rx)
            }
        }
    }

    /// Stores the outcome of the producer and hands back the waiters to notify.
    /// Errors and stale fetches leave the entry empty.
    pub(crate) fn resolve(&mut self, result: &Result<V, E>) -> Vec<Waiter<V, E>> {
        let (waiters, stale) = match std::mem::replace(self, CacheEntry::Empty) {
            CacheEntry::InFlight { waiters, stale } => (waiters, stale),
            _ => (Vec::new(), false),
        };

        if let (Ok(value), false) = (result, stale) {
            *self = CacheEntry::Resolved {
                value: value.clone(),
                created_at: Utc::now(),
            };
        }

        waiters
    }

    /// Drops a resolved value. A running producer keeps its waiters, but its
    /// outcome won't be stored. Returns whether anything changed.
    pub(crate) fn invalidate(&mut self) -> bool {
        match self {
            CacheEntry::Resolved { .. } => {
                *self = CacheEntry::Empty;
                true
            }
            CacheEntry::InFlight { stale, .. } => !std::mem::replace(stale, true),
            CacheEntry::Empty => false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, CacheEntry::Empty)
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        matches!(self, CacheEntry::InFlight { .. })
    }

    pub(crate) fn resolved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CacheEntry::Resolved { created_at, .. } => Some(*created_at),
            _ => None,
        }
    }

    pub(crate) fn is_expired(&self, ttl: Option<Duration>) -> bool {
        self.resolved_at()
            .is_some_and(|created_at| !is_fresh(&created_at, ttl))
    }
}

fn is_fresh(created_at: &DateTime<Utc>, ttl: Option<Duration>) -> bool {
    ttl.map_or(true, |ttl| Utc::now() < *created_at + ttl)
}

/// Sends one outcome to every waiter, first attached first.
pub(crate) fn notify<V: Clone, E: Clone>(waiters: Vec<Waiter<V, E>>, result: &Result<V, E>) {
    for waiter in waiters {
        // The receiving caller may have gone away; nothing to do then.
        let _ = waiter.send(result.clone());
    }
}

/// Waits for the producer the caller is attached to. `None` when the
/// producer panicked before resolving the entry.
pub(crate) async fn try_wait<V, E>(rx: oneshot::Receiver<Result<V, E>>) -> Option<Result<V, E>> {
    rx.await.ok()
}

/// Same as [`try_wait`], re-raising a producer panic in the caller.
pub(crate) async fn wait<V, E>(rx: oneshot::Receiver<Result<V, E>>, cache: &str) -> Result<V, E> {
    match try_wait(rx).await {
        Some(result) => result,
        None => panic!("producer of cache '{}' panicked before resolving", cache),
    }
}
