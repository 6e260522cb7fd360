use super::state::{Page, Phase, SearchState};
use futures::future::{BoxFuture, FutureExt};
use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;

type PageFetcher<I, C, E> = Box<dyn Fn(u32, C) -> BoxFuture<'static, Result<Page<I>, E>> + Send + Sync>;

/// Input of a search.
pub trait SearchContext: Clone + Debug + Send + Sync + 'static {
    /// An empty query resolves to an exhausted search without fetching
    /// anything.
    fn is_empty_query(&self) -> bool {
        false
    }
}

impl SearchContext for () {}

impl SearchContext for String {
    fn is_empty_query(&self) -> bool {
        self.trim().is_empty()
    }
}

impl SearchContext for Option<String> {
    fn is_empty_query(&self) -> bool {
        self.as_deref().map_or(true, |query| query.trim().is_empty())
    }
}

/// Drives a paginated fetch function and accumulates its pages.
///
/// `start` begins a new search from page 1, `load_next` appends the following
/// page. The state is published through a [`watch`] channel; every transition
/// goes through the channel's write lock so commands issued from different
/// tasks never interleave halfway.
///
/// Each `start` opens a new generation. A fetch issued for an older generation
/// may still complete, but its result is dropped.
pub struct SearchController<I, C, E> {
    inner: Arc<Inner<I, C, E>>,
}

struct Inner<I, C, E> {
    name: String,
    state: watch::Sender<SearchState<I, C, E>>,
    fetch: PageFetcher<I, C, E>,
}

impl<I, C, E> Clone for SearchController<I, C, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, C, E> SearchController<I, C, E>
where
    I: Clone + Send + Sync + 'static,
    C: SearchContext,
    E: Clone + Debug + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(u32, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<I>, E>> + Send + 'static,
    {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state,
                fetch: Box::new(move |page, context| fetch(page, context).boxed()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Starts a new search for `context`, discarding everything loaded so far
    /// and any fetch still running.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self, context: C) {
        if context.is_empty_query() {
            self.inner.state.send_modify(|state| {
                state.restart(context, Phase::Exhausted);
            });
            log::debug!("[{}] Empty query, nothing to fetch", self.inner.name);
            return;
        }

        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            generation = state.restart(context.clone(), Phase::LoadingFirst);
        });

        log::debug!(
            "[{}] Starting search #{} for {:?}",
            self.inner.name,
            generation,
            context
        );
        self.spawn_fetch(generation, 1, context);
    }

    /// Fetches the page after the last loaded one.
    ///
    /// Only acts when the current phase is `Loaded`; returns whether a fetch
    /// was issued.
    pub fn load_next(&self) -> bool {
        let mut next = None;
        self.inner.state.send_if_modified(|state| match state.begin_next() {
            Some(page) => {
                next = state
                    .context()
                    .clone()
                    .map(|context| (state.generation(), page, context));
                true
            }
            None => false,
        });

        match next {
            Some((generation, page, context)) => {
                log::debug!("[{}] Loading page {}", self.inner.name, page);
                self.spawn_fetch(generation, page, context);
                true
            }
            None => {
                log::debug!(
                    "[{}] Ignoring load next while {:?}",
                    self.inner.name,
                    self.inner.state.borrow().phase()
                );
                false
            }
        }
    }

    /// Current state
    pub fn state(&self) -> SearchState<I, C, E> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified of every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SearchState<I, C, E>> {
        self.inner.state.subscribe()
    }

    /// Waits until no fetch is running and returns the state at that point.
    pub async fn settled(&self) -> SearchState<I, C, E> {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| !state.phase().is_loading())
            .await
            .map(|state| state.clone());

        // The sender lives as long as `self`, the receiver cannot be closed.
        settled.unwrap_or_else(|_| self.state())
    }

    fn spawn_fetch(&self, generation: u64, page: u32, context: C) {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let fetched = AssertUnwindSafe(async { (inner.fetch)(page, context).await })
                .catch_unwind()
                .await;
            match fetched {
                Ok(result) => inner.complete(generation, page, result),
                Err(_) => inner.abandon(generation, page),
            }
        });
    }
}

impl<I, C, E: Debug> Inner<I, C, E> {
    fn complete(&self, generation: u64, page: u32, result: Result<Page<I>, E>) {
        let name = &self.name;
        self.state.send_if_modified(|state| {
            if state.generation() != generation {
                log::debug!(
                    "[{}] Dropping page {} of stale search #{} (current #{})",
                    name,
                    page,
                    generation,
                    state.generation()
                );
                return false;
            }

            match result {
                Ok(page) => {
                    log::debug!(
                        "[{}] Page {} loaded with {} items",
                        name,
                        page.number,
                        page.items.len()
                    );
                    state.apply_page(page);
                }
                Err(err) => {
                    log::warn!("[{}] Fetching page {} failed: {:?}", name, page, err);
                    state.apply_error(err);
                }
            }
            true
        });
    }

    // A panicking fetch leaves no result behind; the search goes back to
    // where it was before the fetch started.
    fn abandon(&self, generation: u64, page: u32) {
        let name = &self.name;
        self.state.send_if_modified(|state| {
            if state.generation() != generation {
                return false;
            }
            log::warn!("[{}] Fetch of page {} panicked", name, page);
            state.abort_loading()
        });
    }
}
