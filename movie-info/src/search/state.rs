use getset::{CopyGetters, Getters};

/// One page returned by a page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<I> {
    /// 1-based page number
    pub number: u32,
    pub items: Vec<I>,
    pub has_next_page: bool,
}

impl<I> Page<I> {
    pub fn new(number: u32, items: Vec<I>, has_next_page: bool) -> Self {
        Self {
            number,
            items,
            has_next_page,
        }
    }

    /// A page with no results and nothing after it.
    pub fn empty(number: u32) -> Self {
        Self::new(number, Vec::new(), false)
    }
}

/// Where a [`SearchController`](super::SearchController) stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase<E> {
    Idle,
    LoadingFirst,
    LoadingNext,
    Loaded,
    Exhausted,
    Failed(E),
}

impl<E> Phase<E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::LoadingFirst | Phase::LoadingNext)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Phase::Failed(_))
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Snapshot of a search: what has been loaded so far and what is happening.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct SearchState<I, C, E> {
    #[get = "pub"]
    phase: Phase<E>,
    /// Context of the last started search
    #[get = "pub"]
    context: Option<C>,
    /// Last page fetched successfully, 0 before any
    #[get_copy = "pub"]
    current_page: u32,
    /// Every item of the current search, in fetch order
    #[get = "pub"]
    items: Vec<I>,
    #[get_copy = "pub"]
    has_next_page: bool,
    /// Bumped by every start, results of older generations are dropped
    #[get_copy = "pub"]
    generation: u64,
}

impl<I, C, E> Default for SearchState<I, C, E> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            context: None,
            current_page: 0,
            items: Vec::new(),
            has_next_page: false,
            generation: 0,
        }
    }
}

impl<I, C, E> SearchState<I, C, E> {
    /// Starts a new generation for `context`, dropping all loaded items.
    pub(crate) fn restart(&mut self, context: C, phase: Phase<E>) -> u64 {
        self.generation += 1;
        self.phase = phase;
        self.context = Some(context);
        self.current_page = 0;
        self.items.clear();
        self.has_next_page = false;
        self.generation
    }

    /// Moves to `LoadingNext` and returns the page to fetch, or `None` when
    /// nothing can be loaded from the current phase.
    pub(crate) fn begin_next(&mut self) -> Option<u32> {
        if !matches!(self.phase, Phase::Loaded) || self.context.is_none() {
            return None;
        }
        self.phase = Phase::LoadingNext;
        Some(self.current_page + 1)
    }

    pub(crate) fn apply_page(&mut self, page: Page<I>) {
        if matches!(self.phase, Phase::LoadingFirst) {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.current_page = page.number;
        self.has_next_page = page.has_next_page;
        self.phase = if page.has_next_page {
            Phase::Loaded
        } else {
            Phase::Exhausted
        };
    }

    /// Keeps whatever was loaded before the failure.
    pub(crate) fn apply_error(&mut self, err: E) {
        self.phase = Phase::Failed(err);
    }

    /// Leaves a loading phase without a result. Returns whether the phase
    /// changed.
    pub(crate) fn abort_loading(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::LoadingFirst => Phase::Idle,
            Phase::LoadingNext => Phase::Loaded,
            _ => return false,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = SearchState<char, (), String>;

    #[test]
    fn test_restart_clears_progress() {
        let mut state = State::default();
        state.restart((), Phase::LoadingFirst);
        state.apply_page(Page::new(1, vec!['a', 'b'], true));

        let generation = state.restart((), Phase::LoadingFirst);

        assert_eq!(generation, 2);
        assert!(state.items().is_empty());
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.phase(), &Phase::LoadingFirst);
    }

    #[test]
    fn test_pages_are_appended_in_order() {
        let mut state = State::default();
        state.restart((), Phase::LoadingFirst);
        state.apply_page(Page::new(1, vec!['a', 'b'], true));
        assert_eq!(state.begin_next(), Some(2));
        state.apply_page(Page::new(2, vec!['c', 'd'], false));

        assert_eq!(state.items(), &vec!['a', 'b', 'c', 'd']);
        assert_eq!(state.current_page(), 2);
        assert_eq!(state.phase(), &Phase::Exhausted);
        assert!(!state.has_next_page());
    }

    #[test]
    fn test_begin_next_only_from_loaded() {
        let mut state = State::default();
        assert_eq!(state.begin_next(), None);

        state.restart((), Phase::LoadingFirst);
        assert_eq!(state.begin_next(), None);

        state.apply_page(Page::new(1, vec!['a'], true));
        assert_eq!(state.begin_next(), Some(2));
        assert_eq!(state.begin_next(), None);

        state.apply_error("offline".to_string());
        assert_eq!(state.begin_next(), None);
        assert_eq!(state.items(), &vec!['a']);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_abort_loading_restores_previous_phase() {
        let mut state = State::default();
        assert!(!state.abort_loading());

        state.restart((), Phase::LoadingFirst);
        assert!(state.abort_loading());
        assert_eq!(state.phase(), &Phase::Idle);

        state.restart((), Phase::LoadingFirst);
        state.apply_page(Page::new(1, vec!['a'], true));
        state.begin_next();
        assert!(state.abort_loading());
        assert_eq!(state.phase(), &Phase::Loaded);
        assert_eq!(state.items(), &vec!['a']);
        assert_eq!(state.begin_next(), Some(2));
    }

    #[test]
    fn test_phase_helpers() {
        assert!(Phase::<()>::LoadingFirst.is_loading());
        assert!(Phase::<()>::LoadingNext.is_loading());
        assert!(!Phase::<()>::Loaded.is_loading());
        assert_eq!(Phase::Failed(3).error(), Some(&3));
        assert!(Phase::Failed(3).is_failed());
    }
}
