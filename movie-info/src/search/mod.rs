//! Incremental loading of paginated results.

mod controller;
mod state;

pub use controller::{SearchContext, SearchController};
pub use state::{Page, Phase, SearchState};
