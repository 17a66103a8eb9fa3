pub mod clock;
pub mod history;
pub mod orchestrator;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "test-util"))]
pub mod stub;

pub use clock::{Clock, FixedClock, SystemClock};
pub use history::{SearchHistory, HISTORY_CAPACITY};
pub use orchestrator::SearchOrchestrator;
pub use session::{SearchSession, SessionSnapshot};
pub use state::{SearchState, SearchStatus, SearchStore};

use farefinder_core::{ProviderError, ValidationError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid search: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("No flight providers configured")]
    NoProviders,
}

pub type SearchResult<T> = Result<T, SearchError>;
