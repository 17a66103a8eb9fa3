use farefinder_core::{FlightProvider, NormalizedFlightOffer, ProviderError, SearchParams};
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::history::SearchHistory;
use crate::state::{CommitOutcome, SearchState, SearchStore};
use crate::{SearchError, SearchResult};

#[derive(Debug, Default)]
struct SessionCore {
    store: SearchStore,
    history: SearchHistory,
}

/// Drives one session's searches: records history, marks the store pending,
/// queries every provider and commits the aggregated outcome.
///
/// The lock is never held across a provider call, so several searches can be
/// in flight at once. Only the most recently issued one may commit.
pub struct SearchOrchestrator {
    providers: Vec<Arc<dyn FlightProvider>>,
    clock: Arc<dyn Clock>,
    core: Arc<Mutex<SessionCore>>,
}

impl SearchOrchestrator {
    pub fn new(providers: Vec<Arc<dyn FlightProvider>>) -> SearchResult<Self> {
        if providers.is_empty() {
            return Err(SearchError::NoProviders);
        }
        Ok(Self {
            providers,
            clock: Arc::new(SystemClock),
            core: Arc::new(Mutex::new(SessionCore::default())),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run a search.
    ///
    /// Invalid criteria are rejected before anything is recorded. Otherwise
    /// the attempt is pushed onto the history, whatever its outcome. The
    /// returned error is the same value committed to the state.
    ///
    /// The provider query and the commit run on their own task, so dropping
    /// the returned future never leaves the session stuck in `Pending`.
    pub async fn search(&self, params: SearchParams) -> SearchResult<Vec<NormalizedFlightOffer>> {
        let params = params.validate(self.clock.today())?;

        let ticket = {
            let mut core = self.core.lock().await;
            core.history.record(params.clone());
            core.store.begin_pending(params.clone())
        };
        let request = ticket.request();
        info!(
            %request,
            origin = %params.origin,
            destination = %params.destination,
            date = %params.departure_date,
            "Flight search started"
        );

        let providers = self.providers.clone();
        let core = Arc::clone(&self.core);
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(query_providers(&providers, &params))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::UnknownProviderError(
                        "provider panicked during search".to_string(),
                    ))
                });

            let mut core = core.lock().await;
            match outcome {
                Ok(offers) => {
                    let commit = core.store.commit_success(ticket, offers.clone());
                    log_commit(commit, request, "succeeded");
                    info!(%request, offers = offers.len(), "Flight search succeeded");
                    Ok(offers)
                }
                Err(err) => {
                    let commit = core.store.commit_failure(ticket, err.clone());
                    log_commit(commit, request, "failed");
                    warn!(%request, kind = ?err.kind(), error = %err, "Flight search failed");
                    Err(SearchError::Provider(err))
                }
            }
        });

        task.await.unwrap_or_else(|err| {
            error!(%request, error = %err, "Search task did not finish");
            Err(SearchError::Provider(ProviderError::UnknownProviderError(
                "search task did not finish".to_string(),
            )))
        })
    }

    /// Back to `Idle`. History is kept.
    pub async fn clear(&self) {
        self.core.lock().await.store.reset();
        debug!("Search state cleared");
    }

    /// Re-issue the most recent search, pushing a duplicate history entry.
    /// Returns `None` without touching anything when history is empty.
    pub async fn retry(&self) -> Option<SearchResult<Vec<NormalizedFlightOffer>>> {
        let latest = self.core.lock().await.history.latest().cloned();
        match latest {
            Some(params) => {
                info!(origin = %params.origin, destination = %params.destination, "Retrying last search");
                Some(self.search(params).await)
            }
            None => {
                debug!("Retry requested with empty history");
                None
            }
        }
    }

    pub async fn state(&self) -> SearchState {
        self.core.lock().await.store.state().clone()
    }

    pub async fn history(&self) -> SearchHistory {
        self.core.lock().await.history.clone()
    }

    /// State and history read under one lock.
    pub async fn snapshot(&self) -> (SearchState, SearchHistory) {
        let core = self.core.lock().await;
        (core.store.state().clone(), core.history.clone())
    }

}

async fn query_providers(
    providers: &[Arc<dyn FlightProvider>],
    params: &SearchParams,
) -> Result<Vec<NormalizedFlightOffer>, ProviderError> {
    let outcomes = join_all(providers.iter().map(|p| p.fetch_offers(params))).await;
    let names = providers.iter().map(|p| p.name());
    aggregate(names.zip(outcomes))
}

/// Concatenate successful batches in provider order. Fails only when every
/// provider failed, with the first provider's error.
fn aggregate<'a>(
    outcomes: impl IntoIterator<Item = (&'a str, Result<Vec<NormalizedFlightOffer>, ProviderError>)>,
) -> Result<Vec<NormalizedFlightOffer>, ProviderError> {
    let mut offers = Vec::new();
    let mut first_error = None;
    let mut any_success = false;

    for (provider, outcome) in outcomes {
        match outcome {
            Ok(mut batch) => {
                any_success = true;
                offers.append(&mut batch);
            }
            Err(err) => {
                warn!(provider, kind = ?err.kind(), error = %err, "Provider query failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) if !any_success => Err(err),
        _ => Ok(offers),
    }
}

fn log_commit(commit: CommitOutcome, request: crate::state::RequestId, outcome: &str) {
    if commit == CommitOutcome::Discarded {
        debug!(%request, outcome, "Superseded search result discarded");
    }
}
