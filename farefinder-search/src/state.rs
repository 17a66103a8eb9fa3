use farefinder_core::{NormalizedFlightOffer, ProviderError, SearchParams};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number of a search invocation within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Session search state. Each variant carries only what is meaningful in it,
/// so results and error can never both be present.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Pending {
        request: RequestId,
        params: SearchParams,
    },
    Succeeded {
        params: SearchParams,
        offers: Vec<NormalizedFlightOffer>,
    },
    Failed {
        params: SearchParams,
        error: ProviderError,
    },
}

impl SearchState {
    pub fn status(&self) -> SearchStatus {
        match self {
            SearchState::Idle => SearchStatus::Idle,
            SearchState::Pending { .. } => SearchStatus::Pending,
            SearchState::Succeeded { .. } => SearchStatus::Succeeded,
            SearchState::Failed { .. } => SearchStatus::Failed,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Pending { .. })
    }

    /// Offers of the last successful search; empty in every other state.
    pub fn results(&self) -> &[NormalizedFlightOffer] {
        match self {
            SearchState::Succeeded { offers, .. } => offers,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            SearchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Criteria of the search in flight or last resolved.
    pub fn params(&self) -> Option<&SearchParams> {
        match self {
            SearchState::Idle => None,
            SearchState::Pending { params, .. }
            | SearchState::Succeeded { params, .. }
            | SearchState::Failed { params, .. } => Some(params),
        }
    }

    fn pending_request(&self) -> Option<RequestId> {
        match self {
            SearchState::Pending { request, .. } => Some(*request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Begin {
        request: RequestId,
        params: SearchParams,
    },
    Succeed {
        request: RequestId,
        offers: Vec<NormalizedFlightOffer>,
    },
    Fail {
        request: RequestId,
        error: ProviderError,
    },
    Reset,
}

/// Pure transition function.
///
/// `Begin` and `Reset` apply from any state. `Succeed` and `Fail` only apply
/// while the state is pending on the same request; anything else is a
/// superseded or cleared search and leaves the state untouched.
pub fn reduce(state: SearchState, event: SearchEvent) -> SearchState {
    match (state, event) {
        (_, SearchEvent::Begin { request, params }) => SearchState::Pending { request, params },
        (_, SearchEvent::Reset) => SearchState::Idle,
        (SearchState::Pending { request, params }, SearchEvent::Succeed { request: done, offers })
            if request == done =>
        {
            SearchState::Succeeded { params, offers }
        }
        (SearchState::Pending { request, params }, SearchEvent::Fail { request: done, error })
            if request == done =>
        {
            SearchState::Failed { params, error }
        }
        (state, SearchEvent::Succeed { .. } | SearchEvent::Fail { .. }) => state,
    }
}

/// Proof that a search was marked pending. Consumed by exactly one commit.
#[derive(Debug)]
#[must_use = "a pending search must be committed"]
pub struct PendingTicket {
    request: RequestId,
}

impl PendingTicket {
    pub fn request(&self) -> RequestId {
        self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// A later search (or a reset) happened while this one was in flight.
    Discarded,
}

/// Owner of one session's `SearchState`. Every mutation goes through
/// [`reduce`].
#[derive(Debug, Default)]
pub struct SearchStore {
    state: SearchState,
    last_request: u64,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Issue the next request number and enter `Pending`.
    pub fn begin_pending(&mut self, params: SearchParams) -> PendingTicket {
        self.last_request += 1;
        let request = RequestId(self.last_request);
        self.dispatch(SearchEvent::Begin { request, params });
        PendingTicket { request }
    }

    pub fn commit_success(
        &mut self,
        ticket: PendingTicket,
        offers: Vec<NormalizedFlightOffer>,
    ) -> CommitOutcome {
        let outcome = self.outcome_for(&ticket);
        self.dispatch(SearchEvent::Succeed {
            request: ticket.request,
            offers,
        });
        outcome
    }

    pub fn commit_failure(&mut self, ticket: PendingTicket, error: ProviderError) -> CommitOutcome {
        let outcome = self.outcome_for(&ticket);
        self.dispatch(SearchEvent::Fail {
            request: ticket.request,
            error,
        });
        outcome
    }

    pub fn reset(&mut self) {
        self.dispatch(SearchEvent::Reset);
    }

    fn outcome_for(&self, ticket: &PendingTicket) -> CommitOutcome {
        if self.state.pending_request() == Some(ticket.request) {
            CommitOutcome::Applied
        } else {
            CommitOutcome::Discarded
        }
    }

    fn dispatch(&mut self, event: SearchEvent) {
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, event);
    }
}
