use chrono::{DateTime, Utc};
use farefinder_core::{NormalizedFlightOffer, ProviderError, SearchParams};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use crate::history::SearchHistory;
use crate::orchestrator::SearchOrchestrator;
use crate::state::{SearchState, SearchStatus};
use crate::SearchResult;

/// Consumer-facing handle for one UI session. Forwards to its orchestrator
/// and tracks when it was last used.
pub struct SearchSession {
    id: Uuid,
    orchestrator: SearchOrchestrator,
    created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
}

/// Everything a view needs to render the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: SearchStatus,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<SearchParams>,
    pub results: Vec<NormalizedFlightOffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    pub history: SearchHistory,
}

impl SearchSession {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            orchestrator,
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_active_ms.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_active() < cutoff
    }

    pub async fn search(&self, params: SearchParams) -> SearchResult<Vec<NormalizedFlightOffer>> {
        self.touch();
        self.orchestrator.search(params).await
    }

    pub async fn clear(&self) {
        self.touch();
        self.orchestrator.clear().await;
    }

    pub async fn retry(&self) -> Option<SearchResult<Vec<NormalizedFlightOffer>>> {
        self.touch();
        self.orchestrator.retry().await
    }

    pub async fn status(&self) -> SearchStatus {
        self.orchestrator.state().await.status()
    }

    pub async fn results(&self) -> Vec<NormalizedFlightOffer> {
        self.orchestrator.state().await.results().to_vec()
    }

    pub async fn error(&self) -> Option<ProviderError> {
        self.orchestrator.state().await.error().cloned()
    }

    pub async fn state(&self) -> SearchState {
        self.orchestrator.state().await
    }

    pub async fn history(&self) -> Vec<SearchParams> {
        self.orchestrator.history().await.to_vec()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let (state, history) = self.orchestrator.snapshot().await;
        SessionSnapshot {
            session_id: self.id,
            status: state.status(),
            loading: state.is_loading(),
            params: state.params().cloned(),
            results: state.results().to_vec(),
            error: state.error().cloned(),
            history,
        }
    }

    fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::stub::{sample_offer, StubProvider};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn session(provider: StubProvider) -> SearchSession {
        let orchestrator = SearchOrchestrator::new(vec![Arc::new(provider)])
            .unwrap()
            .with_clock(Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())));
        SearchSession::new(orchestrator)
    }

    fn params() -> SearchParams {
        SearchParams::one_way("CGK", "DPS", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn test_session_exposes_state_and_history() {
        let session = session(StubProvider::returning("stub", vec![sample_offer("stub", "1", "100")]));
        assert_eq!(session.status().await, SearchStatus::Idle);

        session.search(params()).await.unwrap();
        assert_eq!(session.status().await, SearchStatus::Succeeded);
        assert_eq!(session.results().await.len(), 1);
        assert!(session.error().await.is_none());
        assert_eq!(session.history().await, vec![params()]);

        session.clear().await;
        assert_eq!(session.status().await, SearchStatus::Idle);
        assert_eq!(session.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_wire_shape() {
        let session = session(StubProvider::failing(
            "stub",
            ProviderError::RateLimited("429".into()),
        ));
        let _ = session.search(params()).await;

        let json = serde_json::to_value(session.snapshot().await).unwrap();
        assert_eq!(json["status"], "Failed");
        assert_eq!(json["loading"], false);
        assert_eq!(json["error"]["kind"], "RateLimited");
        assert_eq!(json["results"].as_array().unwrap().len(), 0);
        assert_eq!(json["history"][0]["origin"], "CGK");
        assert_eq!(json["sessionId"], session.id().to_string());
    }

    #[tokio::test]
    async fn test_activity_is_tracked() {
        let session = session(StubProvider::returning("stub", vec![]));
        let before = session.last_active();
        session.clear().await;
        assert!(session.last_active() >= before);
        assert!(session.is_idle_since(Utc::now() + chrono::Duration::seconds(1)));
        assert!(!session.is_idle_since(session.created_at() - chrono::Duration::seconds(1)));
    }
}
