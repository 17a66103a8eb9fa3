use chrono::{DateTime, Duration, Utc};
use farefinder_core::FlightProvider;
use farefinder_search::{Clock, SearchError, SearchOrchestrator, SearchSession, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Live search sessions keyed by id, with idle expiry.
pub struct SessionRegistry {
    providers: Vec<Arc<dyn FlightProvider>>,
    clock: Arc<dyn Clock>,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<SearchSession>>>,
}

impl SessionRegistry {
    pub fn new(providers: Vec<Arc<dyn FlightProvider>>, idle_ttl: Duration) -> Result<Self, SearchError> {
        if providers.is_empty() {
            return Err(SearchError::NoProviders);
        }
        Ok(Self {
            providers,
            clock: Arc::new(SystemClock),
            idle_ttl,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start a session with empty state and history.
    pub async fn create(&self) -> Result<Arc<SearchSession>, SearchError> {
        let orchestrator = SearchOrchestrator::new(self.providers.clone())?.with_clock(self.clock.clone());
        let session = Arc::new(SearchSession::new(orchestrator));
        self.sessions.write().await.insert(session.id(), session.clone());
        tracing::info!("Search session {} started", session.id());
        Ok(session)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<SearchSession>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// End a session, discarding its state.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!("Search session {} ended", id);
        }
        removed
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub async fn cleanup_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();

        sessions.retain(|_, session| !session.is_idle_since(cutoff));

        initial_count - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Periodically run [`cleanup_idle`](Self::cleanup_idle).
    pub fn spawn_sweeper(self: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = self.cleanup_idle(Utc::now()).await;
                if removed > 0 {
                    tracing::info!("Expired {} idle search sessions", removed);
                }
            }
        })
    }
}
