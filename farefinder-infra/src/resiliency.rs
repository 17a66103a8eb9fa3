use async_trait::async_trait;
use farefinder_core::{ErrorKind, FlightProvider, NormalizedFlightOffer, ProviderError, SearchParams};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::app_config::ResiliencyConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failure detected, failing fast
    HalfOpen, // One probe allowed through
}

struct BreakerInner {
    state: CircuitState,
    failure_count: usize,
    last_failure: Option<Instant>,
    /// When the current half-open probe went out. A probe whose caller was
    /// dropped never reports back, so the slot is reclaimed after
    /// `reset_timeout`.
    probe_started: Option<Instant>,
}

pub struct CircuitBreaker {
    pub name: String,
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                probe_started: None,
            }),
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Whether a call may go out now.
    pub async fn check(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .last_failure
                    .map(|at| at.elapsed() >= self.reset_timeout)
                    .unwrap_or(true);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started = Some(Instant::now());
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                }
                cooled_down
            }
            CircuitState::HalfOpen => match inner.probe_started {
                Some(at) if at.elapsed() < self.reset_timeout => false,
                abandoned => {
                    if abandoned.is_some() {
                        tracing::warn!("Circuit Breaker [{}] probe never reported, retrying", self.name);
                    }
                    inner.probe_started = Some(Instant::now());
                    true
                }
            },
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == CircuitState::HalfOpen {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.probe_started = None;
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failure_count += 1;
        inner.probe_started = None;

        if inner.failure_count >= self.failure_threshold || inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.last_failure = Some(Instant::now());
            tracing::error!(
                "Circuit Breaker [{}] TRIPPED to Open. Failures: {}",
                self.name,
                inner.failure_count
            );
        }
    }
}

/// Wraps a provider so that repeated outages fail fast instead of waiting on
/// the network. Only `ProviderUnavailable` counts as a failure; any other
/// answer proves the provider is reachable.
pub struct CircuitBreakerProvider {
    inner: Arc<dyn FlightProvider>,
    breaker: CircuitBreaker,
}

impl CircuitBreakerProvider {
    pub fn new(inner: Arc<dyn FlightProvider>, config: &ResiliencyConfig) -> Self {
        let breaker = CircuitBreaker::new(
            inner.name(),
            config.failure_threshold,
            Duration::from_secs(config.reset_timeout_seconds),
        );
        Self { inner, breaker }
    }

    pub fn with_breaker(inner: Arc<dyn FlightProvider>, breaker: CircuitBreaker) -> Self {
        Self { inner, breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl FlightProvider for CircuitBreakerProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_offers(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<NormalizedFlightOffer>, ProviderError> {
        if !self.breaker.check().await {
            return Err(ProviderError::ProviderUnavailable(format!(
                "{}: circuit open",
                self.inner.name()
            )));
        }

        let outcome = self.inner.fetch_offers(params).await;
        match &outcome {
            Err(err) if err.kind() == ErrorKind::ProviderUnavailable => {
                self.breaker.record_failure().await
            }
            _ => self.breaker.record_success().await,
        }
        outcome
    }
}
