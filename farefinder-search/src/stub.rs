//! In-process providers for tests and local runs.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use farefinder_core::{
    FlightProvider, Itinerary, NormalizedFlightOffer, Price, ProviderError,
    SearchParams, Segment,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

pub type ProviderOutcome = Result<Vec<NormalizedFlightOffer>, ProviderError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One-segment CGK→DPS offer priced at `total` IDR.
///
/// # Panics
///
/// Panics if `total` is not a non-negative decimal.
pub fn sample_offer(provider: &str, id: &str, total: &str) -> NormalizedFlightOffer {
    let departure_at = NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(7, 30, 0))
        .expect("valid sample departure");

    NormalizedFlightOffer {
        id: id.to_string(),
        provider: provider.to_string(),
        itineraries: vec![Itinerary {
            duration: Some("PT1H50M".to_string()),
            segments: vec![Segment {
                departure_airport: "CGK".to_string(),
                departure_at,
                arrival_airport: "DPS".to_string(),
                arrival_at: departure_at + Duration::minutes(110),
                carrier_code: "GA".to_string(),
                flight_number: "402".to_string(),
            }],
        }],
        price: Price {
            total: total.parse().expect("sample offer total must be a decimal"),
            currency: "IDR".to_string(),
        },
        validating_carriers: vec!["GA".to_string()],
    }
}

/// Replays scripted outcomes in order, repeating the last one once the
/// script runs out.
pub struct StubProvider {
    name: String,
    script: Mutex<VecDeque<ProviderOutcome>>,
    last: Mutex<ProviderOutcome>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(Ok(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(name: &str, offers: Vec<NormalizedFlightOffer>) -> Self {
        Self::new(name).then(Ok(offers))
    }

    pub fn failing(name: &str, error: ProviderError) -> Self {
        Self::new(name).then(Err(error))
    }

    pub fn then(self, outcome: ProviderOutcome) -> Self {
        lock(&self.script).push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlightProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_offers(&self, _params: &SearchParams) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.script).pop_front();
        match next {
            Some(outcome) => {
                *lock(&self.last) = outcome.clone();
                outcome
            }
            None => lock(&self.last).clone(),
        }
    }
}

/// Holds each call open until the test releases it through the sender
/// returned by [`GatedProvider::gate`]. Every call announces its params on the
/// `started` channel once it is in flight.
pub struct GatedProvider {
    name: String,
    gates: Mutex<HashMap<SearchParams, oneshot::Receiver<ProviderOutcome>>>,
    started: mpsc::UnboundedSender<SearchParams>,
}

impl GatedProvider {
    pub fn new(name: &str) -> (Self, mpsc::UnboundedReceiver<SearchParams>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let provider = Self {
            name: name.to_string(),
            gates: Mutex::new(HashMap::new()),
            started,
        };
        (provider, started_rx)
    }

    pub fn gate(&self, params: &SearchParams) -> oneshot::Sender<ProviderOutcome> {
        let (tx, rx) = oneshot::channel();
        lock(&self.gates).insert(params.clone(), rx);
        tx
    }
}

#[async_trait]
impl FlightProvider for GatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_offers(&self, params: &SearchParams) -> ProviderOutcome {
        let gate = lock(&self.gates).remove(params);
        let _ = self.started.send(params.clone());
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(ProviderError::ProviderUnavailable(format!("{}: gate dropped", self.name)))
            }),
            None => Err(ProviderError::UnknownProviderError(format!(
                "{}: no gate for {} -> {}",
                self.name, params.origin, params.destination
            ))),
        }
    }
}
