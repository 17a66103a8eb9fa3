pub mod amadeus;
pub mod app_config;
pub mod aviationstack;
pub mod http;
pub mod resiliency;

pub use amadeus::AmadeusProvider;
pub use aviationstack::AviationStackDirectory;
pub use resiliency::{CircuitBreaker, CircuitBreakerProvider};

use farefinder_core::{AirlineDirectory, FlightProvider, ProviderError};
use std::sync::Arc;

use app_config::Config;

/// Flight providers in registration order, each behind its own circuit breaker.
pub fn flight_providers(config: &Config) -> Result<Vec<Arc<dyn FlightProvider>>, ProviderError> {
    let timeout = config.providers.request_timeout();
    let amadeus: Arc<dyn FlightProvider> =
        Arc::new(AmadeusProvider::new(&config.providers.amadeus, timeout)?);

    Ok(vec![Arc::new(CircuitBreakerProvider::new(amadeus, &config.resiliency))])
}

pub fn airline_directory(config: &Config) -> Result<Arc<dyn AirlineDirectory>, ProviderError> {
    let directory = AviationStackDirectory::new(
        &config.providers.aviationstack,
        config.providers.request_timeout(),
    )?;
    Ok(Arc::new(directory))
}
