pub mod amount;
pub mod offer;
pub mod provider;
pub mod search;
pub mod secret;

pub use amount::DecimalAmount;
pub use offer::{Airline, Itinerary, NormalizedFlightOffer, Price, Segment};
pub use provider::{AirlineDirectory, ErrorKind, FlightProvider, ProviderError};
pub use search::{CabinClass, SearchParams, ValidationError};
pub use secret::Secret;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid decimal amount: {0:?}")]
    InvalidAmount(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
