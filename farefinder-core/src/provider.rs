use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::offer::{Airline, NormalizedFlightOffer};
use crate::search::SearchParams;
use crate::CoreError;

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    ProviderUnavailable,
    RateLimited,
    UnknownProviderError,
}

/// Failure reported by a provider adapter, already classified.
///
/// Stored in the search state and handed back to the caller, so it is cheap
/// to clone and compares by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message")]
pub enum ProviderError {
    #[error("Provider rejected the request: {0}")]
    InvalidRequest(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Provider rate limit reached: {0}")]
    RateLimited(String),
    #[error("Unexpected provider response: {0}")]
    UnknownProviderError(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ProviderError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            ProviderError::RateLimited(_) => ErrorKind::RateLimited,
            ProviderError::UnknownProviderError(_) => ErrorKind::UnknownProviderError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderError::InvalidRequest(m)
            | ProviderError::ProviderUnavailable(m)
            | ProviderError::RateLimited(m)
            | ProviderError::UnknownProviderError(m) => m,
        }
    }
}

impl From<CoreError> for ProviderError {
    fn from(err: CoreError) -> Self {
        ProviderError::UnknownProviderError(err.to_string())
    }
}

/// A source of priced flight offers.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Short tag stamped on every offer this provider returns.
    fn name(&self) -> &str;

    /// Query the provider and normalize its answer. Does not validate `params`.
    async fn fetch_offers(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<NormalizedFlightOffer>, ProviderError>;
}

/// Static airline reference data.
#[async_trait]
pub trait AirlineDirectory: Send + Sync {
    async fn list_airlines(&self) -> Result<Vec<Airline>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wire_shape() {
        let err = ProviderError::RateLimited("amadeus: 429".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "RateLimited");
        assert_eq!(json["message"], "amadeus: 429");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_amount_errors_are_unknown_shape() {
        let err: ProviderError = CoreError::InvalidAmount("-1".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::UnknownProviderError);
    }
}
