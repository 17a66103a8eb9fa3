use async_trait::async_trait;
use chrono::NaiveDateTime;
use farefinder_core::{
    CabinClass, DecimalAmount, FlightProvider, Itinerary, NormalizedFlightOffer, Price,
    ProviderError, SearchParams, Secret, Segment,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::app_config::AmadeusConfig;
use crate::http;

pub const PROVIDER_TAG: &str = "amadeus";

/// Refresh the access token this long before the provider says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Flight Offers Search (self-service API, v2).
pub struct AmadeusProvider {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: Secret,
    max_results: u32,
    currency: Option<String>,
    token: Mutex<Option<AccessToken>>,
}

impl AmadeusProvider {
    pub fn new(config: &AmadeusConfig, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            max_results: config.max_results,
            currency: config.currency.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose()),
            ])
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER_TAG, e))?;

        // Rejected credentials are a deployment problem, not the user's.
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ProviderError::ProviderUnavailable(format!(
                "{}: credentials rejected ({})",
                PROVIDER_TAG,
                response.status()
            )));
        }

        let token: TokenResponse = http::read_json(PROVIDER_TAG, response).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        info!("Obtained {} access token valid for {}s", PROVIDER_TAG, lifetime.as_secs());

        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn query(&self, params: &SearchParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("originLocationCode", params.origin.clone()),
            ("destinationLocationCode", params.destination.clone()),
            ("departureDate", params.departure_date.format("%Y-%m-%d").to_string()),
            ("adults", params.passengers.to_string()),
            ("travelClass", travel_class(params.cabin_class).to_string()),
            ("max", self.max_results.to_string()),
        ];
        if let Some(return_date) = params.return_date {
            query.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(currency) = &self.currency {
            query.push(("currencyCode", currency.clone()));
        }
        query
    }
}

#[async_trait]
impl FlightProvider for AmadeusProvider {
    fn name(&self) -> &str {
        PROVIDER_TAG
    }

    async fn fetch_offers(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<NormalizedFlightOffer>, ProviderError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}/v2/shopping/flight-offers", self.base_url))
            .bearer_auth(&token)
            .query(&self.query(params))
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER_TAG, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            *self.token.lock().await = None;
            return Err(ProviderError::ProviderUnavailable(format!(
                "{}: access token rejected",
                PROVIDER_TAG
            )));
        }

        let body: OffersResponse = http::read_json(PROVIDER_TAG, response).await?;
        debug!("{} returned {} offers", PROVIDER_TAG, body.data.len());

        body.data.into_iter().map(AmadeusOffer::normalize).collect()
    }
}

fn travel_class(cabin: CabinClass) -> &'static str {
    match cabin {
        CabinClass::Economy => "ECONOMY",
        CabinClass::PremiumEconomy => "PREMIUM_ECONOMY",
        CabinClass::Business => "BUSINESS",
        CabinClass::First => "FIRST",
    }
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<AmadeusOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusOffer {
    id: String,
    itineraries: Vec<AmadeusItinerary>,
    price: AmadeusPrice,
    #[serde(default)]
    validating_airline_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AmadeusItinerary {
    duration: Option<String>,
    segments: Vec<AmadeusSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusSegment {
    departure: AmadeusEndpoint,
    arrival: AmadeusEndpoint,
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusEndpoint {
    iata_code: String,
    at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusPrice {
    currency: String,
    total: Option<Value>,
    grand_total: Option<Value>,
}

impl AmadeusOffer {
    fn normalize(self) -> Result<NormalizedFlightOffer, ProviderError> {
        // grandTotal includes ticketing fees; older responses only carry total.
        let raw_total = self
            .price
            .grand_total
            .or(self.price.total)
            .ok_or_else(|| {
                ProviderError::UnknownProviderError(format!(
                    "{}: offer {} has no price",
                    PROVIDER_TAG, self.id
                ))
            })?;
        let total = DecimalAmount::from_json(&raw_total)?;

        let itineraries = self
            .itineraries
            .into_iter()
            .map(|itinerary| Itinerary {
                duration: itinerary.duration,
                segments: itinerary
                    .segments
                    .into_iter()
                    .map(|s| Segment {
                        departure_airport: s.departure.iata_code,
                        departure_at: s.departure.at,
                        arrival_airport: s.arrival.iata_code,
                        arrival_at: s.arrival.at,
                        carrier_code: s.carrier_code,
                        flight_number: s.number,
                    })
                    .collect(),
            })
            .collect();

        Ok(NormalizedFlightOffer {
            id: self.id,
            provider: PROVIDER_TAG.to_string(),
            itineraries,
            price: Price {
                total,
                currency: self.price.currency,
            },
            validating_carriers: self.validating_airline_codes,
        })
    }
}
