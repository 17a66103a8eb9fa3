use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::amount::DecimalAmount;

/// Provider-agnostic projection of a purchasable itinerary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFlightOffer {
    pub id: String,
    /// Tag of the provider that produced the offer (e.g. `amadeus`).
    pub provider: String,
    pub itineraries: Vec<Itinerary>,
    pub price: Price,
    pub validating_carriers: Vec<String>,
}

impl NormalizedFlightOffer {
    pub fn segment_count(&self) -> usize {
        self.itineraries.iter().map(|i| i.segments.len()).sum()
    }
}

/// One direction of travel (outbound or return).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// ISO-8601 duration as reported by the provider, e.g. `PT1H55M`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure_airport: String,
    /// Local time at the departure airport.
    pub departure_at: NaiveDateTime,
    pub arrival_airport: String,
    pub arrival_at: NaiveDateTime,
    pub carrier_code: String,
    pub flight_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub total: DecimalAmount,
    pub currency: String,
}

/// Airline reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airline {
    pub code: String,
    pub name: String,
}
