use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_PASSENGERS: u32 = 9;

/// Cabin requested for every leg of the search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "economy" => Ok(CabinClass::Economy),
            "premium_economy" => Ok(CabinClass::PremiumEconomy),
            "business" => Ok(CabinClass::Business),
            "first" => Ok(CabinClass::First),
            other => Err(ValidationError::UnknownCabinClass(other.to_string())),
        }
    }
}

impl TryFrom<String> for CabinClass {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Criteria for a single flight search. Compared structurally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
    #[serde(default)]
    pub cabin_class: CabinClass,
}

impl SearchParams {
    /// One-way economy search for a single passenger.
    pub fn one_way(origin: &str, destination: &str, departure_date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date,
            return_date: None,
            passengers: 1,
            cabin_class: CabinClass::Economy,
        }
    }

    pub fn with_return(mut self, return_date: NaiveDate) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn with_cabin(mut self, cabin_class: CabinClass) -> Self {
        self.cabin_class = cabin_class;
        self
    }

    /// Check the criteria against `today` and return them with airport codes
    /// upper-cased.
    pub fn validate(&self, today: NaiveDate) -> Result<SearchParams, ValidationError> {
        let origin = normalize_airport(&self.origin, "origin")?;
        let destination = normalize_airport(&self.destination, "destination")?;

        if origin == destination {
            return Err(ValidationError::SameOriginAndDestination(origin));
        }
        if self.departure_date < today {
            return Err(ValidationError::DepartureInPast(self.departure_date));
        }
        if let Some(return_date) = self.return_date {
            if return_date < self.departure_date {
                return Err(ValidationError::ReturnBeforeDeparture {
                    departure: self.departure_date,
                    return_date,
                });
            }
        }
        if self.passengers == 0 || self.passengers > MAX_PASSENGERS {
            return Err(ValidationError::PassengerCount(self.passengers));
        }

        Ok(SearchParams {
            origin,
            destination,
            ..self.clone()
        })
    }
}

fn normalize_airport(code: &str, field: &'static str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidAirportCode {
            field,
            code: code.to_string(),
        });
    }
    Ok(code.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be a three-letter IATA code, got {code:?}")]
    InvalidAirportCode { field: &'static str, code: String },
    #[error("origin and destination are both {0}")]
    SameOriginAndDestination(String),
    #[error("departure date {0} is in the past")]
    DepartureInPast(NaiveDate),
    #[error("return date {return_date} is before departure date {departure}")]
    ReturnBeforeDeparture {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
    #[error("passenger count must be between 1 and 9, got {0}")]
    PassengerCount(u32),
    #[error("unknown cabin class {0:?}")]
    UnknownCabinClass(String),
}
