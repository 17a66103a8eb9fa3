use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::{CoreError, CoreResult};

const MAX_EXPONENT: i32 = 64;

/// A non-negative decimal amount kept as canonical text.
///
/// Providers send totals either as JSON strings (`"546.70"`) or JSON numbers
/// (`546.7`, `5.467e2`). Both are converted digit-by-digit without going through
/// floating point, so the fractional digits the provider sent are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalAmount(String);

impl DecimalAmount {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let text = raw.trim();
        let invalid = || CoreError::InvalidAmount(raw.to_string());

        // A minus sign is only allowed on zero.
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => {
                let exp: i32 = text[pos + 1..].parse().map_err(|_| invalid())?;
                if exp.abs() > MAX_EXPONENT {
                    return Err(invalid());
                }
                (&text[..pos], exp)
            }
            None => (text, 0),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if mantissa.ends_with('.') || !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        // Shift the decimal point by the exponent over the full digit string.
        let digits = format!("{int_part}{frac_part}");
        let point = int_part.len() as i64 + exponent as i64;
        let (int_digits, frac_digits) = if point <= 0 {
            let zeros = "0".repeat(point.unsigned_abs() as usize);
            (String::new(), format!("{zeros}{digits}"))
        } else if point as usize >= digits.len() {
            let zeros = "0".repeat(point as usize - digits.len());
            (format!("{digits}{zeros}"), String::new())
        } else {
            let (i, f) = digits.split_at(point as usize);
            (i.to_string(), f.to_string())
        };

        let int_digits = int_digits.trim_start_matches('0');
        let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
        if negative && (int_digits != "0" || frac_digits.chars().any(|c| c != '0')) {
            return Err(invalid());
        }

        if frac_digits.is_empty() {
            Ok(Self(int_digits.to_string()))
        } else {
            Ok(Self(format!("{int_digits}.{frac_digits}")))
        }
    }

    /// Accepts either a JSON string or a JSON number.
    pub fn from_json(value: &Value) -> CoreResult<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&n.to_string()),
            other => Err(CoreError::InvalidAmount(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0' || c == '.')
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DecimalAmount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DecimalAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DecimalAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
