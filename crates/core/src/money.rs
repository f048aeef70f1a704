//! Money as integer minor units (no floats).

use serde::{Deserialize, Serialize};

use crate::error::{TravelError, TravelResult};

/// ISO-4217 currency code (three ASCII uppercase letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> TravelResult<Self> {
        let code = code.into();
        let valid = code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(TravelError::validation(format!(
                "currency must be a three-letter uppercase code, got '{code}'"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount in the smallest currency unit (e.g. halalas for SAR).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self { amount_minor, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.amount_minor / 100,
            (self.amount_minor % 100).abs(),
            self.currency
        )
    }
}
