//! NAV observations and the market data abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Date format used by NAV feeds, e.g. `31-12-2024`.
pub const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

/// A single dated price point of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: Decimal,
}

/// Raised when a raw feed row does not satisfy the observation contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    #[error("Invalid observation date '{0}', expected dd-mm-yyyy")]
    InvalidDate(String),
    #[error("Invalid observation price '{0}'")]
    InvalidPrice(String),
    #[error("Observation price must be positive, got {0}")]
    NonPositivePrice(Decimal),
}

impl PriceObservation {
    pub fn new(date: NaiveDate, price: Decimal) -> Result<Self, ObservationError> {
        if price <= Decimal::ZERO {
            return Err(ObservationError::NonPositivePrice(price));
        }
        Ok(Self { date, price })
    }

    /// Parses a feed row with a `dd-mm-yyyy` date and a textual price.
    ///
    /// Fails fast on the first violation. Callers decide whether a bad row
    /// is skipped or aborts the whole feed.
    pub fn parse(date: &str, price: &str) -> Result<Self, ObservationError> {
        let date = NaiveDate::parse_from_str(date.trim(), NAV_DATE_FORMAT)
            .map_err(|_| ObservationError::InvalidDate(date.to_string()))?;
        let price = Decimal::from_str(price.trim())
            .map_err(|_| ObservationError::InvalidPrice(price.to_string()))?;
        Self::new(date, price)
    }
}

/// Descriptive fields published alongside a NAV history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeMeta {
    pub scheme_name: Option<String>,
    pub fund_house: Option<String>,
    pub scheme_type: Option<String>,
    pub scheme_category: Option<String>,
}

/// NAV history of one scheme. Observations keep the order of the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    pub meta: SchemeMeta,
    pub observations: Vec<PriceObservation>,
}

impl NavSeries {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations ordered oldest first, for charting.
    pub fn chronological(&self) -> Vec<PriceObservation> {
        let mut sorted = self.observations.clone();
        sorted.sort_by_key(|o| o.date);
        sorted
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_series(&self, scheme_code: &str) -> Result<NavSeries>;
}
