//! Trailing returns over a NAV series.
//!
//! A period's return compares the most recent observation against the
//! observation closest to, but not after, `as_of - lookback`. Periods whose
//! lookback window holds too few observations are reported as absent rather
//! than as a misleadingly precise number.

use crate::core::price::PriceObservation;
use anyhow::anyhow;
use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_finprim::rate::cagr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ReturnPeriod {
    OneYear,
    ThreeYear,
    FiveYear,
}

impl ReturnPeriod {
    pub const ALL: [ReturnPeriod; 3] = [
        ReturnPeriod::OneYear,
        ReturnPeriod::ThreeYear,
        ReturnPeriod::FiveYear,
    ];

    pub fn lookback_days(&self) -> i64 {
        match self {
            ReturnPeriod::OneYear => 365,
            ReturnPeriod::ThreeYear => 365 * 3,
            ReturnPeriod::FiveYear => 365 * 5,
        }
    }

    pub fn lookback(&self) -> Duration {
        Duration::days(self.lookback_days())
    }

    /// Minimum observations inside the lookback window for a usable return.
    pub fn min_observations(&self) -> usize {
        match self {
            ReturnPeriod::OneYear => 230,
            ReturnPeriod::ThreeYear => 700,
            ReturnPeriod::FiveYear => 1200,
        }
    }

    pub fn years(&self) -> u32 {
        match self {
            ReturnPeriod::OneYear => 1,
            ReturnPeriod::ThreeYear => 3,
            ReturnPeriod::FiveYear => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReturnPeriod::OneYear => "1 Year",
            ReturnPeriod::ThreeYear => "3 Years",
            ReturnPeriod::FiveYear => "5 Years",
        }
    }
}

impl Display for ReturnPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ReturnPeriod::OneYear => "1Y",
                ReturnPeriod::ThreeYear => "3Y",
                ReturnPeriod::FiveYear => "5Y",
            }
        )
    }
}

impl FromStr for ReturnPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1Y" | "1" => Ok(ReturnPeriod::OneYear),
            "3Y" | "3" => Ok(ReturnPeriod::ThreeYear),
            "5Y" | "5" => Ok(ReturnPeriod::FiveYear),
            _ => Err(anyhow!("Invalid return period: {}, expected 1Y, 3Y or 5Y", s)),
        }
    }
}

/// The computed return of one period together with the prices behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodReturn {
    pub anchor_date: NaiveDate,
    pub anchor_price: Decimal,
    pub latest_price: Decimal,
    /// Percentage change, rounded to two decimals.
    pub percent: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnResult {
    latest: Option<PriceObservation>,
    periods: BTreeMap<ReturnPeriod, PeriodReturn>,
}

impl ReturnResult {
    /// Percentage return for `period`, or `None` when data is insufficient.
    pub fn get(&self, period: ReturnPeriod) -> Option<Decimal> {
        self.periods.get(&period).map(|r| r.percent)
    }

    pub fn detail(&self, period: ReturnPeriod) -> Option<&PeriodReturn> {
        self.periods.get(&period)
    }

    /// The observation used as the numerator of every period.
    pub fn latest(&self) -> Option<&PriceObservation> {
        self.latest.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Compound annual growth rate for `period`, as a rounded percentage.
    pub fn annualized(&self, period: ReturnPeriod) -> Option<Decimal> {
        let detail = self.periods.get(&period)?;
        let ratio = detail.latest_price.checked_div(detail.anchor_price)?;
        if ratio.is_zero() {
            debug!(%period, "Growth ratio underflowed, no annualized figure");
            return None;
        }
        let rate = cagr(
            detail.anchor_price,
            detail.latest_price,
            Decimal::from(period.years()),
        );
        let Some(percent) = rate.checked_mul(Decimal::ONE_HUNDRED) else {
            debug!(%period, "Annualized return overflowed");
            return None;
        };
        Some(round_percentage(percent))
    }
}

/// Rounds a percentage to two decimals, midpoints away from zero.
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Most recent observation. On equal dates the earliest entry in the input wins.
fn latest_observation(series: &[PriceObservation]) -> Option<&PriceObservation> {
    latest_observation_where(series, |_| true)
}

fn closest_at_or_before(
    series: &[PriceObservation],
    target: NaiveDate,
) -> Option<&PriceObservation> {
    latest_observation_where(series, |obs| obs.date <= target)
}

fn latest_observation_where<'a>(
    series: &'a [PriceObservation],
    predicate: impl Fn(&PriceObservation) -> bool,
) -> Option<&'a PriceObservation> {
    series
        .iter()
        .filter(|obs| predicate(obs))
        .fold(None, |best, obs| match best {
            Some(b) if b.date >= obs.date => Some(b),
            _ => Some(obs),
        })
}

/// Price of the latest observation dated at or before `target`.
///
/// Never interpolates and never looks past `target`.
pub fn closest_price_at_or_before(
    series: &[PriceObservation],
    target: NaiveDate,
) -> Option<Decimal> {
    closest_at_or_before(series, target).map(|obs| obs.price)
}

/// Computes 1, 3 and 5 year trailing returns of `series` as of `as_of`.
///
/// `series` may be unsorted and may contain duplicate dates.
pub fn compute_returns(series: &[PriceObservation], as_of: NaiveDate) -> ReturnResult {
    let Some(latest) = latest_observation(series).copied() else {
        debug!("Empty series, no returns available");
        return ReturnResult::default();
    };

    let mut periods = BTreeMap::new();
    for period in ReturnPeriod::ALL {
        let anchor_date = as_of - period.lookback();

        let Some(anchor) = closest_at_or_before(series, anchor_date) else {
            debug!(%period, %anchor_date, "No observation at or before anchor date");
            continue;
        };

        let in_window = series
            .iter()
            .filter(|obs| obs.date >= anchor_date && obs.date <= as_of)
            .count();
        if in_window < period.min_observations() {
            debug!(
                %period,
                in_window,
                required = period.min_observations(),
                "Too few observations in lookback window"
            );
            continue;
        }

        let Some(raw) = latest
            .price
            .checked_div(anchor.price)
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
            .and_then(|change| change.checked_mul(Decimal::ONE_HUNDRED))
        else {
            debug!(%period, "Return overflowed");
            continue;
        };

        debug!(%period, anchor = %anchor.date, %raw, "Computed trailing return");
        periods.insert(
            period,
            PeriodReturn {
                anchor_date: anchor.date,
                anchor_price: anchor.price,
                latest_price: latest.price,
                percent: round_percentage(raw),
            },
        );
    }

    ReturnResult {
        latest: Some(latest),
        periods,
    }
}
