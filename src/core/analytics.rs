//! Pure computations over fund holdings.
use crate::core::metadata::EquityHolding;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Label used for holdings without a published sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Comparison of two funds' equity holdings by security name.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingsOverlap {
    /// Security names held by both funds, sorted.
    pub common: Vec<String>,
    pub first_count: usize,
    pub second_count: usize,
    /// Common holdings as a share of the union of both funds' holdings.
    pub overlap_pct: Option<f64>,
    /// Common holdings divided by the sum of both funds' holding counts.
    ///
    /// Kept for comparison with earlier reports; it understates overlap and
    /// cannot exceed 50%.
    pub combined_share_pct: Option<f64>,
}

impl HoldingsOverlap {
    pub fn only_first(&self) -> usize {
        self.first_count - self.common.len()
    }

    pub fn only_second(&self) -> usize {
        self.second_count - self.common.len()
    }

    pub fn union_count(&self) -> usize {
        self.first_count + self.second_count - self.common.len()
    }
}

fn security_names(holdings: &[EquityHolding]) -> BTreeSet<&str> {
    holdings
        .iter()
        .map(|h| h.security_name.trim())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Calculates the overlap between two funds' equity holdings.
///
/// Holdings are compared by security name; duplicate names within one fund
/// count once.
pub fn holdings_overlap(first: &[EquityHolding], second: &[EquityHolding]) -> HoldingsOverlap {
    let first_names = security_names(first);
    let second_names = security_names(second);

    let common: Vec<String> = first_names
        .intersection(&second_names)
        .map(|name| name.to_string())
        .collect();

    let first_count = first_names.len();
    let second_count = second_names.len();
    let union = first_count + second_count - common.len();
    let total = first_count + second_count;

    let overlap_pct = (union > 0).then(|| common.len() as f64 / union as f64 * 100.0);
    let combined_share_pct = (total > 0).then(|| common.len() as f64 / total as f64 * 100.0);

    debug!(
        common = common.len(),
        first_count, second_count, "Calculated holdings overlap"
    );

    HoldingsOverlap {
        common,
        first_count,
        second_count,
        overlap_pct,
        combined_share_pct,
    }
}

/// Number of holdings per sector, largest first, ties by sector name.
pub fn sector_distribution(holdings: &[EquityHolding]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for holding in holdings {
        let sector = holding
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SECTOR);
        *counts.entry(sector.to_string()).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts.into_iter().collect();
    distribution.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    distribution
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightSlice {
    pub label: String,
    pub weighting: f64,
}

/// Portfolio weight of each holding, heaviest first.
///
/// Holdings without a published weighting are left out.
pub fn weighting_distribution(holdings: &[EquityHolding]) -> Vec<WeightSlice> {
    let mut slices: Vec<WeightSlice> = holdings
        .iter()
        .filter_map(|h| {
            h.weighting.map(|weighting| WeightSlice {
                label: abbreviate(&h.security_name, 10),
                weighting,
            })
        })
        .collect();
    slices.sort_by(|a, b| b.weighting.total_cmp(&a.weighting));
    slices
}

/// Shortens `name` to `max_chars` characters followed by "..".
pub fn abbreviate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let short: String = name.chars().take(max_chars).collect();
        format!("{short}..")
    }
}
