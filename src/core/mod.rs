//! Core types, the returns engine and collaborator abstractions

pub mod analytics;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod log;
pub mod metadata;
pub mod price;
pub mod returns;

// Re-export main types for cleaner imports
pub use catalog::{FundCatalog, FundEntry};
pub use metadata::FundDataProvider;
pub use price::{MarketDataProvider, NavSeries, PriceObservation};
pub use returns::{ReturnPeriod, ReturnResult, closest_price_at_or_before, compute_returns};
