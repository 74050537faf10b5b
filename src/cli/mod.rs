//! Command handlers and terminal presentation

pub mod fund;
pub mod holdings;
pub mod overlap;
pub mod risk;
pub mod search;
pub mod setup;
pub mod ui;
