//! Fund research data: published details, risk measures and holdings.

use crate::core::returns::ReturnPeriod;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// A loosely typed scalar the research provider publishes as either text or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundDetails {
    pub investment_name: Option<String>,
    pub prospectus_benchmark_name: Option<String>,
    pub expense_ratio: Option<FieldValue>,
    pub last_turnover_ratio: Option<FieldValue>,
    pub equity_style_box: Option<FieldValue>,
    pub load: Option<FieldValue>,
    pub nav: Option<FieldValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMeasures {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub r_squared: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}

/// Risk measures of one subject (fund, category or index) per trailing period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskByPeriod {
    #[serde(rename = "for1Year", default)]
    pub one_year: Option<RiskMeasures>,
    #[serde(rename = "for3Year", default)]
    pub three_year: Option<RiskMeasures>,
    #[serde(rename = "for5Year", default)]
    pub five_year: Option<RiskMeasures>,
}

impl RiskByPeriod {
    pub fn get(&self, period: ReturnPeriod) -> Option<&RiskMeasures> {
        match period {
            ReturnPeriod::OneYear => self.one_year.as_ref(),
            ReturnPeriod::ThreeYear => self.three_year.as_ref(),
            ReturnPeriod::FiveYear => self.five_year.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskVolatility {
    pub fund: RiskByPeriod,
    pub category: RiskByPeriod,
    pub index: RiskByPeriod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSummary {
    pub portfolio_date: Option<String>,
    pub number_of_holding: Option<u64>,
    pub equity_number_of_holding: Option<u64>,
    pub average_turnover_ratio: Option<f64>,
    pub last_turnover: Option<f64>,
    #[serde(rename = "LastTurnoverDate")]
    pub last_turnover_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityHolding {
    pub isin: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub security_name: String,
    pub weighting: Option<f64>,
    pub number_of_share: Option<f64>,
    pub market_value: Option<f64>,
    pub country: Option<String>,
    pub ticker: Option<String>,
    pub total_return_1_year: Option<f64>,
    pub sector: Option<String>,
}

/// Reads a string that may be published as `null`.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundHoldings {
    pub master_portfolio_id: Option<String>,
    pub sec_id: Option<String>,
    pub summary: HoldingSummary,
    pub equity_holdings: Vec<EquityHolding>,
}

#[async_trait]
pub trait FundDataProvider: Send + Sync {
    async fn fetch_details(&self, fund_id: &str) -> anyhow::Result<FundDetails>;
    async fn fetch_risk(&self, fund_id: &str) -> anyhow::Result<RiskVolatility>;
    async fn fetch_holdings(&self, fund_id: &str) -> anyhow::Result<FundHoldings>;
}
