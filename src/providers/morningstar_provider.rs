use super::util::{RETRY_DELAY_MS, http_client, with_retry};
use crate::core::{
    cache::Cache,
    config::{MorningstarProviderConfig, RequestConfig},
    metadata::{
        EquityHolding, FundDataProvider, FundDetails, FundHoldings, HoldingSummary, RiskByPeriod,
        RiskVolatility,
    },
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, warn};

const QUOTE_COMPONENT: &str = "sal-mip-quote";
const RISK_COMPONENT: &str = "sal-mip-risk-volatility-measures";
const HOLDINGS_COMPONENT: &str = "sal-mip-holdings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskVolatilityResponse {
    #[serde(default)]
    fund_risk_volatility: Option<RiskByPeriod>,
    #[serde(default)]
    category_risk_volatility: Option<RiskByPeriod>,
    #[serde(default)]
    index_risk_volatility: Option<RiskByPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldingsResponse {
    master_portfolio_id: Option<String>,
    sec_id: Option<String>,
    #[serde(default)]
    holding_summary: Option<HoldingSummary>,
    #[serde(default)]
    equity_holding_page: Option<HoldingPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldingPage {
    #[serde(default)]
    holding_list: Vec<EquityHolding>,
}

/// Fund research data from the Morningstar SAL service.
pub struct MorningstarProvider {
    base_url: String,
    access_token: Option<String>,
    client_id: String,
    client: reqwest::Client,
    retries: usize,
    holdings_cache: Arc<Cache<String, FundHoldings>>,
}

impl MorningstarProvider {
    pub fn new(
        config: &MorningstarProviderConfig,
        request: &RequestConfig,
        holdings_cache: Arc<Cache<String, FundHoldings>>,
    ) -> Result<Self> {
        let access_token = config.resolved_access_token();
        if access_token.is_none() {
            warn!("No research provider access token configured; requests will likely be rejected");
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token,
            client_id: config.client_id.clone(),
            client: http_client(request)?,
            retries: request.retries,
            holdings_cache,
        })
    }

    fn common_params(&self, component: &str, version: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("languageId", "en".to_string()),
            ("locale", "en".to_string()),
            ("clientId", self.client_id.clone()),
            ("benchmarkId", "mstarorcat".to_string()),
            ("component", component.to_string()),
            ("version", version.to_string()),
        ];
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        fund_id: &str,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/sal-service/v1/fund/{}/{}/data", self.base_url, endpoint, fund_id);
        debug!("Requesting {} from {}", what, url);

        let response = with_retry(
            || async { self.client.get(&url).query(params).send().await },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .with_context(|| format!("Failed to send {what} request for fund ID: {fund_id}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Failed to fetch {} for ID {}: {}",
                what,
                fund_id,
                status
            ));
        }

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get {what} response text for fund ID: {fund_id}"))?;

        match serde_json::from_str::<T>(&response_text) {
            Ok(data) => Ok(data),
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse {} response", what
                );
                Err(e).with_context(|| format!("Failed to parse {what} response for fund ID: {fund_id}"))
            }
        }
    }

    async fn request_holdings(&self, fund_id: &str) -> Result<FundHoldings> {
        let mut params = self.common_params(HOLDINGS_COMPONENT, "4.31.0");
        params.push(("premiumNum", "100".to_string()));
        params.push(("freeNum", "25".to_string()));
        params.push(("hideesg", "true".to_string()));

        let response: HoldingsResponse = self
            .get_json("holdings", fund_id, "portfolio/holding/v2", &params)
            .await?;

        Ok(FundHoldings {
            master_portfolio_id: response.master_portfolio_id,
            sec_id: response.sec_id,
            summary: response.holding_summary.unwrap_or_default(),
            equity_holdings: response
                .equity_holding_page
                .map(|page| page.holding_list)
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl FundDataProvider for MorningstarProvider {
    async fn fetch_details(&self, fund_id: &str) -> Result<FundDetails> {
        let mut params = self.common_params(QUOTE_COMPONENT, "4.13.0");
        params.push(("showAnalystRating", "false".to_string()));
        self.get_json("fund details", fund_id, "quote/v3", &params)
            .await
    }

    async fn fetch_risk(&self, fund_id: &str) -> Result<RiskVolatility> {
        let mut params = self.common_params(RISK_COMPONENT, "4.13.0");
        params.push(("longestTenure", "false".to_string()));

        let response: RiskVolatilityResponse = self
            .get_json(
                "risk data",
                fund_id,
                "performance/riskVolatility",
                &params,
            )
            .await?;

        Ok(RiskVolatility {
            fund: response.fund_risk_volatility.unwrap_or_default(),
            category: response.category_risk_volatility.unwrap_or_default(),
            index: response.index_risk_volatility.unwrap_or_default(),
        })
    }

    async fn fetch_holdings(&self, fund_id: &str) -> Result<FundHoldings> {
        self.holdings_cache
            .get_or_try_fetch(fund_id.to_string(), || self.request_holdings(fund_id))
            .await
    }
}
