use super::fund::risk_table;
use super::ui;
use crate::core::{FundDataProvider, ReturnPeriod};
use anyhow::Result;
use tracing::{info, warn};

/// Prints risk and volatility measures of a fund for every trailing period.
pub async fn run(research: &dyn FundDataProvider, fund_id: &str) -> Result<()> {
    info!(fund_id, "Fetching risk measures");
    let pb = ui::new_spinner(&format!("Fetching risk measures for {fund_id}"));
    let result = research.fetch_risk(fund_id).await;
    pb.finish_and_clear();

    match result {
        Ok(risk) => {
            for period in ReturnPeriod::ALL {
                ui::print_title(&format!("Risk Measures ({})", period.label()));
                println!("{}", risk_table(&risk, period));
            }
        }
        Err(e) => {
            warn!(fund_id, error = %e, "Risk measures unavailable");
            ui::print_notice(&format!(
                "Unable to fetch risk measures for Fund ID {fund_id}: {e:#}"
            ));
        }
    }
    Ok(())
}
