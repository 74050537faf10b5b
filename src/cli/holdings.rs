use super::ui;
use crate::core::FundDataProvider;
use crate::core::analytics::{sector_distribution, weighting_distribution};
use crate::core::metadata::{EquityHolding, FundHoldings};
use anyhow::Result;
use comfy_table::{Cell, Table};
use tracing::{info, warn};

const CHART_WIDTH: usize = 40;
const TOP_WEIGHTINGS: usize = 15;

pub async fn run(research: &dyn FundDataProvider, fund_id: &str) -> Result<()> {
    info!(fund_id, "Fetching holdings");
    let pb = ui::new_spinner(&format!("Fetching holdings for {fund_id}"));
    let result = research.fetch_holdings(fund_id).await;
    pb.finish_and_clear();

    match result {
        Ok(holdings) => display_holdings(fund_id, &holdings),
        Err(e) => {
            warn!(fund_id, error = %e, "Holdings unavailable");
            ui::print_notice(&format!(
                "Unable to fetch holdings for Fund ID {fund_id}: {e:#}"
            ));
        }
    }
    Ok(())
}

pub fn display_holdings(fund_id: &str, holdings: &FundHoldings) {
    ui::print_title(&format!("Fund Information ({fund_id})"));
    println!("{}", info_table(holdings));

    if holdings.equity_holdings.is_empty() {
        println!("No equity holdings found for this fund ID.");
        return;
    }

    ui::print_title("Equity Holdings");
    println!("{}", holdings_table(&holdings.equity_holdings));

    let weights: Vec<(String, f64)> = weighting_distribution(&holdings.equity_holdings)
        .into_iter()
        .take(TOP_WEIGHTINGS)
        .map(|slice| (slice.label, slice.weighting))
        .collect();
    if !weights.is_empty() {
        ui::print_title("Weighting Distribution");
        println!(
            "{}",
            ui::bar_chart(&weights, CHART_WIDTH, |v| format!("{v:.2}%"))
        );
    }

    let sectors: Vec<(String, f64)> = sector_distribution(&holdings.equity_holdings)
        .into_iter()
        .map(|(sector, count)| (sector, count as f64))
        .collect();
    ui::print_title("Sector Distribution");
    println!(
        "{}",
        ui::bar_chart(&sectors, CHART_WIDTH, |v| format!("{v:.0}"))
    );
}

fn info_table(holdings: &FundHoldings) -> Table {
    let summary = &holdings.summary;
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);

    let last_turnover = summary.last_turnover.map(|ratio| match &summary.last_turnover_date {
        Some(date) => format!("{ratio}% on {date}"),
        None => format!("{ratio}%"),
    });

    let rows = [
        ("Master Portfolio ID", holdings.master_portfolio_id.clone()),
        ("Sec ID", holdings.sec_id.clone()),
        ("Portfolio Date", summary.portfolio_date.clone()),
        (
            "Number of Holdings",
            summary.number_of_holding.map(|n| n.to_string()),
        ),
        (
            "Equity Holdings",
            summary.equity_number_of_holding.map(|n| n.to_string()),
        ),
        (
            "Average Turnover Ratio",
            summary.average_turnover_ratio.map(|r| format!("{r}%")),
        ),
        ("Last Turnover", last_turnover),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), ui::format_optional_cell(value, |v| v)]);
    }
    table
}

fn holdings_table(equity: &[EquityHolding]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(
        [
            "ISIN",
            "Security",
            "Weighting",
            "Shares",
            "Market Value",
            "Country",
            "Ticker",
            "1Y Return",
            "Sector",
        ]
        .map(ui::header_cell),
    );

    let text = |value: &Option<String>| ui::format_optional_cell(value.clone(), |v| v);
    for holding in equity {
        table.add_row(vec![
            text(&holding.isin),
            Cell::new(&holding.security_name),
            ui::format_optional_cell(holding.weighting, |v| format!("{v:.2}%")),
            ui::format_optional_cell(holding.number_of_share, |v| format!("{v:.0}")),
            ui::format_optional_cell(holding.market_value, |v| format!("{v:.0}")),
            text(&holding.country),
            text(&holding.ticker),
            ui::format_optional_cell(holding.total_return_1_year, |v| format!("{v:.2}%")),
            text(&holding.sector),
        ]);
    }
    table
}
