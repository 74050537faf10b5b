use super::ui;
use crate::core::metadata::{FundDetails, RiskMeasures, RiskVolatility};
use crate::core::price::NAV_DATE_FORMAT;
use crate::core::{
    FundCatalog, FundDataProvider, FundEntry, MarketDataProvider, NavSeries, ReturnPeriod,
    ReturnResult, compute_returns,
};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment, Table};
use tracing::{debug, info, warn};

const SPARKLINE_WIDTH: usize = 60;

type RiskMetric = (&'static str, fn(&RiskMeasures) -> Option<f64>);

const RISK_METRICS: [RiskMetric; 5] = [
    ("Alpha", |m| m.alpha),
    ("Beta", |m| m.beta),
    ("R-Squared", |m| m.r_squared),
    ("Std Dev", |m| m.standard_deviation),
    ("Sharpe Ratio", |m| m.sharpe_ratio),
];

/// Everything shown for one fund. Each collaborator result is kept separately
/// so one failing source does not hide the others.
pub struct FundReport {
    pub entry: FundEntry,
    pub details: Result<FundDetails>,
    pub series: Result<NavSeries>,
    pub returns: ReturnResult,
    pub risk: Result<RiskVolatility>,
}

pub async fn run(
    catalog: &FundCatalog,
    query: &str,
    period: ReturnPeriod,
    market: &dyn MarketDataProvider,
    research: &dyn FundDataProvider,
    as_of: NaiveDate,
) -> Result<()> {
    let matches = catalog.search(query);
    let Some(entry) = matches.first() else {
        println!("No matching results found.");
        return Ok(());
    };
    if matches.len() > 1 {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "{} funds matched \"{}\", showing the first. Use `search` to list them all.",
                    matches.len(),
                    query.trim()
                ),
                ui::StyleType::Subtle
            )
        );
    }

    let pb = ui::new_spinner(&format!("Fetching data for {}", entry.scheme_name));
    let report = build_report(entry, market, research, as_of).await;
    pb.finish_and_clear();

    display_report(&report, period);
    Ok(())
}

/// Fetches details, NAV history and risk measures one after the other and
/// computes trailing returns as of `as_of`.
pub async fn build_report(
    entry: &FundEntry,
    market: &dyn MarketDataProvider,
    research: &dyn FundDataProvider,
    as_of: NaiveDate,
) -> FundReport {
    info!(fund_id = %entry.fund_id, scheme_code = %entry.scheme_code, "Building fund report");

    let details = research.fetch_details(&entry.fund_id).await;
    let series = market.fetch_series(&entry.scheme_code).await;
    let returns = match &series {
        Ok(series) => compute_returns(&series.observations, as_of),
        Err(_) => ReturnResult::default(),
    };
    let risk = research.fetch_risk(&entry.fund_id).await;

    for (source, failed) in [
        ("details", details.is_err()),
        ("nav history", series.is_err()),
        ("risk", risk.is_err()),
    ] {
        if failed {
            warn!(fund_id = %entry.fund_id, source, "Collaborator call failed");
        }
    }
    let computed = ReturnPeriod::ALL.map(|p| returns.get(p));
    debug!(?computed, "Computed returns");

    FundReport {
        entry: entry.clone(),
        details,
        series,
        returns,
        risk,
    }
}

pub fn display_report(report: &FundReport, period: ReturnPeriod) {
    let entry = &report.entry;

    ui::print_title("Fund Details");
    match &report.details {
        Ok(details) => println!("{}", details_table(details)),
        Err(e) => ui::print_notice(&format!(
            "Unable to fetch details for Fund ID {}: {e:#}",
            entry.fund_id
        )),
    }

    ui::print_title(&format!(
        "Details for {} (Scheme Code: {})",
        entry.scheme_name, entry.scheme_code
    ));
    match &report.series {
        Ok(series) if series.is_empty() => {
            println!("No NAV history available for this scheme.");
        }
        Ok(series) => print_nav_summary(series),
        Err(e) => ui::print_notice(&format!(
            "Unable to fetch NAV history for scheme code {}: {e:#}",
            entry.scheme_code
        )),
    }

    ui::print_title("Trailing Returns");
    println!("{}", returns_table(&report.returns, report.series.is_err()));

    ui::print_title(&format!("Risk Measures ({})", period.label()));
    match &report.risk {
        Ok(risk) => println!("{}", risk_table(risk, period)),
        Err(e) => ui::print_notice(&format!(
            "Unable to fetch risk measures for Fund ID {}: {e:#}",
            entry.fund_id
        )),
    }
}

fn details_table(details: &FundDetails) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);

    let text_rows = [
        ("Name", details.investment_name.clone()),
        ("Benchmark", details.prospectus_benchmark_name.clone()),
    ];
    let value_rows = [
        ("Expense Ratio", &details.expense_ratio),
        ("Turnover Ratio", &details.last_turnover_ratio),
        ("Equity Style Box", &details.equity_style_box),
        ("Load", &details.load),
        ("NAV", &details.nav),
    ];

    for (label, value) in text_rows {
        table.add_row(vec![
            Cell::new(label),
            ui::format_optional_cell(value, |v| v),
        ]);
    }
    for (label, value) in value_rows {
        table.add_row(vec![
            Cell::new(label),
            ui::format_optional_cell(value.as_ref(), |v| v.to_string()),
        ]);
    }
    table
}

fn print_nav_summary(series: &NavSeries) {
    let meta = &series.meta;
    for (label, value) in [
        ("Fund House", &meta.fund_house),
        ("Category", &meta.scheme_category),
        ("Type", &meta.scheme_type),
    ] {
        if let Some(value) = value {
            println!(
                "{}: {}",
                ui::style_text(label, ui::StyleType::Label),
                value
            );
        }
    }

    let history = series.chronological();
    let prices: Vec<_> = history.iter().map(|o| o.price).collect();
    println!("\n{}", ui::sparkline(&prices, SPARKLINE_WIDTH));

    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        println!(
            "{} {} to {}",
            ui::style_text("NAV history:", ui::StyleType::Subtle),
            first.date.format(NAV_DATE_FORMAT),
            last.date.format(NAV_DATE_FORMAT)
        );
        println!(
            "{}: {} on {}",
            ui::style_text("Latest NAV", ui::StyleType::Label),
            ui::style_text(&last.price.to_string(), ui::StyleType::Value),
            last.date.format(NAV_DATE_FORMAT)
        );
    }
}

fn returns_table(returns: &ReturnResult, series_failed: bool) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Return"),
        ui::header_cell("Annualized"),
        ui::header_cell("Since"),
    ]);

    for period in ReturnPeriod::ALL {
        let row = match returns.detail(period) {
            Some(detail) => vec![
                Cell::new(period.label()),
                ui::change_cell(detail.percent),
                returns
                    .annualized(period)
                    .map_or_else(|| ui::na_cell(false), ui::change_cell),
                Cell::new(detail.anchor_date.format(NAV_DATE_FORMAT))
                    .set_alignment(CellAlignment::Right),
            ],
            None => vec![
                Cell::new(period.label()),
                ui::na_cell(series_failed),
                ui::na_cell(series_failed),
                ui::na_cell(series_failed),
            ],
        };
        table.add_row(row);
    }
    table
}

pub(crate) fn risk_table(risk: &RiskVolatility, period: ReturnPeriod) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metric"),
        ui::header_cell("Investment"),
        ui::header_cell("Category"),
        ui::header_cell("Index"),
    ]);

    let subjects = [
        risk.fund.get(period),
        risk.category.get(period),
        risk.index.get(period),
    ];
    for (label, metric) in RISK_METRICS {
        let mut row = vec![Cell::new(label)];
        row.extend(
            subjects
                .iter()
                .map(|m| ui::format_optional_cell(m.and_then(metric), |v| format!("{v:.2}"))),
        );
        table.add_row(row);
    }
    table
}
