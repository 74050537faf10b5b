use super::ui;
use crate::core::FundDataProvider;
use crate::core::analytics::{HoldingsOverlap, holdings_overlap};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};
use tracing::{info, warn};

pub async fn run(research: &dyn FundDataProvider, first_id: &str, second_id: &str) -> Result<()> {
    info!(first_id, second_id, "Comparing fund holdings");
    let pb = ui::new_spinner("Fetching holdings for both funds");
    let fetched = async {
        let first = research.fetch_holdings(first_id).await?;
        let second = research.fetch_holdings(second_id).await?;
        anyhow::Ok((first, second))
    }
    .await;
    pb.finish_and_clear();

    let (first, second) = match fetched {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "Overlap comparison aborted");
            ui::print_notice("Unable to fetch data for one or both Fund IDs.");
            ui::print_notice(&format!("{e:#}"));
            return Ok(());
        }
    };

    let overlap = holdings_overlap(&first.equity_holdings, &second.equity_holdings);
    display_overlap(first_id, second_id, &overlap);
    Ok(())
}

pub fn display_overlap(first_id: &str, second_id: &str, overlap: &HoldingsOverlap) {
    if overlap.common.is_empty() {
        println!("No common holdings found between the two funds.");
        return;
    }

    ui::print_title(&format!("Common Holdings ({first_id} vs {second_id})"));
    println!("{}", common_table(overlap));

    ui::print_title("Overlap");
    println!("{}", summary_table(first_id, second_id, overlap));

    ui::print_title("Holdings Venn Summary");
    println!("{}", venn_table(overlap));
}

fn common_table(overlap: &HoldingsOverlap) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("#"), ui::header_cell("Security")]);
    for (i, name) in overlap.common.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(name)]);
    }
    table
}

fn summary_table(first_id: &str, second_id: &str, overlap: &HoldingsOverlap) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Measure"), ui::header_cell("Value")]);

    let count = |n: usize| Cell::new(n).set_alignment(CellAlignment::Right);
    let pct = |v: Option<f64>| ui::format_optional_cell(v, |v| format!("{v:.2}%"));

    table.add_row(vec![
        Cell::new(format!("Holdings in {first_id}")),
        count(overlap.first_count),
    ]);
    table.add_row(vec![
        Cell::new(format!("Holdings in {second_id}")),
        count(overlap.second_count),
    ]);
    table.add_row(vec![Cell::new("Common holdings"), count(overlap.common.len())]);
    table.add_row(vec![
        Cell::new("Overlap (common / all distinct holdings)"),
        pct(overlap.overlap_pct),
    ]);
    table.add_row(vec![
        Cell::new("Combined share (common / sum of both counts)"),
        pct(overlap.combined_share_pct),
    ]);
    table
}

fn venn_table(overlap: &HoldingsOverlap) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund 1 only"),
        ui::header_cell("Both"),
        ui::header_cell("Fund 2 only"),
    ]);
    table.add_row(vec![
        Cell::new(overlap.only_first()).set_alignment(CellAlignment::Center),
        Cell::new(overlap.common.len()).set_alignment(CellAlignment::Center),
        Cell::new(overlap.only_second()).set_alignment(CellAlignment::Center),
    ]);
    table
}
