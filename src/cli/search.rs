use super::ui;
use crate::core::{FundCatalog, FundEntry};
use comfy_table::Table;
use tracing::info;

pub fn run(catalog: &FundCatalog, query: &str) {
    info!(query, "Searching fund catalog");
    let matches = catalog.search(query);

    if matches.is_empty() {
        println!("No matching results found.");
        return;
    }

    ui::print_title(&format!("Search results for \"{}\"", query.trim()));
    println!("{}", results_table(&matches));
    println!(
        "{}",
        ui::style_text(
            &format!("{} of {} funds matched", matches.len(), catalog.len()),
            ui::StyleType::Subtle
        )
    );
}

fn results_table(matches: &[&FundEntry]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Scheme Name"),
        ui::header_cell("ISIN"),
        ui::header_cell("Scheme Code"),
        ui::header_cell("ID"),
    ]);
    for entry in matches {
        table.add_row(vec![
            entry.scheme_name.as_str(),
            entry.isin.as_str(),
            entry.scheme_code.as_str(),
            entry.fund_id.as_str(),
        ]);
    }
    table
}
