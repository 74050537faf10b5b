pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::{FundCatalog, ReturnPeriod};
use crate::providers::{MfApiProvider, MorningstarProvider};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A command that needs configuration and providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Search { query: String },
    Fund { query: String, period: ReturnPeriod },
    Risk { fund_id: String },
    Holdings { fund_id: String },
    Overlap { first: String, second: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundscope starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Search { query } => {
            let catalog = load_catalog(&config)?;
            cli::search::run(&catalog, &query);
            Ok(())
        }
        AppCommand::Fund { query, period } => {
            let catalog = load_catalog(&config)?;
            let market = MfApiProvider::new(
                config.mfapi_base_url(),
                &config.request,
                Arc::new(Cache::new()),
            )?;
            let research = research_provider(&config)?;
            let as_of = chrono::Local::now().date_naive();
            cli::fund::run(&catalog, &query, period, &market, &research, as_of).await
        }
        AppCommand::Risk { fund_id } => {
            let research = research_provider(&config)?;
            cli::risk::run(&research, fund_id.trim()).await
        }
        AppCommand::Holdings { fund_id } => {
            let research = research_provider(&config)?;
            cli::holdings::run(&research, fund_id.trim()).await
        }
        AppCommand::Overlap { first, second } => {
            let research = research_provider(&config)?;
            cli::overlap::run(&research, first.trim(), second.trim()).await
        }
    }
}

fn load_catalog(config: &AppConfig) -> Result<FundCatalog> {
    let path = config.catalog_path()?;
    let catalog =
        FundCatalog::load(&path).context("Fund catalog unavailable, check catalog_path in the config")?;
    if catalog.is_empty() {
        warn!(path = %path.display(), "Fund catalog has no entries");
    }
    debug!(entries = catalog.len(), path = %path.display(), "Loaded fund catalog");
    Ok(catalog)
}

fn research_provider(config: &AppConfig) -> Result<MorningstarProvider> {
    MorningstarProvider::new(&config.morningstar(), &config.request, Arc::new(Cache::new()))
}
