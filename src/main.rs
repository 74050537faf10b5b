use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fundscope::AppCommand;
use fundscope::core::ReturnPeriod;
use fundscope::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Search the fund catalog by name, ISIN, scheme code or ID
    Search { query: String },
    /// Show details, NAV history, trailing returns and risk for a fund
    Fund {
        query: String,
        /// Period for the risk measures: 1Y, 3Y or 5Y
        #[arg(short, long, default_value = "1Y")]
        period: ReturnPeriod,
    },
    /// Show risk and volatility measures of a fund for 1, 3 and 5 years
    Risk { fund_id: String },
    /// Show equity holdings of a fund
    Holdings { fund_id: String },
    /// Compare the equity holdings of two funds
    Overlap { first: String, second: String },
}

impl TryFrom<Commands> for AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<AppCommand> {
        Ok(match cmd {
            Commands::Search { query } => AppCommand::Search { query },
            Commands::Fund { query, period } => AppCommand::Fund { query, period },
            Commands::Risk { fund_id } => AppCommand::Risk { fund_id },
            Commands::Holdings { fund_id } => AppCommand::Holdings { fund_id },
            Commands::Overlap { first, second } => AppCommand::Overlap { first, second },
            Commands::Setup => anyhow::bail!("setup does not run against a configuration"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fundscope::cli::setup::setup_at_path(path),
            None => fundscope::cli::setup::setup(),
        },
        Some(cmd) => match AppCommand::try_from(cmd) {
            Ok(command) => fundscope::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
