mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::amortization::{LoanArgs, SavingsArgs, SavingsGoalArgs};
use commands::monte_carlo::{McIrrArgs, McNpvArgs};
use commands::portfolio::PortfolioArgs;
use commands::scenarios::{BreakevenArgs, ScenariosArgs, TornadoArgs};
use commands::valuation::{IrrArgs, NpvArgs, PaybackArgs, ReplacementArgs, WaccArgs};

/// Financial analysis for small-business decisions
#[derive(Parser)]
#[command(
    name = "sbf",
    version,
    about = "Financial analysis for small-business decisions",
    long_about = "Evaluate investments (NPV, IRR, payback, asset replacement), cost of \
                  capital, portfolios, loans and savings plans, and explore risk with \
                  Monte Carlo, tornado, scenario and break-even analysis. Inputs come \
                  from --input <file.json>, piped JSON on stdin, or flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (YAML or JSON) supplying defaults
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log solver and simulation events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Net present value of an investment
    Npv(NpvArgs),
    /// Internal rate of return against a reference rate
    Irr(IrrArgs),
    /// Weighted average cost of capital
    Wacc(WaccArgs),
    /// Payback period (optionally discounted)
    Payback(PaybackArgs),
    /// Keep-or-replace analysis for an operating asset
    Replacement(ReplacementArgs),
    /// Portfolio expected return and risk
    Portfolio(PortfolioArgs),
    /// Level-payment loan amortization schedule
    Loan(LoanArgs),
    /// Month-by-month savings projection
    Savings(SavingsArgs),
    /// Months needed to reach a savings target
    SavingsGoal(SavingsGoalArgs),
    /// Monte Carlo simulation of NPV
    McNpv(McNpvArgs),
    /// Monte Carlo simulation of IRR
    McIrr(McIrrArgs),
    /// Tornado sensitivity of NPV
    Tornado(TornadoArgs),
    /// Pessimistic / base / optimistic scenario analysis
    Scenarios(ScenariosArgs),
    /// Break-even value of a single input
    Breakeven(BreakevenArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    /// Single-line JSON for piping into other tools
    JsonCompact,
    Table,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::config::load_engine_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Npv(args) => commands::valuation::run_npv(args),
        Commands::Irr(args) => commands::valuation::run_irr(args, &config),
        Commands::Wacc(args) => commands::valuation::run_wacc(args, &config),
        Commands::Payback(args) => commands::valuation::run_payback(args),
        Commands::Replacement(args) => commands::valuation::run_replacement(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, &config),
        Commands::Loan(args) => commands::amortization::run_loan(args),
        Commands::Savings(args) => commands::amortization::run_savings(args),
        Commands::SavingsGoal(args) => commands::amortization::run_savings_goal(args),
        Commands::McNpv(args) => commands::monte_carlo::run_mc_npv(args, &config),
        Commands::McIrr(args) => commands::monte_carlo::run_mc_irr(args, &config),
        Commands::Tornado(args) => commands::scenarios::run_tornado(args, &config),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args, &config),
        Commands::Breakeven(args) => commands::scenarios::run_breakeven(args, &config),
        Commands::Version => {
            println!("sbf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Err(e) = output::format_output(&cli.output, &value) {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
