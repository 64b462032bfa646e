use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use smallbiz_finance_core::monte_carlo::simulation::{
    self, MonteCarloIrrInput, MonteCarloNpvInput,
};
use smallbiz_finance_core::EngineConfig;

use super::{required, ProjectFlags};
use crate::input;

/// Arguments for Monte Carlo NPV simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct McNpvArgs {
    #[command(flatten)]
    pub project: ProjectFlags,

    /// Coefficient of variation applied to each cash flow
    #[arg(long)]
    pub flow_variation: Option<f64>,

    /// Standard deviation of the discount rate
    #[arg(long)]
    pub rate_variation: Option<f64>,

    /// Number of trials (minimum 100)
    #[arg(long)]
    pub trials: Option<u32>,

    /// Seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run trial blocks across all cores
    #[arg(long)]
    pub parallel: bool,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for Monte Carlo IRR simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct McIrrArgs {
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Cash flows for periods 1..N, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Hurdle the simulated IRRs are compared against
    #[arg(long)]
    pub reference_rate: Option<Decimal>,

    #[arg(long)]
    pub flow_variation: Option<f64>,

    #[arg(long)]
    pub trials: Option<u32>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_mc_npv(args: McNpvArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mc_input: MonteCarloNpvInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let project = args.project.require()?;
            MonteCarloNpvInput {
                initial_investment: project.initial_investment,
                cash_flows: project.cash_flows,
                discount_rate: project.discount_rate,
                flow_variation: args.flow_variation,
                rate_variation: args.rate_variation,
                trials: args.trials,
                seed: args.seed,
                config: None,
            }
        }
    };
    mc_input
        .config
        .get_or_insert_with(|| config.monte_carlo.clone());

    let result = if args.parallel {
        tracing::debug!(chunks = config.monte_carlo.chunks, "running parallel NPV simulation");
        simulation::simulate_npv_monte_carlo_parallel(&mc_input)?
    } else {
        simulation::simulate_npv_monte_carlo(&mc_input)?
    };
    Ok(serde_json::to_value(result)?)
}

pub fn run_mc_irr(args: McIrrArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mc_input: MonteCarloIrrInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => MonteCarloIrrInput {
            initial_investment: required(args.initial_investment, "--initial-investment")?,
            cash_flows: required(args.cash_flows, "--cash-flows")?,
            reference_rate: required(args.reference_rate, "--reference-rate")?,
            flow_variation: args.flow_variation,
            trials: args.trials,
            seed: args.seed,
            solver: None,
            config: None,
        },
    };
    mc_input.solver.get_or_insert_with(|| config.irr.clone());
    mc_input
        .config
        .get_or_insert_with(|| config.monte_carlo.clone());
    let result = simulation::simulate_irr_monte_carlo(&mc_input)?;
    Ok(serde_json::to_value(result)?)
}
