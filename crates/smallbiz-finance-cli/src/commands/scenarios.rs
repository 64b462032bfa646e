use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use smallbiz_finance_core::scenarios::breakeven::{self, BreakevenInput, BreakevenVariable};
use smallbiz_finance_core::scenarios::scenario::{self, ScenarioAnalysisInput};
use smallbiz_finance_core::scenarios::sensitivity::{self, TornadoInput};
use smallbiz_finance_core::EngineConfig;

use super::ProjectFlags;
use crate::input;

/// Arguments for tornado sensitivity
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TornadoArgs {
    #[command(flatten)]
    pub project: ProjectFlags,

    /// Symmetric shift applied to each variable (0.20 = +/-20%)
    #[arg(long)]
    pub variation: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for scenario analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub project: ProjectFlags,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BreakevenTarget {
    CashFlowMultiplier,
    DiscountRate,
    InitialInvestment,
}

impl From<BreakevenTarget> for BreakevenVariable {
    fn from(target: BreakevenTarget) -> Self {
        match target {
            BreakevenTarget::CashFlowMultiplier => BreakevenVariable::CashFlowMultiplier,
            BreakevenTarget::DiscountRate => BreakevenVariable::DiscountRate,
            BreakevenTarget::InitialInvestment => BreakevenVariable::InitialInvestment,
        }
    }
}

/// Arguments for break-even search
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BreakevenArgs {
    #[command(flatten)]
    pub project: ProjectFlags,

    /// Input to solve for
    #[arg(long, value_enum, default_value = "cash-flow-multiplier")]
    pub variable: BreakevenTarget,

    /// Lower end of the search bracket
    #[arg(long, requires = "range_high")]
    pub range_low: Option<Decimal>,

    /// Upper end of the search bracket
    #[arg(long, requires = "range_low")]
    pub range_high: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tornado(args: TornadoArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut tornado_input: TornadoInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let project = args.project.require()?;
            TornadoInput {
                initial_investment: project.initial_investment,
                cash_flows: project.cash_flows,
                discount_rate: project.discount_rate,
                variation: args.variation,
                config: None,
            }
        }
    };
    tornado_input
        .config
        .get_or_insert_with(|| config.sensitivity.clone());
    let result = sensitivity::analyze_tornado(&tornado_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(
    args: ScenariosArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut scenario_input: ScenarioAnalysisInput =
        match input::read_input(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => {
                let project = args.project.require()?;
                ScenarioAnalysisInput {
                    initial_investment: project.initial_investment,
                    cash_flows: project.cash_flows,
                    discount_rate: project.discount_rate,
                    scenarios: None,
                }
            }
        };
    scenario_input
        .scenarios
        .get_or_insert_with(|| config.scenarios.clone());
    let result = scenario::analyze_scenarios(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_breakeven(
    args: BreakevenArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut breakeven_input: BreakevenInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let project = args.project.require()?;
            BreakevenInput {
                initial_investment: project.initial_investment,
                cash_flows: project.cash_flows,
                discount_rate: project.discount_rate,
                variable: args.variable.into(),
                search_range: args.range_low.zip(args.range_high),
                config: None,
            }
        }
    };
    breakeven_input
        .config
        .get_or_insert_with(|| config.sensitivity.clone());
    let result = breakeven::find_breakeven(&breakeven_input)?;
    Ok(serde_json::to_value(result)?)
}
