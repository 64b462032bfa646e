use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use smallbiz_finance_core::valuation::capital_budgeting::{self, IrrInput, NpvInput};
use smallbiz_finance_core::valuation::payback::{self, PaybackInput};
use smallbiz_finance_core::valuation::replacement::{self, ReplacementInput};
use smallbiz_finance_core::valuation::wacc::{self, WaccInput};
use smallbiz_finance_core::EngineConfig;

use super::{required, ProjectFlags};
use crate::input;

/// Arguments for net present value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NpvArgs {
    #[command(flatten)]
    pub project: ProjectFlags,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for internal rate of return
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct IrrArgs {
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Cash flows for periods 1..N, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Hurdle rate the IRR is compared against
    #[arg(long)]
    pub reference_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for weighted average cost of capital
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Market value of equity
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Market value of debt
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Required return on equity (e.g. 0.12)
    #[arg(long)]
    pub cost_of_equity: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Expected project return to compare against the WACC
    #[arg(long)]
    pub hurdle_return: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for payback period
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaybackArgs {
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Cash flows for periods 1..N, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Also report the discounted payback at this rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Longest acceptable payback, in periods
    #[arg(long)]
    pub max_period: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for asset replacement
#[derive(Args)]
pub struct ReplacementArgs {
    /// Annual operating cost of the current asset
    #[arg(long)]
    pub old_annual_cost: Option<Decimal>,

    /// Annual operating cost of the replacement
    #[arg(long)]
    pub new_annual_cost: Option<Decimal>,

    #[arg(long)]
    pub new_purchase_cost: Option<Decimal>,

    /// Proceeds from selling the current asset today
    #[arg(long, default_value = "0")]
    pub old_salvage_value: Decimal,

    /// Useful life of the replacement, in years
    #[arg(long)]
    pub new_useful_life: Option<u32>,

    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: NpvInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let project = args.project.require()?;
            NpvInput {
                initial_investment: project.initial_investment,
                cash_flows: project.cash_flows,
                discount_rate: project.discount_rate,
            }
        }
    };
    let result = capital_budgeting::compute_npv(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_irr(args: IrrArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut irr_input: IrrInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => IrrInput {
            initial_investment: required(args.initial_investment, "--initial-investment")?,
            cash_flows: required(args.cash_flows, "--cash-flows")?,
            reference_rate: required(args.reference_rate, "--reference-rate")?,
            solver: None,
        },
    };
    irr_input.solver.get_or_insert_with(|| config.irr.clone());
    let result = capital_budgeting::compute_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut wacc_input: WaccInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => WaccInput {
            equity: required(args.equity, "--equity")?,
            debt: required(args.debt, "--debt")?,
            cost_of_equity: required(args.cost_of_equity, "--cost-of-equity")?,
            cost_of_debt: required(args.cost_of_debt, "--cost-of-debt")?,
            tax_rate: required(args.tax_rate, "--tax-rate")?,
            hurdle_return: args.hurdle_return,
            fallback: None,
        },
    };
    wacc_input.fallback.get_or_insert_with(|| config.wacc.clone());
    let result = wacc::compute_wacc(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payback(args: PaybackArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payback_input: PaybackInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PaybackInput {
            initial_investment: required(args.initial_investment, "--initial-investment")?,
            cash_flows: required(args.cash_flows, "--cash-flows")?,
            discount_rate: args.discount_rate,
            max_acceptable_period: args.max_period,
        },
    };
    let result = payback::compute_payback(&payback_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_replacement(args: ReplacementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let replacement_input: ReplacementInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ReplacementInput {
            old_annual_cost: required(args.old_annual_cost, "--old-annual-cost")?,
            new_annual_cost: required(args.new_annual_cost, "--new-annual-cost")?,
            new_purchase_cost: required(args.new_purchase_cost, "--new-purchase-cost")?,
            old_salvage_value: args.old_salvage_value,
            new_useful_life: required(args.new_useful_life, "--new-useful-life")?,
            discount_rate: required(args.discount_rate, "--discount-rate")?,
        },
    };
    let result = replacement::analyze_asset_replacement(&replacement_input)?;
    Ok(serde_json::to_value(result)?)
}
