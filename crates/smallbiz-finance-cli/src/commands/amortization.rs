use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use smallbiz_finance_core::amortization::loan::{self, LoanInput};
use smallbiz_finance_core::amortization::savings::{self, SavingsGoalInput, SavingsInput};

use super::required;
use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct LoanArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate, compounded monthly (0.12 or 12)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a savings projection
#[derive(Args)]
pub struct SavingsArgs {
    #[arg(long, default_value = "0")]
    pub initial_balance: Decimal,

    /// Deposit made at the end of every month
    #[arg(long, default_value = "0")]
    pub monthly_contribution: Decimal,

    /// Nominal annual rate, credited monthly
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Horizon in months
    #[arg(long)]
    pub months: Option<u32>,

    /// Tax withheld from interest
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Annual inflation for real balances
    #[arg(long)]
    pub inflation_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a savings goal search
#[derive(Args)]
pub struct SavingsGoalArgs {
    /// Balance to reach
    #[arg(long)]
    pub target_balance: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub initial_balance: Decimal,

    #[arg(long, default_value = "0")]
    pub monthly_contribution: Decimal,

    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LoanInput {
            principal: required(args.principal, "--principal")?,
            annual_rate: required(args.annual_rate, "--annual-rate")?,
            term_months: required(args.term_months, "--term-months")?,
        },
    };
    let result = loan::build_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_savings(args: SavingsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let savings_input: SavingsInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SavingsInput {
            initial_balance: args.initial_balance,
            monthly_contribution: args.monthly_contribution,
            annual_rate: required(args.annual_rate, "--annual-rate")?,
            months: required(args.months, "--months")?,
            tax_rate: args.tax_rate,
            inflation_rate: args.inflation_rate,
        },
    };
    let result = savings::project_savings(&savings_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_savings_goal(args: SavingsGoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal_input: SavingsGoalInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => SavingsGoalInput {
            target_balance: required(args.target_balance, "--target-balance")?,
            initial_balance: args.initial_balance,
            monthly_contribution: args.monthly_contribution,
            annual_rate: required(args.annual_rate, "--annual-rate")?,
            tax_rate: args.tax_rate,
        },
    };
    let result = savings::seek_savings_goal(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}
