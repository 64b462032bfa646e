pub mod amortization;
pub mod monte_carlo;
pub mod portfolio;
pub mod scenarios;
pub mod valuation;

use clap::Args;
use rust_decimal::Decimal;

/// Flags describing a single investment project.
#[derive(Args, Debug, Clone)]
pub struct ProjectFlags {
    /// Upfront outlay, as a positive amount
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Cash flows for periods 1..N, comma separated (e.g. 30000,35000,40000)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Per-period discount rate (0.10 or 10 for 10%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

/// A project assembled from flags when no JSON input was supplied.
pub struct Project {
    pub initial_investment: Decimal,
    pub cash_flows: Vec<Decimal>,
    pub discount_rate: Decimal,
}

impl ProjectFlags {
    pub fn require(self) -> Result<Project, Box<dyn std::error::Error>> {
        Ok(Project {
            initial_investment: required(self.initial_investment, "--initial-investment")?,
            cash_flows: required(self.cash_flows, "--cash-flows")?,
            discount_rate: required(self.discount_rate, "--discount-rate")?,
        })
    }
}

/// Unwrap a flag value or explain how to supply it.
pub fn required<T>(value: Option<T>, flag: &str) -> Result<T, Box<dyn std::error::Error>> {
    value.ok_or_else(|| format!("{} is required (or provide --input)", flag).into())
}
