use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use smallbiz_finance_core::portfolio::analysis::{self, PortfolioInput};
use smallbiz_finance_core::EngineConfig;

use super::required;
use crate::input;

/// Arguments for portfolio analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PortfolioArgs {
    /// Expected return per asset, comma separated (e.g. 0.08,0.12,0.05)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub returns: Option<Vec<Decimal>>,

    /// Allocation per asset, as fractions or percentages
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<Decimal>>,

    /// Volatility per asset
    #[arg(long, value_delimiter = ',')]
    pub volatilities: Option<Vec<Decimal>>,

    /// Correlation matrix in row-major order (n * n values)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub correlations: Option<Vec<Decimal>>,

    /// Risk-free rate for the Sharpe ratio
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_portfolio(
    args: PortfolioArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut portfolio_input: PortfolioInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let returns = required(args.returns, "--returns")?;
            let correlation_matrix = args
                .correlations
                .map(|flat| square_matrix(flat, returns.len()))
                .transpose()?;
            PortfolioInput {
                returns,
                weights: required(args.weights, "--weights")?,
                volatilities: args.volatilities,
                correlation_matrix,
                risk_free_rate: args.risk_free_rate,
                config: None,
            }
        }
    };
    portfolio_input
        .config
        .get_or_insert_with(|| config.portfolio.clone());
    let result = analysis::analyze_portfolio(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}

fn square_matrix(flat: Vec<Decimal>, n: usize) -> Result<Vec<Vec<Decimal>>, String> {
    if n == 0 || flat.len() != n * n {
        return Err(format!(
            "--correlations needs {} values for {} assets, got {}",
            n * n,
            n,
            flat.len()
        ));
    }
    Ok(flat.chunks(n).map(<[Decimal]>::to_vec).collect())
}
