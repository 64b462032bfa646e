pub mod breakeven;
pub mod scenario;
pub mod sensitivity;

pub use breakeven::find_breakeven;
pub use scenario::analyze_scenarios;
pub use sensitivity::analyze_tornado;

use crate::error::FinanceError;
use crate::types::{Money, Rate};
use crate::validation::{validate_cash_flows, validate_positive, validate_rate};
use crate::FinanceResult;

/// Validated base case shared by the sensitivity analyses.
#[derive(Debug, Clone)]
pub(crate) struct BaseCase {
    pub investment: Money,
    pub cash_flows: Vec<Money>,
    pub rate: Rate,
}

impl BaseCase {
    pub(crate) fn validate(
        initial_investment: Money,
        cash_flows: &[Money],
        discount_rate: Rate,
    ) -> FinanceResult<Self> {
        let investment = validate_positive(initial_investment, "initial_investment")?;
        validate_cash_flows(cash_flows, "cash_flows")?;
        let rate = validate_rate(discount_rate, "discount_rate")?;
        Ok(Self {
            investment,
            cash_flows: cash_flows.to_vec(),
            rate,
        })
    }

    /// Every cash flow times `multiplier`; overflow is reported against `label`.
    pub(crate) fn scaled_flows(&self, multiplier: Rate, label: &str) -> FinanceResult<Vec<Money>> {
        self.cash_flows
            .iter()
            .enumerate()
            .map(|(t, cf)| {
                cf.checked_mul(multiplier).ok_or_else(|| {
                    FinanceError::invalid(
                        label,
                        format!("Scaled cash flow for period {} exceeds numeric range", t + 1),
                    )
                })
            })
            .collect()
    }

    pub(crate) fn scaled_investment(&self, multiplier: Rate, label: &str) -> FinanceResult<Money> {
        self.investment.checked_mul(multiplier).ok_or_else(|| {
            FinanceError::invalid(label, "Scaled initial investment exceeds numeric range")
        })
    }
}
