use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::BaseCase;
use crate::config::SensitivityConfig;
use crate::error::FinanceError;
use crate::time_value::{self, Root};
use crate::types::*;
use crate::valuation::project_npv;
use crate::FinanceResult;

/// Input solved for the NPV = 0 crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakevenVariable {
    /// Factor applied to every cash flow
    CashFlowMultiplier,
    DiscountRate,
    InitialInvestment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakevenInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
    pub variable: BreakevenVariable,
    /// Search bracket; derived from the configuration when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_range: Option<(Decimal, Decimal)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SensitivityConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakevenOutcome {
    Found,
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakevenOutput {
    pub variable: BreakevenVariable,
    pub outcome: BreakevenOutcome,
    /// Value of the variable today
    pub base_value: Decimal,
    pub base_npv: Money,
    pub search_range: (Decimal, Decimal),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakeven_value: Option<Decimal>,
    /// Room before NPV turns negative: 1 - m* for the multiplier, r* - r for
    /// the rate, (I* - I) / I for the investment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_of_safety: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npv_at_breakeven: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Bisect for the value of `variable` at which NPV crosses zero.
///
/// The search never leaves the bracket: when NPV has the same sign at both
/// ends the outcome is `NOT_FOUND`.
pub fn find_breakeven(
    input: &BreakevenInput,
) -> FinanceResult<ComputationOutput<BreakevenInput, BreakevenOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let base = BaseCase::validate(input.initial_investment, &input.cash_flows, input.discount_rate)?;
    let base_npv = project_npv(base.investment, &base.cash_flows, base.rate)?;

    let (base_value, default_range) = match input.variable {
        BreakevenVariable::CashFlowMultiplier => (Decimal::ONE, config.multiplier_range),
        BreakevenVariable::DiscountRate => (base.rate, config.rate_range),
        BreakevenVariable::InitialInvestment => {
            let pv_inflows = base_npv
                .checked_add(base.investment)
                .ok_or_else(|| FinanceError::invalid("cash_flows", "Present value exceeds numeric range"))?;
            // Bracket stays within range; an oversized factor is capped.
            let upper = pv_inflows
                .checked_mul(config.investment_range_factor)
                .unwrap_or(Decimal::MAX)
                .max(Decimal::ZERO);
            (base.investment, (Decimal::ZERO, upper))
        }
    };
    let (lo, hi) = input.search_range.unwrap_or(default_range);
    if lo > hi {
        return Err(FinanceError::invalid(
            "search_range",
            format!("Lower bound {lo} exceeds upper bound {hi}"),
        ));
    }
    if input.variable == BreakevenVariable::DiscountRate && lo <= Decimal::NEGATIVE_ONE {
        return Err(FinanceError::invalid(
            "search_range",
            "Discount rate bracket must stay above -100%",
        ));
    }

    let npv_at = |x: Decimal| -> FinanceResult<Money> {
        match input.variable {
            BreakevenVariable::CashFlowMultiplier => {
                project_npv(base.investment, &base.scaled_flows(x, "search_range")?, base.rate)
            }
            BreakevenVariable::DiscountRate => project_npv(base.investment, &base.cash_flows, x),
            BreakevenVariable::InitialInvestment => {
                project_npv(x, &base.cash_flows, base.rate)
            }
        }
    };

    let root = time_value::bisect(npv_at, lo, hi, config.tolerance, config.max_iterations)?;

    let mut output = BreakevenOutput {
        variable: input.variable,
        outcome: BreakevenOutcome::NotFound,
        base_value,
        base_npv,
        search_range: (lo, hi),
        breakeven_value: None,
        margin_of_safety: None,
        npv_at_breakeven: None,
        iterations: None,
        reason: None,
    };

    match root {
        Some(Root {
            value,
            residual,
            iterations,
        }) => {
            output.outcome = BreakevenOutcome::Found;
            output.breakeven_value = Some(value);
            output.npv_at_breakeven = Some(residual);
            output.iterations = Some(iterations);
            output.margin_of_safety = margin_of_safety(input.variable, base_value, value);
            if output.margin_of_safety.is_none() {
                warnings.push("Zero base investment; margin of safety undefined".into());
            }
            if iterations >= config.max_iterations {
                warnings.push(format!(
                    "Bisection stopped at {iterations} iterations before reaching tolerance"
                ));
            }
        }
        None => {
            tracing::debug!(variable = ?input.variable, %lo, %hi, "no break-even in range");
            output.reason = Some(format!(
                "No break-even found in range [{lo}, {hi}]: NPV does not change sign"
            ));
        }
    }

    let normalized = BreakevenInput {
        initial_investment: base.investment,
        cash_flows: base.cash_flows.clone(),
        discount_rate: base.rate,
        variable: input.variable,
        search_range: Some((lo, hi)),
        config: Some(config),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Breakeven,
        "Break-even by bisection on NPV",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

fn margin_of_safety(variable: BreakevenVariable, base: Decimal, breakeven: Decimal) -> Option<Decimal> {
    match variable {
        BreakevenVariable::CashFlowMultiplier => Some(Decimal::ONE - breakeven),
        BreakevenVariable::DiscountRate => Some(breakeven - base),
        BreakevenVariable::InitialInvestment if base.is_zero() => None,
        BreakevenVariable::InitialInvestment => Some((breakeven - base) / base),
    }
}
