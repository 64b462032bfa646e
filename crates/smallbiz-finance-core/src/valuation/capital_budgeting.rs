use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::IrrSolverConfig;
use crate::error::FinanceError;
use crate::time_value::{self, IrrSolution};
use crate::types::*;
use crate::validation::{validate_cash_flows, validate_positive, validate_rate};
use crate::FinanceResult;

/// Input for a net present value evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvInput {
    /// Outlay at period 0, as a positive amount.
    pub initial_investment: Money,
    /// Cash flows for periods 1..N.
    pub cash_flows: Vec<Money>,
    /// Per-period discount rate (decimal or percentage).
    pub discount_rate: Rate,
}

/// Output of the NPV evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    pub decision: Decision,
    /// Sum of the discounted cash flows for periods 1..N.
    pub present_value_of_inflows: Money,
    /// PV of inflows / initial investment; absent for a zero investment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profitability_index: Option<Decimal>,
    /// Discounted value of each period 1..N.
    pub discounted_cash_flows: Vec<Money>,
}

/// Input for an internal rate of return evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    /// Hurdle rate the IRR is compared against.
    pub reference_rate: Rate,
    /// Solver override; engine defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<IrrSolverConfig>,
}

/// Output of the IRR evaluation.
///
/// `irr` is absent and `decision` is `NOT_COMPUTABLE` when no economically
/// plausible root exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr: Option<Rate>,
    pub decision: Decision,
    pub reference_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npv_at_irr: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// NPV of an investment followed by periodic cash flows.
///
/// No validation: callers inside the engine pass already-checked values,
/// and a negative investment (net inflow today) is legitimate here.
pub fn project_npv(initial_investment: Money, cash_flows: &[Money], rate: Rate) -> FinanceResult<Money> {
    time_value::npv(rate, &project_series(initial_investment, cash_flows))
}

fn project_series(initial_investment: Money, cash_flows: &[Money]) -> Vec<Money> {
    let mut series = Vec::with_capacity(cash_flows.len() + 1);
    series.push(-initial_investment);
    series.extend_from_slice(cash_flows);
    series
}

/// Solve for a root inside the plausible band, or explain why there is none.
pub(crate) fn plausible_irr(
    initial_investment: Money,
    cash_flows: &[Money],
    solver: &IrrSolverConfig,
) -> Result<IrrSolution, String> {
    let series = project_series(initial_investment, cash_flows);
    match time_value::irr(&series, solver) {
        Ok(sol) if sol.rate < solver.min_rate || sol.rate > solver.max_rate => Err(format!(
            "IRR {} lies outside the plausible range [{}, {}]",
            sol.rate, solver.min_rate, solver.max_rate
        )),
        Ok(sol) => Ok(sol),
        Err(e) => Err(e.to_string()),
    }
}

/// Net present value: NPV = -I0 + sum(CF_t / (1 + r)^t).
pub fn compute_npv(input: &NpvInput) -> FinanceResult<ComputationOutput<NpvInput, NpvOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let investment = validate_positive(input.initial_investment, "initial_investment")?;
    validate_cash_flows(&input.cash_flows, "cash_flows")?;
    let rate = validate_rate(input.discount_rate, "discount_rate")?;

    let discounted = time_value::discounted_flows(rate, &project_series(investment, &input.cash_flows))?;
    let discounted_cash_flows = discounted[1..].to_vec();
    let out_of_range = || FinanceError::invalid("cash_flows", "NPV exceeds numeric range");
    let present_value_of_inflows = discounted_cash_flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(out_of_range)?;
    let npv = present_value_of_inflows
        .checked_sub(investment)
        .ok_or_else(out_of_range)?;

    let profitability_index = if investment.is_zero() {
        None
    } else {
        let pi = present_value_of_inflows.checked_div(investment);
        if pi.is_none() {
            warnings.push("Profitability index exceeds numeric range and is omitted".into());
        }
        pi
    };

    if rate.is_zero() {
        warnings.push("Zero discount rate: NPV equals the undiscounted sum of cash flows".into());
    }
    if input.cash_flows.iter().any(|cf| *cf < Decimal::ZERO) {
        warnings.push("Series contains negative cash flows after period 0".into());
    }

    let output = NpvOutput {
        npv,
        decision: Decision::from_sign(npv),
        present_value_of_inflows,
        profitability_index,
        discounted_cash_flows,
    };

    let normalized = NpvInput {
        initial_investment: investment,
        cash_flows: input.cash_flows.clone(),
        discount_rate: rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Npv,
        "Net Present Value (discounted cash flow)",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

/// Internal rate of return via Newton-Raphson.
///
/// Divergence or an implausible root yields `NOT_COMPUTABLE` data rather
/// than an error; only malformed input is an error.
pub fn compute_irr(input: &IrrInput) -> FinanceResult<ComputationOutput<IrrInput, IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let investment = validate_positive(input.initial_investment, "initial_investment")?;
    validate_cash_flows(&input.cash_flows, "cash_flows")?;
    let reference_rate = validate_rate(input.reference_rate, "reference_rate")?;
    let solver = input.solver.clone().unwrap_or_default();

    let output = match plausible_irr(investment, &input.cash_flows, &solver) {
        Ok(sol) => {
            let decision = if sol.rate > reference_rate {
                Decision::Accept
            } else {
                Decision::Reject
            };
            IrrOutput {
                irr: Some(sol.rate),
                decision,
                reference_rate,
                iterations: Some(sol.iterations),
                npv_at_irr: Some(sol.residual),
                reason: None,
            }
        }
        Err(reason) => {
            tracing::debug!(%reason, "IRR not computable");
            warnings.push(format!("IRR could not be determined: {reason}"));
            IrrOutput {
                irr: None,
                decision: Decision::NotComputable,
                reference_rate,
                iterations: None,
                npv_at_irr: None,
                reason: Some(reason),
            }
        }
    };

    let normalized = IrrInput {
        initial_investment: investment,
        cash_flows: input.cash_flows.clone(),
        reference_rate,
        solver: Some(solver),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Irr,
        "Internal Rate of Return (Newton-Raphson)",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}
