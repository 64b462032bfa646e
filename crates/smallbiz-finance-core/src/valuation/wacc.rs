use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::CapitalStructureFallback;
use crate::types::*;
use crate::validation::{validate_rate, validate_wacc_inputs};
use crate::FinanceResult;

/// Input parameters for Weighted Average Cost of Capital calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccInput {
    /// Market value of equity
    pub equity: Money,
    /// Market value of debt
    pub debt: Money,
    /// Required return on equity
    pub cost_of_equity: Rate,
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    /// Expected project return to compare against the WACC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hurdle_return: Option<Rate>,
    /// Structure substituted when equity and debt are both zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<CapitalStructureFallback>,
}

/// Output of the WACC calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccOutput {
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// E / V
    pub equity_weight: Rate,
    /// D / V
    pub debt_weight: Rate,
    pub cost_of_equity: Rate,
    /// Rd * (1 - T)
    pub after_tax_cost_of_debt: Rate,
    /// (D/V) * Rd * T, the reduction in WACC from interest deductibility
    pub tax_shield: Rate,
    /// Equity and debt were both zero; weights come from the fallback structure
    pub fallback_applied: bool,
    /// Present only when a hurdle return was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

/// Calculate the Weighted Average Cost of Capital.
///
/// WACC = (E/V) * Re + (D/V) * Rd * (1 - T), with V = E + D.
pub fn compute_wacc(input: &WaccInput) -> FinanceResult<ComputationOutput<WaccInput, WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validation ---
    let fallback = input.fallback.clone().unwrap_or_default();
    let cs = validate_wacc_inputs(
        input.equity,
        input.debt,
        input.cost_of_equity,
        input.cost_of_debt,
        input.tax_rate,
        &fallback,
    )?;
    let hurdle_return = input
        .hurdle_return
        .map(|r| validate_rate(r, "hurdle_return"))
        .transpose()?;

    if cs.fallback_applied {
        warnings.push(format!(
            "Equity and debt are both zero; substituted default capital structure (equity {}, debt {})",
            cs.equity, cs.debt
        ));
    }

    // --- Weights ---
    let total = cs.equity + cs.debt;
    let equity_weight = cs.equity / total;
    let debt_weight = cs.debt / total;

    // --- WACC ---
    let after_tax_cost_of_debt = cs.cost_of_debt * (Decimal::ONE - cs.tax_rate);
    let wacc = equity_weight * cs.cost_of_equity + debt_weight * after_tax_cost_of_debt;
    let tax_shield = debt_weight * cs.cost_of_debt * cs.tax_rate;

    let decision = hurdle_return.map(|r| Decision::from_sign(r - wacc));

    // --- Reasonableness warnings ---
    if cs.cost_of_debt > cs.cost_of_equity {
        warnings.push(format!(
            "Cost of debt ({}) exceeds cost of equity ({}); verify inputs",
            cs.cost_of_debt, cs.cost_of_equity
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk ventures only"
        ));
    }

    let output = WaccOutput {
        wacc,
        equity_weight,
        debt_weight,
        cost_of_equity: cs.cost_of_equity,
        after_tax_cost_of_debt,
        tax_shield,
        fallback_applied: cs.fallback_applied,
        decision,
    };

    let normalized = WaccInput {
        equity: input.equity,
        debt: input.debt,
        cost_of_equity: cs.cost_of_equity,
        cost_of_debt: cs.cost_of_debt,
        tax_rate: cs.tax_rate,
        hurdle_return,
        fallback: Some(fallback),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Wacc,
        "WACC from market-value capital structure",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
