//! Input normalization and rejection.
//!
//! Every public entry point runs its arguments through these checks before
//! any arithmetic. Failures are `FinanceError::InvalidInput` naming the field.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::CapitalStructureFallback;
use crate::error::FinanceError;
use crate::types::{Money, Rate};
use crate::FinanceResult;

const ONE_HUNDRED: Decimal = dec!(100);

/// Reject negative amounts. Zero is allowed.
pub fn validate_positive(value: Decimal, label: &str) -> FinanceResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(FinanceError::invalid(
            label,
            format!("Must be non-negative, got {value}"),
        ));
    }
    Ok(value)
}

/// Normalize a rate given either as a percentage (> 1) or a decimal.
///
/// 12 becomes 0.12; 0.12 stays 0.12. Anything outside [0, 1] after
/// normalization is rejected, never clamped.
pub fn validate_rate(value: Decimal, label: &str) -> FinanceResult<Rate> {
    let normalized = if value > Decimal::ONE {
        value / ONE_HUNDRED
    } else {
        value
    };
    if normalized < Decimal::ZERO || normalized > Decimal::ONE {
        return Err(FinanceError::invalid(
            label,
            format!("Rate must lie between 0% and 100%, got {value}"),
        ));
    }
    Ok(normalized)
}

/// A cash-flow series must contain at least one period.
pub fn validate_cash_flows(flows: &[Money], label: &str) -> FinanceResult<()> {
    if flows.is_empty() {
        return Err(FinanceError::invalid(
            label,
            "At least one cash flow is required",
        ));
    }
    Ok(())
}

/// Companion series must have exactly as many entries as the primary one.
pub fn validate_matching_length(expected: usize, actual: usize, label: &str) -> FinanceResult<()> {
    if expected != actual {
        return Err(FinanceError::invalid(
            label,
            format!("Expected {expected} entries, got {actual}"),
        ));
    }
    Ok(())
}

/// Validate portfolio weights and return them normalized to sum to exactly 1.
///
/// Weights may be fractions (sum within 1 ± tolerance) or percentages
/// (sum within 100 ± 100·tolerance).
pub fn validate_weights(weights: &[Decimal], tolerance: Rate) -> FinanceResult<Vec<Decimal>> {
    if weights.is_empty() {
        return Err(FinanceError::invalid("weights", "At least one weight is required"));
    }
    if let Some((i, w)) = weights.iter().enumerate().find(|(_, w)| **w < Decimal::ZERO) {
        return Err(FinanceError::invalid(
            format!("weights[{i}]"),
            format!("Weights cannot be negative, got {w}"),
        ));
    }

    let sum: Decimal = weights.iter().sum();
    let as_fractions = if (sum - ONE_HUNDRED).abs() <= ONE_HUNDRED * tolerance {
        weights.iter().map(|w| *w / ONE_HUNDRED).collect::<Vec<_>>()
    } else {
        weights.to_vec()
    };

    let fraction_sum: Decimal = as_fractions.iter().sum();
    if (fraction_sum - Decimal::ONE).abs() > tolerance {
        return Err(FinanceError::invalid(
            "weights",
            format!("Weights must sum to 1 (or 100%), got {sum}"),
        ));
    }

    Ok(as_fractions.into_iter().map(|w| w / fraction_sum).collect())
}

/// Capital structure after validation and fallback substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub equity: Money,
    pub debt: Money,
    pub cost_of_equity: Rate,
    pub cost_of_debt: Rate,
    pub tax_rate: Rate,
    /// True when equity and debt were both zero and the fallback was used.
    pub fallback_applied: bool,
}

/// Validate the WACC inputs.
///
/// When both equity and debt are zero the fallback structure is substituted
/// and flagged instead of dividing by zero.
pub fn validate_wacc_inputs(
    equity: Money,
    debt: Money,
    cost_of_equity: Rate,
    cost_of_debt: Rate,
    tax_rate: Rate,
    fallback: &CapitalStructureFallback,
) -> FinanceResult<CapitalStructure> {
    let equity = validate_positive(equity, "equity")?;
    let debt = validate_positive(debt, "debt")?;
    let cost_of_equity = validate_rate(cost_of_equity, "cost_of_equity")?;
    let cost_of_debt = validate_rate(cost_of_debt, "cost_of_debt")?;
    let tax_rate = validate_rate(tax_rate, "tax_rate")?;

    let fallback_applied = equity.is_zero() && debt.is_zero();
    let (equity, debt) = if fallback_applied {
        tracing::warn!(
            equity = %fallback.equity,
            debt = %fallback.debt,
            "zero capital structure, substituting fallback weights"
        );
        (fallback.equity, fallback.debt)
    } else {
        (equity, debt)
    };

    Ok(CapitalStructure {
        equity,
        debt,
        cost_of_equity,
        cost_of_debt,
        tax_rate,
        fallback_applied,
    })
}
