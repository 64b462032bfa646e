use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinanceError;
use crate::time_value;
use crate::types::*;
use crate::validation::{validate_positive, validate_rate};
use crate::FinanceResult;

use super::capital_budgeting::project_npv;

/// Longest supported asset life, in years.
pub const MAX_USEFUL_LIFE: u32 = 100;

/// Input for keep-versus-replace analysis of an operating asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementInput {
    /// Annual operating cost of the current asset
    pub old_annual_cost: Money,
    /// Annual operating cost of the replacement
    pub new_annual_cost: Money,
    pub new_purchase_cost: Money,
    /// Proceeds from selling the current asset today
    pub old_salvage_value: Money,
    /// Useful life of the replacement, in years
    pub new_useful_life: u32,
    pub discount_rate: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementRecommendation {
    Replace,
    Keep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementOutput {
    /// Purchase cost less salvage of the old asset
    pub net_investment: Money,
    /// Old annual cost less new annual cost
    pub annual_savings: Money,
    pub present_value_of_savings: Money,
    pub npv: Money,
    /// NPV restated as a level annual amount over the new asset's life
    pub equivalent_annual_annuity: Money,
    pub decision: Decision,
    pub recommendation: ReplacementRecommendation,
}

/// Decide whether replacing an asset pays for itself.
///
/// The incremental investment is the new cost net of salvage; the
/// incremental inflows are the operating-cost savings, an annuity over the
/// new asset's life.
pub fn analyze_asset_replacement(
    input: &ReplacementInput,
) -> FinanceResult<ComputationOutput<ReplacementInput, ReplacementOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_positive(input.old_annual_cost, "old_annual_cost")?;
    validate_positive(input.new_annual_cost, "new_annual_cost")?;
    validate_positive(input.new_purchase_cost, "new_purchase_cost")?;
    validate_positive(input.old_salvage_value, "old_salvage_value")?;
    let rate = validate_rate(input.discount_rate, "discount_rate")?;
    if input.new_useful_life == 0 || input.new_useful_life > MAX_USEFUL_LIFE {
        return Err(FinanceError::invalid(
            "new_useful_life",
            format!(
                "Useful life must be between 1 and {MAX_USEFUL_LIFE} years, got {}",
                input.new_useful_life
            ),
        ));
    }

    let net_investment = input.new_purchase_cost - input.old_salvage_value;
    let annual_savings = input.old_annual_cost - input.new_annual_cost;
    let savings = vec![annual_savings; input.new_useful_life as usize];

    let npv = project_npv(net_investment, &savings, rate)?;
    let present_value_of_savings = npv.checked_add(net_investment).ok_or_else(|| {
        FinanceError::invalid("old_annual_cost", "Present value of savings exceeds numeric range")
    })?;

    // Annuity factor: sum of discount factors over the life
    let mut unit_series = vec![Decimal::ONE; input.new_useful_life as usize + 1];
    unit_series[0] = Decimal::ZERO;
    let annuity_factor: Decimal = time_value::discounted_flows(rate, &unit_series)?.iter().sum();
    let equivalent_annual_annuity = if annuity_factor.is_zero() {
        Decimal::ZERO
    } else {
        npv / annuity_factor
    };

    if annual_savings <= Decimal::ZERO {
        warnings.push("Replacement does not reduce annual operating cost".into());
    }
    if net_investment < Decimal::ZERO {
        warnings.push("Salvage value exceeds purchase cost; replacement releases cash today".into());
    }

    let recommendation = if npv > Decimal::ZERO {
        ReplacementRecommendation::Replace
    } else {
        ReplacementRecommendation::Keep
    };

    let output = ReplacementOutput {
        net_investment,
        annual_savings,
        present_value_of_savings,
        npv,
        equivalent_annual_annuity,
        decision: Decision::from_sign(npv),
        recommendation,
    };

    let normalized = ReplacementInput {
        discount_rate: rate,
        ..input.clone()
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::AssetReplacement,
        "Asset replacement (incremental NPV of operating savings)",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}
