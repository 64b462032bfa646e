use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::BaseCase;
use crate::config::SensitivityConfig;
use crate::error::FinanceError;
use crate::types::*;
use crate::validation::validate_rate;
use crate::valuation::project_npv;
use crate::FinanceResult;

/// Input for one-at-a-time NPV sensitivity (tornado) analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
    /// Symmetric relative shift applied to each variable (0.20 = +/-20%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SensitivityConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TornadoVariable {
    InitialInvestment,
    CashFlows,
    DiscountRate,
}

/// NPV swing produced by one variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRecord {
    pub variable: TornadoVariable,
    /// Shifted-down input (a multiplier for cash flows)
    pub low_input: Decimal,
    /// Shifted-up input (a multiplier for cash flows)
    pub high_input: Decimal,
    pub npv_low: Money,
    pub npv_high: Money,
    /// |npv_high - npv_low|
    pub range: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoOutput {
    pub base_npv: Money,
    /// Sorted by range, widest first
    pub records: Vec<SensitivityRecord>,
    pub most_sensitive: TornadoVariable,
}

/// Rank investment, cash flows and discount rate by how far each moves NPV
/// when shifted down and up with the others held at base.
pub fn analyze_tornado(
    input: &TornadoInput,
) -> FinanceResult<ComputationOutput<TornadoInput, TornadoOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let base = BaseCase::validate(input.initial_investment, &input.cash_flows, input.discount_rate)?;
    let variation = validate_rate(input.variation.unwrap_or(config.variation), "variation")?;
    if variation.is_zero() {
        return Err(FinanceError::invalid("variation", "Variation must be greater than zero"));
    }

    let down = Decimal::ONE - variation;
    let up = Decimal::ONE + variation;
    let base_npv = project_npv(base.investment, &base.cash_flows, base.rate)?;

    let record = |variable: TornadoVariable,
                  low_input: Decimal,
                  high_input: Decimal,
                  npv_low: Money,
                  npv_high: Money|
     -> FinanceResult<SensitivityRecord> {
        let range = npv_high
            .checked_sub(npv_low)
            .map(|d| d.abs())
            .ok_or_else(|| FinanceError::invalid("variation", "NPV range exceeds numeric range"))?;
        Ok(SensitivityRecord {
            variable,
            low_input,
            high_input,
            npv_low,
            npv_high,
            range,
        })
    };

    let investment_low = base.scaled_investment(down, "variation")?;
    let investment_high = base.scaled_investment(up, "variation")?;
    let mut records = vec![
        record(
            TornadoVariable::InitialInvestment,
            investment_low,
            investment_high,
            project_npv(investment_low, &base.cash_flows, base.rate)?,
            project_npv(investment_high, &base.cash_flows, base.rate)?,
        )?,
        record(
            TornadoVariable::CashFlows,
            down,
            up,
            project_npv(base.investment, &base.scaled_flows(down, "variation")?, base.rate)?,
            project_npv(base.investment, &base.scaled_flows(up, "variation")?, base.rate)?,
        )?,
        record(
            TornadoVariable::DiscountRate,
            base.rate * down,
            base.rate * up,
            project_npv(base.investment, &base.cash_flows, base.rate * down)?,
            project_npv(base.investment, &base.cash_flows, base.rate * up)?,
        )?,
    ];

    // Stable sort keeps declaration order for ties
    records.sort_by(|a, b| b.range.cmp(&a.range));
    let most_sensitive = records[0].variable;

    if base.rate.is_zero() {
        warnings.push("Discount rate is zero; a relative shift leaves it unchanged".into());
    }

    let output = TornadoOutput {
        base_npv,
        records,
        most_sensitive,
    };

    let normalized = TornadoInput {
        initial_investment: base.investment,
        cash_flows: base.cash_flows,
        discount_rate: base.rate,
        variation: Some(variation),
        config: Some(config),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Tornado,
        "One-at-a-time NPV sensitivity (tornado)",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}
