use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::BaseCase;
use crate::config::{ScenarioAdjustment, ScenarioSet};
use crate::error::FinanceError;
use crate::types::*;
use crate::valuation::project_npv;
use crate::FinanceResult;

const PROBABILITY_TOLERANCE: Decimal = dec!(0.001);

/// Input for pessimistic / base / optimistic NPV analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysisInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
    /// Scenario definitions; the default set when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<ScenarioSet>,
}

/// NPV under one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub probability: Rate,
    pub cash_flow_multiplier: Decimal,
    /// Base rate times the scenario's rate multiplier
    pub discount_rate: Rate,
    pub npv: Money,
    pub decision: Decision,
    pub deviation_from_base: Money,
}

/// Qualitative verdict drawn from the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioRecommendation {
    /// Positive even in the pessimistic case
    Robust,
    /// Positive in the base case only
    ModerateRisk,
    /// Positive only when things go well
    Risky,
    NotRecommended,
}

impl ScenarioRecommendation {
    fn from_outcomes(pessimistic: Money, base: Money, optimistic: Money) -> Self {
        if pessimistic > Decimal::ZERO {
            ScenarioRecommendation::Robust
        } else if base > Decimal::ZERO {
            ScenarioRecommendation::ModerateRisk
        } else if optimistic > Decimal::ZERO {
            ScenarioRecommendation::Risky
        } else {
            ScenarioRecommendation::NotRecommended
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysisOutput {
    pub pessimistic: ScenarioOutcome,
    pub base: ScenarioOutcome,
    pub optimistic: ScenarioOutcome,
    pub probability_weighted_npv: Money,
    pub recommendation: ScenarioRecommendation,
}

fn validate_scenarios(set: &ScenarioSet) -> FinanceResult<()> {
    for s in [&set.pessimistic, &set.base, &set.optimistic] {
        if s.cash_flow_multiplier < Decimal::ZERO || s.rate_multiplier < Decimal::ZERO {
            return Err(FinanceError::invalid(
                format!("scenario:{} multipliers", s.name),
                "Multipliers cannot be negative",
            ));
        }
        if s.probability < Decimal::ZERO || s.probability > Decimal::ONE {
            return Err(FinanceError::invalid(
                format!("scenario:{} probability", s.name),
                "Probability must be between 0 and 1",
            ));
        }
    }

    let total = set.pessimistic.probability + set.base.probability + set.optimistic.probability;
    if (total - Decimal::ONE).abs() > PROBABILITY_TOLERANCE {
        return Err(FinanceError::invalid(
            "probabilities",
            format!("Probabilities must sum to 1.0 (got {total})"),
        ));
    }
    Ok(())
}

/// Evaluate NPV under the pessimistic, base and optimistic adjustments.
pub fn analyze_scenarios(
    input: &ScenarioAnalysisInput,
) -> FinanceResult<ComputationOutput<ScenarioAnalysisInput, ScenarioAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base_case =
        BaseCase::validate(input.initial_investment, &input.cash_flows, input.discount_rate)?;
    let set = input.scenarios.clone().unwrap_or_default();
    validate_scenarios(&set)?;

    let base_npv = project_npv(base_case.investment, &base_case.cash_flows, base_case.rate)?;

    let evaluate = |adj: &ScenarioAdjustment| -> FinanceResult<ScenarioOutcome> {
        let rate = base_case.rate * adj.rate_multiplier;
        let npv = project_npv(
            base_case.investment,
            &base_case.scaled_flows(
                adj.cash_flow_multiplier,
                &format!("scenario:{} multipliers", adj.name),
            )?,
            rate,
        )?;
        let deviation_from_base = npv.checked_sub(base_npv).ok_or_else(|| {
            FinanceError::invalid(
                format!("scenario:{} multipliers", adj.name),
                "Deviation from base NPV exceeds numeric range",
            )
        })?;
        Ok(ScenarioOutcome {
            name: adj.name.clone(),
            probability: adj.probability,
            cash_flow_multiplier: adj.cash_flow_multiplier,
            discount_rate: rate,
            npv,
            decision: Decision::from_sign(npv),
            deviation_from_base,
        })
    };

    let pessimistic = evaluate(&set.pessimistic)?;
    let base = evaluate(&set.base)?;
    let optimistic = evaluate(&set.optimistic)?;

    if !(optimistic.npv >= base.npv && base.npv >= pessimistic.npv) {
        warnings.push("Scenario NPVs are not ordered pessimistic <= base <= optimistic".into());
    }

    let probability_weighted_npv = [&pessimistic, &base, &optimistic]
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.probability * s.npv))
        .ok_or_else(|| {
            FinanceError::invalid("cash_flows", "Probability-weighted NPV exceeds numeric range")
        })?;
    let recommendation =
        ScenarioRecommendation::from_outcomes(pessimistic.npv, base.npv, optimistic.npv);

    let output = ScenarioAnalysisOutput {
        pessimistic,
        base,
        optimistic,
        probability_weighted_npv,
        recommendation,
    };

    let normalized = ScenarioAnalysisInput {
        initial_investment: base_case.investment,
        cash_flows: base_case.cash_flows.clone(),
        discount_rate: base_case.rate,
        scenarios: Some(set),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Scenarios,
        "Pessimistic/Base/Optimistic Scenario Analysis",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(investment: Decimal) -> ScenarioAnalysisInput {
        ScenarioAnalysisInput {
            initial_investment: investment,
            cash_flows: vec![dec!(30000), dec!(35000), dec!(40000), dec!(45000), dec!(50000)],
            discount_rate: dec!(0.10),
            scenarios: None,
        }
    }

    #[test]
    fn test_robust_project() {
        let out = analyze_scenarios(&input(dec!(100000))).unwrap().result;
        assert_eq!(out.recommendation, ScenarioRecommendation::Robust);
        assert!(out.optimistic.npv >= out.base.npv);
        assert!(out.base.npv >= out.pessimistic.npv);
        assert_eq!(out.base.deviation_from_base, Decimal::ZERO);
        assert_eq!(out.pessimistic.discount_rate, dec!(0.12));
    }

    #[test]
    fn test_recommendation_bands() {
        // PV of inflows at base ~148k; pessimistic ~113k; optimistic ~188k
        let moderate = analyze_scenarios(&input(dec!(130000))).unwrap().result;
        assert_eq!(moderate.recommendation, ScenarioRecommendation::ModerateRisk);

        let risky = analyze_scenarios(&input(dec!(170000))).unwrap().result;
        assert_eq!(risky.recommendation, ScenarioRecommendation::Risky);

        let none = analyze_scenarios(&input(dec!(250000))).unwrap().result;
        assert_eq!(none.recommendation, ScenarioRecommendation::NotRecommended);
    }

    #[test]
    fn test_probability_weighted_npv() {
        let out = analyze_scenarios(&input(dec!(100000))).unwrap().result;
        let expected = dec!(0.25) * out.pessimistic.npv
            + dec!(0.5) * out.base.npv
            + dec!(0.25) * out.optimistic.npv;
        assert!((out.probability_weighted_npv - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let mut set = ScenarioSet::default();
        set.base.probability = dec!(0.6);
        let mut inp = input(dec!(100000));
        inp.scenarios = Some(set);
        let err = analyze_scenarios(&inp).unwrap_err();
        assert!(err.to_string().contains("probabilities"));
    }

    #[test]
    fn test_unordered_scenarios_warn() {
        let mut set = ScenarioSet::default();
        set.optimistic.cash_flow_multiplier = dec!(0.5);
        let mut inp = input(dec!(100000));
        inp.scenarios = Some(set);
        let result = analyze_scenarios(&inp).unwrap();
        assert_eq!(result.warnings.len(), 1);
    }
}
