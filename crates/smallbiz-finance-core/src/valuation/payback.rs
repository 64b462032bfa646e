use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value;
use crate::types::*;
use crate::validation::{validate_cash_flows, validate_positive, validate_rate};
use crate::FinanceResult;

/// Input for the payback period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackInput {
    pub initial_investment: Money,
    /// Cash flows for periods 1..N.
    pub cash_flows: Vec<Money>,
    /// When present, a discounted payback period is also reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// Longest acceptable payback; recovery within it is ACCEPT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_acceptable_period: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackOutput {
    /// Fractional period at which the investment is recovered; absent when
    /// the horizon ends first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_period: Option<Decimal>,
    pub recovered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_payback_period: Option<Decimal>,
    /// Running total of undiscounted cash flows for periods 1..N.
    pub cumulative_cash_flows: Vec<Money>,
    pub decision: Decision,
}

/// Period at which cumulative flows first reach `investment`, interpolated
/// linearly inside the crossing period. Never extrapolates past the horizon.
fn recovery_period(investment: Money, flows: &[Money]) -> Option<Decimal> {
    if investment.is_zero() {
        return Some(Decimal::ZERO);
    }
    let mut cumulative = Decimal::ZERO;
    for (i, cf) in flows.iter().enumerate() {
        let before = cumulative;
        cumulative += cf;
        if cumulative >= investment && *cf > Decimal::ZERO {
            return Some(Decimal::from(i as i64) + (investment - before) / cf);
        }
    }
    None
}

/// Payback period with optional discounted variant.
pub fn compute_payback(
    input: &PaybackInput,
) -> FinanceResult<ComputationOutput<PaybackInput, PaybackOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let investment = validate_positive(input.initial_investment, "initial_investment")?;
    validate_cash_flows(&input.cash_flows, "cash_flows")?;
    let discount_rate = input
        .discount_rate
        .map(|r| validate_rate(r, "discount_rate"))
        .transpose()?;
    let max_acceptable_period = input
        .max_acceptable_period
        .map(|p| validate_positive(p, "max_acceptable_period"))
        .transpose()?;

    let cumulative_cash_flows: Vec<Money> = input
        .cash_flows
        .iter()
        .scan(Decimal::ZERO, |acc, cf| {
            *acc += cf;
            Some(*acc)
        })
        .collect();

    let payback_period = recovery_period(investment, &input.cash_flows);
    let recovered = payback_period.is_some();

    let discounted_payback_period = match discount_rate {
        Some(rate) => {
            let mut series = Vec::with_capacity(input.cash_flows.len() + 1);
            series.push(Decimal::ZERO);
            series.extend_from_slice(&input.cash_flows);
            let discounted = time_value::discounted_flows(rate, &series)?;
            let period = recovery_period(investment, &discounted[1..]);
            if period.is_none() && recovered {
                warnings.push(
                    "Investment is recovered nominally but not on a discounted basis".into(),
                );
            }
            period
        }
        None => None,
    };

    if !recovered {
        warnings.push(format!(
            "Investment not recovered within the {}-period horizon",
            input.cash_flows.len()
        ));
    }

    let decision = match (payback_period, max_acceptable_period) {
        (None, _) => Decision::Reject,
        (Some(p), Some(max)) if p > max => Decision::Reject,
        (Some(_), _) => Decision::Accept,
    };

    let output = PaybackOutput {
        payback_period,
        recovered,
        discounted_payback_period,
        cumulative_cash_flows,
        decision,
    };

    let normalized = PaybackInput {
        initial_investment: investment,
        cash_flows: input.cash_flows.clone(),
        discount_rate,
        max_acceptable_period,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Payback,
        "Payback period (linear interpolation within crossing period)",
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
    use rust_decimal_macros::dec;

    fn input(investment: Decimal, flows: Vec<Decimal>) -> PaybackInput {
        PaybackInput {
            initial_investment: investment,
            cash_flows: flows,
            discount_rate: None,
            max_acceptable_period: None,
        }
    }

    #[test]
    fn test_payback_interpolated() {
        // 30k + 35k = 65k after 2 periods; 35k of the 40k in period 3 -> 2.875
        let out = compute_payback(&input(
            dec!(100000),
            vec![dec!(30000), dec!(35000), dec!(40000), dec!(45000)],
        ))
        .unwrap()
        .result;
        assert_eq!(out.payback_period, Some(dec!(2.875)));
        assert!(out.recovered);
        assert_eq!(out.decision, Decision::Accept);
        assert_eq!(out.cumulative_cash_flows[1], dec!(65000));
    }

    #[test]
    fn test_payback_exact_period_boundary() {
        let out = compute_payback(&input(dec!(200), vec![dec!(100), dec!(100), dec!(100)]))
            .unwrap()
            .result;
        assert_eq!(out.payback_period, Some(dec!(2)));
    }

    #[test]
    fn test_not_recovered_is_reported_not_extrapolated() {
        let result = compute_payback(&input(dec!(1000), vec![dec!(100), dec!(200)])).unwrap();
        assert!(result.result.payback_period.is_none());
        assert!(!result.result.recovered);
        assert_eq!(result.result.decision, Decision::Reject);
        assert!(result.warnings.iter().any(|w| w.contains("not recovered")));
    }

    #[test]
    fn test_discounted_payback_is_later() {
        let mut inp = input(dec!(1000), vec![dec!(400), dec!(400), dec!(400), dec!(400)]);
        inp.discount_rate = Some(dec!(0.10));
        let out = compute_payback(&inp).unwrap().result;
        let simple = out.payback_period.unwrap();
        let discounted = out.discounted_payback_period.unwrap();
        assert_eq!(simple, dec!(2.5));
        assert!(discounted > simple);
    }

    #[test]
    fn test_max_acceptable_period() {
        let mut inp = input(dec!(1000), vec![dec!(400), dec!(400), dec!(400)]);
        inp.max_acceptable_period = Some(dec!(2));
        assert_eq!(compute_payback(&inp).unwrap().result.decision, Decision::Reject);
        inp.max_acceptable_period = Some(dec!(3));
        assert_eq!(compute_payback(&inp).unwrap().result.decision, Decision::Accept);
    }

    #[test]
    fn test_negative_flow_before_recovery() {
        let out = compute_payback(&input(
            dec!(100),
            vec![dec!(80), dec!(-20), dec!(60)],
        ))
        .unwrap()
        .result;
        // Cumulative 80, 60, 120: crosses in period 3 -> 2 + 40/60
        let p = out.payback_period.unwrap();
        assert!((p - dec!(2.6667)).abs() < dec!(0.0001));
    }
}
