use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smallbiz_finance_core::config::{ScenarioAdjustment, ScenarioSet};
use smallbiz_finance_core::scenarios::breakeven::{BreakevenInput, BreakevenOutcome, BreakevenVariable};
use smallbiz_finance_core::scenarios::scenario::{ScenarioAnalysisInput, ScenarioRecommendation};
use smallbiz_finance_core::scenarios::sensitivity::{TornadoInput, TornadoVariable};
use smallbiz_finance_core::scenarios::{analyze_scenarios, analyze_tornado, find_breakeven};
use smallbiz_finance_core::valuation::capital_budgeting::IrrInput;
use smallbiz_finance_core::valuation::compute_irr;

fn flows() -> Vec<Decimal> {
    vec![dec!(25000), dec!(30000), dec!(35000), dec!(40000), dec!(45000)]
}

#[test]
fn test_tornado_base_matches_scenario_base() {
    let tornado = analyze_tornado(&TornadoInput {
        initial_investment: dec!(100000),
        cash_flows: flows(),
        discount_rate: dec!(0.12),
        variation: None,
        config: None,
    })
    .unwrap()
    .result;
    let scenarios = analyze_scenarios(&ScenarioAnalysisInput {
        initial_investment: dec!(100000),
        cash_flows: flows(),
        discount_rate: dec!(0.12),
        scenarios: None,
    })
    .unwrap()
    .result;

    assert_eq!(tornado.base_npv, scenarios.base.npv);
    assert_eq!(tornado.most_sensitive, TornadoVariable::CashFlows);
}

#[test]
fn test_rate_breakeven_matches_irr() {
    let breakeven = find_breakeven(&BreakevenInput {
        initial_investment: dec!(100000),
        cash_flows: flows(),
        discount_rate: dec!(0.12),
        variable: BreakevenVariable::DiscountRate,
        search_range: None,
        config: None,
    })
    .unwrap()
    .result;
    let irr = compute_irr(&IrrInput {
        initial_investment: dec!(100000),
        cash_flows: flows(),
        reference_rate: dec!(0.12),
        solver: None,
    })
    .unwrap()
    .result;

    assert_eq!(breakeven.outcome, BreakevenOutcome::Found);
    let diff = breakeven.breakeven_value.unwrap() - irr.irr.unwrap();
    assert!(diff.abs() < dec!(0.00001), "diff = {diff}");
    assert!(breakeven.margin_of_safety.unwrap() > Decimal::ZERO);
}

#[test]
fn test_multiplier_breakeven_not_found_when_always_positive() {
    // With no investment NPV is positive for any positive multiplier
    let out = find_breakeven(&BreakevenInput {
        initial_investment: Decimal::ZERO,
        cash_flows: flows(),
        discount_rate: dec!(0.12),
        variable: BreakevenVariable::CashFlowMultiplier,
        search_range: Some((dec!(0.1), dec!(5))),
        config: None,
    })
    .unwrap()
    .result;
    assert_eq!(out.outcome, BreakevenOutcome::NotFound);
    assert!(out.margin_of_safety.is_none());
}

#[test]
fn test_custom_scenarios() {
    let set = ScenarioSet {
        pessimistic: ScenarioAdjustment {
            name: "Recession".into(),
            cash_flow_multiplier: dec!(0.5),
            rate_multiplier: dec!(1.5),
            probability: dec!(0.2),
        },
        base: ScenarioAdjustment {
            name: "Plan".into(),
            cash_flow_multiplier: dec!(1),
            rate_multiplier: dec!(1),
            probability: dec!(0.6),
        },
        optimistic: ScenarioAdjustment {
            name: "Boom".into(),
            cash_flow_multiplier: dec!(1.3),
            rate_multiplier: dec!(0.9),
            probability: dec!(0.2),
        },
    };
    let out = analyze_scenarios(&ScenarioAnalysisInput {
        initial_investment: dec!(100000),
        cash_flows: flows(),
        discount_rate: dec!(0.12),
        scenarios: Some(set),
    })
    .unwrap()
    .result;

    assert_eq!(out.pessimistic.name, "Recession");
    assert_eq!(out.recommendation, ScenarioRecommendation::ModerateRisk);
    assert!(out.probability_weighted_npv < out.optimistic.npv);
}
