use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smallbiz_finance_core::time_value;
use smallbiz_finance_core::valuation::capital_budgeting::{IrrInput, NpvInput};
use smallbiz_finance_core::valuation::payback::PaybackInput;
use smallbiz_finance_core::valuation::replacement::{ReplacementInput, ReplacementRecommendation};
use smallbiz_finance_core::valuation::wacc::WaccInput;
use smallbiz_finance_core::valuation::{
    analyze_asset_replacement, compute_irr, compute_npv, compute_payback, compute_wacc,
};
use smallbiz_finance_core::{ComputationKind, Decision, FinanceError};

// ===========================================================================
// NPV
// ===========================================================================

#[test]
fn test_npv_growing_project_accepted() {
    let result = compute_npv(&NpvInput {
        initial_investment: dec!(100000),
        cash_flows: vec![dec!(30000), dec!(35000), dec!(40000), dec!(45000), dec!(50000)],
        discount_rate: dec!(0.10),
    })
    .unwrap();

    assert_eq!(result.kind, ComputationKind::Npv);
    assert!(result.result.npv > Decimal::ZERO);
    assert_eq!(result.result.decision, Decision::Accept);
}

#[test]
fn test_npv_small_flows_rejected() {
    let result = compute_npv(&NpvInput {
        initial_investment: dec!(100000),
        cash_flows: vec![dec!(10000), dec!(10000), dec!(10000)],
        discount_rate: dec!(0.10),
    })
    .unwrap();

    assert!(result.result.npv < Decimal::ZERO);
    assert_eq!(result.result.decision, Decision::Reject);
}

#[test]
fn test_npv_rate_given_as_percentage() {
    let pct = compute_npv(&NpvInput {
        initial_investment: dec!(1000),
        cash_flows: vec![dec!(600), dec!(600)],
        discount_rate: dec!(8),
    })
    .unwrap();
    let frac = compute_npv(&NpvInput {
        initial_investment: dec!(1000),
        cash_flows: vec![dec!(600), dec!(600)],
        discount_rate: dec!(0.08),
    })
    .unwrap();
    assert_eq!(pct.inputs.discount_rate, dec!(0.08));
    assert!((pct.result.npv - frac.result.npv).abs() < dec!(0.000000001));
}

#[test]
fn test_npv_validation_names_field() {
    let err = compute_npv(&NpvInput {
        initial_investment: dec!(-5),
        cash_flows: vec![dec!(1)],
        discount_rate: dec!(0.1),
    })
    .unwrap_err();
    match err {
        FinanceError::InvalidInput { field, .. } => assert_eq!(field, "initial_investment"),
        other => panic!("unexpected error: {other}"),
    }

    let err = compute_npv(&NpvInput {
        initial_investment: dec!(5),
        cash_flows: vec![],
        discount_rate: dec!(0.1),
    })
    .unwrap_err();
    assert!(err.to_string().contains("cash_flows"));
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_consistent_with_npv() {
    let flows = vec![dec!(30000), dec!(35000), dec!(40000), dec!(45000), dec!(50000)];
    let out = compute_irr(&IrrInput {
        initial_investment: dec!(100000),
        cash_flows: flows.clone(),
        reference_rate: dec!(0.10),
        solver: None,
    })
    .unwrap()
    .result;

    let irr = out.irr.expect("IRR should be computable");
    assert_eq!(out.decision, Decision::Accept);

    let mut series = vec![dec!(-100000)];
    series.extend(flows);
    let npv = time_value::npv(irr, &series).unwrap();
    assert!(npv.abs() < dec!(0.01), "NPV at IRR = {npv}");
}

#[test]
fn test_irr_below_reference_rejected() {
    let out = compute_irr(&IrrInput {
        initial_investment: dec!(1000),
        cash_flows: vec![dec!(400), dec!(400), dec!(400)],
        reference_rate: dec!(0.12),
        solver: None,
    })
    .unwrap()
    .result;
    assert_eq!(out.decision, Decision::Reject);
    assert!(out.irr.unwrap() < dec!(0.12));
}

#[test]
fn test_irr_not_computable_is_data_not_error() {
    let result = compute_irr(&IrrInput {
        initial_investment: dec!(1000000),
        cash_flows: vec![dec!(1), dec!(1)],
        reference_rate: dec!(0.05),
        solver: None,
    })
    .unwrap();
    assert_eq!(result.result.decision, Decision::NotComputable);
    assert!(result.result.irr.is_none());
    assert!(result.result.reason.is_some());
    assert!(!result.warnings.is_empty());
}

// ===========================================================================
// WACC
// ===========================================================================

fn wacc_input(equity: Decimal, debt: Decimal) -> WaccInput {
    WaccInput {
        equity,
        debt,
        cost_of_equity: dec!(0.15),
        cost_of_debt: dec!(0.08),
        tax_rate: dec!(0.30),
        hurdle_return: None,
        fallback: None,
    }
}

#[test]
fn test_wacc_no_debt_equals_cost_of_equity() {
    let out = compute_wacc(&wacc_input(dec!(1000000), Decimal::ZERO))
        .unwrap()
        .result;
    assert_eq!(out.wacc, dec!(0.15));
    assert_eq!(out.debt_weight, Decimal::ZERO);
}

#[test]
fn test_wacc_degenerate_structure_flagged() {
    let result = compute_wacc(&wacc_input(Decimal::ZERO, Decimal::ZERO)).unwrap();
    assert!(result.result.fallback_applied);
    assert_eq!(result.result.equity_weight, dec!(0.6));
    assert!(!result.warnings.is_empty());
}

// ===========================================================================
// Payback and replacement
// ===========================================================================

#[test]
fn test_payback_with_discounting() {
    let out = compute_payback(&PaybackInput {
        initial_investment: dec!(100000),
        cash_flows: vec![dec!(30000), dec!(35000), dec!(40000), dec!(45000), dec!(50000)],
        discount_rate: Some(dec!(0.10)),
        max_acceptable_period: Some(dec!(3)),
    })
    .unwrap()
    .result;

    assert_eq!(out.payback_period, Some(dec!(2.875)));
    assert_eq!(out.decision, Decision::Accept);
    let discounted = out.discounted_payback_period.unwrap();
    assert!(discounted > dec!(3) && discounted < dec!(4));
}

#[test]
fn test_replacement_keep_when_no_savings() {
    let out = analyze_asset_replacement(&ReplacementInput {
        old_annual_cost: dec!(20000),
        new_annual_cost: dec!(20000),
        new_purchase_cost: dec!(50000),
        old_salvage_value: dec!(5000),
        new_useful_life: 10,
        discount_rate: dec!(8),
    })
    .unwrap();
    assert_eq!(out.result.recommendation, ReplacementRecommendation::Keep);
    assert_eq!(out.result.npv, dec!(-45000));
    assert_eq!(out.inputs.discount_rate, dec!(0.08));
}
