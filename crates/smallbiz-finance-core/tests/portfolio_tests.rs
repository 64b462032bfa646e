use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smallbiz_finance_core::config::PortfolioConfig;
use smallbiz_finance_core::portfolio::analysis::{PortfolioInput, RiskMethod};
use smallbiz_finance_core::portfolio::analyze_portfolio;
use smallbiz_finance_core::FinanceError;

fn three_assets(weights: Vec<Decimal>) -> PortfolioInput {
    PortfolioInput {
        returns: vec![dec!(0.10), dec!(0.15), dec!(0.12)],
        weights,
        volatilities: Some(vec![dec!(0.18), dec!(0.25), dec!(0.12)]),
        correlation_matrix: Some(vec![
            vec![dec!(1.0), dec!(0.3), dec!(0.1)],
            vec![dec!(0.3), dec!(1.0), dec!(0.2)],
            vec![dec!(0.1), dec!(0.2), dec!(1.0)],
        ]),
        risk_free_rate: None,
        config: None,
    }
}

#[test]
fn test_expected_return_weighted_sum() {
    let input = PortfolioInput {
        returns: vec![dec!(0.10), dec!(0.15), dec!(0.12)],
        weights: vec![dec!(0.4), dec!(0.35), dec!(0.25)],
        volatilities: None,
        correlation_matrix: None,
        risk_free_rate: None,
        config: None,
    };
    let out = analyze_portfolio(&input).unwrap().result;
    let expected = dec!(0.4) * dec!(0.10) + dec!(0.35) * dec!(0.15) + dec!(0.25) * dec!(0.12);
    assert_eq!(out.expected_return, expected);
    assert_eq!(out.risk_method, RiskMethod::None);
}

#[test]
fn test_fractions_and_percentages_agree() {
    let frac = analyze_portfolio(&three_assets(vec![dec!(0.4), dec!(0.35), dec!(0.25)]))
        .unwrap()
        .result;
    let pct = analyze_portfolio(&three_assets(vec![dec!(40), dec!(35), dec!(25)]))
        .unwrap()
        .result;

    assert_eq!(frac.expected_return, pct.expected_return);
    assert_eq!(frac.volatility, pct.volatility);
    assert_eq!(frac.sharpe_ratio, pct.sharpe_ratio);
}

#[test]
fn test_diversification_lowers_volatility() {
    let out = analyze_portfolio(&three_assets(vec![dec!(0.4), dec!(0.35), dec!(0.25)]))
        .unwrap()
        .result;
    let weighted_avg = dec!(0.4) * dec!(0.18) + dec!(0.35) * dec!(0.25) + dec!(0.25) * dec!(0.12);
    let vol = out.volatility.unwrap();
    assert!(vol < weighted_avg);
    assert_eq!(out.risk_method, RiskMethod::Covariance);

    let shares: Decimal = out
        .risk_contributions
        .unwrap()
        .iter()
        .map(|c| c.share)
        .sum();
    assert!((shares - Decimal::ONE).abs() < dec!(0.000001));
}

#[test]
fn test_weights_outside_tolerance_rejected() {
    let err = analyze_portfolio(&three_assets(vec![dec!(0.4), dec!(0.35), dec!(0.20)]))
        .unwrap_err();
    assert!(matches!(err, FinanceError::InvalidInput { ref field, .. } if field == "weights"));
}

#[test]
fn test_weight_tolerance_configurable() {
    let mut input = three_assets(vec![dec!(0.4), dec!(0.35), dec!(0.20)]);
    input.config = Some(PortfolioConfig {
        weight_tolerance: dec!(0.06),
    });
    let result = analyze_portfolio(&input).unwrap();
    let total: Decimal = result.inputs.weights.iter().sum();
    assert!((total - Decimal::ONE).abs() < dec!(0.0000001));
}

#[test]
fn test_matrix_dimension_mismatch_rejected() {
    let mut input = three_assets(vec![dec!(0.4), dec!(0.35), dec!(0.25)]);
    input.correlation_matrix = Some(vec![vec![dec!(1), dec!(0)], vec![dec!(0), dec!(1)]]);
    let err = analyze_portfolio(&input).unwrap_err();
    assert!(err.to_string().contains("correlation_matrix"));
}
