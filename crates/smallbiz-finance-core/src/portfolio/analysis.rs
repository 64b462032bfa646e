use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::PortfolioConfig;
use crate::error::FinanceError;
use crate::types::*;
use crate::validation::{validate_matching_length, validate_positive, validate_rate, validate_weights};
use crate::FinanceResult;

/// Largest accepted per-asset return or volatility (10 000%).
const MAX_MAGNITUDE: Decimal = Decimal::ONE_HUNDRED;

/// Input for portfolio return and risk analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    /// Expected return per asset (as decimals)
    pub returns: Vec<Rate>,
    /// Allocation per asset, as fractions or percentages
    pub weights: Vec<Decimal>,
    /// Volatility (standard deviation) per asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatilities: Option<Vec<Rate>>,
    /// Pairwise correlations, n x n
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_matrix: Option<Vec<Vec<Decimal>>>,
    /// Risk-free rate for the Sharpe ratio (defaults to 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_free_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PortfolioConfig>,
}

/// How portfolio volatility was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskMethod {
    Covariance,
    WeightedAverageApproximation,
    None,
}

/// Share of portfolio volatility attributable to one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskContribution {
    pub asset: usize,
    pub weight: Decimal,
    /// w_i * (Cov w)_i / sigma_p; contributions sum to portfolio volatility
    pub contribution: Decimal,
    /// contribution / sigma_p
    pub share: Decimal,
}

/// Output of portfolio analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub expected_return: Rate,
    pub risk_method: RiskMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_contributions: Option<Vec<RiskContribution>>,
    /// Weighted average asset volatility / portfolio volatility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversification_ratio: Option<Decimal>,
}

/// Analyze expected return and risk of a weighted asset mix.
///
/// Risk is computed from the full covariance matrix when correlations are
/// supplied, approximated by the weighted-average volatility when only
/// volatilities are known, and omitted otherwise.
pub fn analyze_portfolio(
    input: &PortfolioInput,
) -> FinanceResult<ComputationOutput<PortfolioInput, PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let config = input.config.clone().unwrap_or_default();
    let n = input.returns.len();
    if n == 0 {
        return Err(FinanceError::invalid("returns", "At least one asset is required"));
    }
    validate_matching_length(n, input.weights.len(), "weights")?;
    for (i, r) in input.returns.iter().enumerate() {
        if r.abs() > MAX_MAGNITUDE {
            return Err(FinanceError::invalid(
                format!("returns[{i}]"),
                format!("Return must be within +/-{MAX_MAGNITUDE}, got {r}"),
            ));
        }
    }
    let weights = validate_weights(&input.weights, config.weight_tolerance)?;

    let volatilities = match &input.volatilities {
        Some(vols) => {
            validate_matching_length(n, vols.len(), "volatilities")?;
            for (i, v) in vols.iter().enumerate() {
                let field = format!("volatilities[{i}]");
                if validate_positive(*v, &field)? > MAX_MAGNITUDE {
                    return Err(FinanceError::invalid(
                        field,
                        format!("Volatility must not exceed {MAX_MAGNITUDE}, got {v}"),
                    ));
                }
            }
            Some(vols.clone())
        }
        None => None,
    };

    if let Some(matrix) = &input.correlation_matrix {
        validate_correlation_matrix(matrix, n)?;
        if volatilities.is_none() {
            return Err(FinanceError::invalid(
                "volatilities",
                "A correlation matrix requires per-asset volatilities",
            ));
        }
    }

    let risk_free = input
        .risk_free_rate
        .map(|r| validate_rate(r, "risk_free_rate"))
        .transpose()?
        .unwrap_or(Decimal::ZERO);

    let expected_return: Decimal = weights
        .iter()
        .zip(input.returns.iter())
        .map(|(w, r)| w * r)
        .sum();

    let mut output = PortfolioOutput {
        expected_return,
        risk_method: RiskMethod::None,
        variance: None,
        volatility: None,
        sharpe_ratio: None,
        risk_contributions: None,
        diversification_ratio: None,
    };

    match (&volatilities, &input.correlation_matrix) {
        (Some(vols), Some(corr)) => {
            let cov = covariance_matrix(vols, corr);
            let cov_w = mat_vec(&cov, &weights);
            let mut variance: Decimal = weights.iter().zip(cov_w.iter()).map(|(w, c)| w * c).sum();
            if variance < Decimal::ZERO {
                warnings.push(
                    "Correlation matrix is not positive semi-definite; variance floored at zero"
                        .into(),
                );
                variance = Decimal::ZERO;
            }
            let volatility = sqrt_decimal(variance);

            let weighted_vol: Decimal = weights.iter().zip(vols.iter()).map(|(w, s)| w * s).sum();
            if volatility > Decimal::ZERO {
                output.risk_contributions = Some(
                    weights
                        .iter()
                        .zip(cov_w.iter())
                        .enumerate()
                        .map(|(i, (w, c))| {
                            let contribution = w * c / volatility;
                            RiskContribution {
                                asset: i,
                                weight: *w,
                                contribution,
                                share: contribution / volatility,
                            }
                        })
                        .collect(),
                );
                output.diversification_ratio = Some(weighted_vol / volatility);
            }

            output.risk_method = RiskMethod::Covariance;
            output.variance = Some(variance);
            output.volatility = Some(volatility);
        }
        (Some(vols), None) => {
            let volatility: Decimal = weights.iter().zip(vols.iter()).map(|(w, s)| w * s).sum();
            warnings.push(
                "No correlation matrix supplied; volatility is a weighted average that ignores diversification"
                    .into(),
            );
            output.risk_method = RiskMethod::WeightedAverageApproximation;
            output.variance = Some(volatility * volatility);
            output.volatility = Some(volatility);
        }
        _ => {}
    }

    output.sharpe_ratio = output.volatility.map(|vol| {
        if vol.is_zero() {
            Decimal::ZERO
        } else {
            (expected_return - risk_free) / vol
        }
    });

    let normalized = PortfolioInput {
        returns: input.returns.clone(),
        weights,
        volatilities,
        correlation_matrix: input.correlation_matrix.clone(),
        risk_free_rate: Some(risk_free),
        config: Some(config),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::Portfolio,
        "Mean-variance portfolio analysis",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

fn validate_correlation_matrix(matrix: &[Vec<Decimal>], n: usize) -> FinanceResult<()> {
    validate_matching_length(n, matrix.len(), "correlation_matrix")?;
    for (i, row) in matrix.iter().enumerate() {
        validate_matching_length(n, row.len(), &format!("correlation_matrix[{i}]"))?;
    }
    // Square from here on, so the transpose lookup is in bounds.
    for (i, row) in matrix.iter().enumerate() {
        for (j, rho) in row.iter().enumerate() {
            let field = format!("correlation_matrix[{i}][{j}]");
            if rho.abs() > Decimal::ONE {
                return Err(FinanceError::invalid(
                    field,
                    format!("Correlation must be in [-1, 1], got {rho}"),
                ));
            }
            if i == j && *rho != Decimal::ONE {
                return Err(FinanceError::invalid(field, "Diagonal entries must equal 1"));
            }
            if *rho != matrix[j][i] {
                return Err(FinanceError::invalid(field, "Matrix must be symmetric"));
            }
        }
    }
    Ok(())
}

fn covariance_matrix(vols: &[Decimal], corr: &[Vec<Decimal>]) -> Vec<Vec<Decimal>> {
    corr.iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, rho)| vols[i] * vols[j] * rho)
                .collect()
        })
        .collect()
}

fn mat_vec(m: &[Vec<Decimal>], v: &[Decimal]) -> Vec<Decimal> {
    m.iter()
        .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
        .collect()
}

fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn basic() -> PortfolioInput {
        PortfolioInput {
            returns: vec![dec!(0.10), dec!(0.15), dec!(0.12)],
            weights: vec![dec!(0.4), dec!(0.35), dec!(0.25)],
            volatilities: None,
            correlation_matrix: None,
            risk_free_rate: None,
            config: None,
        }
    }

    #[test]
    fn test_expected_return_only() {
        let result = analyze_portfolio(&basic()).unwrap();
        assert_eq!(result.result.expected_return, dec!(0.1225));
        assert_eq!(result.result.risk_method, RiskMethod::None);
        assert!(result.result.volatility.is_none());
        assert!(result.result.sharpe_ratio.is_none());
    }

    #[test]
    fn test_weighted_average_volatility_warns() {
        let mut input = basic();
        input.volatilities = Some(vec![dec!(0.20), dec!(0.30), dec!(0.10)]);
        let result = analyze_portfolio(&input).unwrap();
        // 0.4*0.2 + 0.35*0.3 + 0.25*0.1
        assert_eq!(result.result.volatility, Some(dec!(0.21)));
        assert_eq!(
            result.result.risk_method,
            RiskMethod::WeightedAverageApproximation
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_covariance_two_assets() {
        let input = PortfolioInput {
            returns: vec![dec!(0.08), dec!(0.12)],
            weights: vec![dec!(0.5), dec!(0.5)],
            volatilities: Some(vec![dec!(0.10), dec!(0.20)]),
            correlation_matrix: Some(vec![
                vec![dec!(1), dec!(0.5)],
                vec![dec!(0.5), dec!(1)],
            ]),
            risk_free_rate: Some(dec!(0.02)),
            config: None,
        };
        let out = analyze_portfolio(&input).unwrap().result;
        // 0.25*0.01 + 0.25*0.04 + 2*0.25*0.5*0.1*0.2 = 0.0175
        assert_eq!(out.variance, Some(dec!(0.0175)));
        let vol = out.volatility.unwrap();
        assert!((vol - dec!(0.132288)).abs() < dec!(0.000001));
        assert_eq!(out.risk_method, RiskMethod::Covariance);

        let contributions = out.risk_contributions.unwrap();
        let total: Decimal = contributions.iter().map(|c| c.contribution).sum();
        assert!((total - vol).abs() < dec!(0.0000001));
        assert!(out.diversification_ratio.unwrap() > Decimal::ONE);

        let sharpe = out.sharpe_ratio.unwrap();
        assert!((sharpe - dec!(0.08) / vol).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_zero_volatility_sharpe_is_zero() {
        let mut input = basic();
        input.volatilities = Some(vec![Decimal::ZERO; 3]);
        let out = analyze_portfolio(&input).unwrap().result;
        assert_eq!(out.sharpe_ratio, Some(Decimal::ZERO));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut input = basic();
        input.weights = vec![dec!(0.5), dec!(0.5)];
        let err = analyze_portfolio(&input).unwrap_err();
        assert!(matches!(err, FinanceError::InvalidInput { ref field, .. } if field == "weights"));
    }

    #[test]
    fn test_asymmetric_correlation_rejected() {
        let mut input = basic();
        input.volatilities = Some(vec![dec!(0.1); 3]);
        input.correlation_matrix = Some(vec![
            vec![dec!(1), dec!(0.2), dec!(0)],
            vec![dec!(0.3), dec!(1), dec!(0)],
            vec![dec!(0), dec!(0), dec!(1)],
        ]);
        assert!(analyze_portfolio(&input).is_err());
    }

    #[test]
    fn test_extreme_volatility_rejected() {
        let mut input = basic();
        input.volatilities = Some(vec![dec!(0.2), dec!(100000000000000000000), dec!(0.1)]);
        input.correlation_matrix = Some(vec![
            vec![dec!(1), dec!(0), dec!(0)],
            vec![dec!(0), dec!(1), dec!(0)],
            vec![dec!(0), dec!(0), dec!(1)],
        ]);
        let err = analyze_portfolio(&input).unwrap_err();
        assert!(matches!(
            err,
            FinanceError::InvalidInput { ref field, .. } if field == "volatilities[1]"
        ));
    }

    #[test]
    fn test_ragged_correlation_rejected() {
        let input = PortfolioInput {
            returns: vec![dec!(0.08), dec!(0.12)],
            weights: vec![dec!(0.5), dec!(0.5)],
            volatilities: Some(vec![dec!(0.10), dec!(0.20)]),
            correlation_matrix: Some(vec![vec![dec!(1), dec!(0.5)], vec![]]),
            risk_free_rate: None,
            config: None,
        };
        let err = analyze_portfolio(&input).unwrap_err();
        assert!(matches!(
            err,
            FinanceError::InvalidInput { ref field, .. } if field == "correlation_matrix[1]"
        ));
    }

    #[test]
    fn test_correlation_without_volatilities_rejected() {
        let mut input = basic();
        input.correlation_matrix = Some(vec![vec![Decimal::ONE; 3]; 3]);
        let err = analyze_portfolio(&input).unwrap_err();
        assert!(err.to_string().contains("volatilities"));
    }
}
