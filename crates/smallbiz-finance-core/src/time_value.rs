use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::IrrSolverConfig;
use crate::error::FinanceError;
use crate::types::{Money, Rate};
use crate::FinanceResult;

/// Each cash flow discounted to period 0. `cash_flows[0]` is undiscounted.
///
/// Once the discount factor leaves the representable range the remaining
/// terms are below Decimal precision and are reported as zero.
pub fn discounted_flows(rate: Rate, cash_flows: &[Money]) -> FinanceResult<Vec<Money>> {
    if rate <= dec!(-1) {
        return Err(FinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Some(Decimal::ONE);
    let mut out = Vec::with_capacity(cash_flows.len());

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.and_then(|d| d.checked_mul(one_plus_r));
        }
        let value = match discount {
            Some(d) if !d.is_zero() => cf.checked_div(d).ok_or_else(|| FinanceError::InvalidInput {
                field: "rate".into(),
                reason: format!("Discounted value at period {t} exceeds numeric range"),
            })?,
            Some(_) => {
                return Err(FinanceError::DivisionByZero {
                    context: format!("NPV discount factor at period {t}"),
                })
            }
            None => Decimal::ZERO,
        };
        out.push(value);
    }

    Ok(out)
}

/// Net Present Value of a series of cash flows (index 0 = today).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> FinanceResult<Money> {
    let discounted = discounted_flows(rate, cash_flows)?;
    discounted
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| FinanceError::invalid("cash_flows", "NPV exceeds numeric range"))
}

/// NPV and its derivative with respect to the rate.
///
/// `None` when the rate is at or below -100% or an intermediate value
/// overflows; the caller treats that as divergence.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                // Growing factor overflowed: remaining terms vanish.
                None if one_plus_r > Decimal::ONE => break,
                None => return None,
            }
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_cf = Decimal::from(t as i64).checked_mul(*cf)?;
            let next = discount.checked_mul(one_plus_r);
            if let Some(next) = next {
                slope = slope.checked_sub(t_cf.checked_div(next)?)?;
            }
        }
    }

    Some((value, slope))
}

/// Converged root of the NPV equation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrSolution {
    pub rate: Rate,
    pub iterations: u32,
    /// NPV at `rate`.
    pub residual: Money,
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Iterates are kept inside the configured plausible band; a root outside
/// it therefore surfaces as a convergence failure.
pub fn irr(cash_flows: &[Money], config: &IrrSolverConfig) -> FinanceResult<IrrSolution> {
    if cash_flows.len() < 2 {
        return Err(FinanceError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = config.initial_guess;
    let mut last_delta = Decimal::MAX;

    for i in 0..config.max_iterations {
        let (value, slope) =
            npv_with_derivative(rate, cash_flows).ok_or_else(|| FinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta,
            })?;
        last_delta = value;

        if value.abs() < config.tolerance {
            return Ok(IrrSolution {
                rate,
                iterations: i,
                residual: value,
            });
        }

        let step = value
            .checked_div(slope)
            .ok_or_else(|| FinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            })?;
        rate = rate
            .checked_sub(step)
            .ok_or_else(|| FinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            })?;

        // Guard against divergence
        if rate < config.min_rate {
            rate = config.min_rate;
        } else if rate > config.max_rate {
            rate = config.max_rate;
        }
    }

    Err(FinanceError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: config.max_iterations,
        last_delta,
    })
}

/// Root located by bisection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    pub value: Decimal,
    pub residual: Decimal,
    pub iterations: u32,
}

/// Bracketing root finder.
///
/// Returns `Ok(None)` when `f` has no sign change on `[lo, hi]`; the search
/// never leaves the bracket.
pub fn bisect<F>(
    f: F,
    mut lo: Decimal,
    mut hi: Decimal,
    tolerance: Decimal,
    max_iterations: u32,
) -> FinanceResult<Option<Root>>
where
    F: Fn(Decimal) -> FinanceResult<Decimal>,
{
    if lo > hi {
        return Err(FinanceError::invalid(
            "search_range",
            format!("Lower bound {lo} exceeds upper bound {hi}"),
        ));
    }

    let mut f_lo = f(lo)?;
    let f_hi = f(hi)?;
    if f_lo.is_zero() {
        return Ok(Some(Root {
            value: lo,
            residual: f_lo,
            iterations: 0,
        }));
    }
    if f_hi.is_zero() {
        return Ok(Some(Root {
            value: hi,
            residual: f_hi,
            iterations: 0,
        }));
    }
    if f_lo.is_sign_positive() == f_hi.is_sign_positive() {
        return Ok(None);
    }

    let two = dec!(2);
    let mut mid = lo;
    let mut f_mid = f_lo;

    for i in 1..=max_iterations {
        // Halve before combining so extreme brackets cannot overflow.
        mid = lo / two + hi / two;
        f_mid = f(mid)?;
        if f_mid.abs() < tolerance || hi / two - lo / two < tolerance {
            return Ok(Some(Root {
                value: mid,
                residual: f_mid,
                iterations: i,
            }));
        }
        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Ok(Some(Root {
        value: mid,
        residual: f_mid,
        iterations: max_iterations,
    }))
}

/// Compute (1 + r)^n via iterative multiplication; `None` on overflow.
pub fn compound(rate: Rate, n: u32) -> Option<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(factor)?;
    }
    Some(result)
}

/// Level payment that amortizes `principal` over `nper` periods at `rate`.
///
/// Returned as a positive amount (the borrower's outflow).
pub fn annuity_payment(rate: Rate, nper: u32, principal: Money) -> FinanceResult<Money> {
    if nper == 0 {
        return Err(FinanceError::invalid("nper", "Number of periods must be > 0"));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    match compound(rate, nper) {
        Some(factor) => {
            let annuity_factor = factor - Decimal::ONE;
            if annuity_factor.is_zero() {
                return Err(FinanceError::DivisionByZero {
                    context: "PMT annuity factor".into(),
                });
            }
            Ok((principal * rate)
                .checked_mul(factor)
                .and_then(|v| v.checked_div(annuity_factor))
                .unwrap_or(principal * rate))
        }
        // (1+r)^n beyond range: the payment has converged to interest-only.
        None => Ok(principal * rate),
    }
}
