use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{validate_horizon, MONTHS_PER_YEAR};
use crate::error::FinanceError;
use crate::time_value;
use crate::types::*;
use crate::validation::{validate_positive, validate_rate};
use crate::FinanceResult;

/// Input for a level-payment loan schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Nominal annual rate, compounded monthly
    pub annual_rate: Rate,
    pub term_months: u32,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Month number (1-indexed).
    pub period: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Balance after this month's payment.
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleOutput {
    pub monthly_payment: Money,
    pub monthly_rate: Rate,
    /// (1 + monthly rate)^12 - 1
    pub effective_annual_rate: Rate,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationRow>,
}

/// Build the monthly amortization schedule of a fixed-rate loan.
///
/// The last row pays off whatever balance remains, so the schedule always
/// closes at exactly zero.
pub fn build_loan_schedule(
    input: &LoanInput,
) -> FinanceResult<ComputationOutput<LoanInput, LoanScheduleOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let principal = validate_positive(input.principal, "principal")?;
    if principal.is_zero() {
        return Err(FinanceError::invalid(
            "principal",
            "Principal must be greater than zero",
        ));
    }
    let annual_rate = validate_rate(input.annual_rate, "annual_rate")?;
    let term = validate_horizon(input.term_months, "term_months")?;

    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let payment = time_value::annuity_payment(monthly_rate, term, principal)?;

    let mut balance = principal;
    let mut schedule = Vec::with_capacity(term as usize);
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=term {
        let interest = balance * monthly_rate;
        let (principal_part, row_payment) = if period == term {
            (balance, balance + interest)
        } else {
            // Never amortize more than what is owed
            let p = (payment - interest).min(balance);
            (p, p + interest)
        };
        balance -= principal_part;

        total_paid += row_payment;
        total_interest += interest;
        schedule.push(AmortizationRow {
            period,
            payment: row_payment,
            principal: principal_part,
            interest,
            remaining_balance: balance,
        });
    }

    let effective_annual_rate = time_value::compound(monthly_rate, 12)
        .map(|f| f - Decimal::ONE)
        .ok_or_else(|| FinanceError::invalid("annual_rate", "Effective rate exceeds numeric range"))?;

    tracing::debug!(term, %payment, "loan schedule built");

    let output = LoanScheduleOutput {
        monthly_payment: payment,
        monthly_rate,
        effective_annual_rate,
        total_paid,
        total_interest,
        schedule,
    };

    let normalized = LoanInput {
        principal,
        annual_rate,
        term_months: term,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::LoanSchedule,
        "Level-payment amortization (monthly compounding)",
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

    fn loan(principal: Decimal, rate: Decimal, months: u32) -> LoanScheduleOutput {
        build_loan_schedule(&LoanInput {
            principal,
            annual_rate: rate,
            term_months: months,
        })
        .unwrap()
        .result
    }

    #[test]
    fn test_twelve_month_loan_at_twelve_percent() {
        let out = loan(dec!(100000), dec!(12), 12);
        assert_eq!(out.schedule.len(), 12);
        assert_eq!(out.monthly_rate, dec!(0.01));
        // Standard PMT(1%, 12, 100000) = 8884.88
        assert!((out.monthly_payment - dec!(8884.88)).abs() < dec!(0.01));
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
        for row in &out.schedule {
            assert!((row.payment - out.monthly_payment).abs() < dec!(0.000001));
        }
    }

    #[test]
    fn test_first_row_split() {
        let out = loan(dec!(100000), dec!(0.12), 12);
        let first = &out.schedule[0];
        assert_eq!(first.interest, dec!(1000.00));
        assert_eq!(first.principal + first.interest, first.payment);
    }

    #[test]
    fn test_principal_sums_to_loan() {
        let out = loan(dec!(250000), dec!(0.065), 360);
        let total: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        assert!((total - dec!(250000)).abs() < dec!(0.000001));
        assert!((out.total_paid - out.total_interest - dec!(250000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate() {
        let out = loan(dec!(1200), Decimal::ZERO, 12);
        assert_eq!(out.monthly_payment, dec!(100));
        assert_eq!(out.total_interest, Decimal::ZERO);
        assert_eq!(out.effective_annual_rate, Decimal::ZERO);
    }

    #[test]
    fn test_effective_annual_rate() {
        let out = loan(dec!(1000), dec!(0.12), 12);
        // 1.01^12 - 1
        assert!((out.effective_annual_rate - dec!(0.126825)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_term_bounds() {
        for months in [0, 1201] {
            let err = build_loan_schedule(&LoanInput {
                principal: dec!(1000),
                annual_rate: dec!(0.05),
                term_months: months,
            })
            .unwrap_err();
            assert!(err.to_string().contains("term_months"));
        }
    }

    #[test]
    fn test_balance_never_negative() {
        let out = loan(dec!(5000), dec!(0.99), 1200);
        assert!(out
            .schedule
            .iter()
            .all(|r| r.remaining_balance >= Decimal::ZERO));
    }
}
