use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{validate_horizon, MAX_MONTHS, MONTHS_PER_YEAR};
use crate::error::FinanceError;
use crate::types::*;
use crate::validation::{validate_positive, validate_rate};
use crate::FinanceResult;

/// Input for a month-by-month savings projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsInput {
    pub initial_balance: Money,
    /// Deposited at the end of every month
    pub monthly_contribution: Money,
    /// Nominal annual rate, credited monthly
    pub annual_rate: Rate,
    pub months: u32,
    /// Tax withheld from each month's interest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// Annual inflation used to deflate balances to today's money
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
}

/// Balance snapshot at a reporting month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsCheckpoint {
    pub month: u32,
    pub balance: Money,
    /// Balance in purchasing power of month 0
    pub real_balance: Money,
    pub cumulative_contributions: Money,
    pub cumulative_net_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsProjectionOutput {
    /// Month 1, every 12th month, and the final month
    pub checkpoints: Vec<SavingsCheckpoint>,
    pub total_contributions: Money,
    pub gross_interest: Money,
    pub taxes_paid: Money,
    pub net_interest: Money,
    /// Final balance less initial balance and contributions
    pub net_gain: Money,
    pub final_balance: Money,
    pub final_real_balance: Money,
}

/// Input for solving how long it takes to reach a savings target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalInput {
    pub target_balance: Money,
    pub initial_balance: Money,
    pub monthly_contribution: Money,
    pub annual_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalOutput {
    pub reachable: bool,
    /// Months until the balance first meets the target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_required: Option<Decimal>,
    /// Balance when the target was met, or after the full horizon
    pub final_balance: Money,
    pub total_contributions: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One month of growth. Interest accrues on the opening balance and the
/// contribution lands at month end.
struct MonthlyAccrual {
    monthly_rate: Rate,
    tax_rate: Rate,
    contribution: Money,
}

struct MonthStep {
    balance: Money,
    gross_interest: Money,
    tax: Money,
}

impl MonthlyAccrual {
    fn step(&self, balance: Money, month: u32) -> FinanceResult<MonthStep> {
        let overflow = || {
            FinanceError::invalid(
                "annual_rate",
                format!("Balance exceeds numeric range at month {month}"),
            )
        };
        let gross_interest = balance.checked_mul(self.monthly_rate).ok_or_else(overflow)?;
        let tax = gross_interest * self.tax_rate;
        let balance = balance
            .checked_add(gross_interest - tax)
            .and_then(|b| b.checked_add(self.contribution))
            .ok_or_else(overflow)?;
        Ok(MonthStep {
            balance,
            gross_interest,
            tax,
        })
    }
}

/// Project a savings balance month by month.
pub fn project_savings(
    input: &SavingsInput,
) -> FinanceResult<ComputationOutput<SavingsInput, SavingsProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let initial_balance = validate_positive(input.initial_balance, "initial_balance")?;
    let contribution = validate_positive(input.monthly_contribution, "monthly_contribution")?;
    let annual_rate = validate_rate(input.annual_rate, "annual_rate")?;
    let months = validate_horizon(input.months, "months")?;
    let tax_rate = input
        .tax_rate
        .map(|t| validate_rate(t, "tax_rate"))
        .transpose()?;
    let inflation_rate = input
        .inflation_rate
        .map(|i| validate_rate(i, "inflation_rate"))
        .transpose()?;

    let accrual = MonthlyAccrual {
        monthly_rate: annual_rate / MONTHS_PER_YEAR,
        tax_rate: tax_rate.unwrap_or(Decimal::ZERO),
        contribution,
    };
    let monthly_inflation = inflation_rate.unwrap_or(Decimal::ZERO) / MONTHS_PER_YEAR;

    let mut balance = initial_balance;
    // None once cumulative inflation leaves the Decimal range.
    let mut deflator = Some(Decimal::ONE);
    let mut total_contributions = Decimal::ZERO;
    let mut gross_interest = Decimal::ZERO;
    let mut taxes_paid = Decimal::ZERO;
    let mut checkpoints = Vec::with_capacity(months as usize / 12 + 2);

    for month in 1..=months {
        let step = accrual.step(balance, month)?;
        balance = step.balance;
        let totals_overflow = || {
            FinanceError::invalid(
                "initial_balance",
                format!("Running totals exceed numeric range at month {month}"),
            )
        };
        gross_interest = gross_interest
            .checked_add(step.gross_interest)
            .ok_or_else(totals_overflow)?;
        taxes_paid = taxes_paid.checked_add(step.tax).ok_or_else(totals_overflow)?;
        total_contributions = total_contributions
            .checked_add(contribution)
            .ok_or_else(totals_overflow)?;
        deflator = deflator.and_then(|d| d.checked_mul(Decimal::ONE + monthly_inflation));

        if month == 1 || month % 12 == 0 || month == months {
            checkpoints.push(SavingsCheckpoint {
                month,
                balance,
                real_balance: deflate(balance, deflator),
                cumulative_contributions: total_contributions,
                cumulative_net_interest: gross_interest - taxes_paid,
            });
        }
    }

    if annual_rate.is_zero() {
        warnings.push("Zero interest rate; balance grows by contributions only".into());
    }
    if deflator.is_none() {
        warnings.push(
            "Cumulative inflation exceeds numeric range; real balances reported as 0".into(),
        );
    }
    if let Some(infl) = inflation_rate {
        if infl > annual_rate {
            warnings.push(format!(
                "Inflation ({infl}) exceeds the nominal rate ({annual_rate}); real value of interest is negative"
            ));
        }
    }

    let net_interest = gross_interest - taxes_paid;
    let output = SavingsProjectionOutput {
        checkpoints,
        total_contributions,
        gross_interest,
        taxes_paid,
        net_interest,
        net_gain: balance - initial_balance - total_contributions,
        final_balance: balance,
        final_real_balance: deflate(balance, deflator),
    };

    let normalized = SavingsInput {
        initial_balance,
        monthly_contribution: contribution,
        annual_rate,
        months,
        tax_rate,
        inflation_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::SavingsProjection,
        "Monthly compounding savings projection",
        normalized,
        warnings,
        elapsed,
        Precision::Decimal128,
        output,
    ))
}

/// Balance in today's money. The deflator is always at least 1.
fn deflate(balance: Money, deflator: Option<Decimal>) -> Money {
    match deflator {
        Some(d) => balance.checked_div(d).unwrap_or(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}

/// Find the number of months until a savings balance reaches a target.
///
/// Searches at most 100 years; a target beyond that is reported as
/// unreachable rather than as an error.
pub fn seek_savings_goal(
    input: &SavingsGoalInput,
) -> FinanceResult<ComputationOutput<SavingsGoalInput, SavingsGoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let target = validate_positive(input.target_balance, "target_balance")?;
    let initial_balance = validate_positive(input.initial_balance, "initial_balance")?;
    let contribution = validate_positive(input.monthly_contribution, "monthly_contribution")?;
    let annual_rate = validate_rate(input.annual_rate, "annual_rate")?;
    let tax_rate = input
        .tax_rate
        .map(|t| validate_rate(t, "tax_rate"))
        .transpose()?;

    let accrual = MonthlyAccrual {
        monthly_rate: annual_rate / MONTHS_PER_YEAR,
        tax_rate: tax_rate.unwrap_or(Decimal::ZERO),
        contribution,
    };

    let mut balance = initial_balance;
    let mut months_required = (balance >= target).then_some(0u32);
    let mut month = 0u32;

    while months_required.is_none() && month < MAX_MONTHS {
        month += 1;
        balance = accrual.step(balance, month)?.balance;
        if balance >= target {
            months_required = Some(month);
        }
    }

    let reason = if months_required.is_none() {
        tracing::debug!(%target, %balance, "savings goal unreachable");
        warnings.push("Target not reached within 100 years".into());
        Some(format!(
            "Balance reaches only {} after {MAX_MONTHS} months",
            balance.round_dp(2)
        ))
    } else {
        None
    };

    let output = SavingsGoalOutput {
        reachable: months_required.is_some(),
        months_required,
        years_required: months_required.map(|m| Decimal::from(m) / MONTHS_PER_YEAR),
        final_balance: balance,
        total_contributions: contribution * Decimal::from(month),
        reason,
    };

    let normalized = SavingsGoalInput {
        target_balance: target,
        initial_balance,
        monthly_contribution: contribution,
        annual_rate,
        tax_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::SavingsGoal,
        "Monthly goal-seek (bounded at 1200 months)",
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

    fn savings(months: u32) -> SavingsInput {
        SavingsInput {
            initial_balance: dec!(1000),
            monthly_contribution: dec!(100),
            annual_rate: dec!(0.12),
            months,
            tax_rate: None,
            inflation_rate: None,
        }
    }

    #[test]
    fn test_first_month() {
        let out = project_savings(&savings(1)).unwrap().result;
        // 1000 + 1% interest + 100 contribution
        assert_eq!(out.final_balance, dec!(1110));
        assert_eq!(out.checkpoints.len(), 1);
        assert_eq!(out.net_gain, dec!(10));
    }

    #[test]
    fn test_checkpoints_at_year_boundaries() {
        let out = project_savings(&savings(30)).unwrap().result;
        let months: Vec<u32> = out.checkpoints.iter().map(|c| c.month).collect();
        assert_eq!(months, vec![1, 12, 24, 30]);
        assert_eq!(out.total_contributions, dec!(3000));
    }

    #[test]
    fn test_tax_reduces_interest() {
        let mut input = savings(24);
        input.tax_rate = Some(dec!(25));
        let out = project_savings(&input).unwrap().result;
        assert!((out.taxes_paid - out.gross_interest * dec!(0.25)).abs() < dec!(0.0000001));
        assert_eq!(out.net_interest, out.gross_interest - out.taxes_paid);
        let untaxed = project_savings(&savings(24)).unwrap().result;
        assert!(out.final_balance < untaxed.final_balance);
    }

    #[test]
    fn test_inflation_deflates_real_balance() {
        let mut input = savings(12);
        input.annual_rate = dec!(0);
        input.inflation_rate = Some(dec!(0.12));
        let result = project_savings(&input).unwrap();
        let out = result.result;
        assert_eq!(out.final_balance, dec!(2200));
        assert!(out.final_real_balance < out.final_balance);
        assert!(result.warnings.iter().any(|w| w.contains("Inflation")));
    }

    #[test]
    fn test_full_horizon_at_maximum_inflation() {
        let mut input = savings(MAX_MONTHS);
        input.annual_rate = dec!(0);
        input.inflation_rate = Some(dec!(1.0));
        let result = project_savings(&input).unwrap();
        let out = result.result;
        assert_eq!(out.final_balance, dec!(121000));
        assert_eq!(out.final_real_balance, Decimal::ZERO);
        assert!(out.checkpoints[0].real_balance > Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("numeric range")));
    }

    #[test]
    fn test_zero_months_rejected() {
        assert!(project_savings(&savings(0)).is_err());
    }

    #[test]
    fn test_goal_reached() {
        let result = seek_savings_goal(&SavingsGoalInput {
            target_balance: dec!(1300),
            initial_balance: dec!(1000),
            monthly_contribution: dec!(100),
            annual_rate: Decimal::ZERO,
            tax_rate: None,
        })
        .unwrap();
        assert_eq!(result.result.months_required, Some(3));
        assert_eq!(result.result.years_required, Some(dec!(0.25)));
        assert!(result.result.reachable);
    }

    #[test]
    fn test_goal_already_met() {
        let out = seek_savings_goal(&SavingsGoalInput {
            target_balance: dec!(500),
            initial_balance: dec!(1000),
            monthly_contribution: Decimal::ZERO,
            annual_rate: dec!(0.05),
            tax_rate: None,
        })
        .unwrap()
        .result;
        assert_eq!(out.months_required, Some(0));
    }

    #[test]
    fn test_goal_unreachable() {
        let out = seek_savings_goal(&SavingsGoalInput {
            target_balance: dec!(1000000),
            initial_balance: Decimal::ZERO,
            monthly_contribution: dec!(10),
            annual_rate: Decimal::ZERO,
            tax_rate: None,
        })
        .unwrap()
        .result;
        assert!(!out.reachable);
        assert!(out.months_required.is_none());
        assert_eq!(out.final_balance, dec!(12000));
        assert!(out.reason.is_some());
    }
}
