pub mod loan;
pub mod savings;

pub use loan::build_loan_schedule;
pub use savings::{project_savings, seek_savings_goal};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::FinanceError;
use crate::FinanceResult;

/// Longest supported horizon: 100 years of monthly periods.
pub const MAX_MONTHS: u32 = 1200;

pub(crate) const MONTHS_PER_YEAR: Decimal = dec!(12);

pub(crate) fn validate_horizon(months: u32, label: &str) -> FinanceResult<u32> {
    if months == 0 || months > MAX_MONTHS {
        return Err(FinanceError::invalid(
            label,
            format!("Must be between 1 and {MAX_MONTHS} months, got {months}"),
        ));
    }
    Ok(months)
}
