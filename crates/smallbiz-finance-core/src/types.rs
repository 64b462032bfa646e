use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) once validated.
pub type Rate = Decimal;

/// Investment decision attached to every valuation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accept,
    Reject,
    Indifferent,
    NotComputable,
}

impl Decision {
    /// ACCEPT above zero, REJECT below, INDIFFERENT at exactly zero.
    pub fn from_sign(value: Decimal) -> Self {
        if value > Decimal::ZERO {
            Decision::Accept
        } else if value < Decimal::ZERO {
            Decision::Reject
        } else {
            Decision::Indifferent
        }
    }
}

/// Which engine operation produced an output envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationKind {
    Npv,
    Irr,
    Wacc,
    Payback,
    AssetReplacement,
    Portfolio,
    LoanSchedule,
    SavingsProjection,
    SavingsGoal,
    MonteCarloNpv,
    MonteCarloIrr,
    Tornado,
    Scenarios,
    Breakeven,
}

/// Standard computation output envelope.
///
/// `inputs` holds the normalized inputs (rates as decimals, weights summing
/// to one) that actually produced `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<I, T> {
    pub kind: ComputationKind,
    pub inputs: I,
    pub result: T,
    pub methodology: String,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Numeric representation used by a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Decimal128,
    Float64,
}

impl Precision {
    fn label(self) -> &'static str {
        match self {
            Precision::Decimal128 => "rust_decimal_128bit",
            Precision::Float64 => "ieee754_f64",
        }
    }
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<I, T>(
    kind: ComputationKind,
    methodology: &str,
    inputs: I,
    warnings: Vec<String>,
    elapsed_us: u64,
    precision: Precision,
    result: T,
) -> ComputationOutput<I, T> {
    ComputationOutput {
        kind,
        inputs,
        result,
        methodology: methodology.to_string(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: precision.label().to_string(),
        },
    }
}
