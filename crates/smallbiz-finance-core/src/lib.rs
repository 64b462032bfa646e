pub mod config;
pub mod error;
pub mod time_value;
pub mod types;
pub mod validation;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use config::EngineConfig;
pub use error::FinanceError;
pub use types::*;

/// Standard result type for all engine operations
pub type FinanceResult<T> = Result<T, FinanceError>;
