//! Tunable thresholds and defaults for the engine.
//!
//! Every section deserializes with defaults, so a configuration file only
//! needs to name the values it overrides. Inputs carry optional overrides;
//! when an override is absent the matching `Default` below applies.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinanceError;
use crate::types::{Money, Rate};
use crate::FinanceResult;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub irr: IrrSolverConfig,
    pub portfolio: PortfolioConfig,
    pub wacc: CapitalStructureFallback,
    pub monte_carlo: MonteCarloConfig,
    pub sensitivity: SensitivityConfig,
    pub scenarios: ScenarioSet,
}

impl EngineConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> FinanceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject settings that would make the solvers meaningless.
    pub fn validate(&self) -> FinanceResult<()> {
        if self.irr.max_iterations == 0 {
            return Err(FinanceError::invalid(
                "irr.max_iterations",
                "Must be at least 1",
            ));
        }
        if self.irr.min_rate <= dec!(-1) || self.irr.min_rate >= self.irr.max_rate {
            return Err(FinanceError::invalid(
                "irr.min_rate / irr.max_rate",
                "Plausible IRR range must satisfy -1 < min < max",
            ));
        }
        if self.portfolio.weight_tolerance < Decimal::ZERO
            || self.portfolio.weight_tolerance >= Decimal::ONE
        {
            return Err(FinanceError::invalid(
                "portfolio.weight_tolerance",
                "Must be in [0, 1)",
            ));
        }
        if self.wacc.equity < Decimal::ZERO
            || self.wacc.debt < Decimal::ZERO
            || (self.wacc.equity + self.wacc.debt).is_zero()
        {
            return Err(FinanceError::invalid(
                "wacc.equity / wacc.debt",
                "Fallback capital structure must be non-negative and non-zero",
            ));
        }
        if self.monte_carlo.trials < 100 {
            return Err(FinanceError::invalid(
                "monte_carlo.trials",
                "Must be at least 100",
            ));
        }
        self.monte_carlo.validate()?;
        self.sensitivity.validate()
    }
}

impl MonteCarloConfig {
    /// Checks that do not depend on per-call overrides. The trial floor is
    /// enforced on the resolved count, which an input may override.
    pub fn validate(&self) -> FinanceResult<()> {
        if self.chunks == 0 {
            return Err(FinanceError::invalid("monte_carlo.chunks", "Must be at least 1"));
        }
        for (field, value) in [
            ("monte_carlo.flow_variation", self.flow_variation),
            ("monte_carlo.rate_std_dev", self.rate_std_dev),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FinanceError::invalid(
                    field,
                    format!("Must be a finite non-negative number, got {value}"),
                ));
            }
        }
        let min_rate = self.min_discount_rate;
        if !min_rate.is_finite() || min_rate <= 0.0 || min_rate >= 1.0 {
            return Err(FinanceError::invalid(
                "monte_carlo.min_discount_rate",
                format!("Must be in (0, 1), got {min_rate}"),
            ));
        }
        Ok(())
    }
}

impl SensitivityConfig {
    pub fn validate(&self) -> FinanceResult<()> {
        if self.variation <= Decimal::ZERO || self.variation > Decimal::ONE {
            return Err(FinanceError::invalid(
                "sensitivity.variation",
                "Must be in (0, 1]",
            ));
        }
        if self.tolerance <= Decimal::ZERO {
            return Err(FinanceError::invalid(
                "sensitivity.tolerance",
                "Must be greater than zero",
            ));
        }
        if self.max_iterations == 0 {
            return Err(FinanceError::invalid(
                "sensitivity.max_iterations",
                "Must be at least 1",
            ));
        }
        let (m_lo, m_hi) = self.multiplier_range;
        if m_lo < Decimal::ZERO || m_lo >= m_hi {
            return Err(FinanceError::invalid(
                "sensitivity.multiplier_range",
                format!("Must satisfy 0 <= low < high, got ({m_lo}, {m_hi})"),
            ));
        }
        let (r_lo, r_hi) = self.rate_range;
        if r_lo <= Decimal::NEGATIVE_ONE || r_lo >= r_hi {
            return Err(FinanceError::invalid(
                "sensitivity.rate_range",
                format!("Must satisfy -1 < low < high, got ({r_lo}, {r_hi})"),
            ));
        }
        if self.investment_range_factor <= Decimal::ZERO {
            return Err(FinanceError::invalid(
                "sensitivity.investment_range_factor",
                "Must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Newton-Raphson IRR solver settings and the plausibility band for roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSolverConfig {
    pub initial_guess: Rate,
    pub max_iterations: u32,
    pub tolerance: Decimal,
    /// Roots below this are reported as not computable.
    pub min_rate: Rate,
    /// Roots above this are reported as not computable.
    pub max_rate: Rate,
}

impl Default for IrrSolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.10),
            max_iterations: 100,
            tolerance: dec!(0.0000001),
            min_rate: dec!(-0.99),
            max_rate: dec!(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Accepted deviation of the weight sum from 1 (or from 100 for percentages).
    pub weight_tolerance: Rate,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: dec!(0.01),
        }
    }
}

/// Capital structure substituted when both equity and debt are zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalStructureFallback {
    pub equity: Money,
    pub debt: Money,
}

impl Default for CapitalStructureFallback {
    fn default() -> Self {
        Self {
            equity: dec!(600000),
            debt: dec!(400000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub trials: u32,
    /// Coefficient of variation applied to each cash flow.
    pub flow_variation: f64,
    /// Standard deviation of the discount rate, in decimal points.
    pub rate_std_dev: f64,
    /// Floor for sampled discount rates.
    pub min_discount_rate: f64,
    pub seed: u64,
    /// Number of independently seeded trial blocks for parallel runs.
    pub chunks: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            flow_variation: 0.15,
            rate_std_dev: 0.02,
            min_discount_rate: 0.001,
            seed: 42,
            chunks: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Symmetric shift applied to each tornado variable.
    pub variation: Rate,
    pub multiplier_range: (Decimal, Decimal),
    pub rate_range: (Rate, Rate),
    /// Upper bracket for investment break-even, as a multiple of the PV of inflows.
    pub investment_range_factor: Decimal,
    pub max_iterations: u32,
    pub tolerance: Decimal,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            variation: dec!(0.20),
            multiplier_range: (Decimal::ZERO, dec!(10)),
            rate_range: (Decimal::ZERO, Decimal::ONE),
            investment_range_factor: dec!(10),
            max_iterations: 200,
            tolerance: dec!(0.000001),
        }
    }
}

/// Multiplicative adjustment defining one named scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustment {
    pub name: String,
    pub cash_flow_multiplier: Decimal,
    pub rate_multiplier: Decimal,
    pub probability: Rate,
}

/// The three cases used by scenario analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSet {
    pub pessimistic: ScenarioAdjustment,
    pub base: ScenarioAdjustment,
    pub optimistic: ScenarioAdjustment,
}

impl Default for ScenarioSet {
    fn default() -> Self {
        Self {
            pessimistic: ScenarioAdjustment {
                name: "Pessimistic".into(),
                cash_flow_multiplier: dec!(0.8),
                rate_multiplier: dec!(1.2),
                probability: dec!(0.25),
            },
            base: ScenarioAdjustment {
                name: "Base".into(),
                cash_flow_multiplier: Decimal::ONE,
                rate_multiplier: Decimal::ONE,
                probability: dec!(0.50),
            },
            optimistic: ScenarioAdjustment {
                name: "Optimistic".into(),
                cash_flow_multiplier: dec!(1.2),
                rate_multiplier: dec!(0.8),
                probability: dec!(0.25),
            },
        }
    }
}
