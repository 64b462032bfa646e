//! Monte Carlo simulation of project NPV and IRR.
//!
//! Trials run in `f64`; each trial rebuilds its cash-flow series in
//! `Decimal` and is scored with the same NPV and IRR routines as the
//! deterministic valuation. Every call owns its generator, seeded from the
//! input or the configured default, so identical inputs give identical
//! statistics.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::time::Instant;

use super::statistics::{summarize, SimulationSummary};
use crate::config::{IrrSolverConfig, MonteCarloConfig};
use crate::error::FinanceError;
use crate::types::*;
use crate::validation::{validate_cash_flows, validate_positive, validate_rate};
use crate::valuation::capital_budgeting::{plausible_irr, project_npv};
use crate::FinanceResult;

const MIN_TRIALS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for an NPV simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloNpvInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
    /// Coefficient of variation applied to each cash flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_variation: Option<f64>,
    /// Standard deviation of the discount rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_variation: Option<f64>,
    /// Number of trials (minimum 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<u32>,
    /// Optional seed for reproducibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Defaults for every setting not given above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MonteCarloConfig>,
}

/// Output of an NPV simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloNpvOutput {
    pub trials: u32,
    /// NPV of the unperturbed inputs.
    pub base_npv: f64,
    pub summary: SimulationSummary,
}

/// Input for an IRR simulation. Only cash flows are perturbed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloIrrInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<Money>,
    /// Hurdle the simulated IRRs are compared against.
    pub reference_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_variation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<IrrSolverConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MonteCarloConfig>,
}

/// Output of an IRR simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloIrrOutput {
    pub attempted_trials: u32,
    /// Trials that produced a plausible, converged IRR.
    pub usable_trials: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_irr: Option<f64>,
    /// Absent when no trial was usable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SimulationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_above_reference: Option<f64>,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

enum FlowSampler {
    Fixed(f64),
    Noisy { dist: Normal, floor_at_zero: bool },
}

impl FlowSampler {
    fn new(base: f64, cv: f64, period: usize) -> FinanceResult<Self> {
        let sd = base.abs() * cv;
        if sd == 0.0 {
            return Ok(FlowSampler::Fixed(base));
        }
        let dist = Normal::new(base, sd).map_err(|e| {
            FinanceError::invalid(
                format!("cash_flows[{period}]"),
                format!("Invalid Normal parameters: {e}"),
            )
        })?;
        Ok(FlowSampler::Noisy {
            dist,
            floor_at_zero: base >= 0.0,
        })
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        match self {
            FlowSampler::Fixed(v) => *v,
            FlowSampler::Noisy { dist, floor_at_zero } => {
                let v: f64 = rng.sample(dist);
                if *floor_at_zero {
                    v.max(0.0)
                } else {
                    v
                }
            }
        }
    }
}

/// Resolved per-trial model shared by the sequential and parallel runners.
struct TrialModel {
    investment: Money,
    flows: Vec<FlowSampler>,
    rate: Option<(Normal, f64)>,
    base_rate: f64,
}

impl TrialModel {
    fn new(
        investment: Money,
        cash_flows: &[Money],
        flow_cv: f64,
        base_rate: f64,
        rate_sd: f64,
        min_rate: f64,
    ) -> FinanceResult<Self> {
        let flows = cash_flows
            .iter()
            .enumerate()
            .map(|(t, cf)| FlowSampler::new(to_f64(*cf, "cash_flows")?, flow_cv, t))
            .collect::<FinanceResult<Vec<_>>>()?;
        let rate = if rate_sd > 0.0 {
            let dist = Normal::new(base_rate, rate_sd).map_err(|e| {
                FinanceError::invalid("rate_variation", format!("Invalid Normal parameters: {e}"))
            })?;
            Some((dist, min_rate))
        } else {
            None
        };
        Ok(Self {
            investment,
            flows,
            rate,
            base_rate,
        })
    }

    fn draw_flows(&self, rng: &mut StdRng) -> FinanceResult<Vec<Money>> {
        self.flows
            .iter()
            .map(|s| to_decimal(s.draw(rng), "cash_flows"))
            .collect()
    }

    fn draw_rate(&self, rng: &mut StdRng) -> FinanceResult<Rate> {
        let r = match &self.rate {
            Some((dist, floor)) => {
                let sampled: f64 = rng.sample(dist);
                sampled.max(*floor)
            }
            None => self.base_rate,
        };
        to_decimal(r, "discount_rate")
    }

    fn npv_trials(&self, rng: &mut StdRng, n: u32) -> FinanceResult<Vec<f64>> {
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let flows = self.draw_flows(rng)?;
            let rate = self.draw_rate(rng)?;
            let npv = project_npv(self.investment, &flows, rate)?;
            out.push(to_f64(npv, "npv")?);
        }
        Ok(out)
    }
}

fn to_f64(value: Decimal, field: &str) -> FinanceResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| FinanceError::invalid(field, format!("{value} is not representable as f64")))
}

fn to_decimal(value: f64, field: &str) -> FinanceResult<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| {
        FinanceError::invalid(field, format!("Sampled value {value} exceeds Decimal range"))
    })
}

fn validate_variation(value: f64, field: &str) -> FinanceResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(FinanceError::invalid(
            field,
            format!("Must be a finite non-negative number, got {value}"),
        ));
    }
    Ok(value)
}

fn validate_trials(trials: u32) -> FinanceResult<u32> {
    if trials < MIN_TRIALS {
        return Err(FinanceError::invalid(
            "trials",
            format!("At least {MIN_TRIALS} trials required, got {trials}"),
        ));
    }
    Ok(trials)
}

/// Validated NPV simulation settings.
struct NpvPlan {
    input: MonteCarloNpvInput,
    config: MonteCarloConfig,
    trials: u32,
    seed: u64,
    model: TrialModel,
    base_npv: f64,
}

fn plan_npv(input: &MonteCarloNpvInput) -> FinanceResult<NpvPlan> {
    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let investment = validate_positive(input.initial_investment, "initial_investment")?;
    validate_cash_flows(&input.cash_flows, "cash_flows")?;
    let rate = validate_rate(input.discount_rate, "discount_rate")?;
    let flow_cv = validate_variation(
        input.flow_variation.unwrap_or(config.flow_variation),
        "flow_variation",
    )?;
    let rate_sd = validate_variation(
        input.rate_variation.unwrap_or(config.rate_std_dev),
        "rate_variation",
    )?;
    let trials = validate_trials(input.trials.unwrap_or(config.trials))?;
    let seed = input.seed.unwrap_or(config.seed);

    let base_rate = to_f64(rate, "discount_rate")?;
    let model = TrialModel::new(
        investment,
        &input.cash_flows,
        flow_cv,
        base_rate,
        rate_sd,
        config.min_discount_rate,
    )?;
    let base_npv = to_f64(project_npv(investment, &input.cash_flows, rate)?, "npv")?;

    let normalized = MonteCarloNpvInput {
        initial_investment: investment,
        cash_flows: input.cash_flows.clone(),
        discount_rate: rate,
        flow_variation: Some(flow_cv),
        rate_variation: Some(rate_sd),
        trials: Some(trials),
        seed: Some(seed),
        config: Some(config.clone()),
    };

    Ok(NpvPlan {
        input: normalized,
        config,
        trials,
        seed,
        model,
        base_npv,
    })
}

fn finish_npv(
    plan: NpvPlan,
    mut outcomes: Vec<f64>,
    methodology: &str,
    start: Instant,
) -> FinanceResult<ComputationOutput<MonteCarloNpvInput, MonteCarloNpvOutput>> {
    let mut warnings = Vec::new();
    let summary = summarize(&mut outcomes)
        .ok_or_else(|| FinanceError::InsufficientData("Simulation produced no outcomes".into()))?;

    let gap = (summary.mean - plan.base_npv).abs();
    if plan.base_npv != 0.0 && gap / plan.base_npv.abs() > 0.10 {
        warnings.push(format!(
            "Simulated mean NPV differs from the base case by {:.1}%",
            gap / plan.base_npv.abs() * 100.0
        ));
    }

    tracing::debug!(
        trials = plan.trials,
        seed = plan.seed,
        mean = summary.mean,
        "npv simulation complete"
    );

    let output = MonteCarloNpvOutput {
        trials: plan.trials,
        base_npv: plan.base_npv,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::MonteCarloNpv,
        methodology,
        plan.input,
        warnings,
        elapsed,
        Precision::Float64,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the NPV distribution under noisy cash flows and discount rate.
///
/// Each period's flow is drawn from Normal(base, |base| * cv), floored at
/// zero when the base is non-negative; the rate is drawn from
/// Normal(base, sd), floored at the configured minimum.
pub fn simulate_npv_monte_carlo(
    input: &MonteCarloNpvInput,
) -> FinanceResult<ComputationOutput<MonteCarloNpvInput, MonteCarloNpvOutput>> {
    let start = Instant::now();
    let plan = plan_npv(input)?;

    let mut rng = StdRng::seed_from_u64(plan.seed);
    let outcomes = plan.model.npv_trials(&mut rng, plan.trials)?;

    finish_npv(plan, outcomes, "Monte Carlo NPV simulation", start)
}

/// Parallel variant of [`simulate_npv_monte_carlo`].
///
/// Trials are split into a fixed number of blocks, each with its own
/// generator seeded from the call seed and the block index. The result
/// depends only on the inputs and the block count, never on the thread
/// pool size, but differs from the sequential run for the same seed.
#[cfg(feature = "parallel")]
pub fn simulate_npv_monte_carlo_parallel(
    input: &MonteCarloNpvInput,
) -> FinanceResult<ComputationOutput<MonteCarloNpvInput, MonteCarloNpvOutput>> {
    use rayon::prelude::*;

    let start = Instant::now();
    let plan = plan_npv(input)?;
    let chunks = plan.config.chunks.max(1).min(plan.trials as usize);
    let per_chunk = plan.trials / chunks as u32;
    let remainder = plan.trials % chunks as u32;

    let blocks: Vec<Vec<f64>> = (0..chunks)
        .into_par_iter()
        .map(|i| {
            let n = per_chunk + u32::from((i as u32) < remainder);
            let mut rng = StdRng::seed_from_u64(chunk_seed(plan.seed, i));
            plan.model.npv_trials(&mut rng, n)
        })
        .collect::<FinanceResult<Vec<_>>>()?;

    let outcomes: Vec<f64> = blocks.into_iter().flatten().collect();
    finish_npv(plan, outcomes, "Monte Carlo NPV simulation (parallel blocks)", start)
}

#[cfg(feature = "parallel")]
fn chunk_seed(seed: u64, chunk: usize) -> u64 {
    seed.wrapping_add((chunk as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Simulate the IRR distribution under noisy cash flows.
///
/// Trials with no plausible root are discarded and counted; the summary is
/// absent when none remain.
pub fn simulate_irr_monte_carlo(
    input: &MonteCarloIrrInput,
) -> FinanceResult<ComputationOutput<MonteCarloIrrInput, MonteCarloIrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let solver = input.solver.clone().unwrap_or_default();
    let investment = validate_positive(input.initial_investment, "initial_investment")?;
    validate_cash_flows(&input.cash_flows, "cash_flows")?;
    let reference_rate = validate_rate(input.reference_rate, "reference_rate")?;
    let flow_cv = validate_variation(
        input.flow_variation.unwrap_or(config.flow_variation),
        "flow_variation",
    )?;
    let trials = validate_trials(input.trials.unwrap_or(config.trials))?;
    let seed = input.seed.unwrap_or(config.seed);

    let model = TrialModel::new(investment, &input.cash_flows, flow_cv, 0.0, 0.0, 0.0)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut irrs = Vec::with_capacity(trials as usize);
    for _ in 0..trials {
        let flows = model.draw_flows(&mut rng)?;
        if let Ok(sol) = plausible_irr(investment, &flows, &solver) {
            irrs.push(to_f64(sol.rate, "irr")?);
        }
    }

    let usable = irrs.len() as u32;
    let discarded = trials - usable;
    if discarded > 0 {
        warnings.push(format!(
            "{discarded} of {trials} trials had no plausible IRR and were discarded"
        ));
    }

    let reference = to_f64(reference_rate, "reference_rate")?;
    let probability_above_reference = if irrs.is_empty() {
        None
    } else {
        Some(irrs.iter().filter(|r| **r > reference).count() as f64 / irrs.len() as f64)
    };
    let summary = summarize(&mut irrs);
    if summary.is_none() {
        tracing::warn!(trials, seed, "no usable IRR trials");
    }

    let base_irr = plausible_irr(investment, &input.cash_flows, &solver)
        .ok()
        .and_then(|sol| sol.rate.to_f64());

    let output = MonteCarloIrrOutput {
        attempted_trials: trials,
        usable_trials: usable,
        base_irr,
        summary,
        probability_above_reference,
    };

    let normalized = MonteCarloIrrInput {
        initial_investment: investment,
        cash_flows: input.cash_flows.clone(),
        reference_rate,
        flow_variation: Some(flow_cv),
        trials: Some(trials),
        seed: Some(seed),
        solver: Some(solver),
        config: Some(config),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        ComputationKind::MonteCarloIrr,
        "Monte Carlo IRR simulation (Newton-Raphson per trial)",
        normalized,
        warnings,
        elapsed,
        Precision::Float64,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
