pub mod simulation;
pub mod statistics;

pub use simulation::{simulate_irr_monte_carlo, simulate_npv_monte_carlo};

#[cfg(feature = "parallel")]
pub use simulation::simulate_npv_monte_carlo_parallel;

pub use statistics::{Percentiles, SimulationSummary};
