pub mod capital_budgeting;
pub mod payback;
pub mod replacement;
pub mod wacc;

pub use capital_budgeting::{compute_irr, compute_npv, project_npv};
pub use payback::compute_payback;
pub use replacement::analyze_asset_replacement;
pub use wacc::compute_wacc;
