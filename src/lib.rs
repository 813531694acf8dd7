//! Retirement Income - projection engine for account-based pensions
//!
//! This library provides:
//! - Age pension means testing (assets and income tests with deeming)
//! - Whole-life annuity-due valuation from a life table
//! - Yearly drawdown projections (minimum withdrawal or level real income)
//! - A solver for the level income that exhausts the balance at a target age
//! - Scenario orchestration, including historical return sweeps

pub mod error;
pub mod assumptions;
pub mod annuity;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use error::{ProjectionError, Result};
pub use assumptions::{AgePensionCalculator, Assumptions, LifeTable, ReturnPath};
pub use projection::{Projection, ProjectionEngine, ProjectionInputs, TargetDrawdownSolver};
pub use scenario::{ScenarioConfig, ScenarioRunner};
