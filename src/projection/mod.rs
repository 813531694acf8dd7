//! Yearly drawdown projection and level income solver

mod state;
mod engine;
mod records;
mod solver;

pub use state::ProjectionState;
pub use engine::{DrawdownStrategy, DynamicAdjustment, ProjectionEngine, ProjectionInputs};
pub use records::{Projection, ProjectionRecord, ProjectionSummary};
pub use solver::{SolveOutcome, SolverConfig, TargetDrawdownSolver};
