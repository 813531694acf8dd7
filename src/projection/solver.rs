//! Level income solver
//!
//! Finds the target income for `LevelRealIncome` that runs the balance down
//! to (near) zero by the final projection age, by repeatedly re-running the
//! full projection with a damped correction of the target.

use super::engine::{DrawdownStrategy, ProjectionEngine, ProjectionInputs};
use super::records::Projection;
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

/// Iteration controls for the target search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: u32,

    /// Converged once |terminal balance| <= target * tolerance_ratio
    pub tolerance_ratio: f64,

    /// Share of the naive spread-the-remainder correction applied per step
    pub damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance_ratio: 0.001,
            damping: 0.5,
        }
    }
}

/// Result of a target search
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub target_drawdown: f64,

    /// Projection at `target_drawdown`
    pub projection: Projection,

    /// Corrections applied after the initial guess
    pub iterations: u32,

    /// False when the iteration cap was hit first; the target is then approximate
    pub converged: bool,
}

/// Damped fixed-point search over the projection engine
#[derive(Debug, Clone, Copy)]
pub struct TargetDrawdownSolver<'a> {
    engine: ProjectionEngine<'a>,
    config: SolverConfig,
}

impl<'a> TargetDrawdownSolver<'a> {
    pub fn new(engine: ProjectionEngine<'a>, config: SolverConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve for the level target income
    ///
    /// Starts from balance / years and, while the terminal balance is outside
    /// tolerance, adds `damping * terminal / years` to the target.
    pub fn solve(&self, inputs: &ProjectionInputs) -> Result<SolveOutcome> {
        if inputs.strategy != DrawdownStrategy::LevelRealIncome {
            return Err(ProjectionError::invalid_input(
                "strategy",
                "target solving applies to LevelRealIncome only",
            ));
        }
        if inputs.years == 0 {
            return Err(ProjectionError::invalid_input("years", "must be at least 1"));
        }
        if self.config.tolerance_ratio <= 0.0 || self.config.damping <= 0.0 {
            return Err(ProjectionError::invalid_input(
                "solver",
                "tolerance ratio and damping must be positive",
            ));
        }

        let years = inputs.years as f64;
        let mut trial = inputs.clone();
        trial.target_drawdown = inputs.starting_balance / years;

        let mut projection = self.engine.project(&trial)?;
        let mut iterations = 0;

        let converged = loop {
            let terminal = projection.terminal_balance();
            if terminal.abs() <= trial.target_drawdown * self.config.tolerance_ratio {
                break true;
            }
            if iterations >= self.config.max_iterations {
                break false;
            }

            trial.target_drawdown += terminal / years * self.config.damping;
            iterations += 1;
            log::debug!(
                "iteration {}: terminal balance {:.2}, target now {:.2}",
                iterations,
                terminal,
                trial.target_drawdown
            );

            projection = self.engine.project(&trial)?;
        };

        if !converged {
            log::warn!(
                "level income search stopped after {} iterations with terminal balance {:.2}; target {:.2} is approximate",
                iterations,
                projection.terminal_balance(),
                trial.target_drawdown
            );
        }

        Ok(SolveOutcome {
            target_drawdown: trial.target_drawdown,
            projection,
            iterations,
            converged,
        })
    }
}
