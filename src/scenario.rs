//! Scenario runner for retirement income projections
//!
//! Pre-loads assumptions once, then turns a high-level scenario (balance,
//! asset mix, annuity share, ages) into projection inputs: buys the annuity,
//! solves the level income on assumed returns and projects on actual returns.

use crate::annuity::{annual_payment, annuity_due_value};
use crate::assumptions::{
    Assumptions, HomeownerStatus, PensionStatus, Relationship, ReturnHistory, ReturnPath,
};
use crate::error::{ProjectionError, Result};
use crate::projection::{
    DrawdownStrategy, DynamicAdjustment, Projection, ProjectionEngine, ProjectionInputs,
    ProjectionSummary, SolverConfig, TargetDrawdownSolver,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// High-level scenario parameters
///
/// Rates are real decimal fractions; allocations are shares of the balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub balance: f64,
    pub growth_return: f64,
    pub defensive_return: f64,

    /// Share of the invested balance held in growth assets
    pub growth_allocation: f64,

    /// Share of the starting balance used to buy a lifetime annuity
    pub annuity_allocation: f64,

    pub start_age: u32,
    pub max_age: u32,

    /// First calendar year of historical returns; `None` projects on assumed returns
    pub start_year: Option<i32>,

    pub strategy: DrawdownStrategy,
    pub adjustment: DynamicAdjustment,
    pub relationship: Relationship,
    pub homeowner: HomeownerStatus,
    pub other_assets: f64,
    pub annuity_term_certain: u32,
    pub solver: SolverConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            balance: 500_000.0,
            growth_return: 0.05,
            defensive_return: 0.02,
            growth_allocation: 0.7,
            annuity_allocation: 0.0,
            start_age: 65,
            max_age: 94,
            start_year: None,
            strategy: DrawdownStrategy::MinimumWithdrawal,
            adjustment: DynamicAdjustment::None,
            relationship: Relationship::Single,
            homeowner: HomeownerStatus::Homeowner,
            other_assets: 0.0,
            annuity_term_certain: 0,
            solver: SolverConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, Box<dyn Error>> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Years projected after the start age
    pub fn years(&self) -> u32 {
        self.max_age.saturating_sub(self.start_age)
    }

    /// Assumed portfolio return for the growth/defensive mix
    pub fn blended_return(&self) -> f64 {
        self.growth_return * self.growth_allocation
            + self.defensive_return * (1.0 - self.growth_allocation)
    }

    pub fn pension_status(&self) -> PensionStatus {
        PensionStatus::new(self.relationship, self.homeowner)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("balance", self.balance), ("other_assets", self.other_assets)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProjectionError::invalid_input(
                    field,
                    format!("must be a non-negative amount, got {}", value),
                ));
            }
        }

        for (field, value) in [
            ("growth_allocation", self.growth_allocation),
            ("annuity_allocation", self.annuity_allocation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProjectionError::invalid_input(
                    field,
                    format!("must be between 0 and 1, got {}", value),
                ));
            }
        }
        if self.growth_allocation + self.annuity_allocation > 1.0 + 1e-12 {
            return Err(ProjectionError::invalid_input(
                "annuity_allocation",
                "growth and annuity allocations exceed the whole balance",
            ));
        }

        for (field, value) in [
            ("growth_return", self.growth_return),
            ("defensive_return", self.defensive_return),
        ] {
            if !value.is_finite() || value <= -1.0 {
                return Err(ProjectionError::invalid_input(
                    field,
                    format!("{} is not a usable real return", value),
                ));
            }
        }

        if self.max_age <= self.start_age {
            return Err(ProjectionError::invalid_input(
                "max_age",
                format!("must exceed start age {}", self.start_age),
            ));
        }
        Ok(())
    }
}

/// Level income search report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub target_drawdown: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Everything produced by one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub assumed_return: f64,

    /// Annuity-due factor at the defensive rate
    pub annuity_value: f64,
    pub annuity_purchase: f64,
    pub annuity_payment: f64,

    /// Balance left in the account after the annuity purchase
    pub invested_balance: f64,

    /// Present for `LevelRealIncome` scenarios
    pub solve: Option<SolveReport>,

    pub start_year: Option<i32>,
    pub projection: Projection,
}

/// Final projection for one historical start year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRun {
    pub start_year: i32,
    pub summary: ProjectionSummary,
}

/// Scenario state shared by the final projection and the historical sweep
struct PreparedScenario {
    assumed_return: f64,
    annuity_value: f64,
    annuity_purchase: f64,
    inputs: ProjectionInputs,
    solve: Option<SolveReport>,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// for growth_allocation in [0.3, 0.5, 0.7] {
///     let config = ScenarioConfig { growth_allocation, ..ScenarioConfig::default() };
///     let result = runner.run(&config)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    assumptions: Assumptions,
}

impl ScenarioRunner {
    pub fn new(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    /// Create runner by loading assumptions from CSV files
    pub fn from_csv() -> std::result::Result<Self, Box<dyn Error>> {
        Ok(Self::new(Assumptions::from_csv()?))
    }

    /// Create runner from specific assumptions directory
    pub fn from_csv_path(path: &Path) -> std::result::Result<Self, Box<dyn Error>> {
        Ok(Self::new(Assumptions::from_csv_path(path)?))
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Get mutable reference to assumptions for customization
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }

    /// Run one scenario end to end
    pub fn run(&self, config: &ScenarioConfig) -> Result<ScenarioResult> {
        let prepared = self.prepare(config)?;

        let returns = match config.start_year {
            Some(year) => self.historical_path(config, year, prepared.assumed_return)?,
            None => prepared.inputs.returns.clone(),
        };
        let projection = self.project_final(config, &prepared, returns)?;

        log::info!(
            "scenario complete: {} years, terminal balance {:.2}",
            projection.len(),
            projection.terminal_balance()
        );

        Ok(ScenarioResult {
            assumed_return: prepared.assumed_return,
            annuity_value: prepared.annuity_value,
            annuity_purchase: prepared.annuity_purchase,
            annuity_payment: prepared.inputs.annuity_payment,
            invested_balance: prepared.inputs.starting_balance,
            solve: prepared.solve,
            start_year: config.start_year,
            projection,
        })
    }

    /// Project the scenario from every start year in the loaded return history
    ///
    /// The level income target is solved once on assumed returns and shared
    /// by all start years. `config.start_year` is ignored.
    pub fn run_historical_sweep(&self, config: &ScenarioConfig) -> Result<Vec<HistoricalRun>> {
        let history = self.history()?;
        let prepared = self.prepare(config)?;
        let start_years: Vec<i32> = history.years().collect();

        log::info!(
            "historical sweep over {} start years ({:?} to {:?})",
            start_years.len(),
            history.first_year(),
            history.last_year()
        );

        start_years
            .par_iter()
            .map(|&start_year| {
                let returns = self.historical_path(config, start_year, prepared.assumed_return)?;
                let projection = self.project_final(config, &prepared, returns)?;
                Ok(HistoricalRun {
                    start_year,
                    summary: projection.summary(),
                })
            })
            .collect()
    }

    /// Validate, buy the annuity and solve the level income on assumed returns
    fn prepare(&self, config: &ScenarioConfig) -> Result<PreparedScenario> {
        config.validate()?;

        let years = config.years();
        let assumed_return = config.blended_return();

        let annuity_value = annuity_due_value(
            &self.assumptions.life_table,
            config.start_age,
            config.defensive_return,
            config.annuity_term_certain,
        )?;
        let annuity_purchase = config.annuity_allocation * config.balance;
        let annuity_payment = annual_payment(annuity_purchase, annuity_value);

        let mut inputs = ProjectionInputs::new(
            config.balance - annuity_purchase,
            config.start_age,
            years,
            ReturnPath::constant(assumed_return, years),
        );
        inputs.strategy = config.strategy;
        inputs.annuity_payment = annuity_payment;
        inputs.annuity_purchase_price = annuity_purchase;
        inputs.pension_status = config.pension_status();
        inputs.other_assets = config.other_assets;

        let solve = match config.strategy {
            DrawdownStrategy::MinimumWithdrawal => None,
            DrawdownStrategy::LevelRealIncome => {
                let solver = TargetDrawdownSolver::new(self.engine(), config.solver);
                let outcome = solver.solve(&inputs)?;
                inputs.target_drawdown = outcome.target_drawdown;
                log::info!(
                    "level income target {:.2} after {} iterations",
                    outcome.target_drawdown,
                    outcome.iterations
                );
                Some(SolveReport {
                    target_drawdown: outcome.target_drawdown,
                    iterations: outcome.iterations,
                    converged: outcome.converged,
                })
            }
        };

        Ok(PreparedScenario {
            assumed_return,
            annuity_value,
            annuity_purchase,
            inputs,
            solve,
        })
    }

    fn project_final(
        &self,
        config: &ScenarioConfig,
        prepared: &PreparedScenario,
        returns: ReturnPath,
    ) -> Result<Projection> {
        let inputs = ProjectionInputs {
            returns,
            adjustment: config.adjustment,
            ..prepared.inputs.clone()
        };
        self.engine().project(&inputs)
    }

    fn historical_path(&self, config: &ScenarioConfig, start_year: i32, assumed: f64) -> Result<ReturnPath> {
        ReturnPath::historical(
            self.history()?,
            start_year,
            config.growth_allocation,
            assumed,
            config.years(),
        )
    }

    fn history(&self) -> Result<&ReturnHistory> {
        self.assumptions
            .return_history
            .as_ref()
            .ok_or(ProjectionError::MissingReturnHistory)
    }

    fn engine(&self) -> ProjectionEngine<'_> {
        ProjectionEngine::new(&self.assumptions)
    }
}
