//! Retirement assumptions: mortality, age pension rules, minimum drawdowns, returns

mod life_table;
mod age_pension;
mod minimums;
mod returns;
pub mod loader;

pub use life_table::{LifeTable, LifeTableRow};
pub use age_pension::{
    AgePensionCalculator, HomeownerStatus, MeansTest, MeansTestInputs, MeansTestRules,
    PensionAssessment, PensionParameterTable, PensionParameters, PensionStatus, Relationship,
};
pub use minimums::MinimumDrawdownSchedule;
pub use returns::{HistoricalReturn, ReturnHistory, ReturnPath};
pub use loader::LoadedAssumptions;

use std::path::Path;

/// Container for all read-only tables used by a projection run
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub life_table: LifeTable,
    pub age_pension: AgePensionCalculator,
    pub minimum_drawdown: MinimumDrawdownSchedule,
    pub return_history: Option<ReturnHistory>,
}

impl Assumptions {
    /// Current pension rates and minimum drawdown schedule with the given life table
    pub fn with_life_table(life_table: LifeTable) -> Self {
        Self {
            life_table,
            age_pension: AgePensionCalculator::default(),
            minimum_drawdown: MinimumDrawdownSchedule::default(),
            return_history: None,
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let loaded = LoadedAssumptions::load_from(path)?;

        Ok(Self {
            life_table: loaded.life_table,
            age_pension: AgePensionCalculator::new(
                loaded.pension_parameters,
                MeansTestRules::default(),
            ),
            minimum_drawdown: loaded.minimum_drawdown,
            return_history: loaded.return_history,
        })
    }

    pub fn set_means_test_rules(&mut self, rules: MeansTestRules) {
        self.age_pension.set_rules(rules);
    }

    pub fn set_return_history(&mut self, history: ReturnHistory) {
        self.return_history = Some(history);
    }
}
