//! CSV-based assumption loader
//!
//! Loads the life table, age pension parameters, minimum drawdown schedule
//! and (optionally) historical returns from CSV files in data/assumptions/

use super::{
    HistoricalReturn, HomeownerStatus, LifeTable, LifeTableRow, MinimumDrawdownSchedule,
    PensionParameterTable, PensionParameters, PensionStatus, Relationship, ReturnHistory,
};
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

pub const LIFE_TABLE_FILE: &str = "life_table.csv";
pub const AGE_PENSION_FILE: &str = "age_pension_parameters.csv";
pub const MINIMUM_DRAWDOWN_FILE: &str = "minimum_drawdown.csv";
pub const RETURN_HISTORY_FILE: &str = "return_history.csv";

#[derive(Debug, Deserialize)]
struct LifeTableCsvRow {
    #[serde(rename = "Age")]
    age: u32,
    qx: f64,
    ex: f64,
}

#[derive(Debug, Deserialize)]
struct PensionCsvRow {
    #[serde(rename = "Relationship")]
    relationship: Relationship,
    #[serde(rename = "Homeowner")]
    homeowner: HomeownerStatus,
    #[serde(rename = "FullPensionFortnightly")]
    full_pension_fortnightly: f64,
    #[serde(rename = "AssetTestLowerLimit")]
    asset_test_lower_limit: f64,
    #[serde(rename = "AssetTestReductionPer1000")]
    asset_test_reduction_per_1000: f64,
    #[serde(rename = "IncomeTestThresholdFortnightly")]
    income_test_threshold_fortnightly: f64,
    #[serde(rename = "IncomeTestReduction")]
    income_test_reduction_rate: f64,
    #[serde(rename = "DeemingTier")]
    deeming_tier: f64,
    #[serde(rename = "DeemingRateLow")]
    deeming_rate_low: f64,
    #[serde(rename = "DeemingRateHigh")]
    deeming_rate_high: f64,
}

impl PensionCsvRow {
    fn into_entry(self) -> (PensionStatus, PensionParameters) {
        (
            PensionStatus::new(self.relationship, self.homeowner),
            PensionParameters {
                full_pension_fortnightly: self.full_pension_fortnightly,
                asset_test_lower_limit: self.asset_test_lower_limit,
                asset_test_reduction_per_1000: self.asset_test_reduction_per_1000,
                income_test_threshold_fortnightly: self.income_test_threshold_fortnightly,
                income_test_reduction_rate: self.income_test_reduction_rate,
                deeming_tier: self.deeming_tier,
                deeming_rate_low: self.deeming_rate_low,
                deeming_rate_high: self.deeming_rate_high,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
struct MinimumCsvRow {
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "Percentage")]
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct ReturnCsvRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "RealGrowthReturn")]
    growth: f64,
    #[serde(rename = "RealDefensiveReturn")]
    defensive: f64,
}

/// Load a life table; columns other than Age, qx and ex are ignored
pub fn load_life_table_from_reader<R: Read>(reader: R) -> Result<LifeTable, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: LifeTableCsvRow = result?;
        rows.push(LifeTableRow {
            age: row.age,
            qx: row.qx,
            ex: row.ex,
        });
    }

    Ok(LifeTable::new(rows)?)
}

pub fn load_life_table(path: &Path) -> Result<LifeTable, Box<dyn Error>> {
    load_life_table_from_reader(File::open(path.join(LIFE_TABLE_FILE))?)
}

/// Load age pension parameters, one row per status combination
pub fn load_pension_parameters_from_reader<R: Read>(
    reader: R,
) -> Result<PensionParameterTable, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();

    for result in csv_reader.deserialize() {
        let row: PensionCsvRow = result?;
        entries.push(row.into_entry());
    }

    Ok(PensionParameterTable::new(entries)?)
}

pub fn load_pension_parameters(path: &Path) -> Result<PensionParameterTable, Box<dyn Error>> {
    load_pension_parameters_from_reader(File::open(path.join(AGE_PENSION_FILE))?)
}

/// Load minimum drawdown percentages (fractions) by starting age
pub fn load_minimum_drawdown_from_reader<R: Read>(
    reader: R,
) -> Result<MinimumDrawdownSchedule, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut bands = Vec::new();

    for result in csv_reader.deserialize() {
        let row: MinimumCsvRow = result?;
        bands.push((row.age, row.percentage));
    }

    Ok(MinimumDrawdownSchedule::new(bands)?)
}

pub fn load_minimum_drawdown(path: &Path) -> Result<MinimumDrawdownSchedule, Box<dyn Error>> {
    load_minimum_drawdown_from_reader(File::open(path.join(MINIMUM_DRAWDOWN_FILE))?)
}

/// Load historical real returns by calendar year
pub fn load_return_history_from_reader<R: Read>(reader: R) -> Result<ReturnHistory, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ReturnCsvRow = result?;
        rows.push((
            row.year,
            HistoricalReturn {
                growth: row.growth,
                defensive: row.defensive,
            },
        ));
    }

    Ok(ReturnHistory::new(rows)?)
}

/// Load return history from a file path
pub fn load_return_history(file: &Path) -> Result<ReturnHistory, Box<dyn Error>> {
    load_return_history_from_reader(File::open(file)?)
}

/// All tables loaded from one assumptions directory
pub struct LoadedAssumptions {
    pub life_table: LifeTable,
    pub pension_parameters: PensionParameterTable,
    pub minimum_drawdown: MinimumDrawdownSchedule,
    /// Present only when the directory holds a return history file
    pub return_history: Option<ReturnHistory>,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self, Box<dyn Error>> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        let history_file = path.join(RETURN_HISTORY_FILE);
        let return_history = if history_file.exists() {
            Some(load_return_history(&history_file)?)
        } else {
            log::debug!("no {} in {}", RETURN_HISTORY_FILE, path.display());
            None
        };

        Ok(Self {
            life_table: load_life_table(path)?,
            pension_parameters: load_pension_parameters(path)?,
            minimum_drawdown: load_minimum_drawdown(path)?,
            return_history,
        })
    }
}
