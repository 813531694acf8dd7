//! Recurrence state carried from one projection year to the next

/// State at the start of a projection year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionState {
    /// Attained age at the start of the year
    pub age: u32,

    /// Years elapsed since the projection start
    pub year_offset: u32,

    /// Account balance, floored at zero
    pub balance: f64,

    /// Unfloored balance; can dip below zero when the drawdown cap bites
    pub check_balance: f64,

    /// Multiplier applied to the target income (starts at 1)
    pub indexation: f64,
}

impl ProjectionState {
    /// Initial state at projection start
    pub fn initial(start_age: u32, starting_balance: f64) -> Self {
        Self {
            age: start_age,
            year_offset: 0,
            balance: starting_balance,
            check_balance: starting_balance,
            indexation: 1.0,
        }
    }

    /// State for the following year after withdrawing `drawdown` mid-year
    /// and crediting `rate` for the full year
    pub fn advance(&self, drawdown: f64, rate: f64, indexation: f64) -> Self {
        let check_balance = roll_forward(self.check_balance, drawdown, rate);
        Self {
            age: self.age + 1,
            year_offset: self.year_offset + 1,
            balance: check_balance.max(0.0),
            check_balance,
            indexation,
        }
    }
}

/// End-of-year balance with the drawdown taken mid-year, so it misses half
/// the year's growth
pub fn roll_forward(balance: f64, drawdown: f64, rate: f64) -> f64 {
    balance * (1.0 + rate) - drawdown * (1.0 + rate / 2.0)
}

/// Ratio of the actual ending balance to the ending balance the expected
/// return would have produced; `None` when the expected balance is ~0
pub fn experience_adjustment(balance: f64, drawdown: f64, realized: f64, expected: f64) -> Option<f64> {
    let actual = roll_forward(balance, drawdown, realized);
    let projected = roll_forward(balance, drawdown, expected);

    if !projected.is_finite() || projected.abs() < 1e-9 {
        return None;
    }
    Some(actual / projected)
}

/// Longevity drag `1 - 1/ex`
///
/// Missing or non-positive life expectancy gives no adjustment; expectancy
/// under one year is treated as exactly one.
pub fn longevity_adjustment(life_expectancy: Option<f64>) -> Option<f64> {
    match life_expectancy {
        Some(ex) if ex.is_finite() && ex > 0.0 => Some(1.0 - 1.0 / ex.max(1.0)),
        _ => None,
    }
}
