//! Statutory minimum drawdown schedule for account-based pensions

use crate::error::{ProjectionError, Result};

/// Minimum annual drawdown as a fraction of the opening balance, by age band
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumDrawdownSchedule {
    /// (first age of band, minimum fraction), sorted by age
    bands: Vec<(u32, f64)>,
}

impl Default for MinimumDrawdownSchedule {
    fn default() -> Self {
        Self {
            bands: vec![
                (0, 0.04),
                (65, 0.05),
                (75, 0.06),
                (80, 0.07),
                (85, 0.09),
                (90, 0.11),
                (95, 0.14),
            ],
        }
    }
}

impl MinimumDrawdownSchedule {
    /// Build from (age, fraction) rows; each row starts a band that runs to
    /// the next row's age. Per-age rows work the same way.
    pub fn new(mut bands: Vec<(u32, f64)>) -> Result<Self> {
        if bands.is_empty() {
            return Err(ProjectionError::invalid_table(
                "minimum drawdown",
                "no rows",
            ));
        }
        for (age, rate) in &bands {
            if !(0.0..=1.0).contains(rate) {
                return Err(ProjectionError::invalid_table(
                    "minimum drawdown",
                    format!("rate at age {} is {}", age, rate),
                ));
            }
        }

        bands.sort_by_key(|(age, _)| *age);
        if bands.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(ProjectionError::invalid_table(
                "minimum drawdown",
                "duplicate ages",
            ));
        }

        Ok(Self { bands })
    }

    /// Minimum fraction at an attained age
    /// Ages below the first band use the first band's rate
    pub fn rate(&self, age: u32) -> f64 {
        self.bands
            .iter()
            .rev()
            .find(|(from, _)| *from <= age)
            .or_else(|| self.bands.first())
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }

    /// Minimum dollar drawdown for a balance
    pub fn minimum_amount(&self, age: u32, balance: f64) -> f64 {
        self.rate(age) * balance
    }

    pub fn bands(&self) -> &[(u32, f64)] {
        &self.bands
    }
}
