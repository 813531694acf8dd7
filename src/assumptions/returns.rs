//! Real investment returns: historical series and per-year projection paths
//!
//! All rates are real (already net of inflation) decimal fractions.

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Historical real returns for growth and defensive assets by calendar year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnHistory {
    years: BTreeMap<i32, HistoricalReturn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalReturn {
    pub growth: f64,
    pub defensive: f64,
}

impl HistoricalReturn {
    /// Portfolio return for a growth allocation in [0, 1]
    pub fn blended(&self, growth_allocation: f64) -> f64 {
        self.growth * growth_allocation + self.defensive * (1.0 - growth_allocation)
    }
}

impl ReturnHistory {
    pub fn new(rows: Vec<(i32, HistoricalReturn)>) -> Result<Self> {
        let mut years = BTreeMap::new();
        for (year, row) in rows {
            if !row.growth.is_finite() || !row.defensive.is_finite() {
                return Err(ProjectionError::invalid_table(
                    "return history",
                    format!("non-finite return in {}", year),
                ));
            }
            if years.insert(year, row).is_some() {
                return Err(ProjectionError::invalid_table(
                    "return history",
                    format!("duplicate year {}", year),
                ));
            }
        }
        Ok(Self { years })
    }

    pub fn get(&self, year: i32) -> Option<&HistoricalReturn> {
        self.years.get(&year)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Sequence of real returns for one projection
///
/// Index 0 is the reference year before the projection starts; the year
/// beginning at age `start_age + k` uses index `k + 1`. Indices past the end
/// of the stored rates fall back to the assumed rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPath {
    rates: Vec<f64>,
    assumed: f64,
}

impl ReturnPath {
    /// Constant assumed rate for `years` projection years
    pub fn constant(rate: f64, years: u32) -> Self {
        Self {
            rates: vec![rate; years as usize + 2],
            assumed: rate,
        }
    }

    /// Explicit rates with a fallback for indices past the end
    pub fn from_rates(rates: Vec<f64>, assumed: f64) -> Self {
        Self { rates, assumed }
    }

    /// Historical returns from `start_year` onwards, blended at
    /// `growth_allocation`, with the assumed rate wherever history runs out
    pub fn historical(
        history: &ReturnHistory,
        start_year: i32,
        growth_allocation: f64,
        assumed: f64,
        years: u32,
    ) -> Result<Self> {
        if !history.contains(start_year) {
            return Err(ProjectionError::UnknownStartYear(start_year));
        }

        let mut path = Self::constant(assumed, years);
        for (offset, rate) in path.rates.iter_mut().enumerate().skip(1) {
            let year = start_year + offset as i32 - 1;
            if let Some(row) = history.get(year) {
                *rate = row.blended(growth_allocation);
            }
        }
        Ok(path)
    }

    /// Rate at a path index (0 = reference year)
    pub fn rate(&self, index: usize) -> f64 {
        self.rates.get(index).copied().unwrap_or(self.assumed)
    }

    /// Rate for the projection year beginning `year_offset` years after the start
    pub fn rate_for_year(&self, year_offset: u32) -> f64 {
        self.rate(year_offset as usize + 1)
    }

    pub fn assumed(&self) -> f64 {
        self.assumed
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn validate(&self) -> Result<()> {
        let all = self.rates.iter().chain(std::iter::once(&self.assumed));
        for rate in all {
            if !rate.is_finite() || *rate <= -1.0 {
                return Err(ProjectionError::invalid_input(
                    "returns",
                    format!("rate {} is not a usable real return", rate),
                ));
            }
        }
        Ok(())
    }
}
