//! Single-life table indexed by integer age
//!
//! The table holds one-year mortality (qx) and complete expectation of life
//! (ex) for a contiguous run of ages ending at the limiting age ω. Any age
//! outside the table is treated as certain death within the year.

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

/// One age of a life table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifeTableRow {
    pub age: u32,

    /// Probability of dying within the year
    pub qx: f64,

    /// Complete expectation of life at this age
    pub ex: f64,
}

/// Contiguous, read-only life table
#[derive(Debug, Clone, PartialEq)]
pub struct LifeTable {
    min_age: u32,
    rows: Vec<LifeTableRow>,
}

impl LifeTable {
    /// Build a table from rows ordered by age
    pub fn new(rows: Vec<LifeTableRow>) -> Result<Self> {
        let min_age = rows.first().ok_or(ProjectionError::EmptyLifeTable)?.age;

        for (offset, row) in rows.iter().enumerate() {
            let expected = min_age + offset as u32;
            if row.age != expected {
                return Err(ProjectionError::NonContiguousLifeTable {
                    expected,
                    found: row.age,
                });
            }
            if !(0.0..=1.0).contains(&row.qx) {
                return Err(ProjectionError::invalid_table(
                    "life",
                    format!("qx at age {} is {}", row.age, row.qx),
                ));
            }
            if !row.ex.is_finite() || row.ex < 0.0 {
                return Err(ProjectionError::invalid_table(
                    "life",
                    format!("ex at age {} is {}", row.age, row.ex),
                ));
            }
        }

        Ok(Self { min_age, rows })
    }

    /// Build a table from mortality rates alone, starting at `min_age`
    ///
    /// Expectation of life is derived backwards from the limiting age:
    /// curtate e(x) = p(x) * (1 + e(x+1)), with nobody surviving past ω,
    /// and the complete expectation approximated as curtate + 0.5.
    pub fn from_qx(min_age: u32, qx: &[f64]) -> Result<Self> {
        let mut curtate = vec![0.0; qx.len()];
        let mut next = 0.0;
        for (idx, q) in qx.iter().enumerate().rev() {
            curtate[idx] = (1.0 - q) * (1.0 + next);
            next = curtate[idx];
        }

        let rows = qx
            .iter()
            .zip(curtate)
            .enumerate()
            .map(|(offset, (&q, e))| LifeTableRow {
                age: min_age + offset as u32,
                qx: q,
                ex: e + 0.5,
            })
            .collect();

        Self::new(rows)
    }

    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    /// Limiting age ω (last tabulated age)
    pub fn max_age(&self) -> u32 {
        self.min_age + self.rows.len() as u32 - 1
    }

    pub fn rows(&self) -> &[LifeTableRow] {
        &self.rows
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && age <= self.max_age()
    }

    fn row(&self, age: u32) -> Option<&LifeTableRow> {
        if age < self.min_age {
            return None;
        }
        self.rows.get((age - self.min_age) as usize)
    }

    /// One-year mortality, `None` outside the table
    pub fn qx(&self, age: u32) -> Option<f64> {
        self.row(age).map(|r| r.qx)
    }

    /// One-year survival; zero outside the table
    pub fn px(&self, age: u32) -> f64 {
        self.qx(age).map(|q| 1.0 - q).unwrap_or(0.0)
    }

    /// Remaining life expectancy, `None` outside the table
    pub fn ex(&self, age: u32) -> Option<f64> {
        self.row(age).map(|r| r.ex)
    }

    /// Probability that a life aged `age` survives `years` more years
    pub fn survival(&self, age: u32, years: u32) -> f64 {
        (0..years).map(|k| self.px(age + k)).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_qx_life_expectancy() {
        // Certain survival at 65, certain death at 66
        let table = LifeTable::from_qx(65, &[0.0, 1.0]).unwrap();

        assert_eq!(table.min_age(), 65);
        assert_eq!(table.max_age(), 66);
        assert_abs_diff_eq!(table.ex(66).unwrap(), 0.5);
        assert_abs_diff_eq!(table.ex(65).unwrap(), 1.5);
    }

    #[test]
    fn test_survival_outside_table_is_zero() {
        let table = LifeTable::from_qx(60, &[0.1, 0.2, 0.5]).unwrap();

        assert_abs_diff_eq!(table.survival(60, 2), 0.9 * 0.8, epsilon = 1e-12);
        assert_eq!(table.px(63), 0.0);
        assert_eq!(table.px(59), 0.0);
        assert_eq!(table.survival(60, 4), 0.0);
        assert_eq!(table.survival(61, 0), 1.0);
        assert!(table.ex(99).is_none());
    }

    #[test]
    fn test_rejects_gaps_and_bad_rates() {
        let rows = vec![
            LifeTableRow { age: 65, qx: 0.01, ex: 20.0 },
            LifeTableRow { age: 67, qx: 0.02, ex: 19.0 },
        ];
        assert_eq!(
            LifeTable::new(rows),
            Err(ProjectionError::NonContiguousLifeTable { expected: 66, found: 67 })
        );

        assert_eq!(LifeTable::new(Vec::new()), Err(ProjectionError::EmptyLifeTable));

        let err = LifeTable::from_qx(65, &[0.01, 1.2]).unwrap_err();
        assert!(err.is_configuration());
    }
}
