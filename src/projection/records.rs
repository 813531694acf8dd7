//! Projection output: one record per simulated age

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::Write;

/// A single year of projection output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub age: u32,

    /// Opening account balance, floored at zero
    pub balance: f64,

    pub drawdown: f64,
    pub annuity_payment: f64,
    pub age_pension: f64,

    /// Drawdown + age pension + annuity payment
    pub total_payment: f64,

    /// Real return credited over the year
    pub real_return: f64,

    /// Opening balance before flooring (diagnostic)
    pub check_balance: f64,

    /// Income indexation factor in force for the year
    pub indexation: f64,
}

/// Ordered projection records, ages increasing by one
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Projection {
    records: Vec<ProjectionRecord>,
}

impl Projection {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: ProjectionRecord) {
        debug_assert!(self
            .records
            .last()
            .map_or(true, |last| last.age + 1 == record.age));
        self.records.push(record);
    }

    pub fn records(&self) -> &[ProjectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&ProjectionRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&ProjectionRecord> {
        self.records.last()
    }

    pub fn get_age(&self, age: u32) -> Option<&ProjectionRecord> {
        let start = self.records.first()?.age;
        if age < start {
            return None;
        }
        self.records.get((age - start) as usize)
    }

    /// Opening balance of the final record
    pub fn terminal_balance(&self) -> f64 {
        self.records.last().map(|r| r.balance).unwrap_or(0.0)
    }

    /// First age at which the opening balance is exhausted
    pub fn depletion_age(&self) -> Option<u32> {
        self.records
            .iter()
            .skip(1)
            .find(|r| r.balance <= 0.0)
            .map(|r| r.age)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_drawdown: f64 = self.records.iter().map(|r| r.drawdown).sum();
        let total_age_pension: f64 = self.records.iter().map(|r| r.age_pension).sum();
        let total_annuity: f64 = self.records.iter().map(|r| r.annuity_payment).sum();
        let total_income: f64 = self.records.iter().map(|r| r.total_payment).sum();

        let min_total_payment = self
            .records
            .iter()
            .map(|r| r.total_payment)
            .fold(f64::INFINITY, f64::min);

        let years = self.records.len();
        ProjectionSummary {
            years: years as u32,
            start_age: self.records.first().map(|r| r.age).unwrap_or(0),
            end_age: self.records.last().map(|r| r.age).unwrap_or(0),
            total_drawdown,
            total_age_pension,
            total_annuity,
            total_income,
            min_total_payment: if years == 0 { 0.0 } else { min_total_payment },
            average_total_payment: if years == 0 { 0.0 } else { total_income / years as f64 },
            terminal_balance: self.terminal_balance(),
            depletion_age: self.depletion_age(),
        }
    }

    /// Write all records as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), Box<dyn Error>> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub years: u32,
    pub start_age: u32,
    pub end_age: u32,
    pub total_drawdown: f64,
    pub total_age_pension: f64,
    pub total_annuity: f64,
    pub total_income: f64,
    pub min_total_payment: f64,
    pub average_total_payment: f64,
    pub terminal_balance: f64,
    pub depletion_age: Option<u32>,
}
