//! Error types for projection runs and assumption tables

use crate::assumptions::{HomeownerStatus, Relationship};
use thiserror::Error;

/// Errors raised while building assumption tables or running a projection
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("no age pension parameters for {relationship:?} / {homeowner:?}")]
    MissingPensionParameters {
        relationship: Relationship,
        homeowner: HomeownerStatus,
    },

    #[error("duplicate age pension parameters for {relationship:?} / {homeowner:?}")]
    DuplicatePensionParameters {
        relationship: Relationship,
        homeowner: HomeownerStatus,
    },

    #[error("life table is empty")]
    EmptyLifeTable,

    #[error("life table ages must be contiguous: expected age {expected}, found {found}")]
    NonContiguousLifeTable { expected: u32, found: u32 },

    #[error("invalid {table} table: {reason}")]
    InvalidTable { table: &'static str, reason: String },

    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("no return history loaded")]
    MissingReturnHistory,

    #[error("no return history for start year {0}")]
    UnknownStartYear(i32),
}

impl ProjectionError {
    pub(crate) fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_table(table: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            table,
            reason: reason.into(),
        }
    }

    /// True for malformed assumption data, as opposed to bad run inputs
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingPensionParameters { .. }
                | Self::DuplicatePensionParameters { .. }
                | Self::EmptyLifeTable
                | Self::NonContiguousLifeTable { .. }
                | Self::InvalidTable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let missing = ProjectionError::MissingPensionParameters {
            relationship: Relationship::Couple,
            homeowner: HomeownerStatus::NonHomeowner,
        };
        assert!(missing.is_configuration());
        assert!(ProjectionError::NonContiguousLifeTable { expected: 66, found: 68 }.is_configuration());

        let input = ProjectionError::invalid_input("years", "must be at least 1");
        assert!(!input.is_configuration());
        assert_eq!(input.to_string(), "invalid input `years`: must be at least 1");
    }
}
