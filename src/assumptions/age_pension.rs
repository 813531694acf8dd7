//! Means-tested age pension
//!
//! The pension is assessed under two parallel tests and reduced by whichever
//! gives the larger reduction:
//! - Assets test: assessable assets above the lower limit reduce the pension
//!   by a fixed amount per $1,000 per fortnight
//! - Income test: deemed income on financial assets plus the assessable share
//!   of annuity income, above the free area, reduces the pension at a taper rate

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relationship status for pension purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Single,
    Couple,
}

/// Home ownership status for pension purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeownerStatus {
    Homeowner,
    #[serde(rename = "Non-Homeowner", alias = "NonHomeowner")]
    NonHomeowner,
}

/// Composite key for the parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PensionStatus {
    pub relationship: Relationship,
    pub homeowner: HomeownerStatus,
}

impl PensionStatus {
    pub fn new(relationship: Relationship, homeowner: HomeownerStatus) -> Self {
        Self { relationship, homeowner }
    }
}

/// Pension rates and thresholds for one status combination
///
/// Couple amounts are combined amounts for both members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PensionParameters {
    /// Maximum pension per fortnight
    pub full_pension_fortnightly: f64,

    /// Assets below this limit do not reduce the pension
    pub asset_test_lower_limit: f64,

    /// Fortnightly reduction per $1,000 of assets above the lower limit
    pub asset_test_reduction_per_1000: f64,

    /// Income free area per fortnight
    pub income_test_threshold_fortnightly: f64,

    /// Reduction per dollar of income above the free area
    pub income_test_reduction_rate: f64,

    /// Financial assets up to this amount are deemed at the low rate
    pub deeming_tier: f64,

    pub deeming_rate_low: f64,
    pub deeming_rate_high: f64,
}

impl PensionParameters {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("full_pension_fortnightly", self.full_pension_fortnightly),
            ("asset_test_lower_limit", self.asset_test_lower_limit),
            ("asset_test_reduction_per_1000", self.asset_test_reduction_per_1000),
            ("income_test_threshold_fortnightly", self.income_test_threshold_fortnightly),
            ("income_test_reduction_rate", self.income_test_reduction_rate),
            ("deeming_tier", self.deeming_tier),
            ("deeming_rate_low", self.deeming_rate_low),
            ("deeming_rate_high", self.deeming_rate_high),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ProjectionError::invalid_table(
                    "age pension",
                    format!("{} must be non-negative, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Parameter table keyed by (relationship, homeowner)
#[derive(Debug, Clone, PartialEq)]
pub struct PensionParameterTable {
    entries: HashMap<PensionStatus, PensionParameters>,
}

impl PensionParameterTable {
    /// Build from rows; at most one row per status combination
    pub fn new(rows: Vec<(PensionStatus, PensionParameters)>) -> Result<Self> {
        let mut entries = HashMap::with_capacity(rows.len());
        for (status, params) in rows {
            params.validate()?;
            if entries.insert(status, params).is_some() {
                return Err(ProjectionError::DuplicatePensionParameters {
                    relationship: status.relationship,
                    homeowner: status.homeowner,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, status: PensionStatus) -> Result<&PensionParameters> {
        self.entries
            .get(&status)
            .ok_or(ProjectionError::MissingPensionParameters {
                relationship: status.relationship,
                homeowner: status.homeowner,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PensionParameterTable {
    /// Rates from 20 September 2025
    fn default() -> Self {
        let single = PensionParameters {
            full_pension_fortnightly: 1178.70,
            asset_test_lower_limit: 321_500.0,
            asset_test_reduction_per_1000: 3.0,
            income_test_threshold_fortnightly: 218.0,
            income_test_reduction_rate: 0.5,
            deeming_tier: 64_200.0,
            deeming_rate_low: 0.0075,
            deeming_rate_high: 0.0275,
        };
        let couple = PensionParameters {
            full_pension_fortnightly: 1777.00,
            asset_test_lower_limit: 481_500.0,
            asset_test_reduction_per_1000: 3.0,
            income_test_threshold_fortnightly: 380.0,
            income_test_reduction_rate: 0.5,
            deeming_tier: 106_200.0,
            deeming_rate_low: 0.0075,
            deeming_rate_high: 0.0275,
        };

        let mut entries = HashMap::new();
        entries.insert(
            PensionStatus::new(Relationship::Single, HomeownerStatus::Homeowner),
            single,
        );
        entries.insert(
            PensionStatus::new(Relationship::Single, HomeownerStatus::NonHomeowner),
            PensionParameters { asset_test_lower_limit: 579_500.0, ..single },
        );
        entries.insert(
            PensionStatus::new(Relationship::Couple, HomeownerStatus::Homeowner),
            couple,
        );
        entries.insert(
            PensionStatus::new(Relationship::Couple, HomeownerStatus::NonHomeowner),
            PensionParameters { asset_test_lower_limit: 739_500.0, ..couple },
        );

        Self { entries }
    }
}

/// Policy constants of the means test that sit outside the rate table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeansTestRules {
    /// Share of a lifetime income stream's purchase price counted as an asset
    pub income_stream_asset_share: f64,

    /// Reduced share once the holder reaches `income_stream_reassessment_age`
    pub income_stream_asset_share_aged: f64,

    pub income_stream_reassessment_age: u32,

    /// Share of annuity payments counted as income
    pub assessable_annuity_income_share: f64,

    pub fortnights_per_year: f64,
}

impl Default for MeansTestRules {
    fn default() -> Self {
        Self {
            income_stream_asset_share: 0.6,
            income_stream_asset_share_aged: 0.3,
            income_stream_reassessment_age: 85,
            assessable_annuity_income_share: 0.6,
            fortnights_per_year: 26.0,
        }
    }
}

/// Financial position assessed in one year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeansTestInputs {
    pub balance: f64,
    pub annuity_income: f64,
    pub other_assets: f64,
    pub annuity_purchase_price: f64,
    pub age: u32,
}

/// Which test produced the larger reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeansTest {
    Assets,
    Income,
}

/// Breakdown of one pension assessment (annual amounts)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PensionAssessment {
    pub full_pension: f64,
    /// Raw reduction, negative when assets are under the lower limit
    pub assets_test_reduction: f64,
    /// Raw reduction, negative when income is under the free area
    pub income_test_reduction: f64,
    pub binding_test: MeansTest,
    pub annual_pension: f64,
}

/// Age pension calculator over an immutable parameter table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgePensionCalculator {
    parameters: PensionParameterTable,
    rules: MeansTestRules,
}

impl AgePensionCalculator {
    pub fn new(parameters: PensionParameterTable, rules: MeansTestRules) -> Self {
        Self { parameters, rules }
    }

    pub fn parameters(&self) -> &PensionParameterTable {
        &self.parameters
    }

    pub fn rules(&self) -> &MeansTestRules {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: MeansTestRules) {
        self.rules = rules;
    }

    /// Annual pension payable, never negative
    pub fn annual_pension(&self, status: PensionStatus, inputs: &MeansTestInputs) -> Result<f64> {
        Ok(self.assess(status, inputs)?.annual_pension)
    }

    /// Full assessment under both tests
    pub fn assess(&self, status: PensionStatus, inputs: &MeansTestInputs) -> Result<PensionAssessment> {
        let params = self.parameters.get(status)?;
        let fortnights = self.rules.fortnights_per_year;

        let full_pension = params.full_pension_fortnightly * fortnights;

        // Assets test
        let income_stream_share = if inputs.age < self.rules.income_stream_reassessment_age {
            self.rules.income_stream_asset_share
        } else {
            self.rules.income_stream_asset_share_aged
        };
        let assessable_assets = inputs.balance
            + inputs.other_assets
            + income_stream_share * inputs.annuity_purchase_price;
        let assets_test_reduction = (assessable_assets - params.asset_test_lower_limit)
            * params.asset_test_reduction_per_1000
            / 1000.0
            * fortnights;

        // Income test with two-tier deeming
        let financial_assets = inputs.balance + inputs.other_assets;
        let deemed_income = financial_assets.min(params.deeming_tier) * params.deeming_rate_low
            + (financial_assets - params.deeming_tier).max(0.0) * params.deeming_rate_high
            + self.rules.assessable_annuity_income_share * inputs.annuity_income;
        let income_test_reduction = (deemed_income
            - params.income_test_threshold_fortnightly * fortnights)
            * params.income_test_reduction_rate;

        let binding_test = if assets_test_reduction >= income_test_reduction {
            MeansTest::Assets
        } else {
            MeansTest::Income
        };
        let reduction = assets_test_reduction.max(income_test_reduction).max(0.0);

        Ok(PensionAssessment {
            full_pension,
            assets_test_reduction,
            income_test_reduction,
            binding_test,
            annual_pension: (full_pension - reduction).max(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn single_homeowner() -> PensionStatus {
        PensionStatus::new(Relationship::Single, HomeownerStatus::Homeowner)
    }

    fn position(balance: f64) -> MeansTestInputs {
        MeansTestInputs {
            balance,
            annuity_income: 0.0,
            other_assets: 0.0,
            annuity_purchase_price: 0.0,
            age: 67,
        }
    }

    #[test]
    fn test_full_pension_with_no_means() {
        let calc = AgePensionCalculator::default();
        for status in [
            single_homeowner(),
            PensionStatus::new(Relationship::Couple, HomeownerStatus::NonHomeowner),
        ] {
            let base = calc.parameters().get(status).unwrap().full_pension_fortnightly;
            let pension = calc.annual_pension(status, &position(0.0)).unwrap();
            assert_abs_diff_eq!(pension, base * 26.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_assets_test_binds_for_large_balance() {
        let calc = AgePensionCalculator::default();
        let assessment = calc.assess(single_homeowner(), &position(500_000.0)).unwrap();

        // (500,000 - 321,500) * 3 / 1000 * 26
        assert_abs_diff_eq!(assessment.assets_test_reduction, 13_923.0, epsilon = 1e-6);
        // 64,200 * 0.75% + 435,800 * 2.75% = 12,466 deemed; (12,466 - 5,668) * 0.5
        assert_abs_diff_eq!(assessment.income_test_reduction, 3_399.0, epsilon = 1e-6);
        assert_eq!(assessment.binding_test, MeansTest::Assets);
        assert_abs_diff_eq!(assessment.annual_pension, 1178.70 * 26.0 - 13_923.0, epsilon = 1e-6);
    }

    #[test]
    fn test_income_test_binds_for_annuity_income() {
        let calc = AgePensionCalculator::default();
        let inputs = MeansTestInputs {
            annuity_income: 40_000.0,
            ..position(50_000.0)
        };
        let assessment = calc.assess(single_homeowner(), &inputs).unwrap();

        assert_eq!(assessment.binding_test, MeansTest::Income);
        let deemed = 50_000.0 * 0.0075 + 0.6 * 40_000.0;
        let expected = 1178.70 * 26.0 - (deemed - 218.0 * 26.0) * 0.5;
        assert_abs_diff_eq!(assessment.annual_pension, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_pension_non_increasing_in_assets() {
        let calc = AgePensionCalculator::default();
        let status = single_homeowner();

        let mut previous = f64::MAX;
        for step in 0..60 {
            let balance = 321_500.0 + step as f64 * 10_000.0;
            let pension = calc.annual_pension(status, &position(balance)).unwrap();
            assert!(pension <= previous, "pension rose at balance {}", balance);
            assert!(pension >= 0.0);
            previous = pension;
        }

        let mut previous = f64::MAX;
        for step in 0..60 {
            let inputs = MeansTestInputs {
                other_assets: step as f64 * 10_000.0,
                ..position(350_000.0)
            };
            let pension = calc.annual_pension(status, &inputs).unwrap();
            assert!(pension <= previous);
            previous = pension;
        }
    }

    #[test]
    fn test_income_stream_assets_discounted_from_85() {
        let calc = AgePensionCalculator::default();
        let at = |age| MeansTestInputs {
            annuity_purchase_price: 200_000.0,
            age,
            ..position(300_000.0)
        };

        let before = calc.assess(single_homeowner(), &at(84)).unwrap();
        let after = calc.assess(single_homeowner(), &at(85)).unwrap();

        // 60% vs 30% of 200,000 counted: 60,000 fewer assessable dollars
        let delta = before.assets_test_reduction - after.assets_test_reduction;
        assert_abs_diff_eq!(delta, 60_000.0 * 3.0 / 1000.0 * 26.0, epsilon = 1e-6);
        assert!(after.annual_pension > before.annual_pension);
    }

    #[test]
    fn test_rules_are_configurable() {
        let mut calc = AgePensionCalculator::default();
        let inputs = MeansTestInputs {
            annuity_income: 40_000.0,
            ..position(0.0)
        };
        let default_pension = calc.annual_pension(single_homeowner(), &inputs).unwrap();

        calc.set_rules(MeansTestRules {
            assessable_annuity_income_share: 0.5,
            ..MeansTestRules::default()
        });
        let relaxed = calc.annual_pension(single_homeowner(), &inputs).unwrap();
        assert_abs_diff_eq!(relaxed - default_pension, 0.1 * 40_000.0 * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_status_is_configuration_error() {
        let table = PensionParameterTable::new(vec![(
            single_homeowner(),
            *PensionParameterTable::default().get(single_homeowner()).unwrap(),
        )])
        .unwrap();
        let calc = AgePensionCalculator::new(table, MeansTestRules::default());

        let status = PensionStatus::new(Relationship::Couple, HomeownerStatus::Homeowner);
        let err = calc.annual_pension(status, &position(0.0)).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err,
            ProjectionError::MissingPensionParameters {
                relationship: Relationship::Couple,
                homeowner: HomeownerStatus::Homeowner,
            }
        );
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let params = *PensionParameterTable::default().get(single_homeowner()).unwrap();
        let result = PensionParameterTable::new(vec![
            (single_homeowner(), params),
            (single_homeowner(), params),
        ]);
        assert!(matches!(
            result,
            Err(ProjectionError::DuplicatePensionParameters { .. })
        ));

        let negative = PensionParameters { deeming_rate_high: -0.01, ..params };
        assert!(PensionParameterTable::new(vec![(single_homeowner(), negative)]).is_err());
    }
}
