//! Core drawdown projection engine for yearly retirement income projections

use crate::assumptions::{
    Assumptions, HomeownerStatus, MeansTestInputs, PensionStatus, Relationship, ReturnPath,
};
use crate::error::{ProjectionError, Result};
use super::records::{Projection, ProjectionRecord};
use super::state::{experience_adjustment, longevity_adjustment, ProjectionState};
use serde::{Deserialize, Serialize};

/// How the yearly drawdown is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawdownStrategy {
    /// Statutory minimum percentage of the balance
    #[default]
    MinimumWithdrawal,
    /// Level real total income (drawdown tops up the age pension to a target)
    LevelRealIncome,
}

/// Dynamic adjustment of the level income target for experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DynamicAdjustment {
    #[default]
    None,
    /// Scale income by actual vs expected balance and a longevity drag
    Smooth,
}

/// Inputs for one projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInputs {
    /// Account balance at the start age (after any annuity purchase)
    pub starting_balance: f64,

    /// Realized real returns by year
    pub returns: ReturnPath,

    /// Expected real return, used as the smoothing benchmark
    pub expected_return: f64,

    pub start_age: u32,

    /// Number of years after the start age; the projection holds years + 1 records
    pub years: u32,

    pub strategy: DrawdownStrategy,
    pub adjustment: DynamicAdjustment,

    /// Target total annual income for `LevelRealIncome`
    pub target_drawdown: f64,

    /// Level annual payment from a lifetime annuity
    pub annuity_payment: f64,

    /// Price paid for the annuity (assessed under the assets test)
    pub annuity_purchase_price: f64,

    pub pension_status: PensionStatus,

    /// Other assessable assets outside the account
    pub other_assets: f64,
}

impl ProjectionInputs {
    /// Minimum-withdrawal inputs with no annuity, no other assets, single homeowner
    pub fn new(starting_balance: f64, start_age: u32, years: u32, returns: ReturnPath) -> Self {
        Self {
            starting_balance,
            expected_return: returns.assumed(),
            returns,
            start_age,
            years,
            strategy: DrawdownStrategy::MinimumWithdrawal,
            adjustment: DynamicAdjustment::None,
            target_drawdown: 0.0,
            annuity_payment: 0.0,
            annuity_purchase_price: 0.0,
            pension_status: PensionStatus::new(Relationship::Single, HomeownerStatus::Homeowner),
            other_assets: 0.0,
        }
    }

    /// Last age in the projection
    pub fn end_age(&self) -> u32 {
        self.start_age + self.years
    }

    pub fn validate(&self) -> Result<()> {
        let amounts = [
            ("starting_balance", self.starting_balance),
            ("target_drawdown", self.target_drawdown),
            ("annuity_payment", self.annuity_payment),
            ("annuity_purchase_price", self.annuity_purchase_price),
            ("other_assets", self.other_assets),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(ProjectionError::invalid_input(
                    field,
                    format!("must be a non-negative amount, got {}", value),
                ));
            }
        }

        if !self.expected_return.is_finite() || self.expected_return <= -1.0 {
            return Err(ProjectionError::invalid_input(
                "expected_return",
                format!("{} is not a usable real return", self.expected_return),
            ));
        }

        self.returns.validate()
    }
}

/// Main projection engine
///
/// Holds only a borrow of the read-only assumptions, so repeated runs with the
/// same inputs give identical projections.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionEngine<'a> {
    assumptions: &'a Assumptions,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(assumptions: &'a Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &'a Assumptions {
        self.assumptions
    }

    /// Run the projection from the start age to start age + years inclusive
    pub fn project(&self, inputs: &ProjectionInputs) -> Result<Projection> {
        inputs.validate()?;

        let mut projection = Projection::with_capacity(inputs.years as usize + 1);
        let mut state = ProjectionState::initial(inputs.start_age, inputs.starting_balance);

        for _ in 0..=inputs.years {
            let (record, next) = self.step(inputs, &state)?;
            projection.push(record);
            state = next;
        }

        Ok(projection)
    }

    /// One year of the recurrence: the record for `state.age` and the state
    /// for the following year
    pub fn step(
        &self,
        inputs: &ProjectionInputs,
        state: &ProjectionState,
    ) -> Result<(ProjectionRecord, ProjectionState)> {
        let age = state.age;
        let balance = state.balance;
        let rate = inputs.returns.rate_for_year(state.year_offset);

        let age_pension = self.assumptions.age_pension.annual_pension(
            inputs.pension_status,
            &MeansTestInputs {
                balance,
                annuity_income: inputs.annuity_payment,
                other_assets: inputs.other_assets,
                annuity_purchase_price: inputs.annuity_purchase_price,
                age,
            },
        )?;

        let minimum = self.assumptions.minimum_drawdown.minimum_amount(age, balance);

        let drawdown = match inputs.strategy {
            DrawdownStrategy::MinimumWithdrawal => minimum,
            DrawdownStrategy::LevelRealIncome => {
                // Draw only the gap above the pension; a pension larger than
                // the desired income means no drawdown, never a contribution
                let desired = (inputs.target_drawdown * state.indexation).max(minimum);
                let affordable = balance * (1.0 + rate / 2.0);
                (desired - age_pension).max(0.0).min(affordable)
            }
        };

        let indexation = self.next_indexation(inputs, state, drawdown, rate);

        let record = ProjectionRecord {
            age,
            balance,
            drawdown,
            annuity_payment: inputs.annuity_payment,
            age_pension,
            total_payment: drawdown + age_pension + inputs.annuity_payment,
            real_return: rate,
            check_balance: state.check_balance,
            indexation: state.indexation,
        };

        Ok((record, state.advance(drawdown, rate, indexation)))
    }

    /// Indexation for the following year
    fn next_indexation(
        &self,
        inputs: &ProjectionInputs,
        state: &ProjectionState,
        drawdown: f64,
        rate: f64,
    ) -> f64 {
        if inputs.strategy != DrawdownStrategy::LevelRealIncome
            || inputs.adjustment != DynamicAdjustment::Smooth
        {
            return state.indexation;
        }

        let mut indexation = state.indexation;

        match experience_adjustment(state.check_balance, drawdown, rate, inputs.expected_return) {
            Some(ratio) => indexation *= ratio,
            None => log::debug!("age {}: expected balance is zero, no experience adjustment", state.age),
        }

        match longevity_adjustment(self.assumptions.life_table.ex(state.age)) {
            Some(drag) => indexation *= drag,
            None => log::debug!("age {}: no life expectancy, no longevity adjustment", state.age),
        }

        indexation.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{
        AgePensionCalculator, LifeTable, MeansTestRules, PensionParameterTable, PensionParameters,
    };
    use approx::assert_abs_diff_eq;

    /// Gompertz-style table from 50 to 110
    fn test_life_table() -> LifeTable {
        let qx: Vec<f64> = (50..=110)
            .map(|age| (0.0005 * (0.095_f64 * (age - 50) as f64).exp()).min(1.0))
            .chain(std::iter::once(1.0))
            .collect();
        LifeTable::from_qx(50, &qx).unwrap()
    }

    fn test_assumptions() -> Assumptions {
        Assumptions::with_life_table(test_life_table())
    }

    /// Assumptions under which no age pension is ever paid
    fn no_pension_assumptions() -> Assumptions {
        let zero = PensionParameters {
            full_pension_fortnightly: 0.0,
            asset_test_lower_limit: 0.0,
            asset_test_reduction_per_1000: 0.0,
            income_test_threshold_fortnightly: 0.0,
            income_test_reduction_rate: 0.0,
            deeming_tier: 0.0,
            deeming_rate_low: 0.0,
            deeming_rate_high: 0.0,
        };
        let status = PensionStatus::new(Relationship::Single, HomeownerStatus::Homeowner);
        let table = PensionParameterTable::new(vec![(status, zero)]).unwrap();

        let mut assumptions = test_assumptions();
        assumptions.age_pension = AgePensionCalculator::new(table, MeansTestRules::default());
        assumptions
    }

    #[test]
    fn test_minimum_withdrawal_drawdown() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs::new(800_000.0, 65, 29, ReturnPath::constant(0.045, 29));

        let projection = engine.project(&inputs).unwrap();
        assert_eq!(projection.len(), 30);

        for record in projection.records() {
            let expected = assumptions.minimum_drawdown.rate(record.age) * record.balance;
            assert_eq!(record.drawdown, expected);
            assert_abs_diff_eq!(
                record.total_payment,
                record.drawdown + record.age_pension + record.annuity_payment,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_ages_and_balances() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 120_000.0,
            ..ProjectionInputs::new(400_000.0, 67, 30, ReturnPath::constant(-0.02, 30))
        };

        let projection = engine.project(&inputs).unwrap();
        assert_eq!(projection.first().unwrap().age, 67);
        assert_eq!(projection.last().unwrap().age, 97);

        for pair in projection.records().windows(2) {
            assert_eq!(pair[1].age, pair[0].age + 1);
        }
        for record in projection.records() {
            assert!(record.balance >= 0.0, "negative balance at age {}", record.age);
            assert!(record.drawdown >= 0.0);
        }
        assert!(projection.depletion_age().is_some());
    }

    #[test]
    fn test_level_income_tops_up_pension() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 50_000.0,
            ..ProjectionInputs::new(400_000.0, 67, 5, ReturnPath::constant(0.0, 5))
        };

        let first = engine.project(&inputs).unwrap().records()[0].clone();
        assert!(first.age_pension > 0.0);
        assert_abs_diff_eq!(first.drawdown + first.age_pension, 50_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pension_near_target_draws_only_gap() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 25_000.0,
            ..ProjectionInputs::new(400_000.0, 67, 3, ReturnPath::constant(0.03, 3))
        };

        let first = engine.project(&inputs).unwrap().records()[0].clone();
        // 30,646.20 less (400,000 - 321,500) * 3 / 1000 * 26
        assert_abs_diff_eq!(first.age_pension, 24_523.2, epsilon = 1e-6);
        assert_abs_diff_eq!(first.drawdown, 476.8, epsilon = 1e-6);
        assert!(first.drawdown < assumptions.minimum_drawdown.minimum_amount(67, 400_000.0));
        assert_abs_diff_eq!(first.total_payment, 25_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pension_above_target_means_no_drawdown() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 5_000.0,
            ..ProjectionInputs::new(100_000.0, 70, 3, ReturnPath::constant(0.03, 3))
        };

        for record in engine.project(&inputs).unwrap().records() {
            assert!(record.age_pension > 5_000.0);
            assert_eq!(record.drawdown, 0.0);
            assert_eq!(record.total_payment, record.age_pension);
        }
    }

    #[test]
    fn test_drawdown_capped_at_affordable_balance() {
        let assumptions = no_pension_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 30_000.0,
            ..ProjectionInputs::new(50_000.0, 65, 3, ReturnPath::constant(0.04, 3))
        };

        let projection = engine.project(&inputs).unwrap();
        let second = &projection.records()[1];
        // 50,000 * 1.04 - 30,000 * 1.02 = 21,400 left, less than the target
        assert_abs_diff_eq!(second.balance, 21_400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(second.drawdown, 21_400.0 * 1.02, epsilon = 1e-9);
        assert_eq!(projection.records()[2].balance, 0.0);
        assert!(projection.records()[2].check_balance < 0.0);
    }

    #[test]
    fn test_smoothing_follows_experience_and_longevity() {
        let assumptions = no_pension_assumptions();
        let engine = ProjectionEngine::new(&assumptions);

        let mut rates = vec![0.04; 12];
        rates[1] = 0.15;
        let base = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            target_drawdown: 40_000.0,
            expected_return: 0.04,
            ..ProjectionInputs::new(600_000.0, 65, 10, ReturnPath::from_rates(rates, 0.04))
        };
        let smooth = ProjectionInputs {
            adjustment: DynamicAdjustment::Smooth,
            ..base.clone()
        };

        let flat = engine.project(&base).unwrap();
        let smoothed = engine.project(&smooth).unwrap();

        assert!(flat.records().iter().all(|r| r.indexation == 1.0));

        let first = &smoothed.records()[0];
        let ratio = experience_adjustment(600_000.0, first.drawdown, 0.15, 0.04).unwrap();
        let drag = 1.0 - 1.0 / assumptions.life_table.ex(65).unwrap();
        assert_abs_diff_eq!(smoothed.records()[1].indexation, ratio * drag, epsilon = 1e-12);
        assert!(smoothed.records()[1].drawdown > flat.records()[1].drawdown * drag);
    }

    #[test]
    fn test_smoothing_beyond_life_table() {
        let qx = vec![0.01, 0.02, 1.0];
        let mut assumptions = no_pension_assumptions();
        assumptions.life_table = LifeTable::from_qx(65, &qx).unwrap();
        let engine = ProjectionEngine::new(&assumptions);

        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            adjustment: DynamicAdjustment::Smooth,
            target_drawdown: 20_000.0,
            ..ProjectionInputs::new(300_000.0, 65, 6, ReturnPath::constant(0.03, 6))
        };

        let projection = engine.project(&inputs).unwrap();
        assert_eq!(projection.len(), 7);
        for record in projection.records() {
            assert!(record.indexation.is_finite());
            assert!(record.indexation >= 0.0);
        }
        // ex under one year at 67 zeroes the indexation; past the table it is left alone
        assert_eq!(projection.records()[5].indexation, projection.records()[4].indexation);
    }

    #[test]
    fn test_projection_is_repeatable() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let inputs = ProjectionInputs {
            strategy: DrawdownStrategy::LevelRealIncome,
            adjustment: DynamicAdjustment::Smooth,
            target_drawdown: 45_000.0,
            annuity_payment: 6_000.0,
            annuity_purchase_price: 100_000.0,
            ..ProjectionInputs::new(500_000.0, 65, 29, ReturnPath::constant(0.05, 29))
        };

        assert_eq!(engine.project(&inputs).unwrap(), engine.project(&inputs).unwrap());
    }

    #[test]
    fn test_missing_pension_parameters_abort() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);
        let mut assumptions_missing = assumptions.clone();
        assumptions_missing.age_pension =
            AgePensionCalculator::new(PensionParameterTable::new(vec![]).unwrap(), MeansTestRules::default());
        let broken = ProjectionEngine::new(&assumptions_missing);

        let inputs = ProjectionInputs::new(100_000.0, 65, 5, ReturnPath::constant(0.03, 5));
        assert!(engine.project(&inputs).is_ok());
        assert!(broken.project(&inputs).unwrap_err().is_configuration());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let assumptions = test_assumptions();
        let engine = ProjectionEngine::new(&assumptions);

        let negative = ProjectionInputs::new(-1.0, 65, 5, ReturnPath::constant(0.03, 5));
        assert!(matches!(
            engine.project(&negative),
            Err(ProjectionError::InvalidInput { field: "starting_balance", .. })
        ));

        let total_loss = ProjectionInputs::new(1_000.0, 65, 5, ReturnPath::constant(-1.0, 5));
        assert!(engine.project(&total_loss).is_err());
    }
}
