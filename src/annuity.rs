//! Life-contingent annuity valuation
//!
//! Prices a whole-life annuity-due of 1 per year with an optional guaranteed
//! (term certain) period, and converts a purchase price into a level annual
//! payment.

use crate::assumptions::LifeTable;
use crate::error::{ProjectionError, Result};

/// Present value of a whole-life annuity-due of 1 per year
///
/// ```text
/// ä = Σ_{t=0}^{ω-x} v^t · (t <= n ? 1 : ₜpₓ),   v = 1 / (1 + i)
/// ```
///
/// where `n` is the term certain. Survival is built one year at a time from
/// qx; an age missing from the table counts as certain death for that year
/// and every later one. A start age beyond ω leaves only the payment at t = 0.
pub fn annuity_due_value(
    life_table: &LifeTable,
    start_age: u32,
    interest_rate: f64,
    term_certain_years: u32,
) -> Result<f64> {
    if !interest_rate.is_finite() || interest_rate <= -1.0 {
        return Err(ProjectionError::invalid_input(
            "interest_rate",
            format!("{} is not a usable discount rate", interest_rate),
        ));
    }

    let max_age = life_table.max_age();
    if start_age > max_age {
        return Ok(1.0);
    }

    let v = 1.0 / (1.0 + interest_rate);
    let mut discount = 1.0;
    let mut survival = 1.0;
    let mut value = 0.0;

    for t in 0..=(max_age - start_age) {
        if t > 0 {
            let q = life_table.qx(start_age + t - 1).unwrap_or(1.0);
            survival *= 1.0 - q;
            discount *= v;
        }

        value += if t <= term_certain_years {
            discount
        } else {
            discount * survival
        };
    }

    Ok(value)
}

/// Level annual payment bought by `purchase_price` at annuity value `annuity_value`
pub fn annual_payment(purchase_price: f64, annuity_value: f64) -> f64 {
    if purchase_price <= 0.0 || annuity_value <= 0.0 {
        return 0.0;
    }
    purchase_price / annuity_value
}
