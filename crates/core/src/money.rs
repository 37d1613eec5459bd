//! Money arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` throughout. Stored and reported values
//! are rounded to two decimal places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest difference between debit and credit totals still considered balanced.
pub fn balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

pub fn within_tolerance(difference: Decimal) -> bool {
    difference.abs() <= balance_tolerance()
}

/// `rate` percent of `amount`, rounded to cents.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    round_money(amount * rate / Decimal::ONE_HUNDRED)
}
