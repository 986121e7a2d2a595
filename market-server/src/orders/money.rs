//! Money helpers
//!
//! All monetary arithmetic goes through `rust_decimal`; f64 only exists at
//! the serde boundary. Results are rounded to 2 decimal places.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Tolerance for float comparisons after decimal round-trips (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert an f64 amount to Decimal
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert a Decimal back to f64, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}

/// Line subtotal: unit price * quantity
pub fn line_subtotal(price: f64, quantity: u32) -> f64 {
    to_f64(to_decimal(price) * Decimal::from(quantity))
}

/// Sum a list of amounts without accumulating float error
pub fn sum(amounts: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum::<Decimal>())
}

/// Validate a monetary amount: finite and strictly positive
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
