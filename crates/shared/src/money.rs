//! Currency arithmetic helpers.
//!
//! Amounts are exact decimals; rounding to whole currency units happens once,
//! when a report or snapshot is built.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to the nearest whole currency unit, halves away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to two decimal places for display in reports.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal rendering used in reports, e.g. `500.00`.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

/// Commission earned on `amount` at `rate_percent`.
pub fn commission_for(amount: Decimal, rate_percent: Decimal) -> Decimal {
    amount * rate_percent / Decimal::ONE_HUNDRED
}

/// Whole-number percent change from `previous` to `current`.
///
/// A zero baseline yields 100 when there is any current value and 0 otherwise.
pub fn percent_change(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    round_currency((current - previous) / previous * Decimal::ONE_HUNDRED)
}
