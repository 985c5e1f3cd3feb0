use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::{TaxError, ValidationError};

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × percentage / 100`, rounded to cents.
///
/// Divides first when the product does not fit, so any amount up to
/// `Decimal::MAX` works with percentages up to 100.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Result<Decimal, TaxError> {
    amount
        .checked_mul(percentage)
        .and_then(|product| product.checked_div(dec!(100)))
        .or_else(|| {
            amount
                .checked_div(dec!(100))
                .and_then(|share| share.checked_mul(percentage))
        })
        .map(round_money)
        .ok_or_else(|| {
            TaxError::Validation(format!("{percentage}% of {amount} is out of range"))
        })
}

/// `total += amount`, failing instead of overflowing.
pub(crate) fn add_money(total: &mut Decimal, amount: Decimal, field: &str) -> Result<(), TaxError> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| TaxError::Validation(format!("{field}: sum is out of range")))?;
    Ok(())
}

pub(crate) fn check_percentage(value: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value < Decimal::ZERO || value > dec!(100) {
        errors.push(ValidationError::new(
            field,
            format!("percentage {value} must be between 0 and 100"),
        ));
    }
}

pub(crate) fn check_non_negative(value: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.push(ValidationError::new(
            field,
            format!("amount {value} must not be negative"),
        ));
    }
}
