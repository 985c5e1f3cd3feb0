use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{Condition, EvaluationContext, Exemption, ExemptionKind, Operator};
use crate::core::{TaxError, add_money, percent_of};

/// Active and inside `[valid_from, valid_to]`, both ends inclusive.
pub fn is_currently_valid(exemption: &Exemption, today: NaiveDate) -> bool {
    exemption.active
        && exemption.valid_from <= today
        && exemption.valid_to.is_none_or(|to| to >= today)
}

/// Whether the exemption's conditions hold for `context`.
///
/// An exemption without conditions applies only when flagged `auto_apply`;
/// otherwise every condition must hold.
pub fn applies_to(exemption: &Exemption, context: &EvaluationContext) -> bool {
    if exemption.conditions.is_empty() {
        return exemption.auto_apply;
    }
    exemption.conditions.iter().all(|c| condition_holds(c, context))
}

/// Evaluate a single condition. A missing field never holds.
pub fn condition_holds(condition: &Condition, context: &EvaluationContext) -> bool {
    let Some(actual) = context.get(&condition.field) else {
        return false;
    };
    let expected = condition.value.as_str();

    match condition.operator {
        Operator::Equal => loosely_equal(actual, expected),
        Operator::NotEqual => !loosely_equal(actual, expected),
        Operator::GreaterThan => {
            matches!((number(actual), number(expected)), (Some(a), Some(b)) if a > b)
        }
        Operator::LessThan => {
            matches!((number(actual), number(expected)), (Some(a), Some(b)) if a < b)
        }
        Operator::Contains => actual.contains(expected),
        Operator::StartsWith => actual.starts_with(expected),
    }
}

fn number(s: &str) -> Option<Decimal> {
    s.trim().parse().ok()
}

// "100" and "100.00" are the same amount.
fn loosely_equal(a: &str, b: &str) -> bool {
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// `amount × percentage / 100`, rounded to cents.
pub fn compute_exempt_amount(exemption: &Exemption, amount: Decimal) -> Result<Decimal, TaxError> {
    percent_of(amount, exemption.percentage)
}

/// Exemptions that are valid on `today`, of `kind` (when given), and apply to `context`.
pub fn find_applicable<'a>(
    exemptions: &'a [Exemption],
    context: &EvaluationContext,
    today: NaiveDate,
    kind: Option<ExemptionKind>,
) -> Vec<&'a Exemption> {
    exemptions
        .iter()
        .filter(|e| is_currently_valid(e, today))
        .filter(|e| kind.is_none_or(|k| e.kind == k))
        .filter(|e| applies_to(e, context))
        .collect()
}

/// Total exempt part of `amount` across every applicable exemption whose
/// kind is in `kinds`, never more than `amount` itself.
pub fn exempt_amount(
    exemptions: &[Exemption],
    context: &EvaluationContext,
    today: NaiveDate,
    kinds: &[ExemptionKind],
    amount: Decimal,
) -> Result<Decimal, TaxError> {
    let mut total = Decimal::ZERO;
    for e in find_applicable(exemptions, context, today, None)
        .into_iter()
        .filter(|e| kinds.contains(&e.kind))
    {
        add_money(&mut total, compute_exempt_amount(e, amount)?, "exempt_amount")?;
    }
    Ok(total.min(amount))
}
