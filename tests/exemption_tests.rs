#![cfg(feature = "exemption")]

use chrono::NaiveDate;
use declara::core::*;
use declara::exemption::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice() -> InvoiceRecord {
    InvoiceRecord {
        id: "inv-1".into(),
        number: "F-2025-014".into(),
        date: date(2025, 5, 14),
        subtotal: dec!(1500),
        tax_amount: dec!(315),
        client_id: "client-9".into(),
        state: InvoiceState::Pending,
        deleted: false,
    }
}

fn rule(kind: ExemptionKind, pct: rust_decimal::Decimal) -> ExemptionBuilder {
    ExemptionBuilder::new("trainer-1", "Rule", kind, pct, date(2025, 1, 1))
}

// --- Operators ---

#[test]
fn operator_codes_parse() {
    for (code, op) in [
        ("equal", Operator::Equal),
        ("notEqual", Operator::NotEqual),
        ("greaterThan", Operator::GreaterThan),
        ("lessThan", Operator::LessThan),
        ("contains", Operator::Contains),
        ("startsWith", Operator::StartsWith),
    ] {
        assert_eq!(code.parse::<Operator>().unwrap(), op);
        assert_eq!(op.to_string(), code);
    }
    assert!(matches!(
        Condition::parse("subtotal", "between", "1"),
        Err(TaxError::Validation(_))
    ));
}

#[test]
fn operators_serialize_in_camel_case() {
    let c = Condition::new(field::SUBTOTAL, Operator::GreaterThan, "1000");
    let json = serde_json::to_value(&c).unwrap();
    assert_eq!(json["operator"], "greaterThan");
    let back: Condition = serde_json::from_value(json).unwrap();
    assert_eq!(back, c);
}

// --- Conditions ---

#[test]
fn numeric_comparisons() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    assert!(condition_holds(
        &Condition::new(field::SUBTOTAL, Operator::GreaterThan, "1000"),
        &ctx
    ));
    assert!(!condition_holds(
        &Condition::new(field::SUBTOTAL, Operator::LessThan, "1000"),
        &ctx
    ));
    assert!(condition_holds(
        &Condition::new(field::SUBTOTAL, Operator::Equal, "1500.00"),
        &ctx
    ));
    assert!(condition_holds(
        &Condition::new(field::QUARTER, Operator::Equal, "2"),
        &ctx
    ));
}

#[test]
fn non_numeric_operands_never_compare() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    assert!(!condition_holds(
        &Condition::new(field::NUMBER, Operator::GreaterThan, "100"),
        &ctx
    ));
    assert!(!condition_holds(
        &Condition::new(field::SUBTOTAL, Operator::LessThan, "lots"),
        &ctx
    ));
}

#[test]
fn string_operators() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    assert!(condition_holds(
        &Condition::new(field::NUMBER, Operator::StartsWith, "F-2025"),
        &ctx
    ));
    assert!(condition_holds(
        &Condition::new(field::NUMBER, Operator::Contains, "014"),
        &ctx
    ));
    assert!(condition_holds(
        &Condition::new(field::CLIENT_ID, Operator::NotEqual, "client-1"),
        &ctx
    ));
    assert!(condition_holds(
        &Condition::new(field::SOURCE, Operator::Equal, "income"),
        &ctx
    ));
}

#[test]
fn missing_field_is_false_for_every_operator() {
    let ctx = EvaluationContext::new();
    for op in [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Contains,
        Operator::StartsWith,
    ] {
        assert!(!condition_holds(&Condition::new("unknown", op, ""), &ctx), "{op}");
    }
}

#[test]
fn expense_and_client_contexts() {
    let expense = ExpenseRecord {
        id: "exp-1".into(),
        date: date(2025, 2, 1),
        amount: dec!(80),
        concept: "Training course".into(),
        state: ExpenseState::Paid,
        active: true,
    };
    let ctx = EvaluationContext::for_expense(&expense);
    assert_eq!(ctx.get(field::SOURCE), Some("expense"));
    assert_eq!(ctx.get(field::CONCEPT), Some("Training course"));
    assert_eq!(ctx.get(field::QUARTER), Some("1"));

    let client = ClientRecord {
        id: "client-9".into(),
        name: "Club Deportivo".into(),
        tax_id: None,
        address: None,
    };
    let ctx = EvaluationContext::for_invoice(&invoice()).with_client(&client);
    assert_eq!(ctx.get(field::CLIENT_NAME), Some("Club Deportivo"));
    assert_eq!(ctx.get(field::CLIENT_TAX_ID), None);
}

// --- Applicability ---

#[test]
fn no_conditions_needs_auto_apply() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    let manual = rule(ExemptionKind::Vat, dec!(10)).build().unwrap();
    let auto = rule(ExemptionKind::Vat, dec!(10)).auto_apply(true).build().unwrap();
    assert!(!applies_to(&manual, &ctx));
    assert!(applies_to(&auto, &ctx));
}

#[test]
fn all_conditions_must_hold() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    let e = rule(ExemptionKind::General, dec!(10))
        .condition(Condition::new(field::SUBTOTAL, Operator::GreaterThan, "1000"))
        .condition(Condition::new(field::CLIENT_ID, Operator::Equal, "client-1"))
        .build()
        .unwrap();
    assert!(!applies_to(&e, &ctx));
}

#[test]
fn validity_window_is_inclusive() {
    let e = rule(ExemptionKind::Vat, dec!(10))
        .valid_to(date(2025, 6, 30))
        .build()
        .unwrap();
    assert!(!is_currently_valid(&e, date(2024, 12, 31)));
    assert!(is_currently_valid(&e, date(2025, 1, 1)));
    assert!(is_currently_valid(&e, date(2025, 6, 30)));
    assert!(!is_currently_valid(&e, date(2025, 7, 1)));

    let mut inactive = e.clone();
    inactive.active = false;
    assert!(!is_currently_valid(&inactive, date(2025, 3, 1)));
}

#[test]
fn find_applicable_filters_kind_and_date() {
    let ctx = EvaluationContext::for_invoice(&invoice());
    let exemptions = vec![
        rule(ExemptionKind::Vat, dec!(10)).auto_apply(true).build().unwrap(),
        rule(ExemptionKind::IncomeTax, dec!(10)).auto_apply(true).build().unwrap(),
        rule(ExemptionKind::Vat, dec!(10))
            .auto_apply(true)
            .valid_to(date(2025, 3, 31))
            .build()
            .unwrap(),
    ];
    let today = date(2025, 5, 14);
    assert_eq!(find_applicable(&exemptions, &ctx, today, None).len(), 2);
    let vat = find_applicable(&exemptions, &ctx, today, Some(ExemptionKind::Vat));
    assert_eq!(vat.len(), 1);
    assert_eq!(vat[0].kind, ExemptionKind::Vat);
}

#[test]
fn exempt_amount_is_capped() {
    let ctx = EvaluationContext::new();
    let exemptions = vec![
        rule(ExemptionKind::Vat, dec!(70)).auto_apply(true).build().unwrap(),
        rule(ExemptionKind::General, dec!(60)).auto_apply(true).build().unwrap(),
    ];
    let amount = exempt_amount(
        &exemptions,
        &ctx,
        date(2025, 5, 1),
        &[ExemptionKind::Vat, ExemptionKind::General],
        dec!(200),
    )
    .unwrap();
    assert_eq!(amount, dec!(200));
    assert_eq!(compute_exempt_amount(&exemptions[0], dec!(33.33)).unwrap(), dec!(23.33));
}

// --- Validation ---

#[test]
fn builder_validates() {
    assert!(matches!(
        rule(ExemptionKind::Vat, dec!(101)).build(),
        Err(TaxError::Validation(_))
    ));
    assert!(matches!(
        rule(ExemptionKind::Vat, dec!(-1)).build(),
        Err(TaxError::Validation(_))
    ));
    assert!(matches!(
        rule(ExemptionKind::Vat, dec!(10)).valid_to(date(2024, 1, 1)).build(),
        Err(TaxError::Validation(_))
    ));
    assert!(matches!(
        ExemptionBuilder::new("t", " ", ExemptionKind::Vat, dec!(1), date(2025, 1, 1)).build(),
        Err(TaxError::Validation(_))
    ));
    let e = rule(ExemptionKind::CorporateTax, dec!(100))
        .description("Full relief")
        .build()
        .unwrap();
    assert!(e.active);
    assert_eq!(e.description.as_deref(), Some("Full relief"));
}
