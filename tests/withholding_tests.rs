#![cfg(feature = "withholding")]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use declara::core::*;
use declara::exemption::*;
use declara::withholding::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 2, 8, 0, 0).unwrap()
}

fn client() -> ClientRecord {
    ClientRecord {
        id: "client-1".into(),
        name: "Gimnasio Norte SL".into(),
        tax_id: Some("B12345678".into()),
        address: Some("Calle Mayor 1, Madrid".into()),
    }
}

fn invoice(id: &str, day: NaiveDate, subtotal: Decimal) -> InvoiceRecord {
    InvoiceRecord {
        id: id.into(),
        number: format!("F-{id}"),
        date: day,
        subtotal,
        tax_amount: subtotal * dec!(0.21),
        client_id: "client-1".into(),
        state: InvoiceState::Paid,
        deleted: false,
    }
}

fn pending() -> Withholding {
    WithholdingCalculator::new()
        .compute_from_invoice("trainer-1", &invoice("i1", date(2025, 5, 10), dec!(1000)), &client())
        .unwrap()
}

// --- Calculation ---

#[test]
fn default_fifteen_percent() {
    let w = pending();
    assert_eq!(w.taxable_base(), dec!(1000));
    assert_eq!(w.percentage(), dec!(15));
    assert_eq!(w.amount(), dec!(150));
    assert_eq!(w.state(), WithholdingState::Pending);
    assert_eq!(w.year(), 2025);
    assert_eq!(w.quarter(), Quarter::Q2);
    assert_eq!(w.period_label(), "2025-Q2");
    assert!(!w.certificate_issued());
    assert!(w.is_active());
}

#[test]
fn snapshots_client_and_invoice() {
    let w = pending();
    assert_eq!(w.client_id().as_str(), "client-1");
    assert_eq!(w.client().name, "Gimnasio Norte SL");
    assert_eq!(w.client().tax_id.as_deref(), Some("B12345678"));
    assert_eq!(w.invoice().number, "F-i1");
    assert_eq!(w.date(), date(2025, 5, 10));
}

#[test]
fn custom_percentage_rounds_to_cents() {
    let w = compute_from_invoice(
        "trainer-1",
        &invoice("i1", date(2025, 1, 31), dec!(333.33)),
        &client(),
        Some(dec!(7)),
    )
    .unwrap();
    assert_eq!(w.amount(), dec!(23.33));
    assert_eq!(w.period_label(), "2025-Q1");
}

#[test]
fn rejects_foreign_client_and_bad_percentage() {
    let mut other = invoice("i1", date(2025, 5, 10), dec!(1000));
    other.client_id = "client-2".into();
    assert!(matches!(
        WithholdingCalculator::new().compute_from_invoice("trainer-1", &other, &client()),
        Err(TaxError::Validation(_))
    ));

    assert!(matches!(
        WithholdingCalculator::new()
            .percentage(dec!(101))
            .compute_from_invoice("trainer-1", &invoice("i1", date(2025, 5, 10), dec!(1)), &client()),
        Err(TaxError::Validation(_))
    ));
}

#[test]
fn direct_creation_fills_missing_period_parts() {
    let input = WithholdingInput {
        trainer: "trainer-1".into(),
        invoice: InvoiceRef {
            id: "i7".into(),
            number: "F-i7".into(),
            date: date(2025, 11, 3),
        },
        client: client(),
        taxable_base: dec!(200),
        percentage: None,
        date: date(2025, 11, 3),
        year: None,
        quarter: Some(3),
    };
    let w = Withholding::create(input.clone()).unwrap();
    assert_eq!(w.period_label(), "2025-Q3");
    assert_eq!(w.amount(), dec!(30));

    let bad = WithholdingInput {
        quarter: Some(5),
        ..input.clone()
    };
    assert!(matches!(Withholding::create(bad), Err(TaxError::Validation(_))));

    let negative = WithholdingInput {
        taxable_base: dec!(-1),
        ..input
    };
    assert!(matches!(Withholding::create(negative), Err(TaxError::Validation(_))));
}

#[test]
fn income_tax_exemption_reduces_base() {
    let exemption = ExemptionBuilder::new(
        "trainer-1",
        "Training grant",
        ExemptionKind::IncomeTax,
        dec!(20),
        date(2025, 1, 1),
    )
    .condition(Condition::new(field::CLIENT_TAX_ID, Operator::StartsWith, "B"))
    .build()
    .unwrap();
    let vat_only = ExemptionBuilder::new(
        "trainer-1",
        "VAT relief",
        ExemptionKind::Vat,
        dec!(50),
        date(2025, 1, 1),
    )
    .auto_apply(true)
    .build()
    .unwrap();

    let w = WithholdingCalculator::new()
        .exemptions(vec![exemption, vat_only])
        .compute_from_invoice("trainer-1", &invoice("i1", date(2025, 5, 10), dec!(1000)), &client())
        .unwrap();
    assert_eq!(w.taxable_base(), dec!(800));
    assert_eq!(w.amount(), dec!(120));
}

#[test]
fn huge_bases_do_not_overflow() {
    let huge = Decimal::from_scientific("1e27").unwrap();
    let w = WithholdingCalculator::new()
        .percentage(dec!(100))
        .compute_from_invoice("trainer-1", &invoice("i1", date(2025, 5, 10), huge), &client())
        .unwrap();
    assert_eq!(w.amount(), huge);

    let near_max = InvoiceRecord {
        id: "i2".into(),
        number: "F-i2".into(),
        date: date(2025, 5, 11),
        subtotal: Decimal::MAX,
        tax_amount: Decimal::ZERO,
        client_id: "client-1".into(),
        state: InvoiceState::Paid,
        deleted: false,
    };
    let w = WithholdingCalculator::new()
        .compute_from_invoice("trainer-1", &near_max, &client())
        .unwrap();
    assert!(w.amount() > Decimal::ZERO);
    assert!(w.amount() < w.taxable_base());
}

// --- Uniqueness ---

#[test]
fn one_active_withholding_per_invoice() {
    let existing = vec![pending()];
    let err = WithholdingCalculator::new()
        .create_or_reject(
            &existing,
            "trainer-1",
            &invoice("i1", date(2025, 5, 10), dec!(1000)),
            &client(),
        )
        .unwrap_err();
    assert_eq!(err, TaxError::DuplicateWithholding("i1".into()));

    let mut deleted = pending();
    deleted.delete().unwrap();
    assert!(create_or_reject(&[deleted], pending()).is_ok());
}

// --- Lifecycle ---

#[test]
fn pending_declared_paid() {
    let mut w = pending();
    w.mark_declared(Some("MOD111-2025-2".into())).unwrap();
    assert_eq!(w.state(), WithholdingState::Declared);
    assert_eq!(w.filing_ref(), Some("MOD111-2025-2"));
    w.mark_paid().unwrap();
    assert_eq!(w.state(), WithholdingState::Paid);
}

#[test]
fn paid_requires_declared() {
    let mut w = pending();
    let err = w.mark_paid().unwrap_err();
    assert_eq!(err.to_string(), "cannot pay from state 'pending'");
}

#[test]
fn declared_cannot_be_declared_again() {
    let mut w = pending();
    w.mark_declared(None).unwrap();
    assert!(matches!(
        w.mark_declared(None),
        Err(TaxError::InvalidState { action: "declare", .. })
    ));
}

#[test]
fn certificate_in_any_state() {
    let mut w = pending();
    w.mark_declared(None).unwrap();
    w.mark_paid().unwrap();
    w.emit_certificate(Some("https://files.example/cert-1.pdf".into()), now())
        .unwrap();
    assert!(w.certificate_issued());
    assert_eq!(w.certificate_date(), Some(now()));
    assert_eq!(w.archive_url(), Some("https://files.example/cert-1.pdf"));

    let later = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
    w.emit_certificate(None, later).unwrap();
    assert_eq!(w.certificate_date(), Some(later));
    assert_eq!(w.archive_url(), Some("https://files.example/cert-1.pdf"));
}

#[test]
fn edits_only_while_pending() {
    let mut w = pending();
    w.set_taxable_base(dec!(2000)).unwrap();
    assert_eq!(w.amount(), dec!(300));
    w.set_percentage(dec!(7)).unwrap();
    assert_eq!(w.amount(), dec!(140));
    w.set_period(2025, 3).unwrap();
    assert_eq!(w.period_label(), "2025-Q3");
    assert!(matches!(w.set_percentage(dec!(-1)), Err(TaxError::Validation(_))));

    w.mark_declared(None).unwrap();
    let before = w.clone();
    assert!(matches!(w.set_taxable_base(dec!(1)), Err(TaxError::ImmutableState { .. })));
    assert!(matches!(w.set_percentage(dec!(1)), Err(TaxError::ImmutableState { .. })));
    assert!(matches!(w.set_period(2025, 4), Err(TaxError::ImmutableState { .. })));
    assert!(matches!(w.delete(), Err(TaxError::InvalidState { .. })));
    assert_eq!(w, before);
}

#[test]
fn deleted_withholding_rejects_transitions() {
    let mut w = pending();
    w.delete().unwrap();
    assert!(!w.is_active());
    assert!(matches!(w.mark_declared(None), Err(TaxError::InvalidState { .. })));
    assert!(matches!(w.emit_certificate(None, now()), Err(TaxError::InvalidState { .. })));
}

#[test]
fn json_round_trip_recomputes_amount() {
    let w = pending();
    let mut value = serde_json::to_value(&w).unwrap();
    value["amount"] = serde_json::json!("9999");
    let restored: Withholding = serde_json::from_value(value).unwrap();
    assert_eq!(restored.amount(), dec!(150));
    assert_eq!(restored, w);
}

#[test]
fn json_with_out_of_range_values_is_rejected() {
    let w = pending();

    let mut value = serde_json::to_value(&w).unwrap();
    value["percentage"] = serde_json::json!("500");
    let err = serde_json::from_value::<Withholding>(value).unwrap_err();
    assert!(err.to_string().contains("percentage"), "{err}");

    let mut value = serde_json::to_value(&w).unwrap();
    value["taxable_base"] = serde_json::json!("-10");
    let err = serde_json::from_value::<Withholding>(value).unwrap_err();
    assert!(err.to_string().contains("taxable_base"), "{err}");
}
