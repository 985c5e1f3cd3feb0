//! Property-based tests for aggregation, withholding amounts and periods.
//!
//! Run with: `cargo test --test proptest_tests`

#![cfg(all(feature = "declaration", feature = "withholding"))]

use chrono::{Datelike, NaiveDate};
use declara::core::*;
use declara::declaration::{Aggregator, Declaration};
use declara::exemption::*;
use declara::withholding::WithholdingCalculator;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn day_in_2025() -> impl Strategy<Value = NaiveDate> {
    (0i64..365).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

fn invoices() -> impl Strategy<Value = Vec<InvoiceRecord>> {
    prop::collection::vec((cents(), cents(), 1u32..=90), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (subtotal, tax, day))| InvoiceRecord {
                id: format!("i{i}").into(),
                number: format!("F-{i}"),
                date: NaiveDate::from_yo_opt(2025, day).unwrap(),
                subtotal,
                tax_amount: tax,
                client_id: "c1".into(),
                state: InvoiceState::Paid,
                deleted: false,
            })
            .collect()
    })
}

fn expenses() -> impl Strategy<Value = Vec<ExpenseRecord>> {
    prop::collection::vec((cents(), 1u32..=90), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (amount, day))| ExpenseRecord {
                id: format!("e{i}").into(),
                date: NaiveDate::from_yo_opt(2025, day).unwrap(),
                amount,
                concept: format!("Expense {i}"),
                state: ExpenseState::Paid,
                active: true,
            })
            .collect()
    })
}

fn build(invoices: &[InvoiceRecord], expenses: &[ExpenseRecord]) -> Declaration {
    Aggregator::new()
        .build_from_period("t1", 2025, 1, invoices, expenses)
        .unwrap()
}

proptest! {
    #[test]
    fn result_is_collected_minus_paid(invs in invoices(), exps in expenses()) {
        let d = build(&invs, &exps);
        let t = d.totals();
        prop_assert_eq!(t.result, t.vat_collected - t.vat_paid);
        let sales: Decimal = invs.iter().map(|i| i.subtotal).sum();
        let collected: Decimal = invs.iter().map(|i| i.tax_amount).sum();
        prop_assert_eq!(t.total_sales, sales);
        prop_assert_eq!(t.vat_collected, collected);
        prop_assert_eq!(d.line_items().len(), invs.len() + exps.len());
    }

    #[test]
    fn expense_vat_is_rounded_rate(exps in expenses()) {
        let d = build(&[], &exps);
        let expected: Decimal = exps
            .iter()
            .map(|e| percent_of(e.amount, Decimal::from(21)).unwrap())
            .sum();
        prop_assert_eq!(d.totals().vat_paid, expected);
        prop_assert!(d.totals().vat_paid.scale() <= 2);
    }

    #[test]
    fn aggregation_is_deterministic(invs in invoices(), exps in expenses()) {
        prop_assert_eq!(build(&invs, &exps), build(&invs, &exps));
    }

    #[test]
    fn recompute_is_idempotent(invs in invoices(), exps in expenses()) {
        let mut d = build(&invs, &exps);
        let once = d.totals().clone();
        d.recompute_totals().unwrap();
        d.recompute_totals().unwrap();
        prop_assert_eq!(d.totals(), &once);
    }

    #[test]
    fn withholding_amount_is_base_times_rate(base in cents(), pct in 0u32..=100, day in day_in_2025()) {
        let client = ClientRecord {
            id: "c1".into(),
            name: "Client".into(),
            tax_id: None,
            address: None,
        };
        let invoice = InvoiceRecord {
            id: "i1".into(),
            number: "F-1".into(),
            date: day,
            subtotal: base,
            tax_amount: Decimal::ZERO,
            client_id: "c1".into(),
            state: InvoiceState::Paid,
            deleted: false,
        };
        let w = WithholdingCalculator::new()
            .percentage(Decimal::from(pct))
            .compute_from_invoice("t1", &invoice, &client)
            .unwrap();
        prop_assert_eq!(w.amount(), round_money(base * Decimal::from(pct) / Decimal::ONE_HUNDRED));
        prop_assert!(w.amount() <= base);
        prop_assert_eq!(w.period(), Period::containing(day).unwrap());
    }

    #[test]
    fn quarter_contains_its_dates(day in day_in_2025()) {
        let q = quarter_of(day);
        let (start, end) = date_range_of_quarter(2025, q.number()).unwrap();
        prop_assert!(start.date() <= day && day <= end.date());
        prop_assert_eq!(q.number(), ((day.month() - 1) / 3 + 1) as u8);

        let deadline = filing_deadline(2025, q.number()).unwrap();
        prop_assert!(deadline > end.date());
    }

    #[test]
    fn validity_window_bounds(from in 0i64..365, len in 0i64..200, day_offset in 0i64..700) {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(from);
        let end = start + chrono::Duration::days(len);
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(day_offset);
        let e = ExemptionBuilder::new("t1", "Window", ExemptionKind::Vat, Decimal::from(10), start)
            .valid_to(end)
            .build()
            .unwrap();
        prop_assert_eq!(is_currently_valid(&e, today), start <= today && today <= end);
    }

    #[test]
    fn exempt_amount_never_exceeds_amount(amount in cents(), a in 0u32..=100, b in 0u32..=100) {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let exemptions = vec![
            ExemptionBuilder::new("t1", "A", ExemptionKind::Vat, Decimal::from(a), day)
                .auto_apply(true)
                .build()
                .unwrap(),
            ExemptionBuilder::new("t1", "B", ExemptionKind::General, Decimal::from(b), day)
                .auto_apply(true)
                .build()
                .unwrap(),
        ];
        let exempt = exempt_amount(
            &exemptions,
            &EvaluationContext::new(),
            day,
            &[ExemptionKind::Vat, ExemptionKind::General],
            amount,
        )
        .unwrap();
        prop_assert!(exempt <= amount);
        prop_assert!(exempt >= Decimal::ZERO);
    }
}
