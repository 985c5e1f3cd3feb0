//! Build, file and pay a quarterly VAT declaration.
//!
//! Run with: `cargo run --example quarterly_declaration`

use chrono::{NaiveDate, TimeZone, Utc};
use declara::core::*;
use declara::declaration::Aggregator;
use rust_decimal_macros::dec;

fn main() -> Result<(), TaxError> {
    let invoices = vec![
        InvoiceRecord {
            id: "inv-1".into(),
            number: "F-2025-001".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            subtotal: dec!(3000),
            tax_amount: dec!(630),
            client_id: "client-1".into(),
            state: InvoiceState::Paid,
            deleted: false,
        },
        InvoiceRecord {
            id: "inv-2".into(),
            number: "F-2025-002".into(),
            date: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            subtotal: dec!(2000),
            tax_amount: dec!(420),
            client_id: "client-2".into(),
            state: InvoiceState::Pending,
            deleted: false,
        },
    ];
    let expenses = vec![ExpenseRecord {
        id: "exp-1".into(),
        date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        amount: dec!(1200),
        concept: "Studio rent".into(),
        state: ExpenseState::Paid,
        active: true,
    }];

    let period = Period::new(2025, 1)?;
    let mut declaration = Aggregator::new().build_from_period(
        "trainer-1",
        period.year(),
        period.quarter().number(),
        &select_invoices(&invoices, &period),
        &select_expenses(&expenses, &period),
    )?;

    println!("Declaration {} model {}", period, declaration.model());
    for item in declaration.line_items() {
        println!(
            "  {:<20} base {:>10} vat {:>8} ({}%)",
            item.description, item.taxable_base, item.vat_amount, item.vat_rate
        );
    }
    let totals = declaration.totals();
    println!("Sales:         {:>10}", totals.total_sales);
    println!("VAT collected: {:>10}", totals.vat_collected);
    println!("VAT paid:      {:>10}", totals.vat_paid);
    println!("Result:        {:>10}", totals.result);
    println!("Due by:        {}", declaration.deadline_date());

    let filed = Utc.with_ymd_and_hms(2025, 4, 14, 9, 0, 0).unwrap();
    declaration.file(Some("303-2025-1T-0001".into()), filed)?;
    declaration.pay(Some("direct debit".into()), filed)?;
    println!("State:         {}", declaration.state());

    Ok(())
}
