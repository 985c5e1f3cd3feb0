//! Compute withholdings for a year of invoices, declare them and issue
//! the yearly certificates.
//!
//! Run with: `cargo run --example withholding_certificates`

use chrono::{NaiveDate, TimeZone, Utc};
use declara::core::*;
use declara::summary::{annual_withholding_summary, quarterly_withholding_summary};
use declara::withholding::{Withholding, WithholdingCalculator};
use rust_decimal::Decimal;

fn main() -> Result<(), TaxError> {
    let clients = [
        ClientRecord {
            id: "client-1".into(),
            name: "Gimnasio Norte SL".into(),
            tax_id: Some("B11111111".into()),
            address: Some("Calle Mayor 1, Madrid".into()),
        },
        ClientRecord {
            id: "client-2".into(),
            name: "Club Atletico Sur".into(),
            tax_id: Some("G22222222".into()),
            address: None,
        },
    ];

    let calculator = WithholdingCalculator::new();
    let mut withholdings: Vec<Withholding> = Vec::new();
    for month in 1..=12u32 {
        let client = &clients[(month % 2) as usize];
        let invoice = InvoiceRecord {
            id: format!("inv-{month}").into(),
            number: format!("F-2025-{month:03}"),
            date: NaiveDate::from_ymd_opt(2025, month, 10).unwrap(),
            subtotal: Decimal::from(800 + month * 50),
            tax_amount: Decimal::ZERO,
            client_id: client.id.clone(),
            state: InvoiceState::Paid,
            deleted: false,
        };
        let w = calculator.create_or_reject(&withholdings, "trainer-1", &invoice, client)?;
        withholdings.push(w);
    }

    for quarter in 1..=4 {
        let summary =
            quarterly_withholding_summary(&withholdings, &"trainer-1".into(), 2025, quarter)?;
        println!(
            "{}: {} invoices, base {}, withheld {}",
            summary.period, summary.total_count, summary.total_base, summary.total_withheld
        );
        for client in &summary.per_client {
            println!("    {:<20} {:>8}", client.client_name, client.total_withheld);
        }
    }

    let issued = Utc.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap();
    for w in &mut withholdings {
        let filing = format!("111-{}", w.period_label());
        w.mark_declared(Some(filing))?;
        w.emit_certificate(None, issued)?;
    }

    let year = annual_withholding_summary(&withholdings, &"trainer-1".into(), 2025)?;
    println!(
        "2025: {} withholdings, {} withheld, {} certificates",
        year.total_count, year.total_withheld, year.certificates_issued_count
    );
    Ok(())
}
