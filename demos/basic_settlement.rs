//! Basic supplier settlement example.
//!
//! Settles a small hand-written batch across three currencies and prints
//! the summary followed by the CSV report.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use settlement_engine::prelude::*;
use settlement_engine::report::csv_writer::write_report;
use std::error::Error;
use std::io;

fn main() -> Result<(), Box<dyn Error>> {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  settlement-engine: Basic Settlement Example  ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let day = |d, h| Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap();
    let brl = CurrencyCode::new("BRL");
    let mxn = CurrencyCode::new("MXN");
    let usd = CurrencyCode::new("USD");
    let hotel = SupplierId::new("HOTEL-RIO");
    let tours = SupplierId::new("TOURS-CDMX");

    let batch = vec![
        Transaction::new("t1", hotel.clone(), TransactionKind::Capture, dec!(5_000), brl.clone(), day(15, 10)),
        Transaction::new("t2", hotel.clone(), TransactionKind::Refund, dec!(400), brl.clone(), day(16, 9)),
        Transaction::new("t3", hotel.clone(), TransactionKind::Capture, dec!(1_200), brl, day(17, 9))
            .with_status(TransactionStatus::Pending),
        Transaction::new("t4", tours.clone(), TransactionKind::Capture, dec!(8_000), mxn.clone(), day(15, 14)),
        Transaction::new("t5", tours.clone(), TransactionKind::Refund, dec!(3_000), mxn, day(18, 11)),
        Transaction::new("t6", tours, TransactionKind::Refund, dec!(25), usd, day(18, 12)),
    ];

    let engine = SettlementEngine::default();
    let run = engine.calculate(&batch)?;

    println!("{}", run);

    println!("━━━ CSV Report ━━━\n");
    write_report(io::stdout().lock(), run.settlements())?;
    Ok(())
}
