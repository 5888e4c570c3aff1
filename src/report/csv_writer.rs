//! Settlement report as CSV: one detail row per settled line, followed by
//! a `SUMMARY` row for the supplier.

use crate::core::settlement::SupplierSettlement;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub const SUMMARY_MARKER: &str = "SUMMARY";

pub const REPORT_HEADERS: [&str; 15] = [
    "supplier_id",
    "supplier_name",
    "transaction_id",
    "type",
    "timestamp",
    "original_amount",
    "original_currency",
    "fx_rate",
    "usd_amount",
    "total_captures_usd",
    "total_refunds_usd",
    "net_amount_usd",
    "transaction_count",
    "refund_rate_pct",
    "warnings",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Default, serde::Serialize)]
struct ReportRow<'a> {
    supplier_id: &'a str,
    supplier_name: &'a str,
    transaction_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    timestamp: String,
    original_amount: String,
    original_currency: &'a str,
    fx_rate: String,
    usd_amount: String,
    total_captures_usd: String,
    total_refunds_usd: String,
    net_amount_usd: String,
    transaction_count: String,
    refund_rate_pct: String,
    warnings: String,
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

fn rate(rate: Decimal) -> String {
    format!("{:.6}", rate.round_dp(6))
}

/// Write the report for `settlements` in the order given. The header is
/// written even when there is nothing to report.
pub fn write_report<W: Write>(writer: W, settlements: &[SupplierSettlement]) -> Result<(), ReportError> {
    let mut wrt = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wrt.write_record(REPORT_HEADERS)?;

    for settlement in settlements {
        let supplier_id = settlement.supplier_id().as_str();
        let supplier_name = settlement.supplier_name();

        for line in settlement.lines() {
            let tx = line.transaction();
            wrt.serialize(ReportRow {
                supplier_id,
                supplier_name,
                transaction_id: tx.id(),
                kind: tx.kind().as_str(),
                timestamp: tx.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
                original_amount: money(tx.amount()),
                original_currency: tx.currency().as_str(),
                fx_rate: rate(line.rate()),
                usd_amount: money(line.converted_amount()),
                ..ReportRow::default()
            })?;
        }

        let warnings: Vec<&str> = settlement.warnings().iter().map(|w| w.as_str()).collect();
        wrt.serialize(ReportRow {
            supplier_id,
            supplier_name,
            transaction_id: SUMMARY_MARKER,
            total_captures_usd: money(settlement.total_captures()),
            total_refunds_usd: money(settlement.total_refunds()),
            net_amount_usd: money(settlement.net_amount()),
            transaction_count: settlement.transaction_count().to_string(),
            refund_rate_pct: settlement.refund_rate_pct().map(money).unwrap_or_default(),
            warnings: warnings.join(";"),
            ..ReportRow::default()
        })?;
    }

    wrt.flush()?;
    Ok(())
}

pub fn write_report_file(path: impl AsRef<Path>, settlements: &[SupplierSettlement]) -> Result<(), ReportError> {
    let file = File::create(path)?;
    write_report(file, settlements)
}
