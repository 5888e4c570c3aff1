//! Transaction CSV. Header:
//! transaction_id,supplier_id,type,original_amount,currency,timestamp,status
//!
//! Timestamps are RFC 3339. Amounts are plain decimals.

use crate::core::currency::CurrencyCode;
use crate::core::transaction::{Transaction, TransactionKind, TransactionStatus};
use crate::ingest::error::IngestError;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const HEADERS: [&str; 7] = [
    "transaction_id",
    "supplier_id",
    "type",
    "original_amount",
    "currency",
    "timestamp",
    "status",
];

#[derive(serde::Deserialize)]
struct CsvRow {
    transaction_id: String,
    supplier_id: String,
    #[serde(rename = "type")]
    kind: String,
    original_amount: String,
    currency: String,
    timestamp: String,
    status: String,
}

#[derive(serde::Serialize)]
struct CsvOutRow<'a> {
    transaction_id: &'a str,
    supplier_id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    original_amount: String,
    currency: &'a str,
    timestamp: String,
    status: &'static str,
}

/// A parsed but not yet validated transaction row.
///
/// Fields are typed, but nothing is checked beyond syntax: the amount may
/// be zero, the currency may be unknown, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub supplier_id: String,
    pub kind: TransactionKind,
    pub original_amount: Decimal,
    pub currency: CurrencyCode,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

/// Read every row of a transaction CSV.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let found: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if found != HEADERS {
        return Err(IngestError::Header {
            expected: HEADERS.iter().map(|h| h.to_string()).collect(),
            found,
        });
    }

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // line 1 is the header
        let line = i + 2;
        let row = row?;
        records.push(parse_row(row, line)?);
    }
    Ok(records)
}

pub fn read_transactions_file(path: impl AsRef<Path>) -> Result<Vec<TransactionRecord>, IngestError> {
    let file = File::open(path)?;
    read_transactions(file)
}

fn parse_row(row: CsvRow, line: usize) -> Result<TransactionRecord, IngestError> {
    let parse_err = |message: String| IngestError::Parse { line, message };

    let original_amount = row
        .original_amount
        .parse::<Decimal>()
        .map_err(|e| parse_err(format!("invalid amount '{}': {e}", row.original_amount)))?;
    let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
        .map_err(|e| {
            parse_err(format!(
                "invalid timestamp '{}': must be RFC3339 format: {e}",
                row.timestamp
            ))
        })?
        .with_timezone(&Utc);
    let kind = row.kind.parse::<TransactionKind>().map_err(parse_err)?;
    let status = row.status.parse::<TransactionStatus>().map_err(parse_err)?;

    Ok(TransactionRecord {
        transaction_id: row.transaction_id,
        supplier_id: row.supplier_id,
        kind,
        original_amount,
        currency: CurrencyCode::new(row.currency),
        timestamp,
        status,
    })
}

/// Write transactions in the same format [`read_transactions`] accepts.
pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<(), IngestError> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for tx in transactions {
        wrt.serialize(CsvOutRow {
            transaction_id: tx.id(),
            supplier_id: tx.supplier_id().as_str(),
            kind: tx.kind().as_str(),
            original_amount: tx.amount().to_string(),
            currency: tx.currency().as_str(),
            timestamp: tx.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
            status: tx.status().as_str(),
        })?;
    }
    wrt.flush()?;
    Ok(())
}
