use crate::core::currency::{CurrencyCode, RateTable};
use crate::core::supplier::SupplierId;
use crate::core::transaction::{Transaction, TransactionBatch};
use crate::ingest::csv::TransactionRecord;
use crate::ingest::error::{IngestError, ValidationError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Turns parsed records into transactions the engine can accept.
///
/// Transaction ID uniqueness is not checked here; the engine reports
/// duplicates itself.
#[derive(Debug, Clone)]
pub struct Validator {
    supported: BTreeSet<CurrencyCode>,
}

impl Validator {
    /// Accept exactly the currencies `rates` can convert.
    pub fn new(rates: &RateTable) -> Self {
        Self {
            supported: rates.currencies().cloned().collect(),
        }
    }

    pub fn validate(&self, record: TransactionRecord, now: DateTime<Utc>) -> Result<Transaction, ValidationError> {
        if record.transaction_id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        let supplier_id = SupplierId::new(record.supplier_id);
        if supplier_id.is_empty() {
            return Err(ValidationError::EmptySupplier);
        }
        if record.original_amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(record.original_amount));
        }
        if !self.supported.contains(&record.currency) {
            return Err(ValidationError::UnsupportedCurrency(record.currency));
        }
        if record.timestamp > now {
            return Err(ValidationError::FutureTimestamp(record.timestamp));
        }

        Ok(Transaction::new(
            record.transaction_id,
            supplier_id,
            record.kind,
            record.original_amount,
            record.currency,
            record.timestamp,
        )
        .with_status(record.status))
    }

    /// Validate every record; the first failure rejects the whole batch.
    pub fn validate_batch(
        &self,
        records: Vec<TransactionRecord>,
        now: DateTime<Utc>,
    ) -> Result<TransactionBatch, IngestError> {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let transaction_id = record.transaction_id.clone();
                self.validate(record, now)
                    .map_err(|source| IngestError::Validation {
                        index: i + 1,
                        transaction_id,
                        source,
                    })
            })
            .collect()
    }
}
