use crate::core::currency::CurrencyCode;
use crate::core::supplier::SupplierId;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a transaction does to a supplier's settlement.
///
/// The sign of a transaction's effect comes from its kind, never from its
/// amount, which is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Intent only. Recorded for volatility comparison, never summed.
    Authorization,
    /// Settle-positive: money owed to the supplier.
    Capture,
    /// Settle-negative: money returned by the supplier.
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Authorization => "authorization",
            TransactionKind::Capture => "capture",
            TransactionKind::Refund => "refund",
        }
    }

    /// Captures and refunds move money; authorizations do not.
    pub fn is_settlement(&self) -> bool {
        matches!(self, TransactionKind::Capture | TransactionKind::Refund)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization" => Ok(TransactionKind::Authorization),
            "capture" => Ok(TransactionKind::Capture),
            "refund" => Ok(TransactionKind::Refund),
            other => Err(format!("invalid transaction type: {other}")),
        }
    }
}

/// Processing state of a transaction at the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransactionStatus::Completed),
            "pending" => Ok(TransactionStatus::Pending),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("invalid transaction status: {other}")),
        }
    }
}

/// A single payment event for a supplier, in its original currency.
///
/// Transactions are immutable once created. The engine works on
/// collections of them to build per-supplier settlements.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::transaction::{Transaction, TransactionKind};
/// use settlement_engine::core::supplier::SupplierId;
/// use settlement_engine::core::currency::CurrencyCode;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let tx = Transaction::new(
///     "tx-001",
///     SupplierId::new("SUP-001"),
///     TransactionKind::Capture,
///     dec!(150.00),
///     CurrencyCode::new("BRL"),
///     Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
/// );
///
/// assert!(tx.is_settleable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRepr")]
pub struct Transaction {
    /// Processor-assigned identifier. Uniqueness is checked by the engine.
    id: String,
    supplier_id: SupplierId,
    kind: TransactionKind,
    /// Amount in `currency`. Always positive.
    amount: Decimal,
    currency: CurrencyCode,
    timestamp: DateTime<Utc>,
    status: TransactionStatus,
}

/// Wire shape of [`Transaction`], checked before it becomes one.
#[derive(Deserialize)]
struct TransactionRepr {
    id: String,
    supplier_id: SupplierId,
    kind: TransactionKind,
    amount: Decimal,
    currency: CurrencyCode,
    timestamp: DateTime<Utc>,
    status: TransactionStatus,
}

impl TryFrom<TransactionRepr> for Transaction {
    type Error = String;

    fn try_from(repr: TransactionRepr) -> Result<Self, Self::Error> {
        if repr.amount <= Decimal::ZERO {
            return Err(format!(
                "transaction {} amount must be positive, got {}",
                repr.id, repr.amount
            ));
        }
        Ok(Self {
            id: repr.id,
            supplier_id: repr.supplier_id,
            kind: repr.kind,
            amount: repr.amount,
            currency: repr.currency,
            timestamp: repr.timestamp,
            status: repr.status,
        })
    }
}

impl Transaction {
    /// Create a new completed transaction.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive.
    pub fn new(
        id: impl Into<String>,
        supplier_id: SupplierId,
        kind: TransactionKind,
        amount: Decimal,
        currency: CurrencyCode,
        timestamp: DateTime<Utc>,
    ) -> Self {
        assert!(
            amount > Decimal::ZERO,
            "Transaction amount must be positive, got {}",
            amount
        );
        Self {
            id: id.into(),
            supplier_id,
            kind,
            amount,
            currency,
            timestamp,
            status: TransactionStatus::Completed,
        }
    }

    /// Set the processing status.
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// The calendar day used for rate lookup. Time of day is ignored.
    pub fn rate_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// A completed capture or refund.
    pub fn is_settleable(&self) -> bool {
        self.kind.is_settlement() && self.is_completed()
    }

    /// A completed authorization, kept for volatility comparison.
    pub fn is_completed_intent(&self) -> bool {
        self.kind == TransactionKind::Authorization && self.is_completed()
    }
}

/// An ordered batch of transactions handed to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionBatch {
    transactions: Vec<Transaction>,
}

impl TransactionBatch {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    pub fn add(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All unique suppliers referenced in this batch.
    pub fn suppliers(&self) -> Vec<SupplierId> {
        let mut suppliers: Vec<SupplierId> = self
            .transactions
            .iter()
            .map(|t| t.supplier_id().clone())
            .collect();
        suppliers.sort();
        suppliers.dedup();
        suppliers
    }

    /// All unique currencies referenced in this batch.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut currencies: Vec<CurrencyCode> = self
            .transactions
            .iter()
            .map(|t| t.currency().clone())
            .collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }

    /// Keep transactions whose calendar date falls inside `[start, end]`.
    ///
    /// Either bound may be open. Input order is preserved.
    pub fn within_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.transactions
            .iter()
            .filter(|t| {
                let day = t.rate_date();
                start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
            })
            .cloned()
            .collect()
    }
}

impl FromIterator<Transaction> for TransactionBatch {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Self {
            transactions: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Transaction>> for TransactionBatch {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}
