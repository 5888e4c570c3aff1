use crate::core::supplier::SupplierId;
use crate::core::transaction::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A settleable transaction with the FX rate applied to it.
///
/// Rate and converted amount are fixed at construction, so a line always
/// reports the same reference-currency value it was summed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedLine {
    transaction: Transaction,
    /// Units of reference currency per unit of the transaction currency.
    rate: Decimal,
    /// `transaction.amount * rate`, exact.
    converted_amount: Decimal,
}

impl ConvertedLine {
    pub fn new(transaction: Transaction, rate: Decimal, converted_amount: Decimal) -> Self {
        Self {
            transaction,
            rate,
            converted_amount,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn converted_amount(&self) -> Decimal {
        self.converted_amount
    }
}

/// Per-supplier warning attached by the anomaly rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Refunds exceed the configured share of captures.
    HighRefundRate,
    /// FX moved more than the configured percentage between an
    /// authorization and a later capture.
    #[serde(rename = "VOLATILITY_WARNING")]
    Volatility,
    /// Informational: the supplier owes money back.
    NegativeNet,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::HighRefundRate => "HIGH_REFUND_RATE",
            WarningCode::Volatility => "VOLATILITY_WARNING",
            WarningCode::NegativeNet => "NEGATIVE_NET",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authorization/capture pair that tripped the volatility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMatch {
    pub intent_id: String,
    pub capture_id: String,
    /// |capture rate - intent rate| / intent rate * 100.
    pub variance_pct: Decimal,
}

/// A supplier's running totals no longer fit in a `Decimal`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("settlement totals out of range for supplier {supplier_id}")]
pub struct TotalsOverflow {
    pub supplier_id: SupplierId,
}

/// Settlement totals for one supplier, in the reference currency.
///
/// Built one line at a time by the aggregator, annotated once by the
/// anomaly rules, then handed to reporting unchanged.
///
/// `net_amount` equals `total_captures - total_refunds` after every
/// [`add_line`](Self::add_line), not only at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSettlement {
    supplier_id: SupplierId,
    supplier_name: String,
    /// In processing order.
    lines: Vec<ConvertedLine>,
    total_captures: Decimal,
    total_refunds: Decimal,
    net_amount: Decimal,
    transaction_count: usize,
    /// `None` when there are no captures to divide by.
    refund_rate_pct: Option<Decimal>,
    volatility_flag: bool,
    volatility_match: Option<VolatilityMatch>,
    /// Insertion-ordered, no repeats.
    warnings: Vec<WarningCode>,
    /// Completed authorizations; compared against, never summed.
    authorizations: Vec<Transaction>,
}

impl SupplierSettlement {
    pub fn new(supplier_id: SupplierId) -> Self {
        let supplier_name = supplier_id.display_name();
        Self {
            supplier_id,
            supplier_name,
            lines: Vec::new(),
            total_captures: Decimal::ZERO,
            total_refunds: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            transaction_count: 0,
            refund_rate_pct: None,
            volatility_flag: false,
            volatility_match: None,
            warnings: Vec::new(),
            authorizations: Vec::new(),
        }
    }

    /// Append a converted line and roll it into the running totals.
    ///
    /// If a total would leave the range of `Decimal` the settlement is left
    /// untouched and an error is returned.
    pub fn add_line(&mut self, line: ConvertedLine) -> Result<(), TotalsOverflow> {
        let overflow = || TotalsOverflow {
            supplier_id: self.supplier_id.clone(),
        };

        let (captures, refunds) = match line.transaction().kind() {
            TransactionKind::Capture => (
                self.total_captures
                    .checked_add(line.converted_amount())
                    .ok_or_else(overflow)?,
                self.total_refunds,
            ),
            TransactionKind::Refund => (
                self.total_captures,
                self.total_refunds
                    .checked_add(line.converted_amount())
                    .ok_or_else(overflow)?,
            ),
            TransactionKind::Authorization => (self.total_captures, self.total_refunds),
        };
        let net = captures.checked_sub(refunds).ok_or_else(overflow)?;

        self.total_captures = captures;
        self.total_refunds = refunds;
        self.net_amount = net;
        self.transaction_count += 1;
        self.lines.push(line);
        Ok(())
    }

    /// Keep completed authorizations for the volatility rule.
    pub fn set_authorizations(&mut self, authorizations: Vec<Transaction>) {
        self.authorizations = authorizations;
    }

    pub(crate) fn set_refund_rate_pct(&mut self, pct: Decimal) {
        self.refund_rate_pct = Some(pct);
    }

    pub(crate) fn flag_volatility(&mut self, found: VolatilityMatch) {
        self.volatility_flag = true;
        self.volatility_match = Some(found);
        self.add_warning(WarningCode::Volatility);
    }

    pub(crate) fn add_warning(&mut self, code: WarningCode) {
        if !self.warnings.contains(&code) {
            self.warnings.push(code);
        }
    }

    // --- Accessors ---

    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    pub fn supplier_name(&self) -> &str {
        &self.supplier_name
    }

    pub fn lines(&self) -> &[ConvertedLine] {
        &self.lines
    }

    pub fn total_captures(&self) -> Decimal {
        self.total_captures
    }

    pub fn total_refunds(&self) -> Decimal {
        self.total_refunds
    }

    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn refund_rate_pct(&self) -> Option<Decimal> {
        self.refund_rate_pct
    }

    pub fn volatility_flag(&self) -> bool {
        self.volatility_flag
    }

    pub fn volatility_match(&self) -> Option<&VolatilityMatch> {
        self.volatility_match.as_ref()
    }

    pub fn warnings(&self) -> &[WarningCode] {
        &self.warnings
    }

    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.contains(&code)
    }

    pub fn authorizations(&self) -> &[Transaction] {
        &self.authorizations
    }

    /// Verify the totals agree with the lines they were built from.
    pub fn is_consistent(&self) -> bool {
        let (captures, refunds) = self.lines.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(c, r), line| match line.transaction().kind() {
                TransactionKind::Capture => (c + line.converted_amount(), r),
                TransactionKind::Refund => (c, r + line.converted_amount()),
                TransactionKind::Authorization => (c, r),
            },
        );
        captures == self.total_captures
            && refunds == self.total_refunds
            && self.net_amount == captures - refunds
            && self.transaction_count == self.lines.len()
    }
}
