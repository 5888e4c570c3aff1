//! Warning rules run over finished settlements and over the raw batch.
//!
//! None of these are errors. Per-supplier findings become
//! [`WarningCode`]s on the settlement; batch-wide findings are returned
//! separately in [`BatchFindings`] because they may involve several
//! suppliers, or a supplier with nothing to settle.

use crate::core::settlement::{SupplierSettlement, VolatilityMatch, WarningCode};
use crate::core::supplier::SupplierId;
use crate::core::transaction::{Transaction, TransactionKind};
use crate::fx::conversion::ConversionService;
use crate::fx::provider::RateProvider;
use crate::settlement::config::EngineConfig;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Findings that belong to the batch rather than to one supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFindings {
    /// Each repeated transaction ID once, in order of first repetition.
    pub duplicate_ids: Vec<String>,
    /// Completed refunds for suppliers with no completed capture.
    pub orphaned_refunds: Vec<String>,
}

impl BatchFindings {
    pub fn scan(transactions: &[Transaction]) -> Self {
        Self {
            duplicate_ids: detect_duplicate_ids(transactions),
            orphaned_refunds: detect_orphaned_refunds(transactions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.duplicate_ids.is_empty() && self.orphaned_refunds.is_empty()
    }
}

/// Store the refund rate and report whether it exceeds `threshold` percent.
///
/// With no captures the rate is undefined: nothing is stored and the rule
/// does not fire.
pub fn detect_high_refund_rate(settlement: &mut SupplierSettlement, threshold: Decimal) -> bool {
    let captures = settlement.total_captures();
    if captures.is_zero() {
        return false;
    }

    let Some(rate) = settlement
        .total_refunds()
        .checked_div(captures)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
    else {
        return false;
    };

    settlement.set_refund_rate_pct(rate);
    rate > threshold
}

/// Percentage move from `intent_rate` to `capture_rate`.
///
/// `None` when the intent rate is zero.
pub fn rate_variance_pct(intent_rate: Decimal, capture_rate: Decimal) -> Option<Decimal> {
    if intent_rate.is_zero() {
        return None;
    }
    (capture_rate - intent_rate)
        .abs()
        .checked_div(intent_rate)?
        .checked_mul(HUNDRED)
}

/// Find the first authorization/capture pair whose FX rates moved more
/// than `threshold` percent.
///
/// Captures are scanned in line order; for each, authorizations in the same
/// currency and strictly earlier in time are tried in the order they were
/// received. The first pair over the threshold is returned and the scan
/// stops. A rate lookup failure for an authorization skips that pair.
pub fn detect_volatility<P: RateProvider>(
    settlement: &SupplierSettlement,
    conversion: &ConversionService<P>,
    threshold: Decimal,
) -> Option<VolatilityMatch> {
    let authorizations = settlement.authorizations();
    if authorizations.is_empty() {
        return None;
    }

    for line in settlement.lines() {
        let capture = line.transaction();
        if capture.kind() != TransactionKind::Capture {
            continue;
        }

        let earlier = authorizations
            .iter()
            .filter(|a| a.currency() == capture.currency() && a.timestamp() < capture.timestamp());

        for auth in earlier {
            let intent_rate = match conversion.rate(auth.currency(), auth.rate_date()) {
                Ok(rate) => rate,
                Err(e) => {
                    warn!(
                        "skipping volatility check {} -> {}: {}",
                        auth.id(),
                        capture.id(),
                        e
                    );
                    continue;
                }
            };

            let Some(variance) = rate_variance_pct(intent_rate, line.rate()) else {
                continue;
            };
            if variance > threshold {
                return Some(VolatilityMatch {
                    intent_id: auth.id().to_string(),
                    capture_id: capture.id().to_string(),
                    variance_pct: variance,
                });
            }
        }
    }

    None
}

/// Informational: the supplier ends the period owing money.
pub fn detect_negative_net(settlement: &SupplierSettlement) -> bool {
    settlement.net_amount() < Decimal::ZERO
}

/// Every transaction ID seen more than once, reported once each.
pub fn detect_duplicate_ids(transactions: &[Transaction]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(transactions.len());
    let mut reported: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();

    for tx in transactions {
        if !seen.insert(tx.id()) && reported.insert(tx.id()) {
            duplicates.push(tx.id().to_string());
        }
    }

    duplicates
}

/// Completed refunds whose supplier has no completed capture in the batch.
pub fn detect_orphaned_refunds(transactions: &[Transaction]) -> Vec<String> {
    let with_captures: HashSet<&SupplierId> = transactions
        .iter()
        .filter(|t| t.kind() == TransactionKind::Capture && t.is_completed())
        .map(|t| t.supplier_id())
        .collect();

    transactions
        .iter()
        .filter(|t| t.kind() == TransactionKind::Refund && t.is_completed())
        .filter(|t| !with_captures.contains(t.supplier_id()))
        .map(|t| t.id().to_string())
        .collect()
}

/// Run every per-supplier rule and attach the resulting warnings.
///
/// Rules are independent; a settlement can carry several codes.
pub fn apply_rules<P: RateProvider>(
    settlement: &mut SupplierSettlement,
    conversion: &ConversionService<P>,
    config: &EngineConfig,
) {
    if detect_high_refund_rate(settlement, config.refund_rate_threshold) {
        settlement.add_warning(WarningCode::HighRefundRate);
    }

    if let Some(found) = detect_volatility(settlement, conversion, config.volatility_threshold) {
        settlement.flag_volatility(found);
    }

    if detect_negative_net(settlement) {
        settlement.add_warning(WarningCode::NegativeNet);
    }
}
