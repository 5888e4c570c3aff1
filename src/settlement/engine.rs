use crate::core::settlement::SupplierSettlement;
use crate::core::transaction::Transaction;
use crate::fx::conversion::ConversionService;
use crate::fx::provider::{RateProvider, SimulatedRateProvider};
use crate::settlement::aggregator::{aggregate, SettlementError};
use crate::settlement::anomaly::{apply_rules, BatchFindings};
use crate::settlement::grouping::group_by_supplier;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use crate::settlement::config::EngineConfig;

/// Output of a successful settlement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRun {
    /// One per supplier with settleable transactions, ordered by supplier ID.
    settlements: Vec<SupplierSettlement>,
    /// Batch-wide findings, not owned by any single supplier.
    batch: BatchFindings,
}

impl SettlementRun {
    pub fn settlements(&self) -> &[SupplierSettlement] {
        &self.settlements
    }

    pub fn into_settlements(self) -> Vec<SupplierSettlement> {
        self.settlements
    }

    pub fn batch(&self) -> &BatchFindings {
        &self.batch
    }

    /// Sum of every supplier's net amount, or `None` if it does not fit in
    /// a `Decimal`.
    pub fn total_net(&self) -> Option<Decimal> {
        self.settlements
            .iter()
            .try_fold(Decimal::ZERO, |total, s| total.checked_add(s.net_amount()))
    }

    /// Number of settled lines across all suppliers.
    pub fn total_lines(&self) -> usize {
        self.settlements.iter().map(|s| s.transaction_count()).sum()
    }

    /// Whether any supplier or batch-wide warning was raised.
    pub fn has_warnings(&self) -> bool {
        !self.batch.is_empty() || self.settlements.iter().any(|s| !s.warnings().is_empty())
    }
}

/// Runs a batch through grouping, conversion, aggregation and the warning
/// rules.
///
/// # Examples
///
/// ```
/// use settlement_engine::prelude::*;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let engine = SettlementEngine::default();
/// let batch = vec![Transaction::new(
///     "tx-1",
///     SupplierId::new("SUP-1"),
///     TransactionKind::Capture,
///     dec!(100),
///     CurrencyCode::new("USD"),
///     Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
/// )];
///
/// let run = engine.calculate(&batch).unwrap();
/// assert_eq!(run.settlements()[0].net_amount(), dec!(100));
/// ```
#[derive(Debug, Clone)]
pub struct SettlementEngine<P> {
    conversion: ConversionService<P>,
    config: EngineConfig,
}

impl<P: RateProvider> SettlementEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            conversion: ConversionService::new(provider),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn conversion(&self) -> &ConversionService<P> {
        &self.conversion
    }

    /// Settle a batch.
    ///
    /// # Algorithm
    ///
    /// 1. Scan the whole batch for duplicate IDs and orphaned refunds.
    /// 2. Group by supplier, dropping anything not completed.
    /// 3. Convert and aggregate each supplier in supplier-ID order.
    /// 4. Run the warning rules on each finished settlement.
    ///
    /// The first conversion failure aborts the run; no partial list of
    /// settlements is ever returned.
    pub fn calculate(&self, transactions: &[Transaction]) -> Result<SettlementRun, SettlementError> {
        let batch = BatchFindings::scan(transactions);
        if !batch.duplicate_ids.is_empty() {
            warn!("duplicate transaction IDs detected: {:?}", batch.duplicate_ids);
        }
        if !batch.orphaned_refunds.is_empty() {
            warn!(
                "orphaned refunds detected (no completed capture for supplier): {:?}",
                batch.orphaned_refunds
            );
        }

        let groups = group_by_supplier(transactions);
        debug!(
            "grouped {} transactions into {} suppliers ({} not completed)",
            transactions.len(),
            groups.len(),
            groups.dropped()
        );

        let mut settlements = Vec::with_capacity(groups.len());
        for (supplier_id, group) in groups.into_ordered() {
            if !group.has_settleable() {
                debug!("supplier {} has nothing to settle", supplier_id);
                continue;
            }

            let mut settlement = aggregate(
                &self.conversion,
                supplier_id.clone(),
                group.settleable,
                group.authorizations,
            )
            .map_err(|e| SettlementError::Supplier {
                supplier_id,
                source: Box::new(e),
            })?;

            apply_rules(&mut settlement, &self.conversion, &self.config);
            if !settlement.warnings().is_empty() {
                let codes: Vec<&str> = settlement.warnings().iter().map(|w| w.as_str()).collect();
                warn!("supplier {}: {}", settlement.supplier_id(), codes.join(", "));
            }

            settlements.push(settlement);
        }

        let run = SettlementRun { settlements, batch };
        match run.total_net() {
            Some(net) => info!(
                "settled {} lines for {} suppliers, net {} {}",
                run.total_lines(),
                run.settlements.len(),
                net,
                self.conversion.reference()
            ),
            None => info!(
                "settled {} lines for {} suppliers, net out of range",
                run.total_lines(),
                run.settlements.len()
            ),
        }
        Ok(run)
    }
}

impl Default for SettlementEngine<SimulatedRateProvider> {
    fn default() -> Self {
        Self::new(SimulatedRateProvider::default())
    }
}

impl std::fmt::Display for SettlementRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Settlement Summary ===")?;
        writeln!(f, "Suppliers:      {}", self.settlements.len())?;
        writeln!(f, "Transactions:   {}", self.total_lines())?;
        match self.total_net() {
            Some(net) => writeln!(f, "Total Net:      {:.2}", net)?,
            None => writeln!(f, "Total Net:      out of range")?,
        }

        writeln!(f, "\n--- Per Supplier ---")?;
        for s in &self.settlements {
            writeln!(
                f,
                "  {} ({}): {:.2} ({} transactions)",
                s.supplier_id(),
                s.supplier_name(),
                s.net_amount(),
                s.transaction_count()
            )?;
        }

        if self.has_warnings() {
            writeln!(f, "\n--- Warnings ---")?;
            for s in self.settlements.iter().filter(|s| !s.warnings().is_empty()) {
                let codes: Vec<&str> = s.warnings().iter().map(|w| w.as_str()).collect();
                writeln!(f, "  {}: {}", s.supplier_id(), codes.join(", "))?;
            }
            if !self.batch.duplicate_ids.is_empty() {
                writeln!(f, "  DUPLICATE_ID: {}", self.batch.duplicate_ids.join(", "))?;
            }
            if !self.batch.orphaned_refunds.is_empty() {
                writeln!(f, "  ORPHANED_REFUND: {}", self.batch.orphaned_refunds.join(", "))?;
            }
        }
        Ok(())
    }
}
