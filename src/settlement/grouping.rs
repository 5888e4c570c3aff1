use crate::core::supplier::SupplierId;
use crate::core::transaction::Transaction;
use std::collections::HashMap;

/// One supplier's share of a batch, split by how it is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierGroup {
    /// Completed captures and refunds, in input order. Summed.
    pub settleable: Vec<Transaction>,
    /// Completed authorizations, in input order. Compared, never summed.
    pub authorizations: Vec<Transaction>,
}

impl SupplierGroup {
    pub fn has_settleable(&self) -> bool {
        !self.settleable.is_empty()
    }
}

/// Result of [`group_by_supplier`].
#[derive(Debug, Clone, Default)]
pub struct SupplierGroups {
    groups: HashMap<SupplierId, SupplierGroup>,
    /// Pending and failed transactions of any kind.
    dropped: usize,
}

impl SupplierGroups {
    pub fn get(&self, supplier: &SupplierId) -> Option<&SupplierGroup> {
        self.groups.get(supplier)
    }

    /// Number of suppliers with at least one retained transaction.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// How many transactions were excluded from all downstream work.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Groups ordered by supplier ID, so output never depends on hash order.
    pub fn into_ordered(self) -> Vec<(SupplierId, SupplierGroup)> {
        let mut groups: Vec<_> = self.groups.into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }
}

/// Partition a batch by supplier in a single pass.
///
/// Completed captures and refunds are settleable. Completed authorizations
/// are kept for volatility checks. Everything that is not completed is
/// dropped here and takes no further part in the run.
pub fn group_by_supplier(transactions: &[Transaction]) -> SupplierGroups {
    let mut groups: HashMap<SupplierId, SupplierGroup> = HashMap::new();
    let mut dropped = 0;

    for tx in transactions {
        if tx.is_settleable() {
            groups
                .entry(tx.supplier_id().clone())
                .or_default()
                .settleable
                .push(tx.clone());
        } else if tx.is_completed_intent() {
            groups
                .entry(tx.supplier_id().clone())
                .or_default()
                .authorizations
                .push(tx.clone());
        } else {
            dropped += 1;
        }
    }

    SupplierGroups { groups, dropped }
}
