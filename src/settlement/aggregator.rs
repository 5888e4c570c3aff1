use crate::core::currency::FxError;
use crate::core::settlement::{ConvertedLine, SupplierSettlement, TotalsOverflow};
use crate::core::supplier::SupplierId;
use crate::core::transaction::Transaction;
use crate::fx::conversion::ConversionService;
use crate::fx::provider::RateProvider;
use log::debug;
use thiserror::Error;

/// Fatal errors of a settlement run.
///
/// Any one of these aborts the whole batch: no settlement is returned for
/// any supplier.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("failed to convert transaction {transaction_id}")]
    Conversion {
        transaction_id: String,
        #[source]
        source: FxError,
    },
    #[error("failed to add transaction {transaction_id} to settlement totals")]
    Totals {
        transaction_id: String,
        #[source]
        source: TotalsOverflow,
    },
    #[error("failed to calculate settlement for supplier {supplier_id}")]
    Supplier {
        supplier_id: SupplierId,
        #[source]
        source: Box<SettlementError>,
    },
}

impl SettlementError {
    /// Identifier of the transaction that caused the failure.
    pub fn transaction_id(&self) -> &str {
        match self {
            SettlementError::Conversion { transaction_id, .. }
            | SettlementError::Totals { transaction_id, .. } => transaction_id,
            SettlementError::Supplier { source, .. } => source.transaction_id(),
        }
    }

    /// The underlying FX failure, if the run stopped on one.
    pub fn fx_error(&self) -> Option<&FxError> {
        match self {
            SettlementError::Conversion { source, .. } => Some(source),
            SettlementError::Totals { .. } => None,
            SettlementError::Supplier { source, .. } => source.fx_error(),
        }
    }
}

/// Build one supplier's settlement from its settleable transactions.
///
/// Lines are converted and added in input order. The first conversion
/// failure aborts with the offending transaction's ID.
pub fn aggregate<P: RateProvider>(
    conversion: &ConversionService<P>,
    supplier_id: SupplierId,
    settleable: Vec<Transaction>,
    authorizations: Vec<Transaction>,
) -> Result<SupplierSettlement, SettlementError> {
    let mut settlement = SupplierSettlement::new(supplier_id);
    settlement.set_authorizations(authorizations);

    for tx in settleable {
        let converted = conversion
            .convert(&tx)
            .map_err(|source| SettlementError::Conversion {
                transaction_id: tx.id().to_string(),
                source,
            })?;

        debug!(
            "supplier {} line {}: {} {} {} @ {} = {}",
            settlement.supplier_id(),
            tx.id(),
            tx.kind(),
            tx.amount(),
            tx.currency(),
            converted.rate,
            converted.amount
        );

        let transaction_id = tx.id().to_string();
        settlement
            .add_line(ConvertedLine::new(tx, converted.rate, converted.amount))
            .map_err(|source| SettlementError::Totals {
                transaction_id,
                source,
            })?;
    }

    Ok(settlement)
}
