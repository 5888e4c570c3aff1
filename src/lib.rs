//! # settlement-engine
//!
//! Multi-currency supplier settlement with FX conversion and anomaly
//! detection.
//!
//! Given a batch of payment transactions (captures, refunds and
//! authorizations in several currencies), the engine groups them by
//! supplier, converts each settleable amount into the reference currency
//! at the rate for its calendar date, totals captures and refunds, and
//! flags suppliers whose refunds or FX exposure look wrong.
//!
//! ## Architecture
//!
//! - **core** — Domain types: currencies and rate tables, suppliers, transactions, settlements
//! - **fx** — Rate providers and the conversion service
//! - **settlement** — Grouping, aggregation, warning rules and the engine itself
//! - **ingest** — Transaction CSV reading and validation
//! - **report** — Settlement CSV report
//! - **simulation** — Random transaction batches

pub mod core;
pub mod fx;
pub mod ingest;
pub mod report;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{CurrencyCode, FxError, RateTable};
    pub use crate::core::settlement::{ConvertedLine, SupplierSettlement, VolatilityMatch, WarningCode};
    pub use crate::core::supplier::SupplierId;
    pub use crate::core::transaction::{Transaction, TransactionBatch, TransactionKind, TransactionStatus};
    pub use crate::fx::conversion::ConversionService;
    pub use crate::fx::provider::{RateProvider, SimulatedRateProvider};
    pub use crate::settlement::aggregator::SettlementError;
    pub use crate::settlement::anomaly::BatchFindings;
    pub use crate::settlement::config::EngineConfig;
    pub use crate::settlement::engine::{SettlementEngine, SettlementRun};
}
