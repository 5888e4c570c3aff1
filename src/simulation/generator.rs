//! Random transaction batches for demos, benchmarks and the CLI.
//!
//! Every generated transaction passes [`Validator`](crate::ingest::validator::Validator)
//! against the default rate table: positive amounts, supported currencies
//! and timestamps no later than `now`.

use crate::core::currency::CurrencyCode;
use crate::core::supplier::SupplierId;
use crate::core::transaction::{Transaction, TransactionBatch, TransactionKind, TransactionStatus};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Shape of a generated batch.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of suppliers.
    pub supplier_count: usize,
    /// Total transactions, spread across suppliers as evenly as possible.
    /// When fewer than `supplier_count`, only the first suppliers get one.
    pub transaction_count: usize,
    /// Currencies to draw from.
    pub currencies: Vec<CurrencyCode>,
    /// Minimum original amount.
    pub min_amount: Decimal,
    /// Maximum original amount.
    pub max_amount: Decimal,
    /// Timestamps fall within this many days before `now`.
    pub span_days: i64,
    /// Probability that a transaction is an authorization.
    pub authorization_share: f64,
    /// Probability that a transaction is a refund.
    pub refund_share: f64,
    /// Probability that a transaction is pending or failed.
    pub incomplete_share: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            supplier_count: 5,
            transaction_count: 100,
            currencies: ["ARS", "BRL", "COP", "MXN", "USD"]
                .into_iter()
                .map(CurrencyCode::new)
                .collect(),
            min_amount: Decimal::from(10),
            max_amount: Decimal::from(5_000),
            span_days: 30,
            authorization_share: 0.15,
            refund_share: 0.15,
            incomplete_share: 0.1,
        }
    }
}

/// Generate a batch using the thread-local RNG.
pub fn generate_batch(config: &GeneratorConfig, now: DateTime<Utc>) -> TransactionBatch {
    generate_batch_with_rng(config, now, &mut rand::thread_rng())
}

/// Generate a batch from the given RNG. A seeded RNG gives a reproducible
/// batch, IDs included.
pub fn generate_batch_with_rng<R: Rng>(
    config: &GeneratorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> TransactionBatch {
    let mut batch = TransactionBatch::new();
    if config.currencies.is_empty() {
        return batch;
    }

    let min_f64 = config.min_amount.to_f64().unwrap_or(1.0).max(0.01);
    let max_f64 = config.max_amount.to_f64().unwrap_or(min_f64).max(min_f64 + 0.01);
    let span_secs = config.span_days.max(1) * 86_400;

    let suppliers = config.supplier_count.min(config.transaction_count);
    for s in 0..suppliers {
        let supplier = SupplierId::new(format!("SUP-{:03}", s));
        let share = config.transaction_count / suppliers + usize::from(s < config.transaction_count % suppliers);

        for _ in 0..share {
            let roll: f64 = rng.gen();
            let kind = if roll < config.authorization_share {
                TransactionKind::Authorization
            } else if roll < config.authorization_share + config.refund_share {
                TransactionKind::Refund
            } else {
                TransactionKind::Capture
            };

            let status = if rng.gen_bool(config.incomplete_share.clamp(0.0, 1.0)) {
                if rng.gen_bool(0.5) {
                    TransactionStatus::Pending
                } else {
                    TransactionStatus::Failed
                }
            } else {
                TransactionStatus::Completed
            };

            let amount = Decimal::from_f64_retain(rng.gen_range(min_f64..max_f64))
                .map(|a| a.round_dp(2))
                .filter(|a| *a > Decimal::ZERO)
                .unwrap_or(Decimal::ONE);

            let currency = config.currencies[rng.gen_range(0..config.currencies.len())].clone();
            let timestamp = now - Duration::seconds(rng.gen_range(0..span_secs));
            let id = Uuid::from_bytes(rng.gen()).to_string();

            batch.add(
                Transaction::new(id, supplier.clone(), kind, amount, currency, timestamp).with_status(status),
            );
        }
    }

    batch
}
