//! Exchange rate sources.

use crate::core::currency::{CurrencyCode, FxError, RateTable};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Source of exchange rates into the reference currency.
///
/// Implementations must be a pure function of `(currency, date)`: the same
/// inputs always produce the same rate, and a lookup never mutates shared
/// state, so a provider can be shared freely between threads.
pub trait RateProvider: Send + Sync {
    /// The currency rates are quoted into.
    fn reference(&self) -> &CurrencyCode;

    /// Whether this provider can quote `currency` at all.
    fn supports(&self, currency: &CurrencyCode) -> bool;

    /// Units of reference currency per unit of `currency` on `date`.
    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> Result<Decimal, FxError>;
}

/// Deterministic offline provider.
///
/// Each non-reference rate is its base rate moved by up to `amplitude`
/// (2% by default) in either direction. The move is `sin(d) * amplitude`
/// where `d` is the number of whole days since 1970-01-01, so every
/// calendar day has its own rate and a day's rate never changes.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::currency::{CurrencyCode, RateTable};
/// use settlement_engine::fx::provider::{RateProvider, SimulatedRateProvider};
/// use chrono::NaiveDate;
///
/// let provider = SimulatedRateProvider::new(RateTable::default());
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
///
/// let a = provider.rate(&CurrencyCode::new("BRL"), day).unwrap();
/// let b = provider.rate(&CurrencyCode::new("BRL"), day).unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedRateProvider {
    table: RateTable,
    amplitude: f64,
}

impl SimulatedRateProvider {
    pub const DEFAULT_AMPLITUDE: f64 = 0.02;

    pub fn new(table: RateTable) -> Self {
        Self {
            table,
            amplitude: Self::DEFAULT_AMPLITUDE,
        }
    }

    /// Override the maximum relative daily move (0.02 = ±2%).
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Multiplier applied to the base rate on `date`.
    ///
    /// The sine is taken in f64 and rounded once to 10 places; everything
    /// after that is decimal arithmetic.
    fn daily_factor(&self, date: NaiveDate) -> Decimal {
        let days = i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE);
        let swing = (days as f64).sin() * self.amplitude;
        let swing = Decimal::from_f64_retain(swing)
            .unwrap_or(Decimal::ZERO)
            .round_dp(10);
        Decimal::ONE + swing
    }
}

impl Default for SimulatedRateProvider {
    fn default() -> Self {
        Self::new(RateTable::default())
    }
}

impl RateProvider for SimulatedRateProvider {
    fn reference(&self) -> &CurrencyCode {
        self.table.reference()
    }

    fn supports(&self, currency: &CurrencyCode) -> bool {
        self.table.is_supported(currency)
    }

    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> Result<Decimal, FxError> {
        let base = self.table.base_rate(currency)?;
        if self.table.is_reference(currency) {
            return Ok(Decimal::ONE);
        }

        match base.checked_mul(self.daily_factor(date)) {
            Some(rate) if rate > Decimal::ZERO => Ok(rate),
            _ => Err(FxError::RateUnavailable {
                currency: currency.clone(),
                date,
            }),
        }
    }
}
