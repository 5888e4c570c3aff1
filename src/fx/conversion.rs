//! Conversion of transaction amounts into the reference currency.

use crate::core::currency::{CurrencyCode, FxError};
use crate::core::transaction::Transaction;
use crate::fx::provider::RateProvider;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of converting one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Amount in the reference currency.
    pub amount: Decimal,
    /// Rate that produced it.
    pub rate: Decimal,
}

/// Converts transactions using the rate for their calendar date.
///
/// Errors from the provider are returned as-is. Rates are local and
/// deterministic, so a failed lookup is not retried.
#[derive(Debug, Clone)]
pub struct ConversionService<P> {
    provider: P,
}

impl<P: RateProvider> ConversionService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn reference(&self) -> &CurrencyCode {
        self.provider.reference()
    }

    /// Convert `transaction.amount` into the reference currency.
    ///
    /// A product beyond the range of `Decimal` is an error, not a panic.
    pub fn convert(&self, transaction: &Transaction) -> Result<Conversion, FxError> {
        let currency = transaction.currency();
        if !self.provider.supports(currency) {
            return Err(FxError::UnsupportedCurrency(currency.clone()));
        }

        let rate = self.provider.rate(currency, transaction.rate_date())?;
        let amount = transaction
            .amount()
            .checked_mul(rate)
            .ok_or_else(|| FxError::Overflow {
                currency: currency.clone(),
            })?;
        Ok(Conversion { amount, rate })
    }

    /// Look up a rate without converting anything.
    pub fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> Result<Decimal, FxError> {
        self.provider.rate(currency, date)
    }
}
