use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// The set of currencies the engine accepts is not encoded in this type:
/// it is whatever the active [`RateTable`] carries a base rate for.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let brl = CurrencyCode::new("BRL");
/// assert_ne!(usd, brl);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from FX rate operations.
#[derive(Debug, Error)]
pub enum FxError {
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),
    #[error("no FX rate available for {currency} on {date}")]
    RateUnavailable {
        currency: CurrencyCode,
        date: NaiveDate,
    },
    #[error("FX rate must be positive, got {rate} for {currency}")]
    InvalidRate {
        currency: CurrencyCode,
        rate: Decimal,
    },
    #[error("reference currency {0} must have a base rate of exactly 1")]
    MissingReference(CurrencyCode),
    #[error("invalid rate table: {0}")]
    Config(String),
    #[error("converted amount out of range for {currency}")]
    Overflow { currency: CurrencyCode },
}

/// Base exchange rates into a single reference currency.
///
/// One entry per supported currency: `1 unit of currency = rate units of
/// reference`. The reference currency itself always maps to exactly one.
/// Adding a currency to the engine means adding one entry here.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::currency::{CurrencyCode, RateTable};
/// use rust_decimal_macros::dec;
///
/// let mut rates = RateTable::new(CurrencyCode::new("USD"));
/// rates.set_rate(CurrencyCode::new("BRL"), dec!(0.20)).unwrap();
///
/// assert!(rates.is_supported(&CurrencyCode::new("BRL")));
/// assert_eq!(rates.base_rate(&CurrencyCode::new("USD")).unwrap(), dec!(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// The currency every settlement is expressed in.
    reference: CurrencyCode,
    /// currency -> units of reference per unit.
    base_rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Create a table that only knows the reference currency.
    pub fn new(reference: CurrencyCode) -> Self {
        let mut base_rates = BTreeMap::new();
        base_rates.insert(reference.clone(), Decimal::ONE);
        Self {
            reference,
            base_rates,
        }
    }

    /// Parse a table from JSON and check it.
    ///
    /// ```json
    /// { "reference": "USD", "base_rates": { "USD": "1", "BRL": "0.20" } }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, FxError> {
        let table: RateTable =
            serde_json::from_str(json).map_err(|e| FxError::Config(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Set the base rate for a currency.
    pub fn set_rate(&mut self, currency: CurrencyCode, rate: Decimal) -> Result<(), FxError> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate { currency, rate });
        }
        if currency == self.reference && rate != Decimal::ONE {
            return Err(FxError::MissingReference(currency));
        }
        self.base_rates.insert(currency, rate);
        Ok(())
    }

    /// Builder-style [`set_rate`](Self::set_rate).
    pub fn with_rate(mut self, currency: impl Into<CurrencyCode>, rate: Decimal) -> Result<Self, FxError> {
        self.set_rate(currency.into(), rate)?;
        Ok(self)
    }

    /// Check every entry; used after deserialization.
    pub fn validate(&self) -> Result<(), FxError> {
        match self.base_rates.get(&self.reference) {
            Some(rate) if *rate == Decimal::ONE => {}
            _ => return Err(FxError::MissingReference(self.reference.clone())),
        }
        for (currency, rate) in &self.base_rates {
            if *rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate {
                    currency: currency.clone(),
                    rate: *rate,
                });
            }
        }
        Ok(())
    }

    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    pub fn is_reference(&self, currency: &CurrencyCode) -> bool {
        *currency == self.reference
    }

    pub fn is_supported(&self, currency: &CurrencyCode) -> bool {
        self.base_rates.contains_key(currency)
    }

    /// The undisturbed base rate for a currency.
    pub fn base_rate(&self, currency: &CurrencyCode) -> Result<Decimal, FxError> {
        self.base_rates
            .get(currency)
            .copied()
            .ok_or_else(|| FxError::UnsupportedCurrency(currency.clone()))
    }

    /// Supported currencies in code order.
    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.base_rates.keys()
    }

    pub fn len(&self) -> usize {
        self.base_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_rates.is_empty()
    }
}

impl Default for RateTable {
    /// USD reference with the Latin American currencies the platform settles.
    fn default() -> Self {
        let mut table = Self::new(CurrencyCode::new("USD"));
        for (code, rate) in [
            ("ARS", dec!(0.0012)),
            ("BRL", dec!(0.20)),
            ("COP", dec!(0.00025)),
            ("MXN", dec!(0.055)),
        ] {
            table.base_rates.insert(CurrencyCode::new(code), rate);
        }
        table
    }
}
