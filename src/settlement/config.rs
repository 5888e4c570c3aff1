use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Thresholds for the warning rules, in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Refunds above this share of captures raise `HIGH_REFUND_RATE`.
    pub refund_rate_threshold: Decimal,
    /// FX moves above this between authorization and capture raise
    /// `VOLATILITY_WARNING`.
    pub volatility_threshold: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refund_rate_threshold: dec!(20),
            volatility_threshold: dec!(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.refund_rate_threshold, dec!(20));
        assert_eq!(config.volatility_threshold, dec!(5));
    }

    #[test]
    fn test_thresholds_from_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"refund_rate_threshold":"35","volatility_threshold":"2.5"}"#).unwrap();
        assert_eq!(config.refund_rate_threshold, dec!(35));
        assert_eq!(config.volatility_threshold, dec!(2.5));
    }
}
