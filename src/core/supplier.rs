use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a supplier receiving settlement payouts.
///
/// # Examples
///
/// ```
/// use settlement_engine::core::supplier::SupplierId;
///
/// let hotel = SupplierId::new("SUP-001");
/// let airline = SupplierId::new("SUP-002");
/// assert_ne!(hotel, airline);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(String);

impl SupplierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this supplier ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name used on reports.
    ///
    /// There is no supplier directory behind the engine, so the name is
    /// derived from the identifier.
    pub fn display_name(&self) -> String {
        format!("Supplier {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SupplierId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
