use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock-keeping unit: the product identifier transfers are grouped by.
///
/// SKUs are kept as the caller supplied them (no case folding), so
/// `"eg4089"` and `"EG4089"` are different units.
///
/// # Examples
///
/// ```
/// use transfer_engine::core::sku::Sku;
///
/// let sku = Sku::new("FW2545");
/// assert_eq!(sku.to_string(), "FW2545");
/// assert!(Sku::new("   ").is_blank());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the code is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Sku {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Sku {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
