use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a retail location taking part in transfers.
///
/// # Examples
///
/// ```
/// use transfer_engine::core::store::StoreId;
///
/// let berlin = StoreId::new("BERLIN FO");
/// let munich = StoreId::new("MUNICH FO");
/// assert_ne!(berlin, munich);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StoreId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
