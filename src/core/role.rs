use crate::core::store::StoreId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is acting on the ledger.
///
/// This is a coarse role check, not authentication: callers are trusted to
/// pass the role of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Manages one store; receives transfers destined for it.
    StoreManager { store: StoreId },
    /// Approves or denies pending transfers across all stores.
    Approver,
}

impl Role {
    pub fn store_manager(store: impl Into<StoreId>) -> Self {
        Role::StoreManager {
            store: store.into(),
        }
    }

    /// The store this role is scoped to, if any.
    pub fn store(&self) -> Option<&StoreId> {
        match self {
            Role::StoreManager { store } => Some(store),
            Role::Approver => None,
        }
    }

    pub fn can_decide(&self) -> bool {
        matches!(self, Role::Approver)
    }

    pub fn can_receive_at(&self, store: &StoreId) -> bool {
        self.store() == Some(store)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::StoreManager { store } => write!(f, "store manager of {}", store),
            Role::Approver => f.write_str("approver"),
        }
    }
}
