use crate::core::role::Role;
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use crate::core::transfer::{RequestId, TransferAction, TransferStatus};
use crate::persistence::journal::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed input: a candidate or snapshot that can never be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("source and destination store are both {0}")]
    SameStore(StoreId),
    #[error("transfer quantity must be positive")]
    ZeroQuantity,
    #[error("SKU must not be blank")]
    BlankSku,
    #[error("sales velocity must be non-negative, got {sales} for {store}/{sku}")]
    NegativeSales {
        store: StoreId,
        sku: Sku,
        sales: Decimal,
    },
    #[error("duplicate inventory line for {store}/{sku}")]
    DuplicateLine { store: StoreId, sku: Sku },
    #[error("request {0} is already in the ledger")]
    DuplicateRequest(RequestId),
}

/// Inventory could not be updated consistently with a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    #[error("receiving {qty} of {sku} at {store} overflows stock of {current}")]
    QuantityOverflow {
        store: StoreId,
        sku: Sku,
        current: u32,
        qty: u32,
    },
}

/// Every failure a transfer operation can surface to its caller.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid transfer: {0}")]
    Validation(#[from] ValidationError),
    #[error("cannot {action} request {id}: status is {status}")]
    InvalidTransition {
        id: RequestId,
        action: TransferAction,
        status: TransferStatus,
    },
    #[error("no transfer request with id {0}")]
    NotFound(RequestId),
    #[error("reconciliation failed: {0}")]
    Reconciliation(#[from] ReconciliationError),
    #[error("{role} may not {action} transfers")]
    PermissionDenied { role: Role, action: TransferAction },
    #[error("journal failure: {0}")]
    Store(#[from] StoreError),
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl TransferError {
    /// Whether the caller can correct the input and retry.
    ///
    /// Journal and lock failures are infrastructure faults; everything else
    /// is a user-correctable condition.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TransferError::Store(_) | TransferError::LockPoisoned(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(TransferError::from(ValidationError::ZeroQuantity).is_recoverable());
        assert!(TransferError::NotFound(RequestId::new()).is_recoverable());
        assert!(!TransferError::LockPoisoned("ledger").is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert!(!TransferError::from(StoreError::from(io)).is_recoverable());
    }

    #[test]
    fn test_permission_denied_carries_role() {
        let err = TransferError::PermissionDenied {
            role: Role::store_manager("Store A"),
            action: TransferAction::Approve,
        };
        assert_eq!(
            err.to_string(),
            "store manager of Store A may not approve transfers"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_transition_message() {
        let id = RequestId::new();
        let err = TransferError::InvalidTransition {
            id,
            action: TransferAction::Approve,
            status: TransferStatus::Denied,
        };
        assert_eq!(
            err.to_string(),
            format!("cannot approve request {}: status is Denied", id)
        );
    }
}
