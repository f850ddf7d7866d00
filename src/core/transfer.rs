use crate::core::error::ValidationError;
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// A fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a transfer request.
///
/// ```text
/// Suggested -> Pending -> Approved -> Received
///                      \-> Denied
/// ```
///
/// `Denied` and `Received` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    Suggested,
    Pending,
    Approved,
    Denied,
    Received,
}

impl TransferStatus {
    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (Suggested, Pending) | (Pending, Approved) | (Pending, Denied) | (Approved, Received)
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Suggested => "Suggested",
            TransferStatus::Pending => "Pending",
            TransferStatus::Approved => "Approved",
            TransferStatus::Denied => "Denied",
            TransferStatus::Received => "Received",
        };
        f.write_str(s)
    }
}

/// A workflow action applied to an existing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferAction {
    Approve,
    Deny,
    Receive,
}

impl TransferAction {
    /// The status a request must be in for this action to apply.
    pub fn required_status(self) -> TransferStatus {
        match self {
            TransferAction::Approve | TransferAction::Deny => TransferStatus::Pending,
            TransferAction::Receive => TransferStatus::Approved,
        }
    }

    /// The status the request ends up in.
    pub fn target_status(self) -> TransferStatus {
        match self {
            TransferAction::Approve => TransferStatus::Approved,
            TransferAction::Deny => TransferStatus::Denied,
            TransferAction::Receive => TransferStatus::Received,
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferAction::Approve => "approve",
            TransferAction::Deny => "deny",
            TransferAction::Receive => "receive",
        };
        f.write_str(s)
    }
}

/// A proposed movement of stock that has not entered the ledger yet.
///
/// Candidates come either from the suggestion engine or from manual entry.
///
/// # Examples
///
/// ```
/// use transfer_engine::core::error::ValidationError;
/// use transfer_engine::core::transfer::TransferCandidate;
///
/// let ok = TransferCandidate::new("EG4089".into(), "Runner", 4, "Store A".into(), "Store B".into());
/// assert!(ok.validate().is_ok());
///
/// let same = TransferCandidate::new("EG4089".into(), "Runner", 4, "Store A".into(), "Store A".into());
/// assert!(matches!(same.validate(), Err(ValidationError::SameStore(_))));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCandidate {
    pub sku: Sku,
    pub product: String,
    pub qty: u32,
    pub from_store: StoreId,
    pub to_store: StoreId,
}

impl TransferCandidate {
    pub fn new(
        sku: Sku,
        product: impl Into<String>,
        qty: u32,
        from_store: StoreId,
        to_store: StoreId,
    ) -> Self {
        Self {
            sku,
            product: product.into(),
            qty,
            from_store,
            to_store,
        }
    }

    /// Check the shape invariants every ledger entry must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sku.is_blank() {
            return Err(ValidationError::BlankSku);
        }
        if self.from_store == self.to_store {
            return Err(ValidationError::SameStore(self.from_store.clone()));
        }
        if self.qty == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        Ok(())
    }
}

/// A transfer request tracked by the ledger.
///
/// Requests are only created through [`TransferRequest::pending`], so every
/// instance satisfies `from_store != to_store` and `qty > 0`. Status is only
/// changed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    id: RequestId,
    sku: Sku,
    product: String,
    qty: u32,
    from_store: StoreId,
    to_store: StoreId,
    status: TransferStatus,
    submitted_at: DateTime<Utc>,
    submitted_by: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TransferRequest {
    /// Build a freshly submitted request with a new id and timestamp.
    pub fn pending(
        candidate: TransferCandidate,
        submitted_by: Option<String>,
    ) -> Result<Self, ValidationError> {
        Self::pending_at(RequestId::new(), candidate, submitted_by, Utc::now())
    }

    /// Build a pending request with a caller-chosen id and time (replay, tests).
    pub fn pending_at(
        id: RequestId,
        candidate: TransferCandidate,
        submitted_by: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        candidate.validate()?;
        let TransferCandidate {
            sku,
            product,
            qty,
            from_store,
            to_store,
        } = candidate;
        Ok(Self {
            id,
            sku,
            product,
            qty,
            from_store,
            to_store,
            status: TransferStatus::Pending,
            submitted_at,
            submitted_by,
            updated_at: submitted_at,
        })
    }

    pub(crate) fn set_status(&mut self, status: TransferStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    /// Re-check shape invariants, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_candidate().validate()
    }

    /// The movement this request describes, detached from its lifecycle.
    pub fn to_candidate(&self) -> TransferCandidate {
        TransferCandidate {
            sku: self.sku.clone(),
            product: self.product.clone(),
            qty: self.qty,
            from_store: self.from_store.clone(),
            to_store: self.to_store.clone(),
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    pub fn from_store(&self) -> &StoreId {
        &self.from_store
    }

    pub fn to_store(&self) -> &StoreId {
        &self.to_store
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn submitted_by(&self) -> Option<&str> {
        self.submitted_by.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} from {} to {} [{}]",
            self.sku, self.qty, self.from_store, self.to_store, self.status
        )
    }
}
