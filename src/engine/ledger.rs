use crate::core::error::{TransferError, ValidationError};
use crate::core::inventory::InventorySnapshot;
use crate::core::store::StoreId;
use crate::core::transfer::{
    RequestId, TransferAction, TransferCandidate, TransferRequest, TransferStatus,
};
use crate::engine::reconciliation::{apply_receipt, ReceiptAdjustment};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Receipts checked against the ledger, with their effect on a copy of the
/// inventory. Committing them cannot fail.
#[derive(Debug)]
pub(crate) struct StagedReceipts {
    indices: Vec<usize>,
    inventory: InventorySnapshot,
    adjustments: Vec<ReceiptAdjustment>,
}

/// The ordered list of transfer requests and their lifecycle.
///
/// Requests are appended on submission and never removed; `Denied` and
/// `Received` requests stay for history. Every failed operation leaves the
/// ledger exactly as it was.
///
/// The ledger is a plain value with `&mut self` operations; sharing it
/// between threads is the job of [`TransferDesk`](crate::service::desk::TransferDesk).
///
/// # Examples
///
/// ```
/// use transfer_engine::core::inventory::{InventoryLine, InventorySnapshot};
/// use transfer_engine::core::store::StoreId;
/// use transfer_engine::core::sku::Sku;
/// use transfer_engine::core::transfer::{TransferCandidate, TransferStatus};
/// use transfer_engine::engine::ledger::TransferLedger;
/// use rust_decimal_macros::dec;
///
/// let mut inventory = InventorySnapshot::from_lines(vec![
///     InventoryLine::new("Store A".into(), "EG4089".into(), "Runner", 20, dec!(5)),
/// ])
/// .unwrap();
///
/// let mut ledger = TransferLedger::new();
/// let candidate =
///     TransferCandidate::new("EG4089".into(), "Runner", 6, "Store A".into(), "Store B".into());
/// let id = ledger.submit(candidate, None).unwrap().id();
/// ledger.approve(id).unwrap();
/// ledger.receive(id, &mut inventory).unwrap();
///
/// assert_eq!(ledger.get(id).unwrap().status(), TransferStatus::Received);
/// let sku = Sku::new("EG4089");
/// assert_eq!(inventory.stock(&StoreId::new("Store A"), &sku), 14);
/// assert_eq!(inventory.stock(&StoreId::new("Store B"), &sku), 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferLedger {
    requests: Vec<TransferRequest>,
    index: HashMap<RequestId, usize>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from previously stored requests.
    pub fn from_requests(
        requests: impl IntoIterator<Item = TransferRequest>,
    ) -> Result<Self, ValidationError> {
        let mut ledger = Self::new();
        for request in requests {
            ledger.insert(request)?;
        }
        Ok(ledger)
    }

    /// Validate a candidate and append it as a `Pending` request.
    pub fn submit(
        &mut self,
        candidate: TransferCandidate,
        submitted_by: Option<String>,
    ) -> Result<&TransferRequest, TransferError> {
        let request = TransferRequest::pending(candidate, submitted_by)?;
        let id = request.id();
        self.insert(request)?;
        self.get(id).ok_or(TransferError::NotFound(id))
    }

    /// Append an already-built request, keeping its id and status.
    pub fn insert(&mut self, request: TransferRequest) -> Result<(), ValidationError> {
        self.check_insert(&request)?;
        self.push(request);
        Ok(())
    }

    pub fn approve(&mut self, id: RequestId) -> Result<&TransferRequest, TransferError> {
        self.approve_at(id, Utc::now())
    }

    pub fn approve_at(
        &mut self,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<&TransferRequest, TransferError> {
        let idx = self.check(id, TransferAction::Approve)?;
        Ok(self.advance(idx, TransferAction::Approve, at))
    }

    pub fn deny(&mut self, id: RequestId) -> Result<&TransferRequest, TransferError> {
        self.deny_at(id, Utc::now())
    }

    pub fn deny_at(
        &mut self,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<&TransferRequest, TransferError> {
        let idx = self.check(id, TransferAction::Deny)?;
        Ok(self.advance(idx, TransferAction::Deny, at))
    }

    /// Mark an approved request received and apply it to `inventory`.
    ///
    /// Reconciliation runs exactly once, on the `Approved -> Received` step.
    /// If it fails, the request stays `Approved` and `inventory` is
    /// unchanged.
    pub fn receive(
        &mut self,
        id: RequestId,
        inventory: &mut InventorySnapshot,
    ) -> Result<ReceiptAdjustment, TransferError> {
        self.receive_at(id, inventory, Utc::now())
    }

    pub fn receive_at(
        &mut self,
        id: RequestId,
        inventory: &mut InventorySnapshot,
        at: DateTime<Utc>,
    ) -> Result<ReceiptAdjustment, TransferError> {
        self.receive_batch_at(&[id], inventory, at)?
            .pop()
            .ok_or(TransferError::NotFound(id))
    }

    /// Receive every approved request destined for `store`.
    ///
    /// All or nothing: if any receipt fails, neither the ledger nor the
    /// inventory changes.
    pub fn receive_all(
        &mut self,
        store: &StoreId,
        inventory: &mut InventorySnapshot,
    ) -> Result<Vec<ReceiptAdjustment>, TransferError> {
        let ids: Vec<RequestId> = self.approved_for(store).iter().map(|r| r.id()).collect();
        self.receive_batch_at(&ids, inventory, Utc::now())
    }

    /// Receive a fixed set of requests atomically.
    pub fn receive_batch_at(
        &mut self,
        ids: &[RequestId],
        inventory: &mut InventorySnapshot,
        at: DateTime<Utc>,
    ) -> Result<Vec<ReceiptAdjustment>, TransferError> {
        let staged = self.stage_receipts(ids, inventory)?;
        Ok(self.commit_receipts(staged, inventory, at))
    }

    pub(crate) fn check_insert(&self, request: &TransferRequest) -> Result<(), ValidationError> {
        request.validate()?;
        if self.index.contains_key(&request.id()) {
            return Err(ValidationError::DuplicateRequest(request.id()));
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, request: TransferRequest) {
        self.index.insert(request.id(), self.requests.len());
        self.requests.push(request);
    }

    /// Index of `id` if `action` may be applied to it now.
    pub(crate) fn check(&self, id: RequestId, action: TransferAction) -> Result<usize, TransferError> {
        let idx = *self.index.get(&id).ok_or(TransferError::NotFound(id))?;
        let status = self.requests[idx].status();
        if status != action.required_status() {
            return Err(TransferError::InvalidTransition { id, action, status });
        }
        Ok(idx)
    }

    /// Move a checked request to the status `action` leads to.
    pub(crate) fn advance(
        &mut self,
        idx: usize,
        action: TransferAction,
        at: DateTime<Utc>,
    ) -> &TransferRequest {
        let request = &mut self.requests[idx];
        let next = action.target_status();
        debug_assert!(request.status().can_transition_to(next));
        request.set_status(next, at);
        request
    }

    /// Check a batch of receipts and apply them to a copy of `inventory`.
    /// Neither the ledger nor `inventory` is touched.
    pub(crate) fn stage_receipts(
        &self,
        ids: &[RequestId],
        inventory: &InventorySnapshot,
    ) -> Result<StagedReceipts, TransferError> {
        let mut staged = StagedReceipts {
            indices: Vec::with_capacity(ids.len()),
            inventory: inventory.clone(),
            adjustments: Vec::with_capacity(ids.len()),
        };
        for &id in ids {
            let idx = self.check(id, TransferAction::Receive)?;
            if staged.indices.contains(&idx) {
                return Err(TransferError::InvalidTransition {
                    id,
                    action: TransferAction::Receive,
                    status: TransferStatus::Received,
                });
            }
            let adjustment = apply_receipt(&mut staged.inventory, &self.requests[idx])?;
            staged.adjustments.push(adjustment);
            staged.indices.push(idx);
        }
        Ok(staged)
    }

    pub(crate) fn commit_receipts(
        &mut self,
        staged: StagedReceipts,
        inventory: &mut InventorySnapshot,
        at: DateTime<Utc>,
    ) -> Vec<ReceiptAdjustment> {
        for idx in staged.indices {
            self.advance(idx, TransferAction::Receive, at);
        }
        *inventory = staged.inventory;
        staged.adjustments
    }

    // --- Reads ---

    pub fn get(&self, id: RequestId) -> Option<&TransferRequest> {
        self.index.get(&id).map(|&idx| &self.requests[idx])
    }

    /// All requests in submission order.
    pub fn requests(&self) -> &[TransferRequest] {
        &self.requests
    }

    pub fn by_status(&self, status: TransferStatus) -> Vec<&TransferRequest> {
        self.requests.iter().filter(|r| r.status() == status).collect()
    }

    /// Pending requests, optionally only those bound for `destination`.
    pub fn pending(&self, destination: Option<&StoreId>) -> Vec<&TransferRequest> {
        self.requests
            .iter()
            .filter(|r| r.status() == TransferStatus::Pending)
            .filter(|r| destination.map_or(true, |store| r.to_store() == store))
            .collect()
    }

    /// Approved requests waiting to be received at `store`.
    pub fn approved_for(&self, store: &StoreId) -> Vec<&TransferRequest> {
        self.requests
            .iter()
            .filter(|r| r.status() == TransferStatus::Approved && r.to_store() == store)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
