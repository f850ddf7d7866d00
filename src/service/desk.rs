use crate::config::{EngineConfig, SuggestionPolicy};
use crate::core::error::TransferError;
use crate::core::inventory::{InventoryLine, InventorySnapshot};
use crate::core::role::Role;
use crate::core::store::StoreId;
use crate::core::transfer::{RequestId, TransferAction, TransferCandidate, TransferRequest};
use crate::engine::ledger::TransferLedger;
use crate::engine::reconciliation::ReceiptAdjustment;
use crate::engine::suggestion::{Suggestion, SuggestionEngine};
use crate::persistence::journal::{replay, JournalEntry, TransferStore};
use crate::persistence::json_lines::JsonLinesStore;
use chrono::Utc;
use log::info;
use std::sync::{Mutex, MutexGuard};

/// Command handlers for the transfer workflow.
///
/// The desk owns one ledger and one inventory snapshot, each behind its own
/// mutex. Mutations take the ledger lock, then the inventory lock, then the
/// journal lock, always in that order, so concurrent commands on the same
/// request serialize and exactly one of them wins.
///
/// Every mutation is applied to a staged copy, appended to the journal, and
/// only then made visible. If the journal append fails the in-memory state is
/// unchanged and the error is returned as [`TransferError::Store`].
pub struct TransferDesk {
    ledger: Mutex<TransferLedger>,
    inventory: Mutex<InventorySnapshot>,
    journal: Mutex<Box<dyn TransferStore>>,
    engine: SuggestionEngine,
}

fn lock<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    name: &'static str,
) -> Result<MutexGuard<'a, T>, TransferError> {
    mutex.lock().map_err(|_| TransferError::LockPoisoned(name))
}

impl TransferDesk {
    /// Load and replay `store`, then serve commands against the result.
    pub fn open(
        mut store: impl TransferStore + 'static,
        policy: SuggestionPolicy,
    ) -> Result<Self, TransferError> {
        let entries = store.load()?;
        let (ledger, inventory) = replay(&entries)?;
        info!(
            "transfer desk opened: {} requests, {} inventory lines",
            ledger.len(),
            inventory.len()
        );
        Ok(Self {
            ledger: Mutex::new(ledger),
            inventory: Mutex::new(inventory),
            journal: Mutex::new(Box::new(store)),
            engine: SuggestionEngine::new(policy),
        })
    }

    /// Open a desk journaling to the file named in `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, TransferError> {
        Self::open(
            JsonLinesStore::new(config.journal_path.clone()),
            config.suggestion.clone(),
        )
    }

    /// Stage `entry` against the locked state, journal it, then apply it.
    fn commit(
        &self,
        ledger: &mut TransferLedger,
        inventory: &mut InventorySnapshot,
        entry: JournalEntry,
    ) -> Result<Vec<ReceiptAdjustment>, TransferError> {
        let staged = entry.stage(ledger, inventory)?;
        lock(&self.journal, "journal")?.append(&entry)?;
        Ok(staged.commit(ledger, inventory))
    }

    /// Replace the whole inventory snapshot with freshly loaded data.
    pub fn replace_snapshot(&self, snapshot: InventorySnapshot) -> Result<(), TransferError> {
        let mut ledger = lock(&self.ledger, "ledger")?;
        let mut inventory = lock(&self.inventory, "inventory")?;
        let lines = snapshot.len();
        self.commit(
            &mut ledger,
            &mut inventory,
            JournalEntry::SnapshotReplaced {
                snapshot,
                at: Utc::now(),
            },
        )?;
        info!("inventory snapshot replaced ({} lines)", lines);
        Ok(())
    }

    /// Current suggestions for the loaded snapshot.
    pub fn suggestions(&self) -> Result<Vec<Suggestion>, TransferError> {
        let inventory = lock(&self.inventory, "inventory")?;
        Ok(self.engine.generate(&inventory))
    }

    /// Submit a manual or suggested candidate; it enters as `Pending`.
    pub fn submit(
        &self,
        candidate: TransferCandidate,
        submitted_by: Option<&str>,
    ) -> Result<TransferRequest, TransferError> {
        let request = TransferRequest::pending(candidate, submitted_by.map(str::to_string))?;
        let mut ledger = lock(&self.ledger, "ledger")?;
        let mut inventory = lock(&self.inventory, "inventory")?;
        self.commit(
            &mut ledger,
            &mut inventory,
            JournalEntry::Submitted {
                request: request.clone(),
            },
        )?;
        info!("submitted {} ({})", request.id(), request);
        Ok(request)
    }

    /// Promote a suggestion to a pending request.
    pub fn submit_suggestion(
        &self,
        suggestion: &Suggestion,
        submitted_by: Option<&str>,
    ) -> Result<TransferRequest, TransferError> {
        self.submit(suggestion.candidate.clone(), submitted_by)
    }

    pub fn approve(&self, role: &Role, id: RequestId) -> Result<TransferRequest, TransferError> {
        self.decide(role, id, TransferAction::Approve)
    }

    pub fn deny(&self, role: &Role, id: RequestId) -> Result<TransferRequest, TransferError> {
        self.decide(role, id, TransferAction::Deny)
    }

    fn decide(
        &self,
        role: &Role,
        id: RequestId,
        action: TransferAction,
    ) -> Result<TransferRequest, TransferError> {
        if !role.can_decide() {
            return Err(TransferError::PermissionDenied {
                role: role.clone(),
                action,
            });
        }
        let at = Utc::now();
        let entry = match action {
            TransferAction::Deny => JournalEntry::Denied { id, at },
            _ => JournalEntry::Approved { id, at },
        };

        let mut ledger = lock(&self.ledger, "ledger")?;
        let mut inventory = lock(&self.inventory, "inventory")?;
        self.commit(&mut ledger, &mut inventory, entry)?;
        let request = ledger.get(id).cloned().ok_or(TransferError::NotFound(id))?;
        info!("{} -> {}", id, request.status());
        Ok(request)
    }

    /// Receive one approved request at its destination store.
    pub fn receive(&self, role: &Role, id: RequestId) -> Result<ReceiptAdjustment, TransferError> {
        let mut ledger = lock(&self.ledger, "ledger")?;
        let destination = ledger
            .get(id)
            .map(|r| r.to_store().clone())
            .ok_or(TransferError::NotFound(id))?;
        Self::check_receiver(role, &destination)?;

        let mut inventory = lock(&self.inventory, "inventory")?;
        let adjustment = self
            .commit(
                &mut ledger,
                &mut inventory,
                JournalEntry::Received {
                    ids: vec![id],
                    at: Utc::now(),
                },
            )?
            .pop()
            .ok_or(TransferError::NotFound(id))?;
        info!(
            "received {}: {} now holds {} of {}",
            id, adjustment.to_store, adjustment.destination_qty, adjustment.sku
        );
        Ok(adjustment)
    }

    /// Receive every approved request bound for `store`, atomically.
    pub fn receive_all(
        &self,
        role: &Role,
        store: &StoreId,
    ) -> Result<Vec<ReceiptAdjustment>, TransferError> {
        Self::check_receiver(role, store)?;
        let mut ledger = lock(&self.ledger, "ledger")?;
        let ids: Vec<RequestId> = ledger.approved_for(store).iter().map(|r| r.id()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut inventory = lock(&self.inventory, "inventory")?;
        let adjustments = self.commit(
            &mut ledger,
            &mut inventory,
            JournalEntry::Received {
                ids,
                at: Utc::now(),
            },
        )?;
        info!("received {} transfers at {}", adjustments.len(), store);
        Ok(adjustments)
    }

    fn check_receiver(role: &Role, store: &StoreId) -> Result<(), TransferError> {
        if role.can_receive_at(store) {
            Ok(())
        } else {
            Err(TransferError::PermissionDenied {
                role: role.clone(),
                action: TransferAction::Receive,
            })
        }
    }

    /// Pending requests visible to `role`.
    ///
    /// Approvers see all pending requests, narrowed by `store_filter` when
    /// given. A store manager only ever sees requests bound for their own
    /// store; a filter naming another store yields nothing.
    pub fn list_pending(
        &self,
        role: &Role,
        store_filter: Option<&StoreId>,
    ) -> Result<Vec<TransferRequest>, TransferError> {
        let destination = match (role.store(), store_filter) {
            (Some(own), Some(filter)) if own != filter => return Ok(Vec::new()),
            (Some(own), _) => Some(own),
            (None, filter) => filter,
        };
        let ledger = lock(&self.ledger, "ledger")?;
        Ok(ledger.pending(destination).into_iter().cloned().collect())
    }

    pub fn request(&self, id: RequestId) -> Result<TransferRequest, TransferError> {
        lock(&self.ledger, "ledger")?
            .get(id)
            .cloned()
            .ok_or(TransferError::NotFound(id))
    }

    /// Every request in submission order, including resolved ones.
    pub fn requests(&self) -> Result<Vec<TransferRequest>, TransferError> {
        Ok(lock(&self.ledger, "ledger")?.requests().to_vec())
    }

    pub fn inventory(&self) -> Result<InventorySnapshot, TransferError> {
        Ok(lock(&self.inventory, "inventory")?.clone())
    }

    /// Inventory lines for one store (the store dashboard).
    pub fn store_inventory(&self, store: &StoreId) -> Result<Vec<InventoryLine>, TransferError> {
        Ok(lock(&self.inventory, "inventory")?
            .lines_for_store(store)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::TransferStatus;
    use crate::persistence::journal::MemoryStore;
    use rust_decimal_macros::dec;

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot::from_lines(vec![
            InventoryLine::new("A".into(), "SKU1".into(), "Stan Smith", 20, dec!(5)),
            InventoryLine::new("B".into(), "SKU1".into(), "Stan Smith", 5, dec!(50)),
        ])
        .unwrap()
    }

    fn desk() -> (TransferDesk, MemoryStore) {
        let store = MemoryStore::new();
        let desk = TransferDesk::open(store.clone(), SuggestionPolicy::default()).unwrap();
        desk.replace_snapshot(snapshot()).unwrap();
        (desk, store)
    }

    fn candidate(from: &str, to: &str, qty: u32) -> TransferCandidate {
        TransferCandidate::new("SKU1".into(), "Stan Smith", qty, from.into(), to.into())
    }

    #[test]
    fn test_empty_journal_is_valid() {
        let desk = TransferDesk::open(MemoryStore::new(), SuggestionPolicy::default()).unwrap();
        assert!(desk.requests().unwrap().is_empty());
        assert!(desk.inventory().unwrap().is_empty());
        assert!(desk.suggestions().unwrap().is_empty());
    }

    #[test]
    fn test_approve_requires_approver() {
        let (desk, _) = desk();
        let req = desk.submit(candidate("A", "B", 5), Some("storea@example.com")).unwrap();
        let err = desk.approve(&Role::store_manager("B"), req.id()).unwrap_err();
        assert!(matches!(
            err,
            TransferError::PermissionDenied {
                role: Role::StoreManager { .. },
                action: TransferAction::Approve,
            }
        ));
        assert_eq!(desk.request(req.id()).unwrap().status(), TransferStatus::Pending);
    }

    #[test]
    fn test_receive_scoped_to_destination_manager() {
        let (desk, _) = desk();
        let req = desk.submit(candidate("A", "B", 5), None).unwrap();
        desk.approve(&Role::Approver, req.id()).unwrap();

        assert!(matches!(
            desk.receive(&Role::store_manager("A"), req.id()),
            Err(TransferError::PermissionDenied { .. })
        ));
        assert!(matches!(
            desk.receive(&Role::Approver, req.id()),
            Err(TransferError::PermissionDenied { .. })
        ));
        let adj = desk.receive(&Role::store_manager("B"), req.id()).unwrap();
        assert_eq!(adj.destination_qty, 10);
    }

    #[test]
    fn test_receive_unknown_id() {
        let (desk, _) = desk();
        assert!(matches!(
            desk.receive(&Role::store_manager("B"), RequestId::new()),
            Err(TransferError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_pending_scopes() {
        let (desk, _) = desk();
        desk.submit(candidate("A", "B", 1), None).unwrap();
        desk.submit(candidate("B", "A", 1), None).unwrap();

        assert_eq!(desk.list_pending(&Role::Approver, None).unwrap().len(), 2);
        assert_eq!(
            desk.list_pending(&Role::Approver, Some(&StoreId::new("A"))).unwrap().len(),
            1
        );
        let manager_b = Role::store_manager("B");
        let visible = desk.list_pending(&manager_b, None).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].to_store().as_str(), "B");
        assert!(desk
            .list_pending(&manager_b, Some(&StoreId::new("A")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_journal_failure_leaves_state_untouched() {
        let (desk, store) = desk();
        let req = desk.submit(candidate("A", "B", 5), None).unwrap();
        desk.approve(&Role::Approver, req.id()).unwrap();
        let inventory_before = desk.inventory().unwrap();
        let journal_len = store.entries().len();

        store.set_fail_appends(true);
        let err = desk.receive(&Role::store_manager("B"), req.id()).unwrap_err();
        assert!(matches!(err, TransferError::Store(_)));
        assert!(!err.is_recoverable());
        assert_eq!(desk.request(req.id()).unwrap().status(), TransferStatus::Approved);
        assert_eq!(desk.inventory().unwrap(), inventory_before);
        assert_eq!(store.entries().len(), journal_len);

        store.set_fail_appends(false);
        desk.receive(&Role::store_manager("B"), req.id()).unwrap();
        assert_eq!(desk.request(req.id()).unwrap().status(), TransferStatus::Received);
    }

    #[test]
    fn test_rejected_command_not_journaled() {
        let (desk, store) = desk();
        let before = store.entries().len();
        assert!(desk.submit(candidate("A", "A", 5), None).is_err());
        assert!(desk.approve(&Role::Approver, RequestId::new()).is_err());
        assert_eq!(store.entries().len(), before);
    }

    #[test]
    fn test_receive_all_without_work_is_noop() {
        let (desk, store) = desk();
        let before = store.entries().len();
        let adjustments = desk
            .receive_all(&Role::store_manager("B"), &"B".into())
            .unwrap();
        assert!(adjustments.is_empty());
        assert_eq!(store.entries().len(), before);
    }

    #[test]
    fn test_store_inventory_view() {
        let (desk, _) = desk();
        let lines = desk.store_inventory(&"A".into()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].stock_qty, 20);
    }
}
