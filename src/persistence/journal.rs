//! Append-only journal of ledger and inventory mutations.
//!
//! The desk never overwrites stored state. Each committed command becomes one
//! [`JournalEntry`]; replaying the entries in order through the same state
//! machine reproduces the ledger and the snapshot.

use crate::core::error::TransferError;
use crate::core::inventory::InventorySnapshot;
use crate::core::transfer::{RequestId, TransferAction, TransferRequest};
use crate::engine::ledger::{StagedReceipts, TransferLedger};
use crate::engine::reconciliation::ReceiptAdjustment;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// One durable mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    /// A new snapshot replaced the previous one wholesale.
    SnapshotReplaced {
        snapshot: InventorySnapshot,
        at: DateTime<Utc>,
    },
    Submitted {
        request: TransferRequest,
    },
    Approved {
        id: RequestId,
        at: DateTime<Utc>,
    },
    Denied {
        id: RequestId,
        at: DateTime<Utc>,
    },
    /// One or more receipts applied together with their inventory updates.
    Received {
        ids: Vec<RequestId>,
        at: DateTime<Utc>,
    },
}

impl JournalEntry {
    /// Apply this entry to in-memory state, returning the inventory
    /// adjustments of any receipts it carries.
    ///
    /// On error neither `ledger` nor `inventory` is modified.
    pub fn apply(
        &self,
        ledger: &mut TransferLedger,
        inventory: &mut InventorySnapshot,
    ) -> Result<Vec<ReceiptAdjustment>, TransferError> {
        Ok(self.stage(ledger, inventory)?.commit(ledger, inventory))
    }

    /// Check this entry against current state without changing it.
    pub(crate) fn stage(
        &self,
        ledger: &TransferLedger,
        inventory: &InventorySnapshot,
    ) -> Result<Staged, TransferError> {
        let staged = match self {
            JournalEntry::SnapshotReplaced { snapshot, .. } => Staged::Snapshot(snapshot.clone()),
            JournalEntry::Submitted { request } => {
                ledger.check_insert(request)?;
                Staged::Insert(request.clone())
            }
            JournalEntry::Approved { id, at } => Staged::Advance {
                idx: ledger.check(*id, TransferAction::Approve)?,
                action: TransferAction::Approve,
                at: *at,
            },
            JournalEntry::Denied { id, at } => Staged::Advance {
                idx: ledger.check(*id, TransferAction::Deny)?,
                action: TransferAction::Deny,
                at: *at,
            },
            JournalEntry::Received { ids, at } => Staged::Receipts {
                receipts: ledger.stage_receipts(ids, inventory)?,
                at: *at,
            },
        };
        Ok(staged)
    }
}

/// A journal entry that has been checked and only needs applying.
#[derive(Debug)]
pub(crate) enum Staged {
    Snapshot(InventorySnapshot),
    Insert(TransferRequest),
    Advance {
        idx: usize,
        action: TransferAction,
        at: DateTime<Utc>,
    },
    Receipts {
        receipts: StagedReceipts,
        at: DateTime<Utc>,
    },
}

impl Staged {
    /// Apply to the state the entry was staged against.
    pub(crate) fn commit(
        self,
        ledger: &mut TransferLedger,
        inventory: &mut InventorySnapshot,
    ) -> Vec<ReceiptAdjustment> {
        match self {
            Staged::Snapshot(snapshot) => *inventory = snapshot,
            Staged::Insert(request) => ledger.push(request),
            Staged::Advance { idx, action, at } => {
                ledger.advance(idx, action, at);
            }
            Staged::Receipts { receipts, at } => {
                return ledger.commit_receipts(receipts, inventory, at)
            }
        }
        Vec::new()
    }
}

/// Rebuild ledger and snapshot from a journal. An empty journal yields an
/// empty ledger and an empty snapshot.
pub fn replay(
    entries: &[JournalEntry],
) -> Result<(TransferLedger, InventorySnapshot), TransferError> {
    let mut ledger = TransferLedger::new();
    let mut inventory = InventorySnapshot::new();
    for entry in entries {
        entry.apply(&mut ledger, &mut inventory)?;
    }
    debug!(
        "replayed {} journal entries: {} requests, {} inventory lines",
        entries.len(),
        ledger.len(),
        inventory.len()
    );
    Ok((ledger, inventory))
}

/// Errors raised by a journal backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("journal entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt journal entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
    #[error("journal unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for journal entries.
///
/// `append` must be durable when it returns `Ok`; the desk only exposes a
/// mutation after its entry has been appended.
pub trait TransferStore: Send {
    fn load(&mut self) -> Result<Vec<JournalEntry>, StoreError>;
    fn append(&mut self, entry: &JournalEntry) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryJournal {
    entries: Vec<JournalEntry>,
    fail_appends: bool,
}

/// In-memory journal. Clones share the same entries, so a test can keep a
/// handle after moving the store into a desk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryJournal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryJournal {
                entries,
                fail_appends: false,
            })),
        }
    }

    /// Copy of everything appended so far.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.inner
            .lock()
            .map(|j| j.entries.clone())
            .unwrap_or_default()
    }

    /// Make subsequent appends fail, simulating an unavailable backend.
    pub fn set_fail_appends(&self, fail: bool) {
        if let Ok(mut journal) = self.inner.lock() {
            journal.fail_appends = fail;
        }
    }
}

impl TransferStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<JournalEntry>, StoreError> {
        let journal = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory journal lock poisoned".to_string()))?;
        Ok(journal.entries.clone())
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut journal = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory journal lock poisoned".to_string()))?;
        if journal.fail_appends {
            return Err(StoreError::Unavailable("appends disabled".to_string()));
        }
        journal.entries.push(entry.clone());
        Ok(())
    }
}
