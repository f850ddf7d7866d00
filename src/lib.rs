//! # transfer-engine
//!
//! Store-to-store stock rebalancing for a small network of retail locations.
//!
//! Given an inventory snapshot (stock and weekly sales per store and SKU),
//! the engine suggests moving units from slow-selling stores to fast-selling
//! ones, and tracks each transfer request through submission, approval and
//! receipt, updating inventory when goods arrive.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: stores, SKUs, inventory, requests, roles, errors
//! - **engine** — Suggestion engine, request ledger, receipt reconciliation
//! - **persistence** — Append-only journal and its backends
//! - **service** — `TransferDesk`, the thread-safe command façade
//! - **simulation** — Random snapshot generation
//! - **config** — Policy and journal settings

pub mod config;
pub mod core;
pub mod engine;
pub mod persistence;
pub mod service;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{EngineConfig, SuggestionPolicy};
    pub use crate::core::error::{ReconciliationError, TransferError, ValidationError};
    pub use crate::core::inventory::{InventoryLine, InventorySnapshot, SalesRecord, StockRecord};
    pub use crate::core::role::Role;
    pub use crate::core::sku::Sku;
    pub use crate::core::store::StoreId;
    pub use crate::core::transfer::{
        RequestId, TransferCandidate, TransferRequest, TransferStatus,
    };
    pub use crate::engine::ledger::TransferLedger;
    pub use crate::engine::reconciliation::{apply_receipt, ReceiptAdjustment};
    pub use crate::engine::suggestion::{generate_suggestions, Suggestion, SuggestionEngine};
    pub use crate::persistence::journal::{JournalEntry, MemoryStore, TransferStore};
    pub use crate::persistence::json_lines::JsonLinesStore;
    pub use crate::service::desk::TransferDesk;
}
