pub mod ledger;
pub mod reconciliation;
pub mod suggestion;
