use crate::config::SuggestionPolicy;
use crate::core::inventory::{InventoryLine, InventorySnapshot};
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use crate::core::transfer::{TransferCandidate, TransferStatus};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A proposed transfer in the `Suggested` state.
///
/// Suggestions live outside the ledger; they become requests only when
/// submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub candidate: TransferCandidate,
    /// Sales velocity at the source store.
    pub source_velocity: Decimal,
    /// Sales velocity at the destination store.
    pub destination_velocity: Decimal,
    /// Stock the source held when the suggestion was made.
    pub source_stock: u32,
}

impl Suggestion {
    pub fn status(&self) -> TransferStatus {
        TransferStatus::Suggested
    }

    pub fn sku(&self) -> &Sku {
        &self.candidate.sku
    }

    pub fn qty(&self) -> u32 {
        self.candidate.qty
    }

    pub fn from_store(&self) -> &StoreId {
        &self.candidate.from_store
    }

    pub fn to_store(&self) -> &StoreId {
        &self.candidate.to_store
    }

    /// Zero-quantity suggestions (empty source) are reported but cannot be
    /// submitted.
    pub fn is_actionable(&self) -> bool {
        self.candidate.qty > 0
    }

    pub fn velocity_gap(&self) -> Decimal {
        self.destination_velocity - self.source_velocity
    }

    pub fn into_candidate(self) -> TransferCandidate {
        self.candidate
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: suggest transferring {} from {} → {}",
            self.candidate.sku, self.candidate.qty, self.candidate.from_store, self.candidate.to_store
        )
    }
}

/// Recommends moving stock from slow-selling to fast-selling stores.
///
/// # Examples
///
/// ```
/// use transfer_engine::core::inventory::{InventoryLine, InventorySnapshot};
/// use transfer_engine::engine::suggestion::SuggestionEngine;
/// use rust_decimal_macros::dec;
///
/// let snapshot = InventorySnapshot::from_lines(vec![
///     InventoryLine::new("Store A".into(), "EG4089".into(), "Runner", 20, dec!(5)),
///     InventoryLine::new("Store B".into(), "EG4089".into(), "Runner", 5, dec!(50)),
/// ])
/// .unwrap();
///
/// let suggestions = SuggestionEngine::default().generate(&snapshot);
/// assert_eq!(suggestions.len(), 1);
/// assert_eq!(suggestions[0].from_store().as_str(), "Store A");
/// assert_eq!(suggestions[0].to_store().as_str(), "Store B");
/// assert_eq!(suggestions[0].qty(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    policy: SuggestionPolicy,
}

impl SuggestionEngine {
    pub fn new(policy: SuggestionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SuggestionPolicy {
        &self.policy
    }

    /// Produce at most one suggestion per SKU.
    ///
    /// # Algorithm
    ///
    /// 1. Group lines by SKU; skip groups below `min_locations`.
    /// 2. Rank each group by sales velocity, ties by store id.
    /// 3. Slowest store is the source, fastest the destination.
    /// 4. Emit only if source velocity is strictly below destination.
    /// 5. Quantity = min(`max_transfer_qty`, source stock), possibly 0.
    ///
    /// Output is sorted by SKU. The snapshot is not modified.
    pub fn generate(&self, snapshot: &InventorySnapshot) -> Vec<Suggestion> {
        let mut groups: BTreeMap<&Sku, Vec<&InventoryLine>> = BTreeMap::new();
        for line in snapshot.lines() {
            groups.entry(&line.sku).or_default().push(line);
        }

        let mut suggestions = Vec::new();
        for (sku, mut lines) in groups {
            if lines.len() < self.policy.min_locations.max(2) {
                continue;
            }
            lines.sort_by(|a, b| {
                a.sales_last_week
                    .cmp(&b.sales_last_week)
                    .then_with(|| a.store.cmp(&b.store))
            });

            let (Some(source), Some(destination)) = (lines.first(), lines.last()) else {
                continue;
            };
            if source.sales_last_week >= destination.sales_last_week {
                continue;
            }

            let qty = self.policy.max_transfer_qty.min(source.stock_qty);
            debug!(
                "suggest {} x{} {} -> {} (velocity {} vs {})",
                sku,
                qty,
                source.store,
                destination.store,
                source.sales_last_week,
                destination.sales_last_week
            );
            suggestions.push(Suggestion {
                candidate: TransferCandidate::new(
                    sku.clone(),
                    source.product.clone(),
                    qty,
                    source.store.clone(),
                    destination.store.clone(),
                ),
                source_velocity: source.sales_last_week,
                destination_velocity: destination.sales_last_week,
                source_stock: source.stock_qty,
            });
        }
        suggestions
    }
}

/// Suggestions under the default policy (cap of 10 units).
pub fn generate_suggestions(snapshot: &InventorySnapshot) -> Vec<Suggestion> {
    SuggestionEngine::default().generate(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(store: &str, sku: &str, qty: u32, sales: Decimal) -> InventoryLine {
        InventoryLine::new(StoreId::new(store), Sku::new(sku), format!("{sku} product"), qty, sales)
    }

    fn snapshot(lines: Vec<InventoryLine>) -> InventorySnapshot {
        InventorySnapshot::from_lines(lines).unwrap()
    }

    #[test]
    fn test_basic_scenario() {
        let snap = snapshot(vec![
            line("A", "SKU1", 20, dec!(5)),
            line("B", "SKU1", 5, dec!(50)),
        ]);
        let suggestions = generate_suggestions(&snap);
        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.sku().as_str(), "SKU1");
        assert_eq!(s.from_store().as_str(), "A");
        assert_eq!(s.to_store().as_str(), "B");
        assert_eq!(s.qty(), 10);
        assert_eq!(s.status(), TransferStatus::Suggested);
        assert_eq!(s.velocity_gap(), dec!(45));
        assert_eq!(s.candidate.product, "SKU1 product");
    }

    #[test]
    fn test_quantity_bounded_by_source_stock() {
        let snap = snapshot(vec![
            line("A", "SKU1", 3, dec!(1)),
            line("B", "SKU1", 0, dec!(8)),
        ]);
        assert_eq!(generate_suggestions(&snap)[0].qty(), 3);
    }

    #[test]
    fn test_empty_source_yields_zero_quantity() {
        let snap = snapshot(vec![
            line("A", "SKU1", 0, dec!(1)),
            line("B", "SKU1", 4, dec!(8)),
        ]);
        let suggestions = generate_suggestions(&snap);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].qty(), 0);
        assert!(!suggestions[0].is_actionable());
    }

    #[test]
    fn test_tied_velocity_no_suggestion() {
        let snap = snapshot(vec![
            line("A", "SKU1", 20, dec!(7)),
            line("B", "SKU1", 20, dec!(7)),
        ]);
        assert!(generate_suggestions(&snap).is_empty());
    }

    #[test]
    fn test_single_location_skipped() {
        let snap = snapshot(vec![line("A", "SKU1", 20, dec!(7))]);
        assert!(generate_suggestions(&snap).is_empty());
    }

    #[test]
    fn test_extremes_of_three_stores() {
        let snap = snapshot(vec![
            line("A", "SKU1", 20, dec!(10)),
            line("B", "SKU1", 20, dec!(2)),
            line("C", "SKU1", 20, dec!(30)),
        ]);
        let s = &generate_suggestions(&snap)[0];
        assert_eq!(s.from_store().as_str(), "B");
        assert_eq!(s.to_store().as_str(), "C");
    }

    #[test]
    fn test_ties_broken_by_store() {
        // Two slowest stores tie: lowest store id is the source.
        // Two fastest stores tie: highest store id is the destination.
        let snap = snapshot(vec![
            line("D", "SKU1", 9, dec!(1)),
            line("A", "SKU1", 9, dec!(1)),
            line("B", "SKU1", 9, dec!(5)),
            line("C", "SKU1", 9, dec!(5)),
        ]);
        let s = &generate_suggestions(&snap)[0];
        assert_eq!(s.from_store().as_str(), "A");
        assert_eq!(s.to_store().as_str(), "C");
    }

    #[test]
    fn test_output_sorted_by_sku() {
        let snap = snapshot(vec![
            line("A", "ZZ9", 5, dec!(1)),
            line("B", "ZZ9", 5, dec!(2)),
            line("B", "AA1", 5, dec!(1)),
            line("A", "AA1", 5, dec!(2)),
            line("A", "MM5", 5, dec!(1)),
            line("C", "MM5", 5, dec!(2)),
        ]);
        let suggestions = generate_suggestions(&snap);
        let skus: Vec<&str> = suggestions
            .iter()
            .map(|s| s.sku().as_str())
            .collect();
        assert_eq!(skus, vec!["AA1", "MM5", "ZZ9"]);
    }

    #[test]
    fn test_configurable_cap() {
        let engine = SuggestionEngine::new(SuggestionPolicy {
            max_transfer_qty: 4,
            ..Default::default()
        });
        let snap = snapshot(vec![
            line("A", "SKU1", 20, dec!(5)),
            line("B", "SKU1", 5, dec!(50)),
        ]);
        assert_eq!(engine.generate(&snap)[0].qty(), 4);
    }

    #[test]
    fn test_min_locations_policy() {
        let engine = SuggestionEngine::new(SuggestionPolicy {
            min_locations: 3,
            ..Default::default()
        });
        let snap = snapshot(vec![
            line("A", "SKU1", 20, dec!(5)),
            line("B", "SKU1", 5, dec!(50)),
        ]);
        assert!(engine.generate(&snap).is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(generate_suggestions(&InventorySnapshot::new()).is_empty());
    }
}
