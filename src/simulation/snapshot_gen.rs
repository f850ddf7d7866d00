//! Random inventory snapshots for benchmarks and tests.

use crate::core::inventory::{InventoryLine, InventorySnapshot};
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use rand::Rng;
use rust_decimal::Decimal;

/// Shape of a generated snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub store_count: usize,
    pub sku_count: usize,
    /// Probability that a given store carries a given SKU.
    pub coverage: f64,
    pub max_stock: u32,
    /// Upper bound on weekly sales, in whole units.
    pub max_sales: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            store_count: 3,
            sku_count: 50,
            coverage: 0.8,
            max_stock: 40,
            max_sales: 60,
        }
    }
}

/// Generate a random snapshot. Keys are unique by construction.
pub fn generate_random_snapshot(config: &SnapshotConfig) -> InventorySnapshot {
    let mut rng = rand::thread_rng();
    let stores: Vec<StoreId> = (0..config.store_count)
        .map(|i| StoreId::new(format!("STORE-{:03}", i)))
        .collect();

    let mut snapshot = InventorySnapshot::new();
    for s in 0..config.sku_count {
        let sku = Sku::new(format!("SKU-{:05}", s));
        for store in &stores {
            if !rng.gen_bool(config.coverage.clamp(0.0, 1.0)) {
                continue;
            }
            snapshot.insert(InventoryLine::new(
                store.clone(),
                sku.clone(),
                format!("Product {}", s),
                rng.gen_range(0..=config.max_stock),
                Decimal::from(rng.gen_range(0..=config.max_sales)),
            ));
        }
    }
    snapshot
}
