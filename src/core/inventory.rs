use crate::core::error::ValidationError;
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Stock and recent demand for one SKU at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub store: StoreId,
    pub sku: Sku,
    pub product: String,
    pub stock_qty: u32,
    /// Units sold over the trailing week; the velocity used for ranking.
    pub sales_last_week: Decimal,
}

impl InventoryLine {
    pub fn new(
        store: StoreId,
        sku: Sku,
        product: impl Into<String>,
        stock_qty: u32,
        sales_last_week: Decimal,
    ) -> Self {
        Self {
            store,
            sku,
            product: product.into(),
            stock_qty,
            sales_last_week,
        }
    }

    fn key(&self) -> (StoreId, Sku) {
        (self.store.clone(), self.sku.clone())
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.sales_last_week < Decimal::ZERO {
            return Err(ValidationError::NegativeSales {
                store: self.store.clone(),
                sku: self.sku.clone(),
                sales: self.sales_last_week,
            });
        }
        Ok(())
    }
}

/// One row of a stock listing, before sales are joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub store: StoreId,
    pub sku: Sku,
    pub product: String,
    pub stock_qty: u32,
}

/// One row of a sales listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub store: StoreId,
    pub sku: Sku,
    pub sales_last_week: Decimal,
}

/// Current inventory across all stores, keyed by `(store, sku)`.
///
/// Snapshots are replaced wholesale when new data is loaded; the only
/// in-place mutation is receipt reconciliation.
///
/// # Examples
///
/// ```
/// use transfer_engine::core::inventory::{InventorySnapshot, SalesRecord, StockRecord};
/// use transfer_engine::core::sku::Sku;
/// use transfer_engine::core::store::StoreId;
/// use rust_decimal_macros::dec;
///
/// let stock = vec![StockRecord {
///     store: StoreId::new("Store A"),
///     sku: Sku::new("FW2545"),
///     product: "Court Mid".to_string(),
///     stock_qty: 12,
/// }];
/// let sales = vec![SalesRecord {
///     store: StoreId::new("Store A"),
///     sku: Sku::new("FW2545"),
///     sales_last_week: dec!(3),
/// }];
///
/// let snapshot = InventorySnapshot::merge(stock, sales).unwrap();
/// let line = snapshot.line(&StoreId::new("Store A"), &Sku::new("FW2545")).unwrap();
/// assert_eq!(line.stock_qty, 12);
/// assert_eq!(line.sales_last_week, dec!(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(with = "lines_serde")]
    lines: BTreeMap<(StoreId, Sku), InventoryLine>,
}

mod lines_serde {
    use super::*;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::ser::SerializeSeq;

    pub fn serialize<S: serde::Serializer>(
        lines: &BTreeMap<(StoreId, Sku), InventoryLine>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(lines.len()))?;
        for line in lines.values() {
            seq.serialize_element(line)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(StoreId, Sku), InventoryLine>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = BTreeMap<(StoreId, Sku), InventoryLine>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a list of inventory lines")
            }
            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = BTreeMap::new();
                while let Some(line) = access.next_element::<InventoryLine>()? {
                    line.check().map_err(de::Error::custom)?;
                    if map.insert(line.key(), line.clone()).is_some() {
                        return Err(de::Error::custom(ValidationError::DuplicateLine {
                            store: line.store,
                            sku: line.sku,
                        }));
                    }
                }
                Ok(map)
            }
        }
        deserializer.deserialize_seq(V)
    }
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from uploaded lines.
    ///
    /// Rejects negative velocities and repeated `(store, sku)` keys.
    pub fn from_lines(
        lines: impl IntoIterator<Item = InventoryLine>,
    ) -> Result<Self, ValidationError> {
        let mut snapshot = Self::new();
        for line in lines {
            line.check()?;
            let key = line.key();
            if snapshot.lines.contains_key(&key) {
                return Err(ValidationError::DuplicateLine {
                    store: key.0,
                    sku: key.1,
                });
            }
            snapshot.lines.insert(key, line);
        }
        Ok(snapshot)
    }

    /// Join a stock listing with a sales listing on `(store, sku)`.
    ///
    /// Every stock row yields one line. Stock rows without sales get a
    /// velocity of zero; sales rows without stock are dropped. Several sales
    /// rows for the same key are summed.
    pub fn merge(
        stock: impl IntoIterator<Item = StockRecord>,
        sales: impl IntoIterator<Item = SalesRecord>,
    ) -> Result<Self, ValidationError> {
        let mut velocity: BTreeMap<(StoreId, Sku), Decimal> = BTreeMap::new();
        for record in sales {
            *velocity
                .entry((record.store, record.sku))
                .or_insert(Decimal::ZERO) += record.sales_last_week;
        }

        Self::from_lines(stock.into_iter().map(|s| {
            let sales_last_week = velocity
                .get(&(s.store.clone(), s.sku.clone()))
                .copied()
                .unwrap_or(Decimal::ZERO);
            InventoryLine {
                store: s.store,
                sku: s.sku,
                product: s.product,
                stock_qty: s.stock_qty,
                sales_last_week,
            }
        }))
    }

    /// Look up the line for a store and SKU.
    pub fn line(&self, store: &StoreId, sku: &Sku) -> Option<&InventoryLine> {
        self.lines.get(&(store.clone(), sku.clone()))
    }

    pub(crate) fn line_mut(&mut self, store: &StoreId, sku: &Sku) -> Option<&mut InventoryLine> {
        self.lines.get_mut(&(store.clone(), sku.clone()))
    }

    pub(crate) fn insert(&mut self, line: InventoryLine) {
        self.lines.insert(line.key(), line);
    }

    /// Stock on hand for a store and SKU; zero when the line does not exist.
    pub fn stock(&self, store: &StoreId, sku: &Sku) -> u32 {
        self.line(store, sku).map(|l| l.stock_qty).unwrap_or(0)
    }

    /// All lines, ordered by store then SKU.
    pub fn lines(&self) -> impl Iterator<Item = &InventoryLine> {
        self.lines.values()
    }

    /// Lines held by a single store (the store dashboard view).
    pub fn lines_for_store(&self, store: &StoreId) -> Vec<&InventoryLine> {
        self.lines
            .values()
            .filter(|l| &l.store == store)
            .collect()
    }

    /// All stores present in the snapshot.
    pub fn stores(&self) -> Vec<StoreId> {
        self.lines
            .keys()
            .map(|(store, _)| store.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total units of a SKU across all stores.
    pub fn total_stock(&self, sku: &Sku) -> u64 {
        self.lines
            .values()
            .filter(|l| &l.sku == sku)
            .map(|l| u64::from(l.stock_qty))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(store: &str, sku: &str, qty: u32, sales: Decimal) -> InventoryLine {
        InventoryLine::new(StoreId::new(store), Sku::new(sku), "Product", qty, sales)
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = InventorySnapshot::from_lines(vec![
            line("A", "SKU1", 20, dec!(5)),
            line("B", "SKU1", 5, dec!(50)),
        ])
        .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.stock(&StoreId::new("A"), &Sku::new("SKU1")), 20);
        assert_eq!(snapshot.stock(&StoreId::new("C"), &Sku::new("SKU1")), 0);
        assert_eq!(snapshot.total_stock(&Sku::new("SKU1")), 25);
    }

    #[test]
    fn test_duplicate_line_rejected() {
        let err = InventorySnapshot::from_lines(vec![
            line("A", "SKU1", 1, dec!(0)),
            line("A", "SKU1", 2, dec!(0)),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateLine { .. }));
    }

    #[test]
    fn test_negative_sales_rejected() {
        let err = InventorySnapshot::from_lines(vec![line("A", "SKU1", 1, dec!(-1))]).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeSales { .. }));
    }

    #[test]
    fn test_merge_left_join() {
        let stock = vec![
            StockRecord {
                store: "A".into(),
                sku: "SKU1".into(),
                product: "Stan Smith".into(),
                stock_qty: 10,
            },
            StockRecord {
                store: "B".into(),
                sku: "SKU1".into(),
                product: "Stan Smith".into(),
                stock_qty: 4,
            },
        ];
        let sales = vec![
            SalesRecord {
                store: "A".into(),
                sku: "SKU1".into(),
                sales_last_week: dec!(3),
            },
            SalesRecord {
                store: "A".into(),
                sku: "SKU1".into(),
                sales_last_week: dec!(2),
            },
            SalesRecord {
                store: "C".into(),
                sku: "SKU1".into(),
                sales_last_week: dec!(9),
            },
        ];
        let snapshot = InventorySnapshot::merge(stock, sales).unwrap();
        assert_eq!(snapshot.len(), 2);
        let a = snapshot.line(&StoreId::new("A"), &Sku::new("SKU1")).unwrap();
        assert_eq!(a.sales_last_week, dec!(5));
        let b = snapshot.line(&StoreId::new("B"), &Sku::new("SKU1")).unwrap();
        assert_eq!(b.sales_last_week, Decimal::ZERO);
        assert!(snapshot.line(&StoreId::new("C"), &Sku::new("SKU1")).is_none());
    }

    #[test]
    fn test_store_views() {
        let snapshot = InventorySnapshot::from_lines(vec![
            line("B", "SKU2", 1, dec!(1)),
            line("A", "SKU1", 1, dec!(1)),
            line("B", "SKU1", 1, dec!(1)),
        ])
        .unwrap();
        assert_eq!(snapshot.stores(), vec![StoreId::new("A"), StoreId::new("B")]);
        assert_eq!(snapshot.lines_for_store(&StoreId::new("B")).len(), 2);
    }

    #[test]
    fn test_serde_as_line_list() {
        let snapshot = InventorySnapshot::from_lines(vec![line("A", "SKU1", 3, dec!(1.5))]).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.starts_with("{\"lines\":["));
        let back: InventorySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_serde_rejects_duplicates() {
        let json = r#"{"lines":[
            {"store":"A","sku":"S","product":"p","stock_qty":1,"sales_last_week":"0"},
            {"store":"A","sku":"S","product":"p","stock_qty":2,"sales_last_week":"0"}
        ]}"#;
        assert!(serde_json::from_str::<InventorySnapshot>(json).is_err());
    }
}
