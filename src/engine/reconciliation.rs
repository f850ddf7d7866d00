use crate::core::error::ReconciliationError;
use crate::core::inventory::{InventoryLine, InventorySnapshot};
use crate::core::sku::Sku;
use crate::core::store::StoreId;
use crate::core::transfer::{RequestId, TransferRequest};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The inventory movement produced by receiving one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAdjustment {
    pub request_id: RequestId,
    pub sku: Sku,
    pub from_store: StoreId,
    pub to_store: StoreId,
    /// Units added at the destination.
    pub received: u32,
    /// Units actually removed from the source.
    pub removed: u32,
    pub destination_qty: u32,
    pub source_qty: u32,
}

impl ReceiptAdjustment {
    /// Units the source was asked for but did not hold.
    pub fn shortfall(&self) -> u32 {
        self.received - self.removed
    }
}

/// Move a received request's quantity into the destination store.
///
/// The destination line gains `qty` (created with zero velocity if missing).
/// The source line loses `qty`, floored at zero. The snapshot is left
/// untouched when an error is returned.
///
/// This function does not look at the request's status: running it exactly
/// once per receipt is the ledger's job.
pub fn apply_receipt(
    snapshot: &mut InventorySnapshot,
    request: &TransferRequest,
) -> Result<ReceiptAdjustment, ReconciliationError> {
    let qty = request.qty();
    let current = snapshot.stock(request.to_store(), request.sku());
    let destination_qty =
        current
            .checked_add(qty)
            .ok_or_else(|| ReconciliationError::QuantityOverflow {
                store: request.to_store().clone(),
                sku: request.sku().clone(),
                current,
                qty,
            })?;

    match snapshot.line_mut(request.to_store(), request.sku()) {
        Some(line) => line.stock_qty = destination_qty,
        None => snapshot.insert(InventoryLine::new(
            request.to_store().clone(),
            request.sku().clone(),
            request.product(),
            destination_qty,
            Decimal::ZERO,
        )),
    }

    let (removed, source_qty) = match snapshot.line_mut(request.from_store(), request.sku()) {
        Some(line) => {
            let removed = line.stock_qty.min(qty);
            line.stock_qty -= removed;
            (removed, line.stock_qty)
        }
        None => (0, 0),
    };

    let adjustment = ReceiptAdjustment {
        request_id: request.id(),
        sku: request.sku().clone(),
        from_store: request.from_store().clone(),
        to_store: request.to_store().clone(),
        received: qty,
        removed,
        destination_qty,
        source_qty,
    };
    if adjustment.shortfall() > 0 {
        warn!(
            "request {}: {} held only {} of {} units of {}",
            request.id(),
            request.from_store(),
            removed,
            qty,
            request.sku()
        );
    }
    Ok(adjustment)
}
