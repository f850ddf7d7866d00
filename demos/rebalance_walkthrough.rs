//! End-to-end rebalancing walkthrough.
//!
//! Loads a three-store listing, prints the suggested transfers, then pushes
//! one of them through submission, approval and receipt on an in-memory
//! journal.

use rust_decimal_macros::dec;
use transfer_engine::config::SuggestionPolicy;
use transfer_engine::core::inventory::{InventorySnapshot, SalesRecord, StockRecord};
use transfer_engine::core::role::Role;
use transfer_engine::core::sku::Sku;
use transfer_engine::core::store::StoreId;
use transfer_engine::persistence::journal::MemoryStore;
use transfer_engine::service::desk::TransferDesk;

fn stock(store: &str, sku: &str, product: &str, qty: u32) -> StockRecord {
    StockRecord {
        store: StoreId::new(store),
        sku: Sku::new(sku),
        product: product.to_string(),
        stock_qty: qty,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("╔══════════════════════════════════════════════╗");
    println!("║  transfer-engine: Rebalancing Walkthrough    ║");
    println!("╚══════════════════════════════════════════════╝\n");

    // --- Step 1: load listings ---
    println!("━━━ Step 1: Inventory ━━━\n");

    let stock_rows = vec![
        stock("Store A", "EG4089", "Runner Low", 20),
        stock("Store B", "EG4089", "Runner Low", 5),
        stock("Store C", "EG4089", "Runner Low", 12),
        stock("Store A", "FW2545", "Court Mid", 3),
        stock("Store B", "FW2545", "Court Mid", 14),
        stock("Store C", "S24039", "Trail Pro", 9),
    ];
    let sales_rows = vec![
        SalesRecord {
            store: StoreId::new("Store A"),
            sku: Sku::new("EG4089"),
            sales_last_week: dec!(2),
        },
        SalesRecord {
            store: StoreId::new("Store B"),
            sku: Sku::new("EG4089"),
            sales_last_week: dec!(18),
        },
        SalesRecord {
            store: StoreId::new("Store C"),
            sku: Sku::new("EG4089"),
            sales_last_week: dec!(7),
        },
        SalesRecord {
            store: StoreId::new("Store A"),
            sku: Sku::new("FW2545"),
            sales_last_week: dec!(11),
        },
    ];
    let snapshot = InventorySnapshot::merge(stock_rows, sales_rows)?;
    for line in snapshot.lines() {
        println!(
            "  {:<8} {:<7} {:<11} stock {:>3}  sold {:>3}",
            line.store, line.sku, line.product, line.stock_qty, line.sales_last_week
        );
    }
    println!();

    let desk = TransferDesk::open(MemoryStore::new(), SuggestionPolicy::default())?;
    desk.replace_snapshot(snapshot)?;

    // --- Step 2: suggestions ---
    println!("━━━ Step 2: Suggested Transfers ━━━\n");

    let suggestions = desk.suggestions()?;
    for s in &suggestions {
        println!("  {}", s);
    }
    println!();

    // --- Step 3: workflow ---
    println!("━━━ Step 3: Submit → Approve → Receive ━━━\n");

    let Some(first) = suggestions.into_iter().find(|s| s.is_actionable()) else {
        println!("  nothing to move");
        return Ok(());
    };
    let request = desk.submit_suggestion(&first, Some("Store A manager"))?;
    println!("  submitted  {} [{}]", request.id(), request.status());

    let approved = desk.approve(&Role::Approver, request.id())?;
    println!("  approved   {} [{}]", approved.id(), approved.status());

    let receiver = Role::store_manager(request.to_store().clone());
    let adjustment = desk.receive(&receiver, request.id())?;
    println!(
        "  received   {} units of {} at {} (source shortfall {})",
        adjustment.received,
        adjustment.sku,
        adjustment.to_store,
        adjustment.shortfall()
    );
    println!();

    // --- Step 4: resulting stock ---
    println!("━━━ Step 4: Stock After Receipt ━━━\n");

    let inventory = desk.inventory()?;
    for store in [request.from_store(), request.to_store()] {
        println!(
            "  {:<8} {:<7} stock {:>3}",
            store,
            request.sku(),
            inventory.stock(store, request.sku())
        );
    }

    Ok(())
}
