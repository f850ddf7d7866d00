use criterion::{black_box, criterion_group, criterion_main, Criterion};
use transfer_engine::core::transfer::TransferCandidate;
use transfer_engine::engine::ledger::TransferLedger;
use transfer_engine::engine::suggestion::SuggestionEngine;
use transfer_engine::simulation::snapshot_gen::{generate_random_snapshot, SnapshotConfig};

fn bench_suggestions_3_stores(c: &mut Criterion) {
    let snapshot = generate_random_snapshot(&SnapshotConfig::default());
    let engine = SuggestionEngine::default();

    c.bench_function("suggestions_3_stores_50_skus", |b| {
        b.iter(|| engine.generate(black_box(&snapshot)))
    });
}

fn bench_suggestions_20_stores(c: &mut Criterion) {
    let config = SnapshotConfig {
        store_count: 20,
        sku_count: 2_000,
        ..Default::default()
    };
    let snapshot = generate_random_snapshot(&config);
    let engine = SuggestionEngine::default();

    c.bench_function("suggestions_20_stores_2000_skus", |b| {
        b.iter(|| engine.generate(black_box(&snapshot)))
    });
}

fn bench_receive_all(c: &mut Criterion) {
    let config = SnapshotConfig {
        store_count: 10,
        sku_count: 500,
        ..Default::default()
    };
    let snapshot = generate_random_snapshot(&config);
    let engine = SuggestionEngine::default();

    let mut ledger = TransferLedger::new();
    for suggestion in engine.generate(&snapshot) {
        let candidate: TransferCandidate = suggestion.into_candidate();
        let id = match ledger.submit(candidate, None) {
            Ok(request) => request.id(),
            Err(_) => continue,
        };
        let _ = ledger.approve(id);
    }
    let stores = snapshot.stores();

    c.bench_function("receive_all_10_stores", |b| {
        b.iter(|| {
            let mut ledger = ledger.clone();
            let mut inventory = snapshot.clone();
            for store in &stores {
                let _ = ledger.receive_all(black_box(store), &mut inventory);
            }
            inventory
        })
    });
}

criterion_group!(
    benches,
    bench_suggestions_3_stores,
    bench_suggestions_20_stores,
    bench_receive_all
);
criterion_main!(benches);
