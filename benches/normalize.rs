use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use encoding_rs::UTF_8;
use tempfile::TempDir;
use ware_review::{
    address::AddressNormalizer, clean, config::ReportConfig, record::RawTable, standardize,
};

const ADDRESSES: [&str; 4] = [
    "3700 beacon ave apartment 140 ,seattle,wa 98144",
    "12 Elm Street  Suite 4,  Portland ,or",
    "500 Pine St, Seattle, Wa",
    "3700 BEACON AVE A140, SEATTLE, WA 98144",
];

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(
        file,
        "Order Date,Shipping Address,Item Description,Category,Quantity,Unit Price,Total Price"
    )
    .expect("header");
    for i in 0..rows {
        let address = ADDRESSES[i % ADDRESSES.len()];
        let day = (i % 28) + 1;
        let month = (i % 3) + 1;
        let cents = (i * 37) % 150_000;
        writeln!(
            file,
            "2025-{month:02}-{day:02},\"{address}\",Item {i},Cat {},1,{}.{:02},{}.{:02}",
            i % 12,
            cents / 100,
            cents % 100,
            cents / 100,
            cents % 100
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_normalize(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_orders(50_000);
    let merged = RawTable::read(&csv_path, b',', UTF_8).expect("read orders");
    let normalizer = AddressNormalizer::new().expect("normalizer");
    let cutoff = NaiveDate::from_ymd_opt(2025, 12, 31).expect("date");
    let config = ReportConfig::default();

    let mut group = c.benchmark_group("review");

    group.bench_function("normalize_addresses", |b| {
        b.iter(|| {
            for address in ADDRESSES {
                std::hint::black_box(normalizer.normalize_str(address));
            }
        });
    });

    group.bench_function("standardize_table", |b| {
        b.iter_batched(
            || (),
            |_| {
                standardize::standardize_table(&merged, &normalizer).expect("standardize");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("clean_table", |b| {
        b.iter_batched(
            || (),
            |_| {
                clean::clean_table(&merged, cutoff, &config.uncategorized_label).expect("clean");
            },
            BatchSize::SmallInput,
        );
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
