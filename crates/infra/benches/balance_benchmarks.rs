use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use stockbook_core::{LocationId, MovementId, ProductId};
use stockbook_locations::Location;
use stockbook_movements::{balance_report, net_by_product_location, Movement};
use stockbook_products::Product;

const PRODUCTS: usize = 20;
const LOCATIONS: usize = 10;

fn synthetic_ledger(len: usize) -> (Vec<Product>, Vec<Location>, Vec<Movement>) {
    let products: Vec<Product> = (0..PRODUCTS)
        .map(|i| {
            Product::new(
                ProductId::new(format!("P{i:03}")).unwrap(),
                format!("Product {i}"),
                "",
            )
            .unwrap()
        })
        .collect();

    let locations: Vec<Location> = (0..LOCATIONS)
        .map(|i| {
            Location::new(
                LocationId::new(format!("L{i:02}")).unwrap(),
                format!("Location {i}"),
                "",
            )
            .unwrap()
        })
        .collect();

    // Deterministic mix of inbound / transfer / outbound movements.
    let movements: Vec<Movement> = (0..len)
        .map(|i| {
            let id = MovementId::new(format!("M{i:06}")).unwrap();
            let product = products[i % PRODUCTS].id().clone();
            let a = locations[i % LOCATIONS].id().clone();
            let b = locations[(i + 1) % LOCATIONS].id().clone();
            match i % 3 {
                0 => Movement::new(id, Utc::now(), None, Some(a), product, 100).unwrap(),
                1 => Movement::new(id, Utc::now(), Some(a), Some(b), product, 10).unwrap(),
                _ => Movement::new(id, Utc::now(), Some(a), None, product, 5).unwrap(),
            }
        })
        .collect();

    (products, locations, movements)
}

fn bench_grouped_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("net_by_product_location");
    for len in [1_000usize, 10_000, 100_000] {
        let (_, _, movements) = synthetic_ledger(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &movements, |b, movements| {
            b.iter(|| net_by_product_location(movements.iter()));
        });
    }
    group.finish();
}

fn bench_balance_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_report");
    for len in [1_000usize, 10_000, 100_000] {
        let (products, locations, movements) = synthetic_ledger(len);
        group.bench_with_input(
            BenchmarkId::from_parameter(len),
            &(products, locations, movements),
            |b, (products, locations, movements)| {
                b.iter(|| balance_report(products, locations, movements));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_grouped_pass, bench_balance_report);
criterion_main!(benches);
