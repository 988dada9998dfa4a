//! Benchmark suite for batch splitting
//!
//! Measures the greedy first-fit splitter on its own and the full engine
//! pipeline (resolve, aggregate, split, persist, report) using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Groups are generated deterministically: item prices cycle through a fixed
//! set of amounts that stay below the payout limit after conversion, so every
//! run splits the same input.

use payout_engine::core::aggregator::{CurrencyGroup, GroupKey, GroupLine};
use payout_engine::core::{
    BatchSplitter, CurrencyConverter, FixedPayoutLimit, InMemoryCatalog, InMemoryLedger,
    PayoutEngine,
};
use payout_engine::types::{Currency, Item, Seller, SoldItemRef};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    divan::main();
}

const PRICES: [i64; 7] = [4999, 12550, 30000, 7525, 61000, 250, 79900];

fn seller() -> Seller {
    Seller {
        id: 1,
        name: "Price-Kunze".to_string(),
        base_currency: Currency::new("USD"),
    }
}

fn group(lines: usize, quantity: u32) -> CurrencyGroup {
    let lines: Vec<GroupLine> = (0..lines)
        .map(|i| {
            let price = Decimal::new(PRICES[i % PRICES.len()], 2);
            GroupLine {
                item_id: i as u64 + 1,
                channel_item_code: format!("ITEM_{}", i),
                name: format!("Item {}", i),
                unit_amount: price,
                unit_converted_amount: price,
                quantity,
            }
        })
        .collect();

    let total: Decimal = lines.iter().map(|l| l.total_amount().unwrap()).sum();
    CurrencyGroup {
        key: GroupKey {
            seller_id: 1,
            original_currency: Currency::new("USD"),
            converted_currency: Currency::new("USD"),
        },
        seller: seller(),
        lines,
        total_original_amount: total,
        total_converted_amount: total,
    }
}

/// Split groups of single-unit items
#[divan::bench(args = [10, 100, 1000])]
fn split_single_units(bencher: divan::Bencher, lines: usize) {
    let splitter = BatchSplitter::new(Decimal::ONE_THOUSAND).unwrap();
    let group = group(lines, 1);

    bencher.bench(|| splitter.split(divan::black_box(&group)).unwrap());
}

/// Split groups whose items carry many units each
#[divan::bench(args = [10, 100, 1000])]
fn split_high_quantity(bencher: divan::Bencher, lines: usize) {
    let splitter = BatchSplitter::new(Decimal::ONE_THOUSAND).unwrap();
    let group = group(lines, 25);

    bencher.bench(|| splitter.split(divan::black_box(&group)).unwrap());
}

/// Full request through the engine with an in-memory ledger
#[divan::bench(args = [10, 100, 1000])]
fn engine_request(bencher: divan::Bencher, items: usize) {
    let mut catalog = InMemoryCatalog::new();
    catalog.insert_seller(seller()).unwrap();
    let mut refs = Vec::with_capacity(items);
    for i in 0..items {
        let code = format!("ITEM_{}", i);
        catalog
            .insert_item(Item {
                id: i as u64 + 1,
                seller_id: 1,
                name: format!("Item {}", i),
                channel_item_code: code.clone(),
                price_amount: Decimal::new(PRICES[i % PRICES.len()], 2),
                price_currency: Currency::new(if i % 2 == 0 { "USD" } else { "EUR" }),
                quantity: 2,
            })
            .unwrap();
        refs.push(SoldItemRef::new(1, &code));
    }

    let engine = PayoutEngine::new(
        catalog,
        CurrencyConverter::default(),
        Arc::new(FixedPayoutLimit::default()),
        InMemoryLedger::new(),
    );

    bencher.bench(|| engine.process(divan::black_box(&refs)).unwrap());
}
