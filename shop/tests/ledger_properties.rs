//! Property tests for the cart ledger.

#![allow(clippy::unwrap_used)]

use cartflow_shop::cart::CartLedger;
use cartflow_shop::catalog::Catalog;
use cartflow_shop::types::{CatalogItem, ProductId};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    SetQuantity(usize, i64),
}

fn catalog_items() -> Vec<CatalogItem> {
    Catalog::baseline().items().to_vec()
}

/// Index into the baseline catalog, plus one id that is never in it
fn arb_index() -> impl Strategy<Value = usize> {
    0..=catalog_items().len()
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_index().prop_map(Op::Add),
        1 => arb_index().prop_map(Op::Remove),
        2 => (arb_index(), -5i64..20).prop_map(|(i, q)| Op::SetQuantity(i, q)),
    ]
}

fn id_at(index: usize) -> ProductId {
    catalog_items()
        .get(index)
        .map_or_else(|| ProductId::new("missing"), |item| item.id.clone())
}

fn apply(ledger: &mut CartLedger, op: &Op) {
    let items = catalog_items();
    match op {
        Op::Add(i) => {
            if let Some(item) = items.get(*i) {
                ledger.add_item(item.clone());
            }
        },
        Op::Remove(i) => ledger.remove_item(&id_at(*i)),
        Op::SetQuantity(i, q) => ledger.set_quantity(&id_at(*i), *q),
    }
}

fn ledger_from(ops: &[Op]) -> CartLedger {
    let mut ledger = CartLedger::new();
    for op in ops {
        apply(&mut ledger, op);
    }
    ledger
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn lines_stay_unique_and_positive(ops in prop::collection::vec(arb_op(), 0..60)) {
        let ledger = ledger_from(&ops);

        let mut ids: Vec<_> = ledger.lines().iter().map(|l| l.item.id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), ledger.len());
        prop_assert!(ledger.lines().iter().all(|l| l.quantity >= 1));
    }

    #[test]
    fn totals_are_sums_over_lines(ops in prop::collection::vec(arb_op(), 0..60)) {
        let ledger = ledger_from(&ops);

        let total: f64 = ledger.lines().iter().map(|l| l.item.price * f64::from(l.quantity)).sum();
        let count: u64 = ledger.lines().iter().map(|l| u64::from(l.quantity)).sum();
        prop_assert!((ledger.total() - total).abs() < 1e-9);
        prop_assert_eq!(ledger.item_count(), count);
        prop_assert!(ledger.total() >= 0.0);
    }

    #[test]
    fn removal_is_idempotent(ops in prop::collection::vec(arb_op(), 0..40), index in arb_index()) {
        let mut once = ledger_from(&ops);
        once.remove_item(&id_at(index));

        let mut twice = once.clone();
        twice.remove_item(&id_at(index));

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.get(&id_at(index)).is_none());
    }

    #[test]
    fn set_quantity_clamps_at_zero(
        ops in prop::collection::vec(arb_op(), 0..40),
        index in 0..catalog_items().len(),
        quantity in -1_000i64..1_000,
    ) {
        let mut ledger = ledger_from(&ops);
        let id = id_at(index);
        let present = ledger.get(&id).is_some();

        ledger.set_quantity(&id, quantity);

        match (present, quantity) {
            (_, q) if q <= 0 => prop_assert!(ledger.get(&id).is_none()),
            (true, q) => prop_assert_eq!(ledger.get(&id).map(|l| i64::from(l.quantity)), Some(q)),
            (false, _) => prop_assert!(ledger.get(&id).is_none()),
        }
    }

    #[test]
    fn adding_n_times_merges_into_one_line(index in 0..catalog_items().len(), times in 1u32..30) {
        let item = catalog_items().get(index).cloned().unwrap();
        let mut ledger = CartLedger::new();

        for _ in 0..times {
            ledger.add_item(item.clone());
        }

        prop_assert_eq!(ledger.len(), 1);
        prop_assert_eq!(ledger.get(&item.id).map(|l| l.quantity), Some(times));
        prop_assert!((ledger.total() - item.price * f64::from(times)).abs() < 1e-9);
    }

    #[test]
    fn line_order_follows_first_insertion(ops in prop::collection::vec(arb_op(), 0..60)) {
        let ledger = ledger_from(&ops);
        let ledger_order: Vec<_> = ledger
            .lines()
            .iter()
            .map(|l| l.item.id.clone())
            .collect();

        // Replaying only the surviving lines' first adds reproduces the order
        let mut first_seen = Vec::new();
        let mut live = CartLedger::new();
        for op in &ops {
            apply(&mut live, op);
            if let Op::Add(i) = op {
                let id = id_at(*i);
                if live.get(&id).is_some() && !first_seen.contains(&id) {
                    first_seen.push(id);
                }
            }
            first_seen.retain(|id| live.get(id).is_some());
        }

        prop_assert_eq!(ledger_order, first_seen);
    }
}
