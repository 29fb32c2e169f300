//! Read-side folds over the movement ledger.
//!
//! Every quantity here is recomputed from the full ledger on each call; there
//! is no incremental maintenance and no running balance table. The cached
//! `total_qty` on Product is advisory and written only by an explicit
//! recompute.

use std::collections::HashMap;

use serde::Serialize;

use stockbook_core::{LocationId, ProductId};
use stockbook_locations::Location;
use stockbook_products::Product;

use crate::movement::{Movement, MovementKind};

/// Net quantity of `product` held at `location`:
/// everything received there minus everything sent from there.
pub fn net_quantity<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    product: &ProductId,
    location: &LocationId,
) -> i64 {
    movements
        .into_iter()
        .filter(|m| m.product_id() == product)
        .map(|m| m.net_effect_at(location))
        .sum()
}

/// System-wide current stock of `product`: external boundary crossings only.
///
/// Counts Inbound minus Outbound. Transfers move quantity between locations
/// and net to zero system-wide, so they are ignored.
pub fn current_stock<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    product: &ProductId,
) -> i64 {
    movements
        .into_iter()
        .filter(|m| m.product_id() == product)
        .map(|m| match m.kind() {
            MovementKind::Inbound => m.qty(),
            MovementKind::Outbound => -m.qty(),
            MovementKind::Transfer => 0,
        })
        .sum()
}

/// Per-(product, location) net quantities in a single grouped pass.
///
/// One scan over the ledger; each movement contributes +qty at its
/// destination and -qty at its source. Pairs never touched by a movement are
/// absent from the map (net zero).
pub fn net_by_product_location<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
) -> HashMap<(ProductId, LocationId), i64> {
    let mut net: HashMap<(ProductId, LocationId), i64> = HashMap::new();

    for m in movements {
        if let Some(to) = m.to_location() {
            *net.entry((m.product_id().clone(), to.clone())).or_insert(0) += m.qty();
        }
        if let Some(from) = m.from_location() {
            *net.entry((m.product_id().clone(), from.clone())).or_insert(0) -= m.qty();
        }
    }

    net
}

/// One row of the balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub location_id: LocationId,
    pub location_name: String,
    pub qty: i64,
}

/// Balance report: every (product, location) pair with a strictly positive
/// net quantity, in product-then-location enumeration order.
///
/// Built from one grouped pass over the ledger plus a lookup per pair.
pub fn balance_report(
    products: &[Product],
    locations: &[Location],
    movements: &[Movement],
) -> Vec<BalanceRow> {
    balance_rows(products, locations, &net_by_product_location(movements))
}

/// Assemble report rows from registries and an already-grouped net map.
///
/// Split out so a storage backend can supply the grouped pass itself
/// (e.g. as one SQL aggregate) and still share the row assembly.
pub fn balance_rows(
    products: &[Product],
    locations: &[Location],
    net: &HashMap<(ProductId, LocationId), i64>,
) -> Vec<BalanceRow> {
    let mut rows = Vec::new();
    for product in products {
        for location in locations {
            let qty = net
                .get(&(product.id().clone(), location.id().clone()))
                .copied()
                .unwrap_or(0);
            if qty > 0 {
                rows.push(BalanceRow {
                    product_id: product.id().clone(),
                    product_name: product.name().to_string(),
                    location_id: location.id().clone(),
                    location_name: location.name().to_string(),
                    qty,
                });
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stockbook_core::MovementId;

    use super::*;

    fn mid(s: &str) -> MovementId {
        MovementId::new(s).unwrap()
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn lid(s: &str) -> LocationId {
        LocationId::new(s).unwrap()
    }

    fn inbound(id: &str, to: &str, product: &str, qty: i64) -> Movement {
        Movement::new(mid(id), Utc::now(), None, Some(lid(to)), pid(product), qty).unwrap()
    }

    fn outbound(id: &str, from: &str, product: &str, qty: i64) -> Movement {
        Movement::new(mid(id), Utc::now(), Some(lid(from)), None, pid(product), qty).unwrap()
    }

    fn transfer(id: &str, from: &str, to: &str, product: &str, qty: i64) -> Movement {
        Movement::new(mid(id), Utc::now(), Some(lid(from)), Some(lid(to)), pid(product), qty)
            .unwrap()
    }

    #[test]
    fn inbound_transfer_outbound_walkthrough() {
        // Inbound 50 X into A.
        let mut ledger = vec![inbound("M1", "A", "X", 50)];
        assert_eq!(net_quantity(&ledger, &pid("X"), &lid("A")), 50);
        assert_eq!(current_stock(&ledger, &pid("X")), 50);

        // Transfer 20 from A to B: balances move, stock does not.
        ledger.push(transfer("M2", "A", "B", "X", 20));
        assert_eq!(net_quantity(&ledger, &pid("X"), &lid("A")), 30);
        assert_eq!(net_quantity(&ledger, &pid("X"), &lid("B")), 20);
        assert_eq!(current_stock(&ledger, &pid("X")), 50);

        // Outbound 10 from B.
        ledger.push(outbound("M3", "B", "X", 10));
        assert_eq!(net_quantity(&ledger, &pid("X"), &lid("B")), 10);
        assert_eq!(current_stock(&ledger, &pid("X")), 40);
    }

    #[test]
    fn net_quantity_ignores_other_products() {
        let ledger = vec![inbound("M1", "A", "X", 50), inbound("M2", "A", "Y", 7)];
        assert_eq!(net_quantity(&ledger, &pid("X"), &lid("A")), 50);
        assert_eq!(net_quantity(&ledger, &pid("Y"), &lid("A")), 7);
    }

    #[test]
    fn grouped_pass_matches_per_pair_fold() {
        let ledger = vec![
            inbound("M1", "A", "X", 50),
            transfer("M2", "A", "B", "X", 20),
            outbound("M3", "B", "X", 10),
            inbound("M4", "B", "Y", 3),
        ];

        let net = net_by_product_location(&ledger);
        for product in ["X", "Y"] {
            for location in ["A", "B"] {
                let expected = net_quantity(&ledger, &pid(product), &lid(location));
                let grouped = net
                    .get(&(pid(product), lid(location)))
                    .copied()
                    .unwrap_or(0);
                assert_eq!(grouped, expected, "mismatch for ({product}, {location})");
            }
        }
    }

    #[test]
    fn balance_report_excludes_non_positive_pairs() {
        let products = vec![
            Product::new(pid("X"), "Product X", "").unwrap(),
            Product::new(pid("Y"), "Product Y", "").unwrap(),
        ];
        let locations = vec![
            Location::new(lid("A"), "Site A", "").unwrap(),
            Location::new(lid("B"), "Site B", "").unwrap(),
        ];
        // X: 20 in A, everything out of B again (B nets zero).
        let movements = vec![
            inbound("M1", "A", "X", 20),
            transfer("M2", "A", "B", "X", 5),
            outbound("M3", "B", "X", 5),
        ];

        let rows = balance_report(&products, &locations, &movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, pid("X"));
        assert_eq!(rows[0].location_id, lid("A"));
        assert_eq!(rows[0].qty, 15);
    }

    #[test]
    fn balance_report_rows_follow_product_then_location_order() {
        let products = vec![
            Product::new(pid("X"), "Product X", "").unwrap(),
            Product::new(pid("Y"), "Product Y", "").unwrap(),
        ];
        let locations = vec![
            Location::new(lid("A"), "Site A", "").unwrap(),
            Location::new(lid("B"), "Site B", "").unwrap(),
        ];
        let movements = vec![
            inbound("M1", "A", "X", 1),
            inbound("M2", "B", "X", 2),
            inbound("M3", "A", "Y", 3),
        ];

        let rows = balance_report(&products, &locations, &movements);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.product_id.as_str(), r.location_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("X", "A"), ("X", "B"), ("Y", "A")]);
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        const LOCATIONS: [&str; 3] = ["A", "B", "C"];

        /// Strategy: an arbitrary structurally-valid movement of product X
        /// across three locations and the external boundary.
        fn arb_movement() -> impl Strategy<Value = Movement> {
            (0usize..3, 0usize..3, 0usize..3, 1i64..1_000i64, 0u32..1_000_000).prop_map(
                |(kind, from_idx, to_idx, qty, nonce)| {
                    let id = mid(&format!("M{nonce}-{kind}-{from_idx}-{to_idx}-{qty}"));
                    match kind {
                        0 => Movement::new(
                            id,
                            Utc::now(),
                            None,
                            Some(lid(LOCATIONS[to_idx])),
                            pid("X"),
                            qty,
                        )
                        .unwrap(),
                        1 => Movement::new(
                            id,
                            Utc::now(),
                            Some(lid(LOCATIONS[from_idx])),
                            None,
                            pid("X"),
                            qty,
                        )
                        .unwrap(),
                        _ => {
                            let to_idx = if to_idx == from_idx {
                                (to_idx + 1) % LOCATIONS.len()
                            } else {
                                to_idx
                            };
                            Movement::new(
                                id,
                                Utc::now(),
                                Some(lid(LOCATIONS[from_idx])),
                                Some(lid(LOCATIONS[to_idx])),
                                pid("X"),
                                qty,
                            )
                            .unwrap()
                        }
                    }
                },
            )
        }

        fn arb_ledger() -> impl Strategy<Value = Vec<Movement>> {
            prop::collection::vec(arb_movement(), 0..40)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: net quantity is order-independent over the ledger.
            #[test]
            fn net_quantity_is_order_independent(ledger in arb_ledger().prop_shuffle()) {
                let mut reversed = ledger.clone();
                reversed.reverse();

                for location in LOCATIONS {
                    prop_assert_eq!(
                        net_quantity(&ledger, &pid("X"), &lid(location)),
                        net_quantity(&reversed, &pid("X"), &lid(location))
                    );
                }
                prop_assert_eq!(
                    current_stock(&ledger, &pid("X")),
                    current_stock(&reversed, &pid("X"))
                );
            }

            /// Property: summing per-location nets over all real locations
            /// equals global stock (transfers cancel pairwise).
            #[test]
            fn per_location_nets_sum_to_global_stock(ledger in arb_ledger()) {
                let total: i64 = LOCATIONS
                    .iter()
                    .map(|l| net_quantity(&ledger, &pid("X"), &lid(l)))
                    .sum();
                prop_assert_eq!(total, current_stock(&ledger, &pid("X")));
            }

            /// Property: the grouped pass agrees with the per-pair fold.
            #[test]
            fn grouped_pass_agrees_with_fold(ledger in arb_ledger()) {
                let net = net_by_product_location(&ledger);
                for location in LOCATIONS {
                    let grouped = net.get(&(pid("X"), lid(location))).copied().unwrap_or(0);
                    prop_assert_eq!(grouped, net_quantity(&ledger, &pid("X"), &lid(location)));
                }
            }
        }
    }
}
