//! `stockbook-movements` — the movement ledger and its read-side folds.
//!
//! A movement is a directed quantity transfer of one product between an
//! optional source and an optional destination location; an absent endpoint
//! is the external boundary (supplier or customer). The ledger is the
//! authoritative record: stock levels and the balance report are derived
//! from it, never stored.

pub mod ledger;
pub mod movement;

pub use ledger::{
    balance_report, balance_rows, current_stock, net_by_product_location, net_quantity, BalanceRow,
};
pub use movement::{Movement, MovementKind};
