//! `stockbook-products` — product registry records.

pub mod product;

pub use product::Product;
