//! `stockbook-locations` — storage location registry records.

pub mod location;

pub use location::Location;
