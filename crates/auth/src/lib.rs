//! `stockbook-auth` — user accounts and the credential boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Password
//! hashing itself lives behind [`PasswordHasher`]; only opaque hashes cross
//! this boundary.

pub mod credentials;
pub mod user;

pub use credentials::{verify_password, PasswordHasher};
pub use user::User;
