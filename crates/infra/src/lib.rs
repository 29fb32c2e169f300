//! `stockbook-infra` — storage backends and the ledger service.
//!
//! The domain crates are pure; everything that touches a store lives here:
//! the repository traits, an in-memory backend (dev/tests), a Postgres
//! backend (sqlx), and the service that composes validation with persistence.

pub mod service;
pub mod store;

pub use service::{LedgerService, MovementChanges, NewMovement};
pub use store::{
    InMemoryStore, LocationStore, MovementStore, PostgresStore, ProductStore, UserStore,
};
