//! Repository interfaces over the persistent store.
//!
//! Explicit store handles replace ORM session globals: callers pass a store,
//! and relationship traversal is replaced by explicit query methods
//! (`movements_involving`, `references_product`). Two backends are provided:
//! [`InMemoryStore`] for dev/tests and [`PostgresStore`] for production.

pub mod in_memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use stockbook_auth::User;
use stockbook_core::{DomainResult, LocationId, MovementId, ProductId};
use stockbook_locations::Location;
use stockbook_movements::Movement;
use stockbook_products::Product;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Product registry store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. Fails with `DuplicateKey` if the id is taken.
    async fn insert(&self, product: Product) -> DomainResult<()>;

    async fn get(&self, id: &ProductId) -> DomainResult<Product>;

    /// All products, ascending by id (deterministic enumeration order).
    async fn list(&self) -> DomainResult<Vec<Product>>;

    /// Replace the record with the same id. Fails with `NotFound` if absent.
    async fn update(&self, product: Product) -> DomainResult<()>;

    async fn delete(&self, id: &ProductId) -> DomainResult<()>;
}

/// Location registry store.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Insert a new location. Fails with `DuplicateKey` if the id is taken.
    async fn insert(&self, location: Location) -> DomainResult<()>;

    async fn get(&self, id: &LocationId) -> DomainResult<Location>;

    /// All locations, ascending by id (deterministic enumeration order).
    async fn list(&self) -> DomainResult<Vec<Location>>;

    /// Replace the record with the same id. Fails with `NotFound` if absent.
    async fn update(&self, location: Location) -> DomainResult<()>;

    async fn delete(&self, id: &LocationId) -> DomainResult<()>;
}

/// Movement ledger store.
///
/// Carries the aggregate queries alongside CRUD so each backend can compute
/// them natively (a fold in memory, `SUM ... WHERE` in SQL).
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Insert a new movement. Fails with `DuplicateKey` if the id is taken.
    async fn insert(&self, movement: Movement) -> DomainResult<()>;

    async fn get(&self, id: &MovementId) -> DomainResult<Movement>;

    /// All movements, most recent first.
    async fn list(&self) -> DomainResult<Vec<Movement>>;

    /// Replace the record with the same id. Fails with `NotFound` if absent.
    async fn update(&self, movement: Movement) -> DomainResult<()>;

    async fn delete(&self, id: &MovementId) -> DomainResult<()>;

    /// All movements with `location` as either endpoint, most recent first.
    async fn movements_involving(&self, location: &LocationId) -> DomainResult<Vec<Movement>>;

    /// Whether any movement references `product`.
    async fn references_product(&self, product: &ProductId) -> DomainResult<bool>;

    /// Net quantity of `product` at `location`: received minus sent.
    /// Recomputed from the full ledger on every call.
    async fn qty_at(&self, location: &LocationId, product: &ProductId) -> DomainResult<i64>;

    /// System-wide stock of `product`: Inbound minus Outbound; Transfers are
    /// ignored (they net to zero across the system).
    async fn current_stock(&self, product: &ProductId) -> DomainResult<i64>;

    /// Per-(product, location) net quantities in one grouped pass over the
    /// whole ledger.
    async fn net_by_product_location(
        &self,
    ) -> DomainResult<HashMap<(ProductId, LocationId), i64>>;
}

/// User account store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `DuplicateKey` if the username or email
    /// is taken.
    async fn insert(&self, user: User) -> DomainResult<()>;

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
}
