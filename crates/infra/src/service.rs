//! The ledger service: validation composed with persistence.
//!
//! Each method is one user action: validate, then write, then report the
//! outcome. The stock-availability check happens at validation time only;
//! it is not re-checked atomically at commit time, so two concurrent writers
//! can race it (inherited check-then-act gap of the backing store model).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockbook_auth::{verify_password, PasswordHasher, User};
use stockbook_core::{DomainError, DomainResult, LocationId, MovementId, ProductId, UserId};
use stockbook_locations::Location;
use stockbook_movements::{balance_rows, BalanceRow, Movement};
use stockbook_products::Product;

use crate::store::{LocationStore, MovementStore, ProductStore, UserStore};

/// A candidate movement as submitted by a caller.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub movement_id: MovementId,
    /// Defaults to now when omitted.
    pub timestamp: Option<DateTime<Utc>>,
    pub from_location: Option<LocationId>,
    pub to_location: Option<LocationId>,
    pub product_id: ProductId,
    pub qty: i64,
}

/// Replacement fields for an existing movement (identity and timestamp are
/// kept).
#[derive(Debug, Clone)]
pub struct MovementChanges {
    pub from_location: Option<LocationId>,
    pub to_location: Option<LocationId>,
    pub product_id: ProductId,
    pub qty: i64,
}

/// Application service over the three registries and the user table.
#[derive(Clone)]
pub struct LedgerService {
    products: Arc<dyn ProductStore>,
    locations: Arc<dyn LocationStore>,
    movements: Arc<dyn MovementStore>,
    users: Arc<dyn UserStore>,
}

impl LedgerService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        locations: Arc<dyn LocationStore>,
        movements: Arc<dyn MovementStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            products,
            locations,
            movements,
            users,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_product(
        &self,
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Product> {
        let product = Product::new(id, name, description)?;
        self.products.insert(product.clone()).await?;
        tracing::info!(product_id = %product.id(), "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: &ProductId) -> DomainResult<Product> {
        self.products.get(id).await
    }

    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        self.products.list().await
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Product> {
        let mut product = self.products.get(id).await?;
        product.update(name, description)?;
        self.products.update(product.clone()).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &ProductId) -> DomainResult<()> {
        if self.movements.references_product(id).await? {
            return Err(DomainError::validation(format!(
                "product '{id}' is referenced by movements and cannot be deleted"
            )));
        }
        self.products.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// System-wide current stock of a product (external crossings only).
    pub async fn product_stock(&self, id: &ProductId) -> DomainResult<i64> {
        self.products.get(id).await?;
        self.movements.current_stock(id).await
    }

    /// Recompute the advisory `total_qty` cache from the ledger.
    ///
    /// This is the only writer of the cache; nothing updates it implicitly.
    pub async fn recompute_total_qty(&self, id: &ProductId) -> DomainResult<Product> {
        let mut product = self.products.get(id).await?;
        let stock = self.movements.current_stock(id).await?;
        product.set_total_qty(stock);
        self.products.update(product.clone()).await?;
        tracing::debug!(product_id = %id, total_qty = stock, "total_qty recomputed");
        Ok(product)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Locations
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_location(
        &self,
        id: LocationId,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> DomainResult<Location> {
        let location = Location::new(id, name, address)?;
        self.locations.insert(location.clone()).await?;
        tracing::info!(location_id = %location.id(), "location created");
        Ok(location)
    }

    pub async fn get_location(&self, id: &LocationId) -> DomainResult<Location> {
        self.locations.get(id).await
    }

    pub async fn list_locations(&self) -> DomainResult<Vec<Location>> {
        self.locations.list().await
    }

    pub async fn update_location(
        &self,
        id: &LocationId,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> DomainResult<Location> {
        let mut location = self.locations.get(id).await?;
        location.update(name, address)?;
        self.locations.update(location.clone()).await?;
        Ok(location)
    }

    pub async fn delete_location(&self, id: &LocationId) -> DomainResult<()> {
        if !self.movements.movements_involving(id).await?.is_empty() {
            return Err(DomainError::validation(format!(
                "location '{id}' is referenced by movements and cannot be deleted"
            )));
        }
        self.locations.delete(id).await?;
        tracing::info!(location_id = %id, "location deleted");
        Ok(())
    }

    /// All movements touching a location as either endpoint, most recent
    /// first (the explicit replacement for relationship back-references).
    pub async fn location_movements(&self, id: &LocationId) -> DomainResult<Vec<Movement>> {
        self.locations.get(id).await?;
        self.movements.movements_involving(id).await
    }

    /// Net quantity of a product at a location, recomputed from the ledger.
    pub async fn quantity_at(
        &self,
        location: &LocationId,
        product: &ProductId,
    ) -> DomainResult<i64> {
        self.locations.get(location).await?;
        self.movements.qty_at(location, product).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Movements
    // ─────────────────────────────────────────────────────────────────────

    pub async fn record_movement(&self, new: NewMovement) -> DomainResult<Movement> {
        let movement = Movement::new(
            new.movement_id,
            new.timestamp.unwrap_or_else(Utc::now),
            new.from_location,
            new.to_location,
            new.product_id,
            new.qty,
        )?;

        self.ensure_references(&movement).await?;
        self.ensure_available(&movement, None).await?;

        self.movements.insert(movement.clone()).await?;
        tracing::info!(
            movement_id = %movement.id(),
            product_id = %movement.product_id(),
            kind = %movement.kind(),
            qty = movement.qty(),
            "movement recorded"
        );
        Ok(movement)
    }

    pub async fn get_movement(&self, id: &MovementId) -> DomainResult<Movement> {
        self.movements.get(id).await
    }

    pub async fn list_movements(&self) -> DomainResult<Vec<Movement>> {
        self.movements.list().await
    }

    /// Replace a movement's endpoints/product/quantity, re-running the full
    /// validator. The availability check excludes the edited movement's own
    /// prior contribution so it does not count against itself.
    pub async fn update_movement(
        &self,
        id: &MovementId,
        changes: MovementChanges,
    ) -> DomainResult<Movement> {
        let old = self.movements.get(id).await?;

        let movement = Movement::new(
            old.id().clone(),
            old.timestamp(),
            changes.from_location,
            changes.to_location,
            changes.product_id,
            changes.qty,
        )?;

        self.ensure_references(&movement).await?;
        self.ensure_available(&movement, Some(&old)).await?;

        self.movements.update(movement.clone()).await?;
        tracing::info!(movement_id = %movement.id(), "movement updated");
        Ok(movement)
    }

    pub async fn delete_movement(&self, id: &MovementId) -> DomainResult<()> {
        self.movements.delete(id).await?;
        tracing::info!(movement_id = %id, "movement deleted");
        Ok(())
    }

    /// Referential checks: the product and any named endpoints must exist.
    async fn ensure_references(&self, movement: &Movement) -> DomainResult<()> {
        self.products.get(movement.product_id()).await?;
        if let Some(from) = movement.from_location() {
            self.locations.get(from).await?;
        }
        if let Some(to) = movement.to_location() {
            self.locations.get(to).await?;
        }
        Ok(())
    }

    /// Stock-availability check for the source endpoint.
    ///
    /// When re-validating an edit, `exclude` is the movement's previous
    /// version; its contribution to the source balance is backed out first.
    async fn ensure_available(
        &self,
        movement: &Movement,
        exclude: Option<&Movement>,
    ) -> DomainResult<()> {
        let Some(from) = movement.from_location() else {
            return Ok(());
        };

        let mut available = self.movements.qty_at(from, movement.product_id()).await?;
        if let Some(old) = exclude {
            if old.product_id() == movement.product_id() {
                available -= old.net_effect_at(from);
            }
        }

        if available < movement.qty() {
            let source = self.locations.get(from).await?;
            return Err(DomainError::invalid_movement(format!(
                "insufficient stock of product '{}' at {}: available {}, required {}",
                movement.product_id(),
                source.name(),
                available,
                movement.qty()
            )));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Balance report
    // ─────────────────────────────────────────────────────────────────────

    /// Every (product, location) pair holding a strictly positive net
    /// quantity, in product-then-location enumeration order. One grouped
    /// pass over the ledger regardless of backend.
    pub async fn balance_report(&self) -> DomainResult<Vec<BalanceRow>> {
        let products = self.products.list().await?;
        let locations = self.locations.list().await?;
        let net = self.movements.net_by_product_location().await?;
        Ok(balance_rows(&products, &locations, &net))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    pub async fn register_user(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> DomainResult<User> {
        let user = User::new(UserId::new(), username, email, hasher.hash(password))?;
        self.users.insert(user.clone()).await?;
        tracing::info!(username = user.username(), "user registered");
        Ok(user)
    }

    /// Look up a user and check the password through the credential seam.
    pub async fn verify_user(
        &self,
        username: &str,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> DomainResult<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::validation("invalid credentials"))?;
        verify_password(&user, password, hasher)?;
        Ok(user)
    }
}
