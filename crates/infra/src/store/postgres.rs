//! Postgres-backed stores.
//!
//! Aggregates are computed in SQL (`SUM ... WHERE`, one grouped pass for the
//! balance report) so the database does the fold. Each method executes as a
//! single statement/transaction; there is no cross-request coordination.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `DomainError` as follows:
//!
//! | PostgreSQL Error Code | DomainError | Scenario |
//! |-----------------------|-------------|----------|
//! | `23505` (unique violation) | `DuplicateKey` | Insert with a taken identity |
//! | `23503` (foreign key violation) | `Validation` | Deleting a referenced record / dangling reference |
//! | `23514` (check violation) | `ConstraintViolation` | Data violating a table check (e.g. qty <= 0) |
//! | other | `Storage` | Connection/pool/unclassified database errors |

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockbook_auth::User;
use stockbook_core::{DomainError, DomainResult, LocationId, MovementId, ProductId, UserId};
use stockbook_locations::Location;
use stockbook_movements::Movement;
use stockbook_products::Product;

use super::{LocationStore, MovementStore, ProductStore, UserStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        total_qty BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        location_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movements (
        movement_id TEXT PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL,
        from_location TEXT REFERENCES locations (location_id),
        to_location TEXT REFERENCES locations (location_id),
        product_id TEXT NOT NULL REFERENCES products (product_id),
        qty BIGINT NOT NULL CHECK (qty > 0),
        CHECK (from_location IS NOT NULL OR to_location IS NOT NULL),
        CHECK (from_location IS DISTINCT FROM to_location)
    )
    "#,
];

/// Postgres backend holding all four tables.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> DomainResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn map_sqlx_error(op: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        return match db.code().as_deref() {
            Some("23505") => DomainError::duplicate_key(db.message().to_string()),
            Some("23503") => {
                DomainError::validation("record is referenced by other records")
            }
            Some("23514") => DomainError::constraint(db.message().to_string()),
            _ => DomainError::storage(format!("{op}: {err}")),
        };
    }
    DomainError::storage(format!("{op}: {err}"))
}

fn product_from_row(row: &PgRow) -> DomainResult<Product> {
    let id: String = row
        .try_get("product_id")
        .map_err(|e| DomainError::storage(format!("products row: {e}")))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| DomainError::storage(format!("products row: {e}")))?;
    let description: String = row
        .try_get("description")
        .map_err(|e| DomainError::storage(format!("products row: {e}")))?;
    let total_qty: i64 = row
        .try_get("total_qty")
        .map_err(|e| DomainError::storage(format!("products row: {e}")))?;

    let mut product = Product::new(ProductId::new(id)?, name, description)?;
    product.set_total_qty(total_qty);
    Ok(product)
}

fn location_from_row(row: &PgRow) -> DomainResult<Location> {
    let id: String = row
        .try_get("location_id")
        .map_err(|e| DomainError::storage(format!("locations row: {e}")))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| DomainError::storage(format!("locations row: {e}")))?;
    let address: String = row
        .try_get("address")
        .map_err(|e| DomainError::storage(format!("locations row: {e}")))?;

    Location::new(LocationId::new(id)?, name, address)
}

fn movement_from_row(row: &PgRow) -> DomainResult<Movement> {
    let id: String = row
        .try_get("movement_id")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
    let timestamp: DateTime<Utc> = row
        .try_get("timestamp")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
    let from_location: Option<String> = row
        .try_get("from_location")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
    let to_location: Option<String> = row
        .try_get("to_location")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
    let product_id: String = row
        .try_get("product_id")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
    let qty: i64 = row
        .try_get("qty")
        .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;

    Movement::new(
        MovementId::new(id)?,
        timestamp,
        from_location.map(LocationId::new).transpose()?,
        to_location.map(LocationId::new).transpose()?,
        ProductId::new(product_id)?,
        qty,
    )
}

fn user_from_row(row: &PgRow) -> DomainResult<User> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| DomainError::storage(format!("users row: {e}")))?;
    let username: String = row
        .try_get("username")
        .map_err(|e| DomainError::storage(format!("users row: {e}")))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| DomainError::storage(format!("users row: {e}")))?;
    let password_hash: String = row
        .try_get("password_hash")
        .map_err(|e| DomainError::storage(format!("users row: {e}")))?;

    User::new(UserId::from_uuid(id), username, email, password_hash)
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert(&self, product: Product) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO products (product_id, name, description, total_qty) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product.id().as_str())
        .bind(product.name())
        .bind(product.description())
        .bind(product.total_qty())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_key(format!("product '{}' already exists", product.id()))
            } else {
                map_sqlx_error("products.insert", e)
            }
        })?;
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> DomainResult<Product> {
        let row = sqlx::query(
            "SELECT product_id, name, description, total_qty FROM products \
             WHERE product_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.get", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => Err(DomainError::not_found(format!("product '{id}' not found"))),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT product_id, name, description, total_qty FROM products \
             ORDER BY product_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.list", e))?;

        rows.iter().map(product_from_row).collect()
    }

    async fn update(&self, product: Product) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, description = $3, total_qty = $4 \
             WHERE product_id = $1",
        )
        .bind(product.id().as_str())
        .bind(product.name())
        .bind(product.description())
        .bind(product.total_qty())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "product '{}' not found",
                product.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("products.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("product '{id}' not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl LocationStore for PostgresStore {
    async fn insert(&self, location: Location) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO locations (location_id, name, address) VALUES ($1, $2, $3)",
        )
        .bind(location.id().as_str())
        .bind(location.name())
        .bind(location.address())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_key(format!(
                    "location '{}' already exists",
                    location.id()
                ))
            } else {
                map_sqlx_error("locations.insert", e)
            }
        })?;
        Ok(())
    }

    async fn get(&self, id: &LocationId) -> DomainResult<Location> {
        let row = sqlx::query(
            "SELECT location_id, name, address FROM locations WHERE location_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("locations.get", e))?;

        match row {
            Some(row) => location_from_row(&row),
            None => Err(DomainError::not_found(format!("location '{id}' not found"))),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT location_id, name, address FROM locations ORDER BY location_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("locations.list", e))?;

        rows.iter().map(location_from_row).collect()
    }

    async fn update(&self, location: Location) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE locations SET name = $2, address = $3 WHERE location_id = $1",
        )
        .bind(location.id().as_str())
        .bind(location.name())
        .bind(location.address())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("locations.update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "location '{}' not found",
                location.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &LocationId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE location_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("locations.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("location '{id}' not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl MovementStore for PostgresStore {
    async fn insert(&self, movement: Movement) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO movements \
             (movement_id, timestamp, from_location, to_location, product_id, qty) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(movement.id().as_str())
        .bind(movement.timestamp())
        .bind(movement.from_location().map(|l| l.as_str()))
        .bind(movement.to_location().map(|l| l.as_str()))
        .bind(movement.product_id().as_str())
        .bind(movement.qty())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_key(format!(
                    "movement '{}' already exists",
                    movement.id()
                ))
            } else {
                map_sqlx_error("movements.insert", e)
            }
        })?;
        Ok(())
    }

    async fn get(&self, id: &MovementId) -> DomainResult<Movement> {
        let row = sqlx::query(
            "SELECT movement_id, timestamp, from_location, to_location, product_id, qty \
             FROM movements WHERE movement_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.get", e))?;

        match row {
            Some(row) => movement_from_row(&row),
            None => Err(DomainError::not_found(format!("movement '{id}' not found"))),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Movement>> {
        let rows = sqlx::query(
            "SELECT movement_id, timestamp, from_location, to_location, product_id, qty \
             FROM movements ORDER BY timestamp DESC, movement_id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.list", e))?;

        rows.iter().map(movement_from_row).collect()
    }

    async fn update(&self, movement: Movement) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE movements SET timestamp = $2, from_location = $3, to_location = $4, \
             product_id = $5, qty = $6 WHERE movement_id = $1",
        )
        .bind(movement.id().as_str())
        .bind(movement.timestamp())
        .bind(movement.from_location().map(|l| l.as_str()))
        .bind(movement.to_location().map(|l| l.as_str()))
        .bind(movement.product_id().as_str())
        .bind(movement.qty())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "movement '{}' not found",
                movement.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &MovementId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM movements WHERE movement_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("movements.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("movement '{id}' not found")));
        }
        Ok(())
    }

    async fn movements_involving(&self, location: &LocationId) -> DomainResult<Vec<Movement>> {
        let rows = sqlx::query(
            "SELECT movement_id, timestamp, from_location, to_location, product_id, qty \
             FROM movements WHERE from_location = $1 OR to_location = $1 \
             ORDER BY timestamp DESC, movement_id DESC",
        )
        .bind(location.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.involving", e))?;

        rows.iter().map(movement_from_row).collect()
    }

    async fn references_product(&self, product: &ProductId) -> DomainResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM movements WHERE product_id = $1) AS present",
        )
        .bind(product.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.references_product", e))?;

        row.try_get("present")
            .map_err(|e| DomainError::storage(format!("movements row: {e}")))
    }

    async fn qty_at(&self, location: &LocationId, product: &ProductId) -> DomainResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(CASE WHEN to_location = $1 THEN qty ELSE -qty END), 0)::BIGINT \
             AS net \
             FROM movements \
             WHERE product_id = $2 AND (to_location = $1 OR from_location = $1)",
        )
        .bind(location.as_str())
        .bind(product.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.qty_at", e))?;

        row.try_get("net")
            .map_err(|e| DomainError::storage(format!("movements row: {e}")))
    }

    async fn current_stock(&self, product: &ProductId) -> DomainResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(CASE WHEN from_location IS NULL THEN qty ELSE -qty END), 0)::BIGINT \
             AS stock \
             FROM movements \
             WHERE product_id = $1 AND (from_location IS NULL OR to_location IS NULL)",
        )
        .bind(product.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.current_stock", e))?;

        row.try_get("stock")
            .map_err(|e| DomainError::storage(format!("movements row: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn net_by_product_location(
        &self,
    ) -> DomainResult<HashMap<(ProductId, LocationId), i64>> {
        // One grouped pass: each movement contributes +qty at its destination
        // and -qty at its source.
        let rows = sqlx::query(
            "SELECT product_id, location_id, SUM(delta)::BIGINT AS net FROM ( \
                 SELECT product_id, to_location AS location_id, qty AS delta \
                 FROM movements WHERE to_location IS NOT NULL \
                 UNION ALL \
                 SELECT product_id, from_location AS location_id, -qty AS delta \
                 FROM movements WHERE from_location IS NOT NULL \
             ) contributions \
             GROUP BY product_id, location_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements.net_by_product_location", e))?;

        let mut net = HashMap::with_capacity(rows.len());
        for row in &rows {
            let product: String = row
                .try_get("product_id")
                .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
            let location: String = row
                .try_get("location_id")
                .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
            let qty: i64 = row
                .try_get("net")
                .map_err(|e| DomainError::storage(format!("movements row: {e}")))?;
            net.insert((ProductId::new(product)?, LocationId::new(location)?), qty);
        }
        Ok(net)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert(&self, user: User) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id().as_uuid())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_key(format!(
                    "username '{}' or email '{}' already exists",
                    user.username(),
                    user.email()
                ))
            } else {
                map_sqlx_error("users.insert", e)
            }
        })?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.find_by_username", e))?;

        row.as_ref().map(user_from_row).transpose()
    }
}
