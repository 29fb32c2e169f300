use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockbook_auth::User;
use stockbook_core::{DomainError, DomainResult, LocationId, MovementId, ProductId};
use stockbook_locations::Location;
use stockbook_movements::{ledger, Movement};
use stockbook_products::Product;

use super::{LocationStore, MovementStore, ProductStore, UserStore};

/// In-memory backend holding all four tables.
///
/// Intended for tests/dev. Not optimized for performance: the aggregate
/// queries fold over the full ledger on every call, exactly like their SQL
/// counterparts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
    locations: RwLock<HashMap<LocationId, Location>>,
    movements: RwLock<HashMap<MovementId, Movement>>,
    users: RwLock<Vec<User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn movements_snapshot(&self) -> DomainResult<Vec<Movement>> {
        let map = self
            .movements
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        Ok(map.values().cloned().collect())
    }
}

/// Most recent first; id as a tie-break for determinism.
fn sort_most_recent_first(movements: &mut [Movement]) {
    movements.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| b.id().cmp(a.id()))
    });
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert(&self, product: Product) -> DomainResult<()> {
        let mut map = self
            .products
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if map.contains_key(product.id()) {
            return Err(DomainError::duplicate_key(format!(
                "product '{}' already exists",
                product.id()
            )));
        }
        map.insert(product.id().clone(), product);
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> DomainResult<Product> {
        let map = self
            .products
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product '{id}' not found")))
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let map = self
            .products
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(products)
    }

    async fn update(&self, product: Product) -> DomainResult<()> {
        let mut map = self
            .products
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if !map.contains_key(product.id()) {
            return Err(DomainError::not_found(format!(
                "product '{}' not found",
                product.id()
            )));
        }
        map.insert(product.id().clone(), product);
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> DomainResult<()> {
        let mut map = self
            .products
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(format!("product '{id}' not found")))
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn insert(&self, location: Location) -> DomainResult<()> {
        let mut map = self
            .locations
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if map.contains_key(location.id()) {
            return Err(DomainError::duplicate_key(format!(
                "location '{}' already exists",
                location.id()
            )));
        }
        map.insert(location.id().clone(), location);
        Ok(())
    }

    async fn get(&self, id: &LocationId) -> DomainResult<Location> {
        let map = self
            .locations
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("location '{id}' not found")))
    }

    async fn list(&self) -> DomainResult<Vec<Location>> {
        let map = self
            .locations
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        let mut locations: Vec<Location> = map.values().cloned().collect();
        locations.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(locations)
    }

    async fn update(&self, location: Location) -> DomainResult<()> {
        let mut map = self
            .locations
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if !map.contains_key(location.id()) {
            return Err(DomainError::not_found(format!(
                "location '{}' not found",
                location.id()
            )));
        }
        map.insert(location.id().clone(), location);
        Ok(())
    }

    async fn delete(&self, id: &LocationId) -> DomainResult<()> {
        let mut map = self
            .locations
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(format!("location '{id}' not found")))
    }
}

#[async_trait]
impl MovementStore for InMemoryStore {
    async fn insert(&self, movement: Movement) -> DomainResult<()> {
        let mut map = self
            .movements
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if map.contains_key(movement.id()) {
            return Err(DomainError::duplicate_key(format!(
                "movement '{}' already exists",
                movement.id()
            )));
        }
        map.insert(movement.id().clone(), movement);
        Ok(())
    }

    async fn get(&self, id: &MovementId) -> DomainResult<Movement> {
        let map = self
            .movements
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("movement '{id}' not found")))
    }

    async fn list(&self) -> DomainResult<Vec<Movement>> {
        let mut movements = self.movements_snapshot()?;
        sort_most_recent_first(&mut movements);
        Ok(movements)
    }

    async fn update(&self, movement: Movement) -> DomainResult<()> {
        let mut map = self
            .movements
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if !map.contains_key(movement.id()) {
            return Err(DomainError::not_found(format!(
                "movement '{}' not found",
                movement.id()
            )));
        }
        map.insert(movement.id().clone(), movement);
        Ok(())
    }

    async fn delete(&self, id: &MovementId) -> DomainResult<()> {
        let mut map = self
            .movements
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(format!("movement '{id}' not found")))
    }

    async fn movements_involving(&self, location: &LocationId) -> DomainResult<Vec<Movement>> {
        let mut movements: Vec<Movement> = self
            .movements_snapshot()?
            .into_iter()
            .filter(|m| {
                m.from_location() == Some(location) || m.to_location() == Some(location)
            })
            .collect();
        sort_most_recent_first(&mut movements);
        Ok(movements)
    }

    async fn references_product(&self, product: &ProductId) -> DomainResult<bool> {
        let map = self
            .movements
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        Ok(map.values().any(|m| m.product_id() == product))
    }

    async fn qty_at(&self, location: &LocationId, product: &ProductId) -> DomainResult<i64> {
        let movements = self.movements_snapshot()?;
        Ok(ledger::net_quantity(&movements, product, location))
    }

    async fn current_stock(&self, product: &ProductId) -> DomainResult<i64> {
        let movements = self.movements_snapshot()?;
        Ok(ledger::current_stock(&movements, product))
    }

    async fn net_by_product_location(
        &self,
    ) -> DomainResult<HashMap<(ProductId, LocationId), i64>> {
        let movements = self.movements_snapshot()?;
        Ok(ledger::net_by_product_location(&movements))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, user: User) -> DomainResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        if users.iter().any(|u| u.username() == user.username()) {
            return Err(DomainError::duplicate_key(format!(
                "username '{}' already exists",
                user.username()
            )));
        }
        if users.iter().any(|u| u.email() == user.email()) {
            return Err(DomainError::duplicate_key(format!(
                "email '{}' already exists",
                user.email()
            )));
        }
        users.push(user);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))?;
        Ok(users.iter().find(|u| u.username() == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: &str) -> Product {
        Product::new(ProductId::new(id).unwrap(), format!("Product {id}"), "").unwrap()
    }

    fn inbound(id: &str, to: &str, product: &str, qty: i64) -> Movement {
        Movement::new(
            MovementId::new(id).unwrap(),
            Utc::now(),
            None,
            Some(LocationId::new(to).unwrap()),
            ProductId::new(product).unwrap(),
            qty,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn product_insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        ProductStore::insert(&store, product("P1")).await.unwrap();
        let err = ProductStore::insert(&store, product("P1")).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn product_list_is_sorted_by_id() {
        let store = InMemoryStore::new();
        for id in ["P3", "P1", "P2"] {
            ProductStore::insert(&store, product(id)).await.unwrap();
        }
        let ids: Vec<String> = ProductStore::list(&store)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn movement_aggregates_fold_the_ledger() {
        let store = InMemoryStore::new();
        let x = ProductId::new("X").unwrap();
        let a = LocationId::new("A").unwrap();

        MovementStore::insert(&store, inbound("M1", "A", "X", 50))
            .await
            .unwrap();
        assert_eq!(store.qty_at(&a, &x).await.unwrap(), 50);
        assert_eq!(store.current_stock(&x).await.unwrap(), 50);
        assert!(store.references_product(&x).await.unwrap());
    }

    #[tokio::test]
    async fn user_insert_rejects_duplicate_username_and_email() {
        let store = InMemoryStore::new();
        let user = |name: &str, email: &str| {
            User::new(stockbook_core::UserId::new(), name, email, "h").unwrap()
        };

        UserStore::insert(&store, user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = UserStore::insert(&store, user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));

        let err = UserStore::insert(&store, user("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));
    }
}
