use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, ProductId};

/// Registry record: Product.
///
/// `total_qty` is an advisory cache of the product's current stock. It is
/// written only by an explicit recompute call and is never authoritative;
/// the movement ledger is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    total_qty: i64,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        Ok(Self {
            id,
            name: name.trim().to_string(),
            description: description.into(),
            total_qty: 0,
        })
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Cached stock total. Advisory only; derive authoritative values from the ledger.
    pub fn total_qty(&self) -> i64 {
        self.total_qty
    }

    /// Update the mutable registry fields (identity is immutable).
    pub fn update(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        self.name = name.trim().to_string();
        self.description = description.into();
        Ok(())
    }

    /// Overwrite the advisory stock cache.
    pub fn set_total_qty(&mut self, total_qty: i64) {
        self.total_qty = total_qty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    #[test]
    fn new_product_starts_with_zero_cached_qty() {
        let p = Product::new(pid("P-001"), "Widget", "A widget").unwrap();
        assert_eq!(p.id().as_str(), "P-001");
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.total_qty(), 0);
    }

    #[test]
    fn new_product_rejects_empty_name() {
        let err = Product::new(pid("P-001"), "   ", "desc").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn name_is_trimmed() {
        let p = Product::new(pid("P-001"), "  Widget  ", "").unwrap();
        assert_eq!(p.name(), "Widget");
    }

    #[test]
    fn update_replaces_fields_but_not_identity() {
        let mut p = Product::new(pid("P-001"), "Widget", "old").unwrap();
        p.update("Gadget", "new").unwrap();
        assert_eq!(p.id().as_str(), "P-001");
        assert_eq!(p.name(), "Gadget");
        assert_eq!(p.description(), "new");
    }

    #[test]
    fn update_rejects_empty_name() {
        let mut p = Product::new(pid("P-001"), "Widget", "").unwrap();
        let err = p.update("", "desc").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(p.name(), "Widget");
    }

    #[test]
    fn set_total_qty_overwrites_cache() {
        let mut p = Product::new(pid("P-001"), "Widget", "").unwrap();
        p.set_total_qty(42);
        assert_eq!(p.total_qty(), 42);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: construction never panics and always trims the name.
            #[test]
            fn name_is_always_stored_trimmed(
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                pad_left in " {0,3}",
                pad_right in " {0,3}"
            ) {
                let padded = format!("{pad_left}{name}{pad_right}");
                let p = Product::new(pid("P-1"), padded, "").unwrap();
                prop_assert_eq!(p.name(), name.trim());
            }
        }
    }
}
