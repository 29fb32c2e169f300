use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, LocationId};

/// Registry record: Location.
///
/// A physical or logical stock point. The *absence* of a location on a
/// movement endpoint denotes the external world (supplier or customer);
/// that boundary is never represented by a Location record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    address: String,
}

impl Location {
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }

        Ok(Self {
            id,
            name: name.trim().to_string(),
            address: address.into(),
        })
    }

    pub fn id(&self) -> &LocationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Update the mutable registry fields (identity is immutable).
    pub fn update(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        self.name = name.trim().to_string();
        self.address = address.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lid(s: &str) -> LocationId {
        LocationId::new(s).unwrap()
    }

    #[test]
    fn new_location_holds_fields() {
        let l = Location::new(lid("WH-A"), "Warehouse A", "1 Dock Rd").unwrap();
        assert_eq!(l.id().as_str(), "WH-A");
        assert_eq!(l.name(), "Warehouse A");
        assert_eq!(l.address(), "1 Dock Rd");
    }

    #[test]
    fn new_location_rejects_empty_name() {
        let err = Location::new(lid("WH-A"), "", "addr").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_replaces_fields() {
        let mut l = Location::new(lid("WH-A"), "Warehouse A", "old").unwrap();
        l.update("Warehouse A2", "new").unwrap();
        assert_eq!(l.name(), "Warehouse A2");
        assert_eq!(l.address(), "new");
    }
}
