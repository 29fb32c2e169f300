use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, LocationId, MovementId, ProductId};

/// Movement classification, derived from which endpoints are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// External boundary → location.
    Inbound,
    /// Location → external boundary.
    Outbound,
    /// Location → location.
    Transfer,
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MovementKind::Inbound => write!(f, "Inbound"),
            MovementKind::Outbound => write!(f, "Outbound"),
            MovementKind::Transfer => write!(f, "Transfer"),
        }
    }
}

/// Ledger record: a directed quantity transfer of one product.
///
/// # Invariants
/// - `qty` is strictly positive.
/// - At least one of `from_location` / `to_location` is set.
/// - If both endpoints are set, they differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    id: MovementId,
    timestamp: DateTime<Utc>,
    from_location: Option<LocationId>,
    to_location: Option<LocationId>,
    product_id: ProductId,
    qty: i64,
}

impl Movement {
    /// Construct a structurally valid movement.
    ///
    /// Enforces the endpoint and quantity invariants. Stock availability is
    /// a ledger-level concern and is checked by the service, not here.
    pub fn new(
        id: MovementId,
        timestamp: DateTime<Utc>,
        from_location: Option<LocationId>,
        to_location: Option<LocationId>,
        product_id: ProductId,
        qty: i64,
    ) -> Result<Self, DomainError> {
        if qty <= 0 {
            return Err(DomainError::invalid_movement("quantity must be positive"));
        }

        match (&from_location, &to_location) {
            (None, None) => {
                return Err(DomainError::invalid_movement(
                    "either a source or a destination location must be specified",
                ));
            }
            (Some(from), Some(to)) if from == to => {
                return Err(DomainError::invalid_movement(
                    "source and destination location cannot be the same",
                ));
            }
            _ => {}
        }

        Ok(Self {
            id,
            timestamp,
            from_location,
            to_location,
            product_id,
            qty,
        })
    }

    pub fn id(&self) -> &MovementId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn from_location(&self) -> Option<&LocationId> {
        self.from_location.as_ref()
    }

    pub fn to_location(&self) -> Option<&LocationId> {
        self.to_location.as_ref()
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn qty(&self) -> i64 {
        self.qty
    }

    pub fn kind(&self) -> MovementKind {
        match (&self.from_location, &self.to_location) {
            (None, Some(_)) => MovementKind::Inbound,
            (Some(_), None) => MovementKind::Outbound,
            (Some(_), Some(_)) => MovementKind::Transfer,
            // Unreachable by construction.
            (None, None) => unreachable!("movement with no endpoints"),
        }
    }

    /// Signed effect of this movement on the net quantity of its product at
    /// `location`: positive when received there, negative when sent from there.
    pub fn net_effect_at(&self, location: &LocationId) -> i64 {
        let mut effect = 0;
        if self.to_location.as_ref() == Some(location) {
            effect += self.qty;
        }
        if self.from_location.as_ref() == Some(location) {
            effect -= self.qty;
        }
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid(s: &str) -> MovementId {
        MovementId::new(s).unwrap()
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn lid(s: &str) -> LocationId {
        LocationId::new(s).unwrap()
    }

    #[test]
    fn inbound_outbound_transfer_classification() {
        let inbound = Movement::new(mid("M1"), Utc::now(), None, Some(lid("A")), pid("X"), 5).unwrap();
        let outbound = Movement::new(mid("M2"), Utc::now(), Some(lid("A")), None, pid("X"), 5).unwrap();
        let transfer =
            Movement::new(mid("M3"), Utc::now(), Some(lid("A")), Some(lid("B")), pid("X"), 5).unwrap();

        assert_eq!(inbound.kind(), MovementKind::Inbound);
        assert_eq!(outbound.kind(), MovementKind::Outbound);
        assert_eq!(transfer.kind(), MovementKind::Transfer);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        for qty in [0, -1, -50] {
            let err = Movement::new(mid("M1"), Utc::now(), None, Some(lid("A")), pid("X"), qty)
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidMovement(_)));
        }
    }

    #[test]
    fn rejects_movement_with_no_endpoints() {
        let err = Movement::new(mid("M1"), Utc::now(), None, None, pid("X"), 5).unwrap_err();
        assert!(matches!(err, DomainError::InvalidMovement(_)));
    }

    #[test]
    fn rejects_identical_endpoints_regardless_of_quantity() {
        for qty in [1, 999] {
            let err =
                Movement::new(mid("M1"), Utc::now(), Some(lid("A")), Some(lid("A")), pid("X"), qty)
                    .unwrap_err();
            assert!(matches!(err, DomainError::InvalidMovement(_)));
        }
    }

    #[test]
    fn net_effect_is_signed_per_endpoint() {
        let transfer =
            Movement::new(mid("M1"), Utc::now(), Some(lid("A")), Some(lid("B")), pid("X"), 7).unwrap();
        assert_eq!(transfer.net_effect_at(&lid("A")), -7);
        assert_eq!(transfer.net_effect_at(&lid("B")), 7);
        assert_eq!(transfer.net_effect_at(&lid("C")), 0);
    }
}
