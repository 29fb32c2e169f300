//! Request DTOs and JSON projections of the domain records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use stockbook_core::{DomainError, DomainResult, LocationId};
use stockbook_locations::Location;
use stockbook_movements::Movement;
use stockbook_products::Product;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Movement payloads accept `qty` as a raw JSON value so malformed numeric
/// input surfaces as a constraint violation rather than a generic body
/// rejection.
#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    pub movement_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub from_location: Option<String>,
    #[serde(default)]
    pub to_location: Option<String>,
    pub product_id: String,
    pub qty: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovementRequest {
    #[serde(default)]
    pub from_location: Option<String>,
    #[serde(default)]
    pub to_location: Option<String>,
    pub product_id: String,
    pub qty: JsonValue,
}

pub fn parse_qty(value: &JsonValue) -> DomainResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| DomainError::constraint("qty must be an integer"))
}

/// An omitted or empty-string endpoint means the external boundary.
pub fn optional_location(value: Option<String>) -> DomainResult<Option<LocationId>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => LocationId::new(s).map(Some),
    }
}

pub fn product_to_json(product: &Product) -> JsonValue {
    serde_json::json!({
        "product_id": product.id().as_str(),
        "name": product.name(),
        "description": product.description(),
        "total_qty": product.total_qty(),
    })
}

pub fn location_to_json(location: &Location) -> JsonValue {
    serde_json::json!({
        "location_id": location.id().as_str(),
        "name": location.name(),
        "address": location.address(),
    })
}

pub fn movement_to_json(movement: &Movement) -> JsonValue {
    serde_json::json!({
        "movement_id": movement.id().as_str(),
        "timestamp": movement.timestamp(),
        "from_location": movement.from_location().map(|l| l.as_str()),
        "to_location": movement.to_location().map(|l| l.as_str()),
        "product_id": movement.product_id().as_str(),
        "qty": movement.qty(),
        "kind": movement.kind().to_string(),
    })
}
