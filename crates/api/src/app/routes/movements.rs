use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockbook_core::MovementId;
use stockbook_infra::service::{MovementChanges, NewMovement};

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_movements).post(create_movement))
        .route(
            "/:id",
            get(get_movement)
                .put(update_movement)
                .delete(delete_movement),
        )
}

fn parse_id(id: &str) -> Result<MovementId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_movements().await {
        Ok(movements) => {
            let body: Vec<_> = movements.iter().map(dto::movement_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMovementRequest>,
) -> axum::response::Response {
    let new = match build_new_movement(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.record_movement(new).await {
        Ok(movement) => {
            (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn build_new_movement(
    body: dto::CreateMovementRequest,
) -> Result<NewMovement, axum::response::Response> {
    let movement_id = parse_id(&body.movement_id)?;
    let product_id = body
        .product_id
        .parse()
        .map_err(errors::domain_error_to_response)?;
    let from_location =
        dto::optional_location(body.from_location).map_err(errors::domain_error_to_response)?;
    let to_location =
        dto::optional_location(body.to_location).map_err(errors::domain_error_to_response)?;
    let qty = dto::parse_qty(&body.qty).map_err(errors::domain_error_to_response)?;

    Ok(NewMovement {
        movement_id,
        timestamp: body.timestamp,
        from_location,
        to_location,
        product_id,
        qty,
    })
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get_movement(&id).await {
        Ok(movement) => (StatusCode::OK, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateMovementRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let changes = match build_movement_changes(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.update_movement(&id, changes).await {
        Ok(movement) => (StatusCode::OK, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn build_movement_changes(
    body: dto::UpdateMovementRequest,
) -> Result<MovementChanges, axum::response::Response> {
    let product_id = body
        .product_id
        .parse()
        .map_err(errors::domain_error_to_response)?;
    let from_location =
        dto::optional_location(body.from_location).map_err(errors::domain_error_to_response)?;
    let to_location =
        dto::optional_location(body.to_location).map_err(errors::domain_error_to_response)?;
    let qty = dto::parse_qty(&body.qty).map_err(errors::domain_error_to_response)?;

    Ok(MovementChanges {
        from_location,
        to_location,
        product_id,
        qty,
    })
}

pub async fn delete_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.delete_movement(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
