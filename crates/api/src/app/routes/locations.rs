use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockbook_core::LocationId;

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/:id",
            get(get_location)
                .put(update_location)
                .delete(delete_location),
        )
        .route("/:id/movements", get(get_location_movements))
}

fn parse_id(id: &str) -> Result<LocationId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_locations().await {
        Ok(locations) => {
            let body: Vec<_> = locations.iter().map(dto::location_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateLocationRequest>,
) -> axum::response::Response {
    let id = match parse_id(&body.location_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .ledger
        .create_location(id, body.name, body.address)
        .await
    {
        Ok(location) => {
            (StatusCode::CREATED, Json(dto::location_to_json(&location))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get_location(&id).await {
        Ok(location) => (StatusCode::OK, Json(dto::location_to_json(&location))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateLocationRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .ledger
        .update_location(&id, body.name, body.address)
        .await
    {
        Ok(location) => (StatusCode::OK, Json(dto::location_to_json(&location))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.delete_location(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_location_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.location_movements(&id).await {
        Ok(movements) => {
            let body: Vec<_> = movements.iter().map(dto::movement_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
