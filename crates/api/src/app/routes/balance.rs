use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{errors, AppServices};

/// The balance report: every (product, location) pair holding a strictly
/// positive net quantity.
pub async fn balance_report(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.balance_report().await {
        Ok(rows) => {
            let body: Vec<_> = rows
                .iter()
                .map(|row| {
                    serde_json::json!({
                        "product_id": row.product_id.as_str(),
                        "product": row.product_name,
                        "location_id": row.location_id.as_str(),
                        "location": row.location_name,
                        "qty": row.qty,
                    })
                })
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
