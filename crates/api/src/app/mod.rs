use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::get, Router};

use stockbook_infra::{InMemoryStore, LedgerService, PostgresStore};

pub mod dto;
pub mod errors;
pub mod routes;

/// Wired application services shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: LedgerService,
}

fn build_in_memory_services() -> AppServices {
    let store = Arc::new(InMemoryStore::new());
    AppServices {
        ledger: LedgerService::new(store.clone(), store.clone(), store.clone(), store),
    }
}

async fn build_persistent_services(database_url: &str) -> AppServices {
    let pool = sqlx::PgPool::connect(database_url)
        .await
        .expect("failed to connect to Postgres");

    let store = Arc::new(PostgresStore::new(pool));
    store.migrate().await.expect("failed to create schema");

    AppServices {
        ledger: LedgerService::new(store.clone(), store.clone(), store.clone(), store),
    }
}

/// Build the application router with env-selected storage.
///
/// `USE_PERSISTENT_STORES=true` (plus `DATABASE_URL`) selects Postgres;
/// the default is the in-memory backend (dev/tests).
pub async fn build_app() -> Router {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let services = if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        build_persistent_services(&database_url).await
    } else {
        build_in_memory_services()
    };

    router(Arc::new(services))
}

/// Assemble the router around already-wired services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/balance", get(routes::balance::balance_report))
        .nest("/products", routes::products::router())
        .nest("/locations", routes::locations::router())
        .nest("/movements", routes::movements::router())
        .layer(Extension(services))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
