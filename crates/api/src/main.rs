#[tokio::main]
async fn main() {
    stockbook_observability::init();

    let app = stockbook_api::app::build_app().await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
