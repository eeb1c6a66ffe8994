mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::PermissionEngine;

pub fn build_router(engine: PermissionEngine) -> Router {
    let state = Arc::new(AppState::new(engine));

    Router::new()
        .route("/api/check", get(handlers::check))
        .route("/api/regions/{code}", get(handlers::region))
        .route("/api/distributors", get(handlers::list_distributors).post(handlers::add_distributor))
        .route("/api/distributors/{name}/permissions", post(handlers::set_permissions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(engine: PermissionEngine, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(engine);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "territory server listening");
    axum::serve(listener, app).await
}
