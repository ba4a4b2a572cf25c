//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let api_routes = Router::new()
        // Relay builds
        .route("/builds", get(handlers::build::list_builds))
        .route("/builds/customize", post(handlers::build::customize_build))
        .route("/builds/{buildId}", get(handlers::build::get_build))
        // Gateway builds
        .route(
            "/gateway-builds",
            get(handlers::gateway::list_gateway_builds)
                .post(handlers::gateway::import_gateway_build),
        )
        .route(
            "/gateway-builds/{buildId}",
            get(handlers::gateway::get_gateway_build),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let axum::Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_router_builds() {
        let (state, _dir) = handlers::test_support::test_state().await;
        let _router = build_router(state);
    }
}
