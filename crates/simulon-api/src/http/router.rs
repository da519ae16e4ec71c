//! Axum router configuration with middleware.
//!
//! Routes:
//! - POST   /api/think          - run the loop (or a single turn)
//! - GET    /api/sessions/{id}  - session history
//! - DELETE /api/sessions/{id}  - drop a session
//! - GET    /health             - liveness probe
//! - GET    /                   - browser client shell
//!
//! Middleware: permissive CORS, request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/think", post(handlers::think::think))
        .route(
            "/sessions/{id}",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::system::health))
        .route("/", get(handlers::system::index))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
