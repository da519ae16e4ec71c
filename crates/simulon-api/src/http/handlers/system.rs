//! Health probe and the embedded browser shell.

use axum::Json;
use axum::response::Html;
use serde_json::{Value, json};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
