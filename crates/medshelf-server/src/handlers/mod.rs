//! HTTP request handlers.

pub mod images;
pub mod medications;
pub mod reviews;

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope shared by the JSON endpoints.
pub(crate) fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Handler for the /health endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
