//! Review subresource handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::success;
use crate::auth::AuthIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Wire shape of a review create/update body.
#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub rating: u8,
}

/// Handler for POST /medications/:id/reviews.
pub async fn create(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(payload): Json<ReviewPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let review = state
        .service
        .add_review(&identity, &id, &payload.review, payload.rating)?;
    info!(medication_id = %id, review_id = %review.id, "review added");
    Ok((StatusCode::CREATED, success(review.id)))
}

/// Handler for GET /medications/:id/reviews.
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let reviews = state.service.list_reviews(&id)?;
    Ok(success(reviews))
}

/// Handler for GET /medications/:id/reviews/:review_id.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let review = state.service.get_review(&id, &review_id)?;
    Ok(success(review))
}

/// Handler for PUT /medications/:id/reviews/:review_id.
pub async fn update(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path((id, review_id)): Path<(String, String)>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<Value>, ApiError> {
    let modified =
        state
            .service
            .update_review(&identity, &id, &review_id, &payload.review, payload.rating)?;
    Ok(success(modified))
}

/// Handler for DELETE /medications/:id/reviews/:review_id.
pub async fn delete(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.service.delete_review(&identity, &id, &review_id)?;
    Ok(success(removed))
}
