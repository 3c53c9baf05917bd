//! Medication CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use medshelf_core::{Availability, ImageRef, MedicationChanges};

use super::success;
use crate::auth::AuthIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Wire shape of a medication create/update body.
///
/// Every field is defaulted so a missing field reaches domain validation
/// instead of failing JSON extraction. Identity is never part of the body.
#[derive(Debug, Deserialize)]
pub struct MedicationPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub generic_name: String,
    #[serde(default)]
    pub medication_class: String,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl From<MedicationPayload> for MedicationChanges {
    fn from(payload: MedicationPayload) -> Self {
        MedicationChanges {
            name: payload.name,
            generic_name: payload.generic_name,
            medication_class: payload.medication_class,
            availability: payload.availability,
            images: payload.images,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub first_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub name: Option<String>,
}

/// Handler for POST /medications.
pub async fn create(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<MedicationPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let medication = state.service.create(&identity, payload.into())?;
    info!(id = %medication.id, name = %medication.name, "medication created");
    Ok((StatusCode::CREATED, success(medication)))
}

/// Handler for GET /medications?first_letter=A.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let letter = query.first_letter.unwrap_or_else(|| "A".to_string());
    let shelf = state.service.list_by_letter(&letter)?;
    Ok(success(shelf))
}

/// Handler for GET /medications/search?query=asp.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let results = state.service.search(&query.query.unwrap_or_default())?;
    Ok(success(results))
}

/// Handler for GET /medications/exists?name=Aspirin.
///
/// Bare `{exists}` shape, consumed by the duplicate-name form validator.
pub async fn exists(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> Result<Json<Value>, ApiError> {
    let exists = state.service.exists(&query.name.unwrap_or_default())?;
    Ok(Json(json!({ "exists": exists })))
}

/// Handler for GET /medications/:id.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let medication = state.service.get(&id)?;
    Ok(success(medication))
}

/// Handler for PUT /medications/:id.
pub async fn update(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(payload): Json<MedicationPayload>,
) -> Result<Json<Value>, ApiError> {
    let modified = state.service.update(&identity, &id, payload.into())?;
    Ok(success(modified))
}

/// Handler for DELETE /medications/:id.
pub async fn delete(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.service.delete(&identity, &id)?;
    info!(id = %id, "medication deleted");
    Ok(success(deleted))
}
