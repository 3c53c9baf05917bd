//! Serving uploaded images from the configured upload root.
//!
//! Image bytes are written by the external uploader; this handler only reads
//! files already under the root, and refuses any resolved path outside it.

use std::io::ErrorKind;
use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use soft_canonicalize::soft_canonicalize;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve a client-supplied filename against the upload root.
///
/// Canonicalizes both sides so `..` segments and symlinked parents cannot
/// escape the root.
fn resolve_upload_path(root: &FsPath, filename: &str) -> Result<PathBuf, ApiError> {
    let root = soft_canonicalize(root)?;
    let candidate = soft_canonicalize(root.join(filename))?;
    if !candidate.starts_with(&root) {
        warn!(filename, "rejected image path outside upload root");
        return Err(ApiError::InvalidInput("Invalid image filename".into()));
    }
    Ok(candidate)
}

fn content_type_for(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Handler for GET /medications/images/:filename.
pub async fn serve(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = resolve_upload_path(&state.config.upload_dir, &filename)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Image not found".into()));
        }
        Err(e) => return Err(ApiError::Io(e)),
    };
    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response())
}
