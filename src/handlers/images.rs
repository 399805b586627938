use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminSession;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::Image;
use crate::state::AppState;

/// Descriptive metadata about a file uploaded elsewhere; creating or deleting
/// a row performs no file operation.
#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
}

fn validate(payload: &ImagePayload) -> ApiResult<()> {
    let mut errors = FieldErrors::default();

    match &payload.file_name {
        Some(name) if name.trim().is_empty() => {
            errors.push("file_name", "must be a non-empty string")
        }
        None => errors.push("file_name", "is required"),
        _ => {}
    }
    match &payload.file_path {
        Some(path) if path.trim().is_empty() => {
            errors.push("file_path", "must be a non-empty string")
        }
        None => errors.push("file_path", "is required"),
        _ => {}
    }
    if let Some(size) = payload.file_size {
        if size < 0 {
            errors.push("file_size", "must be a non-negative integer");
        }
    }

    errors.into_result(())
}

/// GET /images
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM images ORDER BY created_at DESC, id DESC",
        Image::COLUMNS
    ))?;
    let images = stmt
        .query_map([], Image::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(images))
}

/// POST /images
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<ImagePayload>,
) -> ApiResult<impl IntoResponse> {
    validate(&payload)?;

    let now = Utc::now().to_rfc3339();
    let conn = state.db.lock().await;
    conn.execute(
        "INSERT INTO images (file_name, file_path, file_type, file_size, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            payload.file_name.unwrap_or_default(),
            payload.file_path.unwrap_or_default(),
            payload.file_type,
            payload.file_size,
            now,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    let image = conn
        .query_row(
            &format!("SELECT {} FROM images WHERE id = ?", Image::COLUMNS),
            [id],
            Image::from_row,
        )
        .optional()?
        .ok_or(ApiError::NotFound { entity: "Image", id })?;
    tracing::info!(id, "image record created");

    Ok((StatusCode::CREATED, Json(image)))
}

/// DELETE /images/:id
pub async fn destroy(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let deleted = conn.execute("DELETE FROM images WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ApiError::NotFound { entity: "Image", id });
    }
    tracing::info!(id, "image record deleted");

    Ok(Json(json!({ "message": "Image deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_and_path() {
        let payload = ImagePayload {
            file_name: None,
            file_path: None,
            file_type: None,
            file_size: None,
        };
        match validate(&payload).unwrap_err() {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.0.iter().map(|(f, _)| *f).collect();
                assert_eq!(fields, vec!["file_name", "file_path"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_file_size_is_rejected() {
        let payload = ImagePayload {
            file_name: Some("a.png".to_string()),
            file_path: Some("/uploads/a.png".to_string()),
            file_type: None,
            file_size: Some(-1),
        };
        assert!(validate(&payload).is_err());
    }
}
