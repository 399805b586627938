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
use crate::models::Update;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

fn validate(payload: &UpdatePayload, required: bool) -> ApiResult<()> {
    let mut errors = FieldErrors::default();

    match &payload.title {
        Some(title) if title.trim().is_empty() || title.chars().count() > 255 => {
            errors.push("title", "must be a non-empty string of at most 255 characters")
        }
        None if required => errors.push("title", "is required"),
        _ => {}
    }
    match &payload.description {
        Some(description) if description.trim().is_empty() => {
            errors.push("description", "must be a non-empty string")
        }
        None if required => errors.push("description", "is required"),
        _ => {}
    }

    errors.into_result(())
}

fn find_update(conn: &rusqlite::Connection, id: i64) -> ApiResult<Update> {
    conn.query_row(
        &format!("SELECT {} FROM updates WHERE id = ?", Update::COLUMNS),
        [id],
        Update::from_row,
    )
    .optional()?
    .ok_or(ApiError::NotFound {
        entity: "Update",
        id,
    })
}

/// GET /updates
pub async fn list_public(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM updates WHERE published = 1 ORDER BY created_at DESC, id DESC",
        Update::COLUMNS
    ))?;
    let updates = stmt
        .query_map([], Update::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(updates))
}

/// GET /admin/updates
pub async fn list_admin(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM updates ORDER BY created_at DESC, id DESC",
        Update::COLUMNS
    ))?;
    let updates = stmt
        .query_map([], Update::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(updates))
}

/// POST /updates
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePayload>,
) -> ApiResult<impl IntoResponse> {
    validate(&payload, true)?;

    let now = Utc::now().to_rfc3339();
    let conn = state.db.lock().await;
    conn.execute(
        "INSERT INTO updates (title, description, category, image_url, published, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            payload.title.unwrap_or_default(),
            payload.description.unwrap_or_default(),
            payload.category,
            payload.image_url,
            payload.published.unwrap_or(false),
            now,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    let update = find_update(&conn, id)?;
    tracing::info!(id, "update created");

    Ok((StatusCode::CREATED, Json(update)))
}

/// PUT /updates/:id — partial update, unsupplied fields keep prior values.
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePayload>,
) -> ApiResult<impl IntoResponse> {
    validate(&payload, false)?;

    let conn = state.db.lock().await;
    let existing = find_update(&conn, id)?;

    conn.execute(
        "UPDATE updates SET title = ?, description = ?, category = ?, image_url = ?, published = ?, updated_at = ?
         WHERE id = ?",
        params![
            payload.title.unwrap_or(existing.title),
            payload.description.unwrap_or(existing.description),
            payload.category.or(existing.category),
            payload.image_url.or(existing.image_url),
            payload.published.unwrap_or(existing.published),
            Utc::now().to_rfc3339(),
            id
        ],
    )?;
    let update = find_update(&conn, id)?;
    tracing::info!(id, "update modified");

    Ok(Json(update))
}

/// DELETE /updates/:id
pub async fn destroy(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let deleted = conn.execute("DELETE FROM updates WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ApiError::NotFound {
            entity: "Update",
            id,
        });
    }
    tracing::info!(id, "update deleted");

    Ok(Json(json!({ "message": "Update deleted successfully" })))
}
