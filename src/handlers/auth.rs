use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use rusqlite::OptionalExtension;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{create_auth_token, revoke_auth_token, verify_password, AdminSession};
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = {
        let conn = state.db.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?", User::COLUMNS),
            [&input.email],
            User::from_row,
        )
        .optional()?
    };

    let user = match user {
        Some(user) if verify_password(&input.password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
    };

    let token = create_auth_token(&state.db, user.id).await?;
    tracing::info!(user_id = user.id, "admin logged in");

    Ok(Json(json!({ "token": token, "user": user })))
}

/// POST /logout
pub async fn logout(
    session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    revoke_auth_token(&state.db, &session.token).await?;
    tracing::info!(user_id = session.user_id, "admin logged out");

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// GET /me
pub async fn me(
    session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .lock()
        .await
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?", User::COLUMNS),
            [session.user_id],
            User::from_row,
        )
        .optional()?
        .ok_or(ApiError::NotFound {
            entity: "User",
            id: session.user_id,
        })?;

    Ok(Json(user))
}
