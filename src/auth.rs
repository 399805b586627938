use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::DbConnection;
use crate::error::ApiError;
use crate::state::AppState;

pub fn hash_password(password: &str) -> String {
    hash(password, DEFAULT_COST).unwrap()
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub async fn create_auth_token(conn: &DbConnection, user_id: i64) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let now = Utc::now();

    conn.lock().await.execute(
        "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)",
        params![token, user_id, now.to_rfc3339()],
    )?;

    Ok(token)
}

pub async fn revoke_auth_token(conn: &DbConnection, token: &str) -> Result<(), rusqlite::Error> {
    conn.lock()
        .await
        .execute("DELETE FROM auth_tokens WHERE token = ?", [token])?;
    Ok(())
}

/// Authenticated admin identity, resolved per request from the bearer token
/// in the `Authorization` header. Add it as a handler parameter to gate the
/// endpoint; there is no process-wide session state.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: i64,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

        // Bare tokens are tolerated alongside the usual Bearer scheme.
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(ApiError::Unauthorized("Missing token".to_string()));
        }

        let user_id: Option<i64> = state
            .db
            .lock()
            .await
            .query_row(
                "SELECT user_id FROM auth_tokens WHERE token = ?",
                [token],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(user_id) => Ok(AdminSession {
                user_id,
                token: token.to_string(),
            }),
            None => Err(ApiError::Unauthorized("Invalid token".to_string())),
        }
    }
}
