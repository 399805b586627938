use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Field-level validation failures, accumulated so a single response can
/// enumerate every offending field.
#[derive(Debug, Default)]
pub struct FieldErrors(pub Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> ApiResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed multipart request: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, message) in errors.0 {
                    fields.insert(field.to_string(), json!(message));
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "message": "The given data was invalid", "errors": fields })),
                )
                    .into_response()
            }
            ApiError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("{entity} with id {id} not found") })),
            )
                .into_response(),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": message })),
            )
                .into_response(),
            ApiError::Multipart(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": format!("malformed multipart request: {err}") })),
            )
                .into_response(),
            // Row lookups go through OptionalExtension, so a stray
            // QueryReturnedNoRows still maps to 404 rather than 500.
            ApiError::Database(rusqlite::Error::QueryReturnedNoRows) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Resource not found" })),
            )
                .into_response(),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "database error");
                internal_error()
            }
            ApiError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Internal server error" })),
    )
        .into_response()
}
