pub mod auth;
pub mod certificates;
pub mod files;
pub mod images;
pub mod updates;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 5 MiB image plus form fields and multipart framing.
const MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/updates", get(updates::list_public).post(updates::create))
        .route("/certificates", get(certificates::list_public).post(certificates::create))
        .route("/images", get(images::list).post(images::create))
        .route("/login", post(auth::login))
        .route("/storage/*path", get(files::serve))
        // Session-gated (each handler takes an AdminSession extractor)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/admin/updates", get(updates::list_admin))
        .route("/updates/:id", put(updates::update).delete(updates::destroy))
        .route("/admin/certificates", get(certificates::list_admin))
        .route(
            "/certificates/:id",
            put(certificates::update).delete(certificates::destroy),
        )
        .route("/images/:id", delete(images::destroy))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
