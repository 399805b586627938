use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs;
use tokio_util::io::ReaderStream;

use crate::state::AppState;

/// GET /storage/*path — stream a stored file back to the browser.
pub async fn serve(State(state): State<AppState>, Path(rel): Path<String>) -> Response {
    let Some(path) = state.storage.resolve(&rel) else {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };

    match fs::File::open(&path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            let body = Body::from_stream(stream);

            let mime_type = mime_guess::from_path(&path).first_or_octet_stream();

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime_type.as_ref())
                .header(header::CACHE_CONTROL, "public, max-age=31536000")
                .body(body)
                .unwrap()
        }
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}
