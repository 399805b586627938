//! Certificate CRUD together with the lifecycle of the uploaded image file.
//!
//! The row's `image_path` must always point at a file that exists under the
//! storage root: a replacement image is accepted only after the whole request
//! validates, the previous file is removed before the new path is recorded,
//! and deleting the row also deletes its file.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::json;

use crate::auth::AdminSession;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::Certificate;
use crate::state::AppState;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw multipart form fields, before validation.
#[derive(Debug, Default)]
pub struct CertificateForm {
    certificate_name: Option<String>,
    full_name: Option<String>,
    issuer: Option<String>,
    issue_date: Option<String>,
    certificate_number: Option<String>,
    score: Option<String>,
    skills_covered: Option<String>,
    description: Option<String>,
    is_visible: Option<String>,
    image: Option<UploadedImage>,
}

/// Validated input for a create.
#[derive(Debug)]
struct NewCertificate {
    certificate_name: String,
    full_name: String,
    issuer: String,
    issue_date: NaiveDate,
    certificate_number: Option<String>,
    score: Option<String>,
    skills_covered: Option<String>,
    description: Option<String>,
    is_visible: bool,
    image: UploadedImage,
}

/// Validated input for a partial update; `None` keeps the prior value.
#[derive(Debug, Default)]
struct CertificatePatch {
    certificate_name: Option<String>,
    full_name: Option<String>,
    issuer: Option<String>,
    issue_date: Option<NaiveDate>,
    certificate_number: Option<String>,
    score: Option<String>,
    skills_covered: Option<String>,
    description: Option<String>,
    is_visible: Option<bool>,
    image: Option<UploadedImage>,
}

impl CertificateForm {
    pub async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = CertificateForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "certificate_image" => {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    form.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        data,
                    });
                }
                "certificate_name" => form.certificate_name = Some(field.text().await?),
                "full_name" => form.full_name = Some(field.text().await?),
                "issuer" => form.issuer = Some(field.text().await?),
                "issue_date" => form.issue_date = Some(field.text().await?),
                "certificate_number" => form.certificate_number = Some(field.text().await?),
                "score" => form.score = Some(field.text().await?),
                "skills_covered" => form.skills_covered = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "is_visible" => form.is_visible = Some(field.text().await?),
                // Unknown fields are drained and ignored.
                _ => {
                    field.bytes().await?;
                }
            }
        }

        Ok(form)
    }

    fn validate_create(self) -> ApiResult<NewCertificate> {
        let mut errors = FieldErrors::default();

        let certificate_name = required_text(&mut errors, "certificate_name", self.certificate_name);
        let full_name = required_text(&mut errors, "full_name", self.full_name);
        let issuer = required_text(&mut errors, "issuer", self.issuer);

        let issue_date = match self.issue_date.as_deref() {
            Some(raw) => parse_issue_date(&mut errors, raw),
            None => {
                errors.push("issue_date", "is required");
                NaiveDate::default()
            }
        };

        let is_visible = match self.is_visible.as_deref() {
            Some(raw) => parse_bool(&mut errors, "is_visible", raw).unwrap_or(true),
            None => true,
        };

        let image = match self.image {
            Some(image) => {
                check_image(&mut errors, &image);
                Some(image)
            }
            None => {
                errors.push("certificate_image", "is required");
                None
            }
        };
        let Some(image) = image else {
            return Err(ApiError::Validation(errors));
        };

        errors.into_result(NewCertificate {
            certificate_name,
            full_name,
            issuer,
            issue_date,
            certificate_number: self.certificate_number,
            score: self.score,
            skills_covered: self.skills_covered,
            description: self.description,
            is_visible,
            image,
        })
    }

    fn validate_update(self) -> ApiResult<CertificatePatch> {
        let mut errors = FieldErrors::default();

        let certificate_name =
            optional_text(&mut errors, "certificate_name", self.certificate_name);
        let full_name = optional_text(&mut errors, "full_name", self.full_name);
        let issuer = optional_text(&mut errors, "issuer", self.issuer);

        let issue_date = self
            .issue_date
            .as_deref()
            .map(|raw| parse_issue_date(&mut errors, raw));

        let is_visible = self
            .is_visible
            .as_deref()
            .and_then(|raw| parse_bool(&mut errors, "is_visible", raw));

        if let Some(image) = &self.image {
            check_image(&mut errors, image);
        }

        errors.into_result(CertificatePatch {
            certificate_name,
            full_name,
            issuer,
            issue_date,
            certificate_number: self.certificate_number,
            score: self.score,
            skills_covered: self.skills_covered,
            description: self.description,
            is_visible,
            image: self.image,
        })
    }
}

fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> String {
    match value {
        Some(v) if !v.trim().is_empty() && v.chars().count() <= 255 => v,
        Some(_) => {
            errors.push(field, "must be a non-empty string of at most 255 characters");
            String::new()
        }
        None => {
            errors.push(field, "is required");
            String::new()
        }
    }
}

fn optional_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() && v.chars().count() <= 255 => Some(v),
        Some(_) => {
            errors.push(field, "must be a non-empty string of at most 255 characters");
            None
        }
        None => None,
    }
}

fn parse_issue_date(errors: &mut FieldErrors, raw: &str) -> NaiveDate {
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            errors.push("issue_date", "must be a valid date in YYYY-MM-DD format");
            NaiveDate::default()
        }
    }
}

fn parse_bool(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => {
            errors.push(field, "must be a boolean");
            None
        }
    }
}

fn check_image(errors: &mut FieldErrors, image: &UploadedImage) {
    let content_type = match &image.content_type {
        Some(ct) => ct.clone(),
        None => mime_guess::from_path(&image.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        errors.push(
            "certificate_image",
            format!("must be a jpeg, png, or gif image (got {content_type})"),
        );
    }
    if image.data.is_empty() {
        errors.push("certificate_image", "must not be empty");
    } else if image.data.len() > MAX_IMAGE_BYTES {
        errors.push("certificate_image", "must be at most 5 MiB");
    }
}

fn find_certificate(conn: &rusqlite::Connection, id: i64) -> ApiResult<Certificate> {
    conn.query_row(
        &format!("SELECT {} FROM certificates WHERE id = ?", Certificate::COLUMNS),
        [id],
        Certificate::from_row,
    )
    .optional()?
    .ok_or(ApiError::NotFound {
        entity: "Certificate",
        id,
    })
}

/// GET /certificates
pub async fn list_public(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM certificates WHERE is_visible = 1 ORDER BY issue_date DESC, id DESC",
        Certificate::COLUMNS
    ))?;
    let certificates = stmt
        .query_map([], Certificate::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(certificates))
}

/// GET /admin/certificates
pub async fn list_admin(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.db.lock().await;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM certificates ORDER BY issue_date DESC, id DESC",
        Certificate::COLUMNS
    ))?;
    let certificates = stmt
        .query_map([], Certificate::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(certificates))
}

/// POST /certificates (multipart, `certificate_image` required)
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let new = CertificateForm::from_multipart(multipart)
        .await?
        .validate_create()?;

    let image_path = state
        .storage
        .save_certificate_image(&new.image.file_name, &new.image.data)
        .await?;

    let now = Utc::now().to_rfc3339();
    let conn = state.db.lock().await;
    conn.execute(
        "INSERT INTO certificates (certificate_name, full_name, issuer, image_path, issue_date, \
         certificate_number, score, skills_covered, description, is_visible, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            new.certificate_name,
            new.full_name,
            new.issuer,
            image_path,
            new.issue_date.format(DATE_FORMAT).to_string(),
            new.certificate_number,
            new.score,
            new.skills_covered,
            new.description,
            new.is_visible,
            now,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    let certificate = find_certificate(&conn, id)?;
    tracing::info!(id, path = %certificate.image_path, "certificate created");

    Ok((StatusCode::CREATED, Json(certificate)))
}

/// PUT /certificates/:id (multipart, all fields optional)
///
/// The previous image file is removed only after the whole request has
/// validated, so a rejected request never orphans the existing file.
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let patch = CertificateForm::from_multipart(multipart)
        .await?
        .validate_update()?;

    let existing = {
        let conn = state.db.lock().await;
        find_certificate(&conn, id)?
    };

    let image_path = match &patch.image {
        Some(image) => {
            if let Err(err) = state.storage.delete_public_path(&existing.image_path).await {
                tracing::warn!(id, path = %existing.image_path, error = %err,
                    "failed to remove previous certificate image");
            }
            state
                .storage
                .save_certificate_image(&image.file_name, &image.data)
                .await?
        }
        None => existing.image_path.clone(),
    };

    let conn = state.db.lock().await;
    conn.execute(
        "UPDATE certificates SET certificate_name = ?, full_name = ?, issuer = ?, image_path = ?, \
         issue_date = ?, certificate_number = ?, score = ?, skills_covered = ?, description = ?, \
         is_visible = ?, updated_at = ? WHERE id = ?",
        params![
            patch.certificate_name.unwrap_or(existing.certificate_name),
            patch.full_name.unwrap_or(existing.full_name),
            patch.issuer.unwrap_or(existing.issuer),
            image_path,
            patch
                .issue_date
                .unwrap_or(existing.issue_date)
                .format(DATE_FORMAT)
                .to_string(),
            patch.certificate_number.or(existing.certificate_number),
            patch.score.or(existing.score),
            patch.skills_covered.or(existing.skills_covered),
            patch.description.or(existing.description),
            patch.is_visible.unwrap_or(existing.is_visible),
            Utc::now().to_rfc3339(),
            id
        ],
    )?;
    let certificate = find_certificate(&conn, id)?;
    tracing::info!(id, "certificate modified");

    Ok(Json(certificate))
}

/// DELETE /certificates/:id
///
/// Removes the backing image first, then the row. A file that is already
/// gone (or a stored path that never resolved) is logged and skipped; the
/// row is deleted regardless.
pub async fn destroy(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let existing = {
        let conn = state.db.lock().await;
        find_certificate(&conn, id)?
    };

    if let Err(err) = state.storage.delete_public_path(&existing.image_path).await {
        tracing::warn!(id, path = %existing.image_path, error = %err,
            "failed to remove certificate image");
    }

    state
        .db
        .lock()
        .await
        .execute("DELETE FROM certificates WHERE id = ?", [id])?;
    tracing::info!(id, "certificate deleted");

    Ok(Json(json!({ "message": "Certificate deleted successfully" })))
}
