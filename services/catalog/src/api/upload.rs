//! Image upload and local delivery endpoints.
//!
//! # Purpose
//! Accepts `multipart/form-data` with one or more image files (any field
//! carrying a filename) and returns the delivered URLs. With the in-process
//! media backend, uploaded files are served back under `/media`.
//!
//! # Key invariants and assumptions
//! - Credentials are checked before the body is read.
//! - Per-file size is enforced by the media service; the route's body limit
//!   only caps the whole request.
use crate::api::error::{ApiError, api_not_found, api_validation_error};
use crate::api::types::UploadResponse;
use crate::app::AppState;
use crate::auth::require_permission;
use crate::media::{self, UploadFile};
use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use luxe_authz::Action;

pub const MAX_FILES_PER_REQUEST: usize = 20;
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body cap for the upload route.
pub fn upload_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(FORM_OVERHEAD_BYTES)
}

async fn read_files(multipart: &mut Multipart) -> Result<Vec<UploadFile>, ApiError> {
    let mut files = Vec::new();
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| api_validation_error(&err.body_text()))?;
        let Some(field) = field else {
            break;
        };
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if files.len() == MAX_FILES_PER_REQUEST {
            return Err(api_validation_error(&format!(
                "at most {MAX_FILES_PER_REQUEST} files per upload"
            )));
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| api_validation_error(&err.body_text()))?;
        files.push(UploadFile {
            file_name: Some(file_name),
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "media",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "One or more JPEG, PNG or WebP files"
    ),
    responses(
        (status = 200, description = "Uploaded images", body = UploadResponse),
        (status = 400, description = "Invalid or oversized file", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Media backend failure", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn upload_images(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let actor = require_permission(&state, &headers, Action::MediaUpload)?;
    let mut multipart = multipart.map_err(|err| api_validation_error(&err.body_text()))?;
    let files = read_files(&mut multipart).await?;
    let images = media::upload_images(
        state.media.as_ref(),
        &files,
        &actor,
        state.max_upload_bytes,
    )
    .await?;
    Ok(Json(UploadResponse { images }))
}

/// `GET /media/{folder}/{file}` for the in-process media backend.
pub(crate) async fn serve_local_media(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let local = state
        .local_media
        .as_ref()
        .ok_or_else(|| api_not_found("media not found"))?;
    let public_id = media::public_id_from_url(&file, &folder)
        .ok_or_else(|| api_not_found("media not found"))?;
    let (content_type, bytes) = local
        .fetch(&public_id)
        .await
        .ok_or_else(|| api_not_found("media not found"))?;
    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
