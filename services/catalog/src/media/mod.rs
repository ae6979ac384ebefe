//! Listing image uploads and CDN cleanup.
//!
//! # Purpose
//! Validates uploaded image files and forwards them to the configured media
//! backend (`memory` for development, `cloudinary` for deployments). Also owns
//! best-effort asset deletion when a listing is removed.
//!
//! # Key invariants
//! - Authorization (`media.upload`) is checked before any file is inspected.
//! - Every file in a request is validated before the first one is forwarded,
//!   so a bad file never leaves earlier files orphaned on the CDN.
//! - Content type is decided from the file's magic bytes; the client-declared
//!   type must agree when present.
//! - Asset public ids are `<folder>/<file stem>` of the delivered URL.
pub mod cloudinary;
pub mod memory;

use crate::auth::Actor;
use crate::observability::{MEDIA_DELETE_FAILURES, MEDIA_UPLOADS};
use async_trait::async_trait;
use luxe_authz::{Action, AuthzError, authorize};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Forbidden(#[from] AuthzError),
    #[error("media backend failure: {0}")]
    Upstream(String),
}

/// One file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store one already-validated image. `content_type` is the sniffed type.
    async fn upload(
        &self,
        file: &UploadFile,
        content_type: &'static str,
    ) -> Result<UploadedImage, MediaError>;
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
    /// Folder prefix applied to every public id.
    fn folder(&self) -> &str;
    fn backend_name(&self) -> &'static str;
}

/// Detect an allowed image type from leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn display_name(file: &UploadFile, index: usize) -> String {
    file.file_name
        .clone()
        .unwrap_or_else(|| format!("file #{}", index + 1))
}

/// Check one file against the type and size rules; returns its content type.
pub fn validate_file(
    file: &UploadFile,
    index: usize,
    max_bytes: usize,
) -> Result<&'static str, MediaError> {
    let name = display_name(file, index);
    if file.bytes.is_empty() {
        return Err(MediaError::Validation(format!("{name} is empty")));
    }
    if file.bytes.len() > max_bytes {
        return Err(MediaError::Validation(format!(
            "{name} exceeds the {max_bytes} byte upload limit"
        )));
    }
    if let Some(declared) = file.content_type.as_deref() {
        if !ALLOWED_CONTENT_TYPES.contains(&declared) {
            return Err(MediaError::Validation(format!(
                "{name} has unsupported type {declared}; allowed: {}",
                ALLOWED_CONTENT_TYPES.join(", ")
            )));
        }
    }
    let sniffed = sniff_image_type(&file.bytes).ok_or_else(|| {
        MediaError::Validation(format!("{name} is not a JPEG, PNG or WebP image"))
    })?;
    match file.content_type.as_deref() {
        Some(declared) if declared != sniffed => Err(MediaError::Validation(format!(
            "{name} is declared as {declared} but contains {sniffed}"
        ))),
        _ => Ok(sniffed),
    }
}

/// Validate every file, then forward them one by one.
pub async fn upload_images(
    media: &dyn MediaStore,
    files: &[UploadFile],
    actor: &Actor,
    max_bytes: usize,
) -> Result<Vec<UploadedImage>, MediaError> {
    authorize(actor.role, Action::MediaUpload)?;
    if files.is_empty() {
        return Err(MediaError::Validation("no files uploaded".to_string()));
    }
    let content_types = files
        .iter()
        .enumerate()
        .map(|(index, file)| validate_file(file, index, max_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    let mut uploaded = Vec::with_capacity(files.len());
    for (file, content_type) in files.iter().zip(content_types) {
        match media.upload(file, content_type).await {
            Ok(image) => {
                metrics::counter!(MEDIA_UPLOADS, "backend" => media.backend_name(), "result" => "ok")
                    .increment(1);
                uploaded.push(image);
            }
            Err(err) => {
                metrics::counter!(MEDIA_UPLOADS, "backend" => media.backend_name(), "result" => "error")
                    .increment(1);
                tracing::error!(
                    subject = %actor.subject,
                    uploaded = uploaded.len(),
                    error = %err,
                    "image upload failed"
                );
                return Err(err);
            }
        }
    }
    tracing::info!(subject = %actor.subject, count = uploaded.len(), "images uploaded");
    Ok(uploaded)
}

/// Public id of an asset delivered at `url`: `<folder>/<file stem>`.
pub fn public_id_from_url(url: &str, folder: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        return None;
    }
    Some(format!("{folder}/{stem}"))
}

/// Delete the CDN assets behind `urls`; returns how many deletions failed.
/// Failures are logged and counted, never propagated.
pub async fn delete_images(media: &dyn MediaStore, urls: &[String]) -> usize {
    let mut failures = 0;
    for url in urls {
        let Some(public_id) = public_id_from_url(url, media.folder()) else {
            tracing::warn!(%url, "cannot derive media public id");
            failures += 1;
            metrics::counter!(MEDIA_DELETE_FAILURES, "backend" => media.backend_name()).increment(1);
            continue;
        };
        if let Err(err) = media.delete(&public_id).await {
            tracing::warn!(%public_id, error = %err, "failed to delete media asset");
            failures += 1;
            metrics::counter!(MEDIA_DELETE_FAILURES, "backend" => media.backend_name()).increment(1);
        }
    }
    failures
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    pub const WEBP: &[u8] = b"RIFF\x24\x00\x00\x00WEBPVP8 ";
}
