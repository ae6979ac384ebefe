//! Cloudinary media backend.
//!
//! # Purpose
//! Signed calls against the Cloudinary upload API:
//! - `POST {api_base}/v1_1/{cloud}/image/upload` (multipart, file + folder)
//! - `POST {api_base}/v1_1/{cloud}/image/destroy` (form, public id)
//!
//! # Signing
//! Every signed parameter except `file` and `api_key` is sorted by name,
//! joined as `k=v&k=v`, suffixed with the API secret and SHA-1 hashed (hex).
use super::{MediaError, MediaStore, UploadFile, UploadedImage};
use crate::config::CloudinaryConfig;
use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Hex SHA-1 signature over `params` (any order) and `secret`.
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig, folder: impl Into<String>) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| MediaError::Upstream(format!("http client: {err}")))?;
        Ok(Self {
            client,
            config,
            folder: folder.into(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, MediaError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| "no error detail".to_string());
            return Err(MediaError::Upstream(format!("cloudinary returned {status}: {message}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| MediaError::Upstream(format!("unexpected cloudinary response: {err}")))
    }
}

fn transport(err: reqwest::Error) -> MediaError {
    MediaError::Upstream(format!("cloudinary request failed: {err}"))
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(
        &self,
        file: &UploadFile,
        content_type: &'static str,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone().unwrap_or_else(|| "upload".to_string()))
            .mime_str(content_type)
            .map_err(transport)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let result: UploadResult = Self::read_json(response).await?;
        tracing::debug!(public_id = %result.public_id, "cloudinary upload complete");
        Ok(UploadedImage {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );
        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        let result: DestroyResult = Self::read_json(response).await?;
        if result.result == "ok" {
            Ok(())
        } else {
            Err(MediaError::Upstream(format!(
                "destroy {public_id}: {}",
                result.result
            )))
        }
    }

    fn folder(&self) -> &str {
        &self.folder
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}
