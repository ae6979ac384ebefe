//! In-process media backend for development and tests.
//!
//! Assets live in a `HashMap` keyed by public id; URLs are minted under the
//! configured public base URL. Nothing is persisted.
use super::{MediaError, MediaStore, UploadFile, UploadedImage};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredAsset {
    content_type: &'static str,
    bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct InMemoryMediaStore {
    base_url: String,
    folder: String,
    assets: RwLock<HashMap<String, StoredAsset>>,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            folder: folder.into(),
            assets: RwLock::new(HashMap::new()),
        }
    }

    pub async fn asset_count(&self) -> usize {
        self.assets.read().await.len()
    }

    /// Content type and bytes of a stored asset.
    pub async fn fetch(&self, public_id: &str) -> Option<(&'static str, Vec<u8>)> {
        self.assets
            .read()
            .await
            .get(public_id)
            .map(|asset| (asset.content_type, asset.bytes.clone()))
    }
}

fn extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(
        &self,
        file: &UploadFile,
        content_type: &'static str,
    ) -> Result<UploadedImage, MediaError> {
        let public_id = format!("{}/{}", self.folder, Uuid::new_v4().simple());
        let url = format!("{}/{public_id}.{}", self.base_url, extension(content_type));
        self.assets.write().await.insert(
            public_id.clone(),
            StoredAsset {
                content_type,
                bytes: file.bytes.clone(),
            },
        );
        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        match self.assets.write().await.remove(public_id) {
            Some(_) => Ok(()),
            None => Err(MediaError::Upstream(format!("asset {public_id} not found"))),
        }
    }

    fn folder(&self) -> &str {
        &self.folder
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fixtures::PNG;

    #[tokio::test]
    async fn upload_fetch_delete() {
        let store = InMemoryMediaStore::new("http://localhost:3000/media/", "tonyluxe");
        let file = UploadFile {
            file_name: Some("pool.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: PNG.to_vec(),
        };
        let image = store.upload(&file, "image/png").await.expect("upload");
        assert!(image.url.starts_with("http://localhost:3000/media/tonyluxe/"));
        assert!(image.url.ends_with(".png"));

        let (content_type, bytes) = store.fetch(&image.public_id).await.expect("stored");
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, PNG);

        store.delete(&image.public_id).await.expect("delete");
        assert!(store.delete(&image.public_id).await.is_err());
    }
}
