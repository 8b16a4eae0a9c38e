//! Media store construction.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::config::Config;

use super::{
    Error, FolderPath, ImageKitConfig, ImageKitStore, MediaFile, MediaStore, Result, UploadedFile,
};

/// Stand-in used when no media store credentials are configured.
///
/// Listings come back empty so gallery pages still render; writes fail with
/// `NotConfigured`.
pub struct UnconfiguredMediaStore;

#[async_trait]
impl MediaStore for UnconfiguredMediaStore {
    async fn list_files(&self, _folder: &FolderPath) -> Result<Vec<MediaFile>> {
        Ok(Vec::new())
    }

    async fn upload_file(
        &self,
        _data: Bytes,
        _file_name: &str,
        _folder: &FolderPath,
    ) -> Result<UploadedFile> {
        Err(Error::NotConfigured("imagekit private key is not set"))
    }

    async fn delete_file(&self, _file_id: &str) -> Result<()> {
        Err(Error::NotConfigured("imagekit private key is not set"))
    }

    async fn delete_folder(&self, _folder: &FolderPath) -> Result<()> {
        Err(Error::NotConfigured("imagekit private key is not set"))
    }

    async fn file_details(&self, file_id: &str) -> Result<MediaFile> {
        Err(Error::NotFound(file_id.to_string()))
    }
}

/// Create the media store selected by the configuration.
///
/// Falls back to [`UnconfiguredMediaStore`] when the private key is absent,
/// warning once so a misconfigured deployment shows up in the logs.
pub fn create_media_store(config: &Config) -> Arc<dyn MediaStore> {
    match config.imagekit.private_key.as_deref() {
        Some(key) if !key.is_empty() => {
            let imagekit = ImageKitConfig::new(key, &config.imagekit.url_endpoint)
                .with_api_base(&config.imagekit.api_base)
                .with_upload_base(&config.imagekit.upload_base);
            Arc::new(ImageKitStore::new(imagekit))
        }
        _ => {
            warn!("imagekit private key is not set; image uploads and deletions are disabled");
            Arc::new(UnconfiguredMediaStore)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_store_reads_empty_and_rejects_writes() {
        let store = UnconfiguredMediaStore;
        let folder = FolderPath::for_location("safari-gallery", "Africa", "Masai Mara");

        assert!(store.list_files(&folder).await.unwrap().is_empty());

        let upload = store
            .upload_file(Bytes::from_static(b"x"), "a.jpg", &folder)
            .await;
        assert!(matches!(upload, Err(Error::NotConfigured(_))));

        let delete = store.delete_file("file-1").await;
        assert!(matches!(delete, Err(Error::NotConfigured(_))));
    }
}
