//! ImageKit implementation of the media store.
//!
//! Talks to the ImageKit REST API: listing and deletion go through the
//! management endpoint, uploads through the dedicated upload endpoint.
//! Authentication is HTTP basic with the private key as the username and an
//! empty password.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{Error, FolderPath, MediaFile, MediaStore, Result, UploadedFile};

const DEFAULT_API_BASE: &str = "https://api.imagekit.io/v1";
const DEFAULT_UPLOAD_BASE: &str = "https://upload.imagekit.io/api/v1";

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the ImageKit REST API.
#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    /// Private API key, sent as the basic-auth username.
    pub private_key: String,
    /// Public delivery endpoint, used when building image URLs.
    pub url_endpoint: String,
    /// Base URL of the management API.
    pub api_base: String,
    /// Base URL of the upload API.
    pub upload_base: String,
}

impl ImageKitConfig {
    /// Create a config with the default API endpoints.
    pub fn new(private_key: impl Into<String>, url_endpoint: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            url_endpoint: url_endpoint.into().trim_end_matches('/').to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        }
    }

    /// Override the management API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the upload API base URL.
    pub fn with_upload_base(mut self, upload_base: impl Into<String>) -> Self {
        self.upload_base = upload_base.into().trim_end_matches('/').to_string();
        self
    }
}

// =============================================================================
// Delivery URLs
// =============================================================================

/// Resize and re-encode parameters for a delivery URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformation {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    /// Target format, e.g. `webp`. `auto` leaves the choice to the store.
    pub format: Option<String>,
}

/// Build a delivery URL for a stored image path.
///
/// Absolute URLs pass through untouched. Relative paths are joined to the
/// endpoint, with a `tr:` segment when any transformation is requested.
pub fn build_image_url(endpoint: &str, image_path: &str, options: &Transformation) -> String {
    if image_path.starts_with("http") {
        return image_path.to_string();
    }

    let clean_path = if image_path.starts_with('/') {
        image_path.to_string()
    } else {
        format!("/{}", image_path)
    };

    let mut transforms = Vec::new();
    if let Some(width) = options.width {
        transforms.push(format!("w-{}", width));
    }
    if let Some(height) = options.height {
        transforms.push(format!("h-{}", height));
    }
    if let Some(quality) = options.quality {
        transforms.push(format!("q-{}", quality));
    }
    if let Some(format) = options.format.as_deref() {
        if format != "auto" {
            transforms.push(format!("f-{}", format));
        }
    }

    let endpoint = endpoint.trim_end_matches('/');
    if transforms.is_empty() {
        format!("{}{}", endpoint, clean_path)
    } else {
        format!("{}/tr:{}{}", endpoint, transforms.join(","), clean_path)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileRecord {
    file_id: String,
    name: String,
    #[serde(default)]
    file_path: String,
    url: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl From<FileRecord> for MediaFile {
    fn from(record: FileRecord) -> Self {
        let thumbnail_url = record.thumbnail.unwrap_or_else(|| record.url.clone());
        Self {
            id: record.file_id,
            name: record.name,
            path: record.file_path,
            url: record.url,
            thumbnail_url,
            width: record.width,
            height: record.height,
            size: record.size,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRecord {
    file_id: String,
    name: String,
    #[serde(default)]
    file_path: String,
    url: String,
}

impl From<UploadRecord> for UploadedFile {
    fn from(record: UploadRecord) -> Self {
        Self {
            id: record.file_id,
            name: record.name,
            path: record.file_path,
            url: record.url,
        }
    }
}

// =============================================================================
// ImageKitStore
// =============================================================================

/// Media store backed by the ImageKit REST API.
pub struct ImageKitStore {
    client: Client,
    config: ImageKitConfig,
}

impl ImageKitStore {
    /// Create a new store from the given configuration.
    pub fn new(config: ImageKitConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a new store with a custom reqwest client.
    pub fn with_client(client: Client, config: ImageKitConfig) -> Self {
        Self { client, config }
    }

    /// The delivery endpoint this store builds image URLs against.
    pub fn url_endpoint(&self) -> &str {
        &self.config.url_endpoint
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.config.api_base, file_id)
    }

    fn file_details_url(&self, file_id: &str) -> String {
        format!("{}/files/{}/details", self.config.api_base, file_id)
    }

    fn folder_url(&self) -> String {
        format!("{}/folder", self.config.api_base)
    }

    fn upload_url(&self) -> String {
        format!("{}/files/upload", self.config.upload_base)
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.config.private_key, Some(""))
    }
}

#[async_trait]
impl MediaStore for ImageKitStore {
    async fn list_files(&self, folder: &FolderPath) -> Result<Vec<MediaFile>> {
        let path = folder.slash_prefixed();
        let response = self
            .auth(self.client.get(self.files_url()))
            .query(&[("path", path.as_str()), ("type", "file")])
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let records: Vec<FileRecord> = response
                    .json()
                    .await
                    .map_err(|e| Error::Other(format!("failed to parse file listing: {}", e)))?;
                Ok(records
                    .into_iter()
                    .filter(|record| record.kind.as_deref().unwrap_or("file") == "file")
                    .map(MediaFile::from)
                    .collect())
            }
            // A folder that was never created lists as empty, not as an error.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(Error::Other(format!("unexpected status code: {}", status))),
        }
    }

    async fn upload_file(
        &self,
        data: Bytes,
        file_name: &str,
        folder: &FolderPath,
    ) -> Result<UploadedFile> {
        let part = Part::bytes(data.to_vec()).file_name(file_name.to_string());
        let form = Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string())
            .text("folder", folder.slash_prefixed())
            .text("useUniqueFileName", "false");

        let response = self
            .auth(self.client.post(self.upload_url()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!("status {}: {}", status, body)));
        }

        let record: UploadRecord = response
            .json()
            .await
            .map_err(|e| Error::Upload(format!("failed to parse upload response: {}", e)))?;
        Ok(record.into())
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let response = self
            .auth(self.client.delete(self.file_url(file_id)))
            .send()
            .await
            .map_err(|e| Error::Delete(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::NotFound(file_id.to_string())),
            status => Err(Error::Delete(format!("unexpected status code: {}", status))),
        }
    }

    async fn delete_folder(&self, folder: &FolderPath) -> Result<()> {
        // The folder node cannot be removed while it still contains files.
        let files = self.list_files(folder).await?;
        for file in &files {
            match self.delete_file(&file.id).await {
                Ok(()) | Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let response = self
            .auth(self.client.delete(self.folder_url()))
            .json(&serde_json::json!({ "folderPath": folder.slash_prefixed() }))
            .send()
            .await
            .map_err(|e| Error::Delete(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // The folder node may never have existed; deleting it is a no-op.
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(Error::Delete(format!("unexpected status code: {}", status))),
        }
    }

    async fn file_details(&self, file_id: &str) -> Result<MediaFile> {
        let response = self
            .auth(self.client.get(self.file_details_url(file_id)))
            .send()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let record: FileRecord = response
                    .json()
                    .await
                    .map_err(|e| Error::Other(format!("failed to parse file details: {}", e)))?;
                Ok(record.into())
            }
            StatusCode::NOT_FOUND => Err(Error::NotFound(file_id.to_string())),
            status => Err(Error::Other(format!("unexpected status code: {}", status))),
        }
    }
}
