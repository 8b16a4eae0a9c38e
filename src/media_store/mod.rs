//! Media store traits and types for the image hosting service.
//!
//! The media store holds the gallery's image binaries, organized in
//! per-location folders. Implementations:
//! - [`ImageKitStore`] - adapter over the ImageKit REST API
//! - [`MemoryMediaStore`] - in-memory store, intended primarily for testing
//! - [`UnconfiguredMediaStore`] - stand-in when no credentials are present

mod create;
mod imagekit;
mod memory;
mod paths;

pub use create::{create_media_store, UnconfiguredMediaStore};
pub use imagekit::{build_image_url, ImageKitConfig, ImageKitStore, Transformation};
pub use memory::MemoryMediaStore;
pub use paths::{sanitize_segment, FolderPath};

use async_trait::async_trait;
use bytes::Bytes;

/// Result type for media store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in media store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("media store is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("{0}")]
    Other(String),
}

// =============================================================================
// File Types
// =============================================================================

/// A file as reported by the media store.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MediaFile {
    /// Opaque store-assigned identifier, used for deletion.
    pub id: String,
    /// Base name of the file.
    pub name: String,
    /// Path of the file within the store.
    pub path: String,
    /// Public URL of the file.
    pub url: String,
    /// Store-generated thumbnail URL, falling back to the file URL.
    pub thumbnail_url: String,
    /// Pixel width, when the store reports it.
    pub width: Option<u32>,
    /// Pixel height, when the store reports it.
    pub height: Option<u32>,
    /// Size in bytes, when the store reports it.
    pub size: Option<u64>,
}

/// The outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UploadedFile {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Name the store recorded for the file.
    pub name: String,
    /// Path of the file within the store.
    pub path: String,
    /// Public URL of the file.
    pub url: String,
}

// =============================================================================
// MediaStore Trait
// =============================================================================

/// Folder-scoped file operations against the image hosting service.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// List the files in a folder.
    ///
    /// A folder that does not exist yields an empty list, not an error.
    /// Order is as reported by the store; callers must not assume sorting.
    async fn list_files(&self, folder: &FolderPath) -> Result<Vec<MediaFile>>;

    /// Upload a file into a folder.
    ///
    /// Uploads are not content-addressed: re-uploading the same bytes under
    /// the same name creates a duplicate.
    async fn upload_file(
        &self,
        data: Bytes,
        file_name: &str,
        folder: &FolderPath,
    ) -> Result<UploadedFile>;

    /// Delete a file by its store-assigned identifier.
    ///
    /// Returns [`Error::NotFound`] if the store does not know the id.
    async fn delete_file(&self, file_id: &str) -> Result<()>;

    /// Delete a folder and everything in it.
    ///
    /// Contained files are enumerated and deleted first, then the folder
    /// node itself. Deleting a folder that does not exist succeeds.
    async fn delete_folder(&self, folder: &FolderPath) -> Result<()>;

    /// Fetch the details of a single file by its identifier.
    async fn file_details(&self, file_id: &str) -> Result<MediaFile>;
}
