//! In-memory media store, intended primarily for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Error, FolderPath, MediaFile, MediaStore, Result, UploadedFile};

/// An in-memory implementation of `MediaStore`.
///
/// Counts listing calls and can be told to fail, so tests can observe cache
/// behavior and exercise degraded paths.
pub struct MemoryMediaStore {
    folders: RwLock<HashMap<String, Vec<MediaFile>>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    fail_listing: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryMediaStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            folders: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            list_calls: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// Place a file in a folder without going through `upload_file`.
    pub fn seed_file(&self, folder: &FolderPath, file_name: &str) -> MediaFile {
        self.add_file(folder, file_name, 0)
    }

    /// Number of `list_files` calls made so far, including failed ones.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent `list_files` call fail.
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `upload_file` call fail.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of files currently in a folder.
    pub fn file_count(&self, folder: &FolderPath) -> usize {
        let folders = self.folders.read().unwrap();
        folders.get(folder.as_str()).map(Vec::len).unwrap_or(0)
    }

    fn add_file(&self, folder: &FolderPath, file_name: &str, size: u64) -> MediaFile {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let file = MediaFile {
            id: format!("file-{}", id),
            name: file_name.to_string(),
            path: format!("/{}/{}", folder.as_str(), file_name),
            url: format!("https://media.test/{}/{}", folder.as_str(), file_name),
            thumbnail_url: format!("https://media.test/thumb/{}/{}", folder.as_str(), file_name),
            width: None,
            height: None,
            size: Some(size),
        };
        let mut folders = self.folders.write().unwrap();
        folders
            .entry(folder.as_str().to_string())
            .or_default()
            .push(file.clone());
        file
    }
}

impl Default for MemoryMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn list_files(&self, folder: &FolderPath) -> Result<Vec<MediaFile>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::Other("listing unavailable".to_string()));
        }
        let folders = self.folders.read().unwrap();
        Ok(folders.get(folder.as_str()).cloned().unwrap_or_default())
    }

    async fn upload_file(
        &self,
        data: Bytes,
        file_name: &str,
        folder: &FolderPath,
    ) -> Result<UploadedFile> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::Upload("upload rejected".to_string()));
        }
        let file = self.add_file(folder, file_name, data.len() as u64);
        Ok(UploadedFile {
            id: file.id,
            name: file.name,
            path: file.path,
            url: file.url,
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let mut folders = self.folders.write().unwrap();
        for files in folders.values_mut() {
            if let Some(index) = files.iter().position(|file| file.id == file_id) {
                files.remove(index);
                return Ok(());
            }
        }
        Err(Error::NotFound(file_id.to_string()))
    }

    async fn delete_folder(&self, folder: &FolderPath) -> Result<()> {
        let mut folders = self.folders.write().unwrap();
        folders.remove(folder.as_str());
        Ok(())
    }

    async fn file_details(&self, file_id: &str) -> Result<MediaFile> {
        let folders = self.folders.read().unwrap();
        folders
            .values()
            .flatten()
            .find(|file| file.id == file_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(file_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder() -> FolderPath {
        FolderPath::for_location("safari-gallery", "Africa", "Masai Mara")
    }

    #[tokio::test]
    async fn test_upload_then_list() {
        let store = MemoryMediaStore::new();

        let uploaded = store
            .upload_file(Bytes::from_static(b"bytes"), "lion.jpg", &folder())
            .await
            .unwrap();

        let files = store.list_files(&folder()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, uploaded.id);
        assert_eq!(files[0].name, "lion.jpg");
        assert_eq!(files[0].size, Some(5));
    }

    #[tokio::test]
    async fn test_list_unknown_folder_is_empty() {
        let store = MemoryMediaStore::new();
        let files = store.list_files(&folder()).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let store = MemoryMediaStore::new();
        let file = store.seed_file(&folder(), "lion.jpg");

        store.delete_file(&file.id).await.unwrap();
        assert_eq!(store.file_count(&folder()), 0);

        let result = store.delete_file(&file.id).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_folder_is_idempotent() {
        let store = MemoryMediaStore::new();
        store.seed_file(&folder(), "lion.jpg");

        store.delete_folder(&folder()).await.unwrap();
        assert_eq!(store.file_count(&folder()), 0);

        // Deleting again, and deleting a folder that never existed, both
        // succeed.
        store.delete_folder(&folder()).await.unwrap();
        let never_created = FolderPath::for_location("safari-gallery", "Asia", "Ranthambore");
        store.delete_folder(&never_created).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_calls_are_counted() {
        let store = MemoryMediaStore::new();
        assert_eq!(store.list_calls(), 0);

        store.list_files(&folder()).await.unwrap();
        store.list_files(&folder()).await.unwrap();
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = MemoryMediaStore::new();

        store.set_fail_listing(true);
        assert!(store.list_files(&folder()).await.is_err());
        store.set_fail_listing(false);
        assert!(store.list_files(&folder()).await.is_ok());

        store.set_fail_uploads(true);
        let result = store
            .upload_file(Bytes::from_static(b"x"), "a.jpg", &folder())
            .await;
        assert!(matches!(result, Err(Error::Upload(_))));
    }

    #[tokio::test]
    async fn test_file_details() {
        let store = MemoryMediaStore::new();
        let file = store.seed_file(&folder(), "lion.jpg");

        let details = store.file_details(&file.id).await.unwrap();
        assert_eq!(details.name, "lion.jpg");

        let result = store.file_details("missing").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
