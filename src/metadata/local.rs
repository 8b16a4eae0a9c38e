//! Local-file implementation of the metadata store.
//!
//! The development and degraded-mode fallback when no database is
//! configured. Records live in flat JSON files with the same shape as the
//! database rows. I/O is synchronous and there is no concurrency control;
//! concurrent writers may interleave and lose updates, which is acceptable
//! on this path.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use super::{CoverKey, Error, LocationRecord, LocationUpdate, MetadataStore, Result, StoredCover};

const LOCATIONS_FILE: &str = "gallery-locations.json";
const COVERS_FILE: &str = "gallery-covers.json";

/// Metadata store backed by JSON files in a content directory.
pub struct LocalFileMetadataStore {
    locations_path: PathBuf,
    covers_path: PathBuf,
}

impl LocalFileMetadataStore {
    /// Create a store rooted at the given content directory.
    ///
    /// The directory and files are created lazily on first write.
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        let dir = content_dir.into();
        Self {
            locations_path: dir.join(LOCATIONS_FILE),
            covers_path: dir.join(COVERS_FILE),
        }
    }

    fn read_locations(&self) -> Result<Vec<LocationRecord>> {
        if !self.locations_path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.locations_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_locations(&self, records: &[LocationRecord]) -> Result<()> {
        if let Some(parent) = self.locations_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.locations_path, raw)?;
        Ok(())
    }

    fn read_covers(&self) -> Result<Vec<StoredCover>> {
        if !self.covers_path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.covers_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_covers(&self, rows: &[StoredCover]) -> Result<()> {
        if let Some(parent) = self.covers_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(rows)?;
        std::fs::write(&self.covers_path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for LocalFileMetadataStore {
    async fn locations(&self) -> Result<Vec<LocationRecord>> {
        let mut records = self.read_locations()?;
        records.sort_by(|a, b| {
            a.continent_name
                .cmp(&b.continent_name)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(records)
    }

    async fn insert_location(&self, record: &LocationRecord) -> Result<()> {
        let mut records = self.read_locations()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(Error::Other(format!("duplicate location id: {}", record.id)));
        }
        let mut record = record.clone();
        if record.created_at.is_none() {
            record.created_at = Some(Utc::now());
        }
        records.push(record);
        self.write_locations(&records)
    }

    async fn update_location(&self, id: &str, update: &LocationUpdate) -> Result<()> {
        let mut records = self.read_locations()?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(description) = &update.description {
            record.description = description.clone();
        }
        if let Some(wildlife) = &update.wildlife {
            record.wildlife = wildlife.clone();
        }
        if let Some(country) = &update.country {
            record.country = country.clone();
        }
        self.write_locations(&records)
    }

    async fn delete_location(&self, id: &str) -> Result<()> {
        let mut records = self.read_locations()?;
        records.retain(|record| record.id != id);
        self.write_locations(&records)
    }

    async fn covers(&self) -> Result<HashMap<CoverKey, String>> {
        let rows = self.read_covers()?;
        let mut covers = HashMap::with_capacity(rows.len());
        for row in rows {
            match CoverKey::decode(&row.location_key) {
                Some(key) => {
                    covers.insert(key, row.cover_url);
                }
                None => warn!(key = %row.location_key, "skipping malformed cover key"),
            }
        }
        Ok(covers)
    }

    async fn set_cover(&self, key: &CoverKey, url: &str) -> Result<()> {
        let encoded = key.encode();
        let mut rows = self.read_covers()?;
        let row = StoredCover {
            location_key: encoded.clone(),
            cover_url: url.to_string(),
            updated_at: Some(Utc::now()),
        };
        match rows.iter_mut().find(|row| row.location_key == encoded) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        self.write_covers(&rows)
    }

    async fn remove_cover(&self, key: &CoverKey) -> Result<()> {
        let encoded = key.encode();
        let mut rows = self.read_covers()?;
        rows.retain(|row| row.location_key != encoded);
        self.write_covers(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(continent: &str, name: &str) -> LocationRecord {
        let continent_slug = continent.to_lowercase();
        let slug = name.to_lowercase().replace(' ', "-");
        LocationRecord {
            id: format!("{}-{}", continent_slug, slug),
            continent_slug,
            continent_name: continent.to_string(),
            name: name.to_string(),
            slug,
            country: "Kenya".to_string(),
            description: format!("Explore the wildlife of {}.", name),
            wildlife: vec!["lion".to_string()],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());

        assert!(store.locations().await.unwrap().is_empty());
        assert!(store.covers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_read_back_ordered() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());

        store.insert_location(&record("Asia", "Ranthambore")).await.unwrap();
        store.insert_location(&record("Africa", "Masai Mara")).await.unwrap();
        store.insert_location(&record("Africa", "Amboseli")).await.unwrap();

        let records = store.locations().await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Amboseli", "Masai Mara", "Ranthambore"]);
        assert!(records.iter().all(|r| r.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());

        store.insert_location(&record("Africa", "Masai Mara")).await.unwrap();
        let result = store.insert_location(&record("Africa", "Masai Mara")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_location_is_partial() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());
        store.insert_location(&record("Africa", "Masai Mara")).await.unwrap();

        let update = LocationUpdate {
            country: Some("Tanzania".to_string()),
            ..LocationUpdate::default()
        };
        store.update_location("africa-masai-mara", &update).await.unwrap();

        let records = store.locations().await.unwrap();
        assert_eq!(records[0].country, "Tanzania");
        assert_eq!(records[0].description, "Explore the wildlife of Masai Mara.");

        let missing = store.update_location("africa-nowhere", &update).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_location() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());
        store.insert_location(&record("Africa", "Masai Mara")).await.unwrap();

        store.delete_location("africa-masai-mara").await.unwrap();
        assert!(store.locations().await.unwrap().is_empty());

        // Deleting an absent id succeeds.
        store.delete_location("africa-masai-mara").await.unwrap();
    }

    #[tokio::test]
    async fn test_cover_set_replace_remove() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileMetadataStore::new(dir.path());
        let key = CoverKey::new("Africa", "Masai Mara");

        store.set_cover(&key, "https://media.test/a.jpg").await.unwrap();
        store.set_cover(&key, "https://media.test/b.jpg").await.unwrap();

        let covers = store.covers().await.unwrap();
        assert_eq!(covers.len(), 1);
        assert_eq!(covers.get(&key).unwrap(), "https://media.test/b.jpg");

        store.remove_cover(&key).await.unwrap();
        assert!(store.covers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_files_survive_reopening_the_store() {
        let dir = TempDir::new().unwrap();
        {
            let store = LocalFileMetadataStore::new(dir.path());
            store.insert_location(&record("Africa", "Masai Mara")).await.unwrap();
            store
                .set_cover(&CoverKey::new("Africa", "Masai Mara"), "https://media.test/a.jpg")
                .await
                .unwrap();
        }

        let reopened = LocalFileMetadataStore::new(dir.path());
        assert_eq!(reopened.locations().await.unwrap().len(), 1);
        assert_eq!(reopened.covers().await.unwrap().len(), 1);
    }
}
