//! Metadata store traits and types for location records and cover selections.
//!
//! The metadata store is the authority on what locations exist and which
//! image was chosen as each location's cover. Implementations:
//! - [`RestMetadataStore`] - adapter over a Supabase/PostgREST database
//! - [`LocalFileMetadataStore`] - flat JSON files for unconfigured deployments
//! - [`MemoryMetadataStore`] - in-memory store, intended primarily for testing

mod create;
mod local;
mod memory;
mod rest;

pub use create::create_metadata_store;
pub use local::LocalFileMetadataStore;
pub use memory::MemoryMetadataStore;
pub use rest::RestMetadataStore;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result type for metadata store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in metadata store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("location not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Record Types
// =============================================================================

/// A location row as stored in the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Synthetic key: `<continent_slug>-<slug>`.
    pub id: String,
    pub continent_slug: String,
    pub continent_name: String,
    pub name: String,
    pub slug: String,
    pub country: String,
    pub description: String,
    #[serde(default)]
    pub wildlife: Vec<String>,
    /// Assigned by the store on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A partial update to a location record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildlife: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl LocationUpdate {
    /// Whether the update would change anything.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.wildlife.is_none() && self.country.is_none()
    }
}

// =============================================================================
// Cover Selections
// =============================================================================

/// Composite key for a cover selection: continent and location display names.
///
/// The store serializes this as a single `"<continent>/<location>"` string;
/// [`CoverKey::encode`] and [`CoverKey::decode`] are the only places that
/// format exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverKey {
    pub continent: String,
    pub location: String,
}

impl CoverKey {
    pub fn new(continent: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            continent: continent.into(),
            location: location.into(),
        }
    }

    /// Serialize to the storage format.
    pub fn encode(&self) -> String {
        format!("{}/{}", self.continent, self.location)
    }

    /// Parse the storage format back into a structured key.
    ///
    /// Continent names never contain `/`, so the first separator wins.
    pub fn decode(raw: &str) -> Option<Self> {
        let (continent, location) = raw.split_once('/')?;
        if continent.is_empty() || location.is_empty() {
            return None;
        }
        Some(Self::new(continent, location))
    }
}

/// A cover selection as serialized at the storage boundary.
///
/// Shared by the database adapter and the local-file fallback, which store
/// the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCover {
    pub location_key: String,
    pub cover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// MetadataStore Trait
// =============================================================================

/// CRUD over location records and the cover-selection mapping.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All location records, ordered by continent name then location name.
    async fn locations(&self) -> Result<Vec<LocationRecord>>;

    /// Insert a new location record.
    async fn insert_location(&self, record: &LocationRecord) -> Result<()>;

    /// Apply a partial update to a location record by id.
    ///
    /// Returns [`Error::NotFound`] if no record has the id.
    async fn update_location(&self, id: &str, update: &LocationUpdate) -> Result<()>;

    /// Delete a location record by id. Deleting an absent id succeeds.
    async fn delete_location(&self, id: &str) -> Result<()>;

    /// All cover selections.
    async fn covers(&self) -> Result<HashMap<CoverKey, String>>;

    /// Insert or replace the cover selection for a key.
    async fn set_cover(&self, key: &CoverKey, url: &str) -> Result<()>;

    /// Remove the cover selection for a key, if any.
    async fn remove_cover(&self, key: &CoverKey) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_key_roundtrip() {
        let key = CoverKey::new("Africa", "Masai Mara");
        assert_eq!(key.encode(), "Africa/Masai Mara");
        assert_eq!(CoverKey::decode("Africa/Masai Mara"), Some(key));
    }

    #[test]
    fn test_cover_key_decode_rejects_malformed_input() {
        assert_eq!(CoverKey::decode("no-separator"), None);
        assert_eq!(CoverKey::decode("/missing-continent"), None);
        assert_eq!(CoverKey::decode("missing-location/"), None);
    }

    #[test]
    fn test_location_update_is_empty() {
        assert!(LocationUpdate::default().is_empty());
        let update = LocationUpdate {
            country: Some("Kenya".to_string()),
            ..LocationUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_location_record_serializes_without_missing_created_at() {
        let record = LocationRecord {
            id: "africa-masai-mara".to_string(),
            continent_slug: "africa".to_string(),
            continent_name: "Africa".to_string(),
            name: "Masai Mara".to_string(),
            slug: "masai-mara".to_string(),
            country: "Kenya".to_string(),
            description: "Explore the wildlife of Masai Mara.".to_string(),
            wildlife: vec!["lion".to_string()],
            created_at: None,
        };
        let raw = serde_json::to_string(&record).unwrap();
        assert!(!raw.contains("created_at"));

        let parsed: LocationRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, record);
    }
}
