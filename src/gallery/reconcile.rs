//! Reconciliation of metadata records with live media-store folder listings.
//!
//! The metadata store is authoritative for which locations exist and what
//! they say about themselves; the media store is authoritative for which
//! images exist. The reconciler joins the two into the view types, listing
//! folders concurrently under a permit bound, and treats every read failure
//! as an empty result so the gallery still renders.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::media_store::{FolderPath, MediaFile, MediaStore};
use crate::metadata::{CoverKey, LocationRecord, MetadataStore};

use super::{
    Continent, GalleryImage, GallerySettings, Location, StructureContinent, StructureImage,
    StructureLocation,
};

/// Display names for the continents the gallery knows about. Slugs outside
/// this table fall back to the slug itself.
const CONTINENT_NAMES: &[(&str, &str)] = &[("africa", "Africa"), ("asia", "Asia")];

/// Resolves a continent slug to its display name.
pub fn continent_display_name(slug: &str) -> String {
    CONTINENT_NAMES
        .iter()
        .find(|(known, _)| *known == slug)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| slug.to_string())
}

/// Whether a stored cover URL is usable. Anything that is not an absolute
/// HTTP(S) URL is treated as stale.
pub fn is_absolute_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Derives human-readable alt text from a file name: separators become
/// spaces and a trailing extension is stripped.
pub fn alt_text_for(file_name: &str) -> String {
    let spaced: String = file_name
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();
    let stem = match spaced.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            stem
        }
        _ => spaced.as_str(),
    };
    let alt = stem.trim();
    if alt.is_empty() {
        "Safari photo".to_string()
    } else {
        alt.to_string()
    }
}

impl From<MediaFile> for GalleryImage {
    fn from(file: MediaFile) -> Self {
        let alt = alt_text_for(&file.name);
        Self {
            id: file.id,
            src: file.url,
            file_name: file.name,
            alt,
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Joins location records with folder listings into gallery views.
pub struct Reconciler {
    media: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataStore>,
    settings: GallerySettings,
    list_permits: Arc<Semaphore>,
}

impl Reconciler {
    pub fn new(
        media: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        settings: GallerySettings,
    ) -> Self {
        let list_permits = Arc::new(Semaphore::new(settings.max_concurrent_lists.max(1)));
        Self {
            media,
            metadata,
            settings,
            list_permits,
        }
    }

    /// The media-store folder backing a location. Folders are keyed by
    /// display names, not slugs.
    pub fn folder_for(&self, record: &LocationRecord) -> FolderPath {
        FolderPath::for_location(&self.settings.root, &record.continent_name, &record.name)
    }

    /// All location records, or an empty list when the metadata store is
    /// unreachable.
    pub async fn records(&self) -> Vec<LocationRecord> {
        match self.metadata.locations().await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "failed to load location records, serving an empty gallery");
                Vec::new()
            }
        }
    }

    async fn covers(&self) -> HashMap<CoverKey, String> {
        match self.metadata.covers().await {
            Ok(covers) => covers,
            Err(error) => {
                warn!(%error, "failed to load stored covers, falling back to first images");
                HashMap::new()
            }
        }
    }

    /// Lists one location's folder, or returns an empty list on failure.
    pub async fn list_location(&self, record: &LocationRecord) -> Vec<MediaFile> {
        let _permit = match self.list_permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Vec::new(),
        };
        let folder = self.folder_for(record);
        match self.media.list_files(&folder).await {
            Ok(files) => files,
            Err(error) => {
                warn!(%error, folder = %folder, "failed to list folder, treating it as empty");
                Vec::new()
            }
        }
    }

    fn resolve_cover(&self, saved: Option<&String>, files: &[MediaFile]) -> String {
        if let Some(url) = saved {
            if is_absolute_http_url(url) {
                return url.clone();
            }
        }
        files
            .first()
            .map(|file| file.url.clone())
            .unwrap_or_else(|| self.settings.placeholder_image.clone())
    }

    /// Assembles the full continent tree with resolved covers and counts.
    pub async fn build_continents(&self) -> Vec<Continent> {
        let records = self.records().await;
        let covers = self.covers().await;
        let listings = join_all(records.iter().map(|record| self.list_location(record))).await;

        let mut continents: Vec<Continent> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (record, files) in records.iter().zip(listings) {
            let slot = *index
                .entry(record.continent_slug.clone())
                .or_insert_with(|| {
                    continents.push(Continent {
                        id: record.continent_slug.clone(),
                        name: record.continent_name.clone(),
                        slug: record.continent_slug.clone(),
                        description: format!(
                            "Explore the wildlife of {}",
                            record.continent_name
                        ),
                        cover_image: String::new(),
                        locations: Vec::new(),
                        location_count: 0,
                        total_images: 0,
                    });
                    continents.len() - 1
                });
            let saved = covers.get(&CoverKey::new(&record.continent_name, &record.name));
            let cover = self.resolve_cover(saved, &files);
            let continent = &mut continents[slot];
            continent.total_images += files.len();
            continent.locations.push(Location {
                id: record.id.clone(),
                name: record.name.clone(),
                slug: record.slug.clone(),
                country: record.country.clone(),
                description: record.description.clone(),
                wildlife: record.wildlife.clone(),
                cover_image: cover,
                image_count: files.len(),
            });
        }

        // A continent inherits the cover of its first location that actually
        // has images.
        for continent in &mut continents {
            continent.location_count = continent.locations.len();
            continent.cover_image = continent
                .locations
                .iter()
                .find(|location| location.image_count > 0)
                .map(|location| location.cover_image.clone())
                .unwrap_or_else(|| self.settings.placeholder_image.clone());
        }
        continents
    }

    /// Assembles the uncached admin view: every image with its cover flag,
    /// and `None` for locations with nothing to show.
    pub async fn build_structure(&self) -> Vec<StructureContinent> {
        let records = self.records().await;
        let covers = self.covers().await;
        let listings = join_all(records.iter().map(|record| self.list_location(record))).await;

        let mut continents: Vec<StructureContinent> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (record, files) in records.iter().zip(listings) {
            let slot = *index
                .entry(record.continent_slug.clone())
                .or_insert_with(|| {
                    continents.push(StructureContinent {
                        name: record.continent_name.clone(),
                        slug: record.continent_slug.clone(),
                        locations: Vec::new(),
                    });
                    continents.len() - 1
                });
            let saved = covers.get(&CoverKey::new(&record.continent_name, &record.name));
            let cover = match saved {
                Some(url) if is_absolute_http_url(url) => Some(url.clone()),
                _ => files.first().map(|file| file.url.clone()),
            };
            let images = files
                .iter()
                .map(|file| StructureImage {
                    name: file.name.clone(),
                    file_id: file.id.clone(),
                    url: file.url.clone(),
                    is_cover: cover.as_deref() == Some(file.url.as_str()),
                })
                .collect();
            continents[slot].locations.push(StructureLocation {
                name: record.name.clone(),
                slug: record.slug.clone(),
                country: record.country.clone(),
                description: record.description.clone(),
                wildlife: record.wildlife.clone(),
                cover_image: cover,
                images,
            });
        }
        continents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_store::MemoryMediaStore;
    use crate::metadata::MemoryMetadataStore;

    fn record(continent_slug: &str, name: &str) -> LocationRecord {
        let slug = crate::gallery::slugify(name);
        LocationRecord {
            id: format!("{}-{}", continent_slug, slug),
            continent_slug: continent_slug.to_string(),
            continent_name: continent_display_name(continent_slug),
            name: name.to_string(),
            slug,
            country: "Kenya".to_string(),
            description: format!("Explore the wildlife of {}.", name),
            wildlife: vec!["lion".to_string()],
            created_at: None,
        }
    }

    fn stores() -> (Arc<MemoryMediaStore>, Arc<MemoryMetadataStore>, Reconciler) {
        let media = Arc::new(MemoryMediaStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let reconciler = Reconciler::new(
            media.clone(),
            metadata.clone(),
            GallerySettings::default(),
        );
        (media, metadata, reconciler)
    }

    #[tokio::test]
    async fn test_location_without_images_gets_placeholder_cover() {
        let (_media, metadata, reconciler) = stores();
        metadata.insert_location(&record("africa", "Masai Mara")).await.unwrap();

        let continents = reconciler.build_continents().await;

        assert_eq!(continents.len(), 1);
        let continent = &continents[0];
        assert_eq!(continent.slug, "africa");
        assert_eq!(continent.name, "Africa");
        assert_eq!(continent.description, "Explore the wildlife of Africa");
        assert_eq!(continent.cover_image, "/images/placeholder-safari.jpg");
        assert_eq!(continent.total_images, 0);
        let location = &continent.locations[0];
        assert_eq!(location.cover_image, "/images/placeholder-safari.jpg");
        assert_eq!(location.image_count, 0);
    }

    #[tokio::test]
    async fn test_first_file_becomes_cover_when_none_stored() {
        let (media, metadata, reconciler) = stores();
        let mara = record("africa", "Masai Mara");
        metadata.insert_location(&mara).await.unwrap();
        let folder = reconciler.folder_for(&mara);
        let first = media.seed_file(&folder, "lion.jpg");
        media.seed_file(&folder, "zebra.jpg");

        let continents = reconciler.build_continents().await;

        let location = &continents[0].locations[0];
        assert_eq!(location.cover_image, first.url);
        assert_eq!(location.image_count, 2);
        assert_eq!(continents[0].cover_image, first.url);
        assert_eq!(continents[0].total_images, 2);
    }

    #[tokio::test]
    async fn test_stored_absolute_cover_wins() {
        let (media, metadata, reconciler) = stores();
        let mara = record("africa", "Masai Mara");
        metadata.insert_location(&mara).await.unwrap();
        media.seed_file(&reconciler.folder_for(&mara), "lion.jpg");
        metadata
            .set_cover(
                &CoverKey::new("Africa", "Masai Mara"),
                "https://cdn.example.com/chosen.jpg",
            )
            .await
            .unwrap();

        let continents = reconciler.build_continents().await;

        assert_eq!(
            continents[0].locations[0].cover_image,
            "https://cdn.example.com/chosen.jpg"
        );
    }

    #[tokio::test]
    async fn test_stale_stored_cover_falls_back_to_first_file() {
        let (media, metadata, reconciler) = stores();
        let mara = record("africa", "Masai Mara");
        metadata.insert_location(&mara).await.unwrap();
        let first = media.seed_file(&reconciler.folder_for(&mara), "lion.jpg");
        metadata
            .set_cover(&CoverKey::new("Africa", "Masai Mara"), "images/relative.jpg")
            .await
            .unwrap();

        let continents = reconciler.build_continents().await;

        assert_eq!(continents[0].locations[0].cover_image, first.url);
    }

    #[tokio::test]
    async fn test_metadata_failure_degrades_to_empty_gallery() {
        let (_media, metadata, reconciler) = stores();
        metadata.insert_location(&record("africa", "Masai Mara")).await.unwrap();
        metadata.set_fail_reads(true);

        let continents = reconciler.build_continents().await;

        assert!(continents.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_degrades_to_zero_images() {
        let (media, metadata, reconciler) = stores();
        let mara = record("africa", "Masai Mara");
        metadata.insert_location(&mara).await.unwrap();
        media.seed_file(&reconciler.folder_for(&mara), "lion.jpg");
        media.set_fail_listing(true);

        let continents = reconciler.build_continents().await;

        let location = &continents[0].locations[0];
        assert_eq!(location.image_count, 0);
        assert_eq!(location.cover_image, "/images/placeholder-safari.jpg");
    }

    #[tokio::test]
    async fn test_continents_group_in_record_order() {
        let (_media, metadata, reconciler) = stores();
        metadata.insert_location(&record("asia", "Ranthambore")).await.unwrap();
        metadata.insert_location(&record("africa", "Masai Mara")).await.unwrap();
        metadata.insert_location(&record("africa", "Amboseli")).await.unwrap();

        let continents = reconciler.build_continents().await;

        // Records come back sorted by continent name, then location name.
        assert_eq!(continents.len(), 2);
        assert_eq!(continents[0].slug, "africa");
        assert_eq!(continents[0].location_count, 2);
        assert_eq!(continents[0].locations[0].name, "Amboseli");
        assert_eq!(continents[1].slug, "asia");
        assert_eq!(continents[1].location_count, 1);
    }

    #[tokio::test]
    async fn test_structure_marks_stored_cover() {
        let (media, metadata, reconciler) = stores();
        let mara = record("africa", "Masai Mara");
        metadata.insert_location(&mara).await.unwrap();
        let folder = reconciler.folder_for(&mara);
        media.seed_file(&folder, "lion.jpg");
        let chosen = media.seed_file(&folder, "zebra.jpg");
        metadata
            .set_cover(&CoverKey::new("Africa", "Masai Mara"), &chosen.url)
            .await
            .unwrap();

        let structure = reconciler.build_structure().await;

        let location = &structure[0].locations[0];
        assert_eq!(location.cover_image.as_deref(), Some(chosen.url.as_str()));
        assert!(!location.images[0].is_cover);
        assert!(location.images[1].is_cover);
        assert_eq!(location.images[1].file_id, chosen.id);
    }

    #[tokio::test]
    async fn test_structure_cover_is_none_without_images() {
        let (_media, metadata, reconciler) = stores();
        metadata.insert_location(&record("africa", "Masai Mara")).await.unwrap();

        let structure = reconciler.build_structure().await;

        let location = &structure[0].locations[0];
        assert!(location.cover_image.is_none());
        assert!(location.images.is_empty());
    }

    #[test]
    fn test_continent_display_name() {
        assert_eq!(continent_display_name("africa"), "Africa");
        assert_eq!(continent_display_name("asia"), "Asia");
        assert_eq!(continent_display_name("atlantis"), "atlantis");
    }

    #[test]
    fn test_is_absolute_http_url() {
        assert!(is_absolute_http_url("https://example.com/a.jpg"));
        assert!(is_absolute_http_url("http://example.com/a.jpg"));
        assert!(!is_absolute_http_url("/images/a.jpg"));
        assert!(!is_absolute_http_url("images/a.jpg"));
        assert!(!is_absolute_http_url("ftp://example.com/a.jpg"));
    }

    #[test]
    fn test_alt_text_for() {
        assert_eq!(alt_text_for("masai-mara_sunset.jpg"), "masai mara sunset");
        assert_eq!(alt_text_for("lion"), "lion");
        assert_eq!(alt_text_for("archive.tar.gz"), "archive.tar");
        assert_eq!(alt_text_for(".jpg"), "Safari photo");
        assert_eq!(alt_text_for("---.png"), "Safari photo");
    }
}
