//! The gallery facade.
//!
//! Reads are cache-aware and infallible; writes validate first, touch the
//! stores, and clear the entire view cache on success. Multi-step deletion
//! is not transactional: the metadata record decides the outcome and
//! earlier steps are tolerated failures.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::imaging;
use crate::media_store::{FolderPath, MediaFile, MediaStore};
use crate::metadata::{CoverKey, LocationRecord, LocationUpdate, MetadataStore};

use super::{
    continent_display_name, CacheKey, CachedView, Continent, ContinentSummary, FeaturedLocation,
    GalleryError, GalleryImage, GallerySettings, Location, Reconciler, Result, StructureContinent,
    ViewCache,
};

/// Derives a URL-safe slug from a display name: lower-cased, punctuation
/// stripped, whitespace collapsed to single hyphens.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut previous_hyphen = false;
    for c in lowered.chars() {
        let mapped = if c.is_whitespace() { '-' } else { c };
        if mapped != '-' && !mapped.is_ascii_alphanumeric() {
            continue;
        }
        if mapped == '-' {
            if previous_hyphen {
                continue;
            }
            previous_hyphen = true;
        } else {
            previous_hyphen = false;
        }
        slug.push(mapped);
    }
    slug.trim_matches('-').to_string()
}

/// Fields for a new location. Description defaults from the name when
/// omitted.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub wildlife: Vec<String>,
}

/// The outcome of a successful upload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SavedImage {
    pub file_id: String,
    pub path: String,
    pub url: String,
}

// =============================================================================
// Gallery
// =============================================================================

/// Cache-aware facade over the media and metadata stores.
pub struct Gallery {
    media: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataStore>,
    reconciler: Reconciler,
    cache: ViewCache,
    settings: GallerySettings,
}

impl Gallery {
    pub fn new(
        media: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        settings: GallerySettings,
        cache: ViewCache,
    ) -> Self {
        let reconciler = Reconciler::new(media.clone(), metadata.clone(), settings.clone());
        Self {
            media,
            metadata,
            reconciler,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &GallerySettings {
        &self.settings
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The full continent tree, from cache when fresh.
    pub async fn continents(&self) -> Arc<Vec<Continent>> {
        if let Some(continents) = self.cache.continents() {
            return continents;
        }
        let continents = Arc::new(self.reconciler.build_continents().await);
        self.cache
            .insert(CacheKey::Continents, CachedView::Continents(continents.clone()));
        continents
    }

    pub async fn continent(&self, slug: &str) -> Option<Continent> {
        self.continents()
            .await
            .iter()
            .find(|continent| continent.slug == slug)
            .cloned()
    }

    pub async fn locations(&self, continent_slug: &str) -> Vec<Location> {
        self.continent(continent_slug)
            .await
            .map(|continent| continent.locations)
            .unwrap_or_default()
    }

    pub async fn location(&self, continent_slug: &str, location_slug: &str) -> Option<Location> {
        self.locations(continent_slug)
            .await
            .into_iter()
            .find(|location| location.slug == location_slug)
    }

    /// One location's images, from cache when fresh. Unknown slugs resolve
    /// to an empty list.
    pub async fn images(
        &self,
        continent_slug: &str,
        location_slug: &str,
    ) -> Arc<Vec<GalleryImage>> {
        if let Some(images) = self.cache.images(continent_slug, location_slug) {
            return images;
        }
        let records = self.reconciler.records().await;
        let record = records.iter().find(|record| {
            record.continent_slug == continent_slug && record.slug == location_slug
        });
        let images = match record {
            Some(record) => {
                let files = self.reconciler.list_location(record).await;
                Arc::new(files.into_iter().map(GalleryImage::from).collect())
            }
            None => Arc::new(Vec::new()),
        };
        self.cache.insert(
            CacheKey::Images {
                continent_slug: continent_slug.to_string(),
                location_slug: location_slug.to_string(),
            },
            CachedView::Images(images.clone()),
        );
        images
    }

    /// Continent slug/name pairs in record order. Deliberately uncached, so
    /// admin forms always see freshly added continents.
    pub async fn continents_list(&self) -> Vec<ContinentSummary> {
        let records = self.reconciler.records().await;
        let mut summaries: Vec<ContinentSummary> = Vec::new();
        for record in &records {
            if !summaries.iter().any(|summary| summary.slug == record.continent_slug) {
                summaries.push(ContinentSummary {
                    slug: record.continent_slug.clone(),
                    name: record.continent_name.clone(),
                });
            }
        }
        summaries
    }

    /// The uncached admin view with per-image cover flags.
    pub async fn full_structure(&self) -> Vec<StructureContinent> {
        self.reconciler.build_structure().await
    }

    /// The `limit` locations with the most images, among those whose cover
    /// resolved to a real image.
    pub async fn featured_locations(&self, limit: usize) -> Vec<FeaturedLocation> {
        let continents = self.continents().await;
        let mut featured: Vec<FeaturedLocation> = Vec::new();
        for continent in continents.iter() {
            for location in &continent.locations {
                if location.cover_image.is_empty()
                    || location.cover_image == self.settings.placeholder_image
                {
                    continue;
                }
                featured.push(FeaturedLocation {
                    name: location.name.clone(),
                    slug: location.slug.clone(),
                    continent_slug: continent.slug.clone(),
                    country: location.country.clone(),
                    description: location.description.clone(),
                    wildlife: location.wildlife.clone(),
                    cover_image: location.cover_image.clone(),
                    image_count: location.image_count,
                });
            }
        }
        // Stable sort keeps continent-then-location order among ties.
        featured.sort_by(|a, b| b.image_count.cmp(&a.image_count));
        featured.truncate(limit);
        featured
    }

    /// Details for one stored file, straight from the media store.
    pub async fn image_details(&self, file_id: &str) -> Result<MediaFile> {
        Ok(self.media.file_details(file_id).await?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Compresses and uploads one image into a location's folder.
    pub async fn save_image(
        &self,
        continent: &str,
        location: &str,
        data: Bytes,
        file_name: &str,
    ) -> Result<SavedImage> {
        let prepared = imaging::compress_for_upload(data, file_name);
        let folder = FolderPath::for_location(&self.settings.root, continent, location);
        let uploaded = self
            .media
            .upload_file(prepared.data, &prepared.file_name, &folder)
            .await?;
        info!(path = %uploaded.path, "uploaded image");
        self.cache.clear();
        Ok(SavedImage {
            file_id: uploaded.id,
            path: uploaded.path,
            url: uploaded.url,
        })
    }

    /// Deletes one image by its store file id.
    pub async fn delete_image(&self, file_id: &str) -> Result<()> {
        if file_id.starts_with("http") {
            return Err(GalleryError::Validation(
                "images are deleted by file id, not URL".to_string(),
            ));
        }
        self.media.delete_file(file_id).await?;
        info!(file_id, "deleted image");
        self.cache.clear();
        Ok(())
    }

    /// Records a cover selection for a location. Validity of the URL is
    /// judged at read time, so a stale value degrades instead of erroring.
    pub async fn set_cover_photo(
        &self,
        continent: &str,
        location: &str,
        image_url: &str,
    ) -> Result<()> {
        if image_url.trim().is_empty() {
            return Err(GalleryError::Validation(
                "cover image URL must not be empty".to_string(),
            ));
        }
        let key = CoverKey::new(continent, location);
        self.metadata.set_cover(&key, image_url).await?;
        info!(continent, location, "stored cover selection");
        self.cache.clear();
        Ok(())
    }

    /// Creates a location under a continent.
    pub async fn add_location(
        &self,
        continent_slug: &str,
        new: NewLocation,
    ) -> Result<Location> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(GalleryError::Validation(
                "location name is required".to_string(),
            ));
        }
        let country = new.country.trim();
        if country.is_empty() {
            return Err(GalleryError::Validation("country is required".to_string()));
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(GalleryError::Validation(
                "location name must contain letters or digits".to_string(),
            ));
        }

        let records = self.metadata.locations().await?;
        let duplicate = records.iter().any(|record| {
            record.continent_slug == continent_slug
                && (record.slug == slug || record.name.to_lowercase() == name.to_lowercase())
        });
        if duplicate {
            return Err(GalleryError::Validation(format!(
                "a location named '{}' already exists in {}",
                name, continent_slug
            )));
        }

        let description = match new.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => format!("Explore the wildlife of {}.", name),
        };
        let wildlife: Vec<String> = new
            .wildlife
            .iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        let record = LocationRecord {
            id: format!("{}-{}", continent_slug, slug),
            continent_slug: continent_slug.to_string(),
            continent_name: continent_display_name(continent_slug),
            name: name.to_string(),
            slug,
            country: country.to_string(),
            description,
            wildlife,
            created_at: None,
        };
        self.metadata.insert_location(&record).await?;
        info!(id = %record.id, "added location");
        self.cache.clear();

        Ok(Location {
            id: record.id,
            name: record.name,
            slug: record.slug,
            country: record.country,
            description: record.description,
            wildlife: record.wildlife,
            cover_image: self.settings.placeholder_image.clone(),
            image_count: 0,
        })
    }

    /// Deletes a location, its image folder, and its cover selection.
    ///
    /// The three steps share no transaction. Folder and cover failures are
    /// logged and skipped; the metadata delete decides the outcome.
    pub async fn delete_location(
        &self,
        continent_slug: &str,
        location_slug: &str,
    ) -> Result<()> {
        let records = self.metadata.locations().await?;
        if !records
            .iter()
            .any(|record| record.continent_slug == continent_slug)
        {
            return Err(GalleryError::ContinentNotFound(continent_slug.to_string()));
        }
        let record = records
            .iter()
            .find(|record| {
                record.continent_slug == continent_slug && record.slug == location_slug
            })
            .ok_or_else(|| GalleryError::LocationNotFound(location_slug.to_string()))?;

        let folder = self.reconciler.folder_for(record);
        if let Err(error) = self.media.delete_folder(&folder).await {
            warn!(%error, folder = %folder, "failed to delete image folder, continuing");
        }
        let key = CoverKey::new(&record.continent_name, &record.name);
        if let Err(error) = self.metadata.remove_cover(&key).await {
            warn!(%error, "failed to remove stored cover, continuing");
        }
        self.metadata.delete_location(&record.id).await?;
        info!(id = %record.id, "deleted location");
        self.cache.clear();
        Ok(())
    }

    /// Applies a partial update to a location record.
    pub async fn update_location(
        &self,
        continent_slug: &str,
        location_slug: &str,
        update: LocationUpdate,
    ) -> Result<()> {
        if update.is_empty() {
            return Err(GalleryError::Validation(
                "nothing to update".to_string(),
            ));
        }
        let records = self.metadata.locations().await?;
        if !records
            .iter()
            .any(|record| record.continent_slug == continent_slug)
        {
            return Err(GalleryError::ContinentNotFound(continent_slug.to_string()));
        }
        let record = records
            .iter()
            .find(|record| {
                record.continent_slug == continent_slug && record.slug == location_slug
            })
            .ok_or_else(|| GalleryError::LocationNotFound(location_slug.to_string()))?;

        self.metadata.update_location(&record.id, &update).await?;
        info!(id = %record.id, "updated location");
        self.cache.clear();
        Ok(())
    }
}
