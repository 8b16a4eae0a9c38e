//! Gallery views, reconciliation, and the caching facade.
//!
//! This is the layered core of the crate:
//! - [`cache`] - in-memory TTL cache for assembled views
//! - [`reconcile`] - merges metadata records with live folder listings
//! - [`gallery`] - the facade the rest of the application calls
//!
//! Reads degrade rather than fail: a broken store produces empty lists and
//! placeholder covers, never an error page. Writes return typed errors and
//! clear the whole view cache on success.

mod cache;
#[allow(clippy::module_inception)]
mod gallery;
mod reconcile;

pub use cache::{CacheKey, CacheSettings, CachedView, Clock, ManualClock, SystemClock, ViewCache};
pub use gallery::{slugify, Gallery, NewLocation, SavedImage};
pub use reconcile::{alt_text_for, continent_display_name, is_absolute_http_url, Reconciler};

use serde::Serialize;

/// Result type for gallery write operations.
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Errors returned by gallery write operations.
///
/// Reads never produce these; they degrade to empty views instead.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("continent not found: {0}")]
    ContinentNotFound(String),

    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Media(#[from] crate::media_store::Error),

    #[error(transparent)]
    Metadata(#[from] crate::metadata::Error),
}

// =============================================================================
// Settings
// =============================================================================

/// Settings shared by the reconciliation layer and the facade.
#[derive(Debug, Clone)]
pub struct GallerySettings {
    /// Root folder for gallery images in the media store.
    pub root: String,
    /// URL substituted when a location has no usable cover.
    pub placeholder_image: String,
    /// Bound on concurrent folder listings during reconciliation.
    pub max_concurrent_lists: usize,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            root: "safari-gallery".to_string(),
            placeholder_image: "/images/placeholder-safari.jpg".to_string(),
            max_concurrent_lists: 8,
        }
    }
}

// =============================================================================
// View Types
// =============================================================================

/// A continent with its locations, as assembled by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Continent {
    /// Stable identifier; equal to the slug.
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Cover of the first location with images, else a placeholder.
    pub cover_image: String,
    pub locations: Vec<Location>,
    pub location_count: usize,
    /// Sum of the per-location image counts.
    pub total_images: usize,
}

/// A safari destination within a continent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub country: String,
    pub description: String,
    pub wildlife: Vec<String>,
    /// Resolved cover: stored selection, first image, or placeholder.
    pub cover_image: String,
    pub image_count: usize,
}

/// A live projection of one stored image file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryImage {
    /// Store-assigned identifier, used for deletion.
    pub id: String,
    /// Public URL.
    pub src: String,
    /// Base file name in the store.
    pub file_name: String,
    /// Human-readable description derived from the file name.
    pub alt: String,
}

/// A continent slug/name pair, for forms and navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinentSummary {
    pub slug: String,
    pub name: String,
}

/// A location surfaced on the featured listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedLocation {
    pub name: String,
    pub slug: String,
    pub continent_slug: String,
    pub country: String,
    pub description: String,
    pub wildlife: Vec<String>,
    pub cover_image: String,
    pub image_count: usize,
}

// =============================================================================
// Admin Structure Types
// =============================================================================

/// Admin view of one image, carrying its cover status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureImage {
    pub name: String,
    /// Deletion handle for the admin UI.
    pub file_id: String,
    pub url: String,
    pub is_cover: bool,
}

/// Admin view of one location with filesystem-exact image state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureLocation {
    pub name: String,
    pub slug: String,
    pub country: String,
    pub description: String,
    pub wildlife: Vec<String>,
    /// `None` when the location has no images and no stored cover.
    pub cover_image: Option<String>,
    pub images: Vec<StructureImage>,
}

/// Admin view of one continent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureContinent {
    pub name: String,
    pub slug: String,
    pub locations: Vec<StructureLocation>,
}
