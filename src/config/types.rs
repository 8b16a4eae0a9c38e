//! Configuration types for safari-gallery.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::gallery::{CacheSettings, GallerySettings};

// =============================================================================
// Config Sections
// =============================================================================

/// [imagekit] section - media store connection settings.
#[derive(Debug, Clone)]
pub struct ImageKitSettings {
    /// Private API key. Uploads and deletions are disabled without it.
    pub private_key: Option<String>,
    /// Public delivery endpoint for image URLs.
    pub url_endpoint: String,
    /// Base URL of the management API.
    pub api_base: String,
    /// Base URL of the upload API.
    pub upload_base: String,
}

/// [supabase] section - metadata database settings.
///
/// When either field is absent, metadata falls back to local JSON files.
#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// [gallery] section - gallery behavior settings.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Root folder for gallery images in the media store.
    pub root: String,
    /// URL substituted when a location has no usable cover.
    pub placeholder_image: String,
    /// Directory holding the local metadata fallback files.
    pub content_dir: PathBuf,
    /// Bound on concurrent folder listings during reconciliation.
    pub max_concurrent_lists: usize,
}

/// [cache] section - view cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub enabled: bool,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub imagekit: ImageKitSettings,
    pub supabase: SupabaseSettings,
    pub gallery: GalleryConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Cache settings in the form the gallery layer consumes.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: Duration::from_secs(self.cache.ttl_secs),
            max_entries: self.cache.max_entries,
            enabled: self.cache.enabled,
        }
    }

    /// Gallery settings in the form the gallery layer consumes.
    pub fn gallery_settings(&self) -> GallerySettings {
        GallerySettings {
            root: self.gallery.root.clone(),
            placeholder_image: self.gallery.placeholder_image.clone(),
            max_concurrent_lists: self.gallery.max_concurrent_lists,
        }
    }
}
