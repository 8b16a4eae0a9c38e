//! Metadata store construction.

use std::sync::Arc;

use tracing::warn;

use crate::config::Config;

use super::{LocalFileMetadataStore, MetadataStore, RestMetadataStore};

/// Create the metadata store selected by the configuration.
///
/// The database adapter is used when both the project URL and the API key
/// are present; otherwise location records and covers live in local JSON
/// files, with a single startup warning. Callers cannot tell which backend
/// served a request.
pub fn create_metadata_store(config: &Config) -> Arc<dyn MetadataStore> {
    match (
        config.supabase.url.as_deref(),
        config.supabase.anon_key.as_deref(),
    ) {
        (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
            Arc::new(RestMetadataStore::new(url, key))
        }
        _ => {
            warn!(
                content_dir = %config.gallery.content_dir.display(),
                "database credentials are not set; using local metadata files"
            );
            Arc::new(LocalFileMetadataStore::new(&config.gallery.content_dir))
        }
    }
}
