//! Top-level application component.
//!
//! The [`App`] owns all global services and is the root for the application's functionality.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::config::{read_config, Config, ConfigSource};
use crate::gallery::{Gallery, SystemClock, ViewCache};
use crate::media_store::create_media_store;
use crate::metadata::create_metadata_store;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during App operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for App operations.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Context Types
// =============================================================================

/// Context for creating an App.
#[derive(Default)]
pub struct AppContext {
    /// Source for configuration files.
    pub config_source: ConfigSource,
}

// =============================================================================
// App
// =============================================================================

/// The top-level application component.
///
/// Owns the configuration and the gallery service wired to the configured
/// media and metadata stores.
pub struct App {
    config: Config,
    gallery: Gallery,
}

impl App {
    /// Create a new App with the given context.
    pub fn new(ctx: AppContext) -> Result<Self> {
        let config_result =
            read_config(&ctx.config_source).map_err(|e| AppError::Config(e.to_string()))?;
        for warning in &config_result.warnings {
            warn!("{}", warning);
        }
        let config = config_result.config;

        let media = create_media_store(&config);
        let metadata = create_metadata_store(&config);
        let cache = ViewCache::new(config.cache_settings(), Arc::new(SystemClock));
        let gallery = Gallery::new(media, metadata, config.gallery_settings(), cache);

        Ok(Self { config, gallery })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the gallery service.
    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_creation() {
        let app = App::new(AppContext::default()).unwrap();
        assert_eq!(app.gallery().settings().root, app.config().gallery.root);
    }

    #[test]
    fn test_app_honors_config_overrides() {
        let ctx = AppContext {
            config_source: ConfigSource {
                config_file: None,
                override_file: None,
                overrides: vec![("gallery.root".to_string(), "test-root".to_string())],
            },
        };
        let app = App::new(ctx).unwrap();
        assert_eq!(app.config().gallery.root, "test-root");
        assert_eq!(app.gallery().settings().root, "test-root");
    }
}
