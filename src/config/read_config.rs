//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

use super::{CacheConfig, Config, GalleryConfig, ImageKitSettings, SupabaseSettings};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_URL_ENDPOINT: &str = "https://ik.imagekit.io/safarikannadiga";
const DEFAULT_API_BASE: &str = "https://api.imagekit.io/v1";
const DEFAULT_UPLOAD_BASE: &str = "https://upload.imagekit.io/api/v1";
const DEFAULT_GALLERY_ROOT: &str = "safari-gallery";
const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/placeholder-safari.jpg";
const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_MAX_CONCURRENT_LISTS: usize = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
const DEFAULT_CACHE_ENABLED: bool = true;

const ENV_CONFIG_FILE: &str = "SGAL_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".sgalconfig";

const ENV_IMAGEKIT_PRIVATE_KEY: &str = "IMAGEKIT_PRIVATE_KEY";
const ENV_IMAGEKIT_URL_ENDPOINT: &str = "IMAGEKIT_URL_ENDPOINT";
const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid boolean '{value}' for key '{key}'")]
    InvalidBoolean { key: String, value: String },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to SGAL_CONFIG_FILE env var, then ~/.sgalconfig.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "imagekit.private_key", "cache.ttl_secs"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// Value Parsing
// =============================================================================

/// Parse a boolean value.
fn parse_bool(ini: &Ini, section: &str, key: &str, default: bool) -> Result<bool> {
    match ini.get(section, key) {
        None => Ok(default),
        Some(v) => parse_bool_value(key, &v),
    }
}

fn parse_bool_value(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_usize(value: &str) -> Result<usize> {
    value.parse().map_err(|e| ConfigError::InvalidInteger {
        value: value.to_string(),
        source: e,
    })
}

fn parse_u64(value: &str) -> Result<u64> {
    value.parse().map_err(|e| ConfigError::InvalidInteger {
        value: value.to_string(),
        source: e,
    })
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
pub struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    pub path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    pub warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    // If explicit path provided, it must exist
    if let Some(ref path) = source.config_file {
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            });
        } else {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
    }

    // Check environment variable
    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        } else {
            // Warn but continue with defaults
            return Ok(ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "config file specified by {} does not exist: {}",
                    ENV_CONFIG_FILE, env_path
                )),
            });
        }
    }

    // Check ~/.sgalconfig
    if let Some(home) = home_dir() {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    // No config file found
    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        imagekit: ImageKitSettings {
            private_key: None,
            url_endpoint: DEFAULT_URL_ENDPOINT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        },
        supabase: SupabaseSettings {
            url: None,
            anon_key: None,
        },
        gallery: GalleryConfig {
            root: DEFAULT_GALLERY_ROOT.to_string(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            max_concurrent_lists: DEFAULT_MAX_CONCURRENT_LISTS,
        },
        cache: CacheConfig {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            enabled: DEFAULT_CACHE_ENABLED,
        },
    }
}

/// Apply credential environment variables. Config files and explicit
/// overrides layer on top of these.
fn apply_env(config: &mut Config) {
    if let Ok(key) = env::var(ENV_IMAGEKIT_PRIVATE_KEY) {
        if !key.is_empty() {
            config.imagekit.private_key = Some(key);
        }
    }
    if let Ok(endpoint) = env::var(ENV_IMAGEKIT_URL_ENDPOINT) {
        if !endpoint.is_empty() {
            config.imagekit.url_endpoint = endpoint;
        }
    }
    if let Ok(url) = env::var(ENV_SUPABASE_URL) {
        if !url.is_empty() {
            config.supabase.url = Some(url);
        }
    }
    if let Ok(key) = env::var(ENV_SUPABASE_ANON_KEY) {
        if !key.is_empty() {
            config.supabase.anon_key = Some(key);
        }
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

/// Apply an INI file's contents to a Config, layering on top of existing values.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    // [imagekit] section
    if let Some(private_key) = ini.get("imagekit", "private_key") {
        config.imagekit.private_key = Some(private_key);
    }
    if let Some(url_endpoint) = ini.get("imagekit", "url_endpoint") {
        config.imagekit.url_endpoint = url_endpoint;
    }
    if let Some(api_base) = ini.get("imagekit", "api_base") {
        config.imagekit.api_base = api_base;
    }
    if let Some(upload_base) = ini.get("imagekit", "upload_base") {
        config.imagekit.upload_base = upload_base;
    }

    // [supabase] section
    if let Some(url) = ini.get("supabase", "url") {
        config.supabase.url = Some(url);
    }
    if let Some(anon_key) = ini.get("supabase", "anon_key") {
        config.supabase.anon_key = Some(anon_key);
    }

    // [gallery] section
    if let Some(root) = ini.get("gallery", "root") {
        config.gallery.root = root;
    }
    if let Some(placeholder) = ini.get("gallery", "placeholder_image") {
        config.gallery.placeholder_image = placeholder;
    }
    if let Some(content_dir) = ini.get("gallery", "content_dir") {
        config.gallery.content_dir = PathBuf::from(content_dir);
    }
    if let Some(value) = ini.get("gallery", "max_concurrent_lists") {
        config.gallery.max_concurrent_lists = parse_usize(&value)?;
    }

    // [cache] section
    if let Some(value) = ini.get("cache", "ttl_secs") {
        config.cache.ttl_secs = parse_u64(&value)?;
    }
    if let Some(value) = ini.get("cache", "max_entries") {
        config.cache.max_entries = parse_usize(&value)?;
    }
    config.cache.enabled = parse_bool(ini, "cache", "enabled", config.cache.enabled)?;

    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.splitn(2, '.').collect();

    match parts.as_slice() {
        ["imagekit", param] => apply_imagekit_override(config, param, value),
        ["supabase", param] => apply_supabase_override(config, param, value),
        ["gallery", param] => apply_gallery_override(config, param, value),
        ["cache", param] => apply_cache_override(config, param, value),
        _ => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_imagekit_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "private_key" => {
            config.imagekit.private_key = Some(value.to_string());
            Ok(())
        }
        "url_endpoint" => {
            config.imagekit.url_endpoint = value.to_string();
            Ok(())
        }
        "api_base" => {
            config.imagekit.api_base = value.to_string();
            Ok(())
        }
        "upload_base" => {
            config.imagekit.upload_base = value.to_string();
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("imagekit.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

fn apply_supabase_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "url" => {
            config.supabase.url = Some(value.to_string());
            Ok(())
        }
        "anon_key" => {
            config.supabase.anon_key = Some(value.to_string());
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("supabase.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

fn apply_gallery_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "root" => {
            config.gallery.root = value.to_string();
            Ok(())
        }
        "placeholder_image" => {
            config.gallery.placeholder_image = value.to_string();
            Ok(())
        }
        "content_dir" => {
            config.gallery.content_dir = PathBuf::from(value);
            Ok(())
        }
        "max_concurrent_lists" => {
            config.gallery.max_concurrent_lists = parse_usize(value)?;
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("gallery.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

fn apply_cache_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "ttl_secs" => {
            config.cache.ttl_secs = parse_u64(value)?;
            Ok(())
        }
        "max_entries" => {
            config.cache.max_entries = parse_usize(value)?;
            Ok(())
        }
        "enabled" => {
            config.cache.enabled = parse_bool_value(param, value)?;
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("cache.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Credential environment variables
/// 3. Base config file (from CLI, env var, or ~/.sgalconfig)
/// 4. Override config file (if specified)
/// 5. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    // Start with defaults and environment credentials
    let mut config = default_config();
    apply_env(&mut config);

    // Resolve and apply base config file
    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    // Apply override config file if specified
    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    // Apply individual overrides
    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(config.imagekit.private_key.is_none());
        assert_eq!(
            config.imagekit.url_endpoint,
            "https://ik.imagekit.io/safarikannadiga"
        );
        assert!(config.supabase.url.is_none());
        assert_eq!(config.gallery.root, "safari-gallery");
        assert_eq!(
            config.gallery.placeholder_image,
            "/images/placeholder-safari.jpg"
        );
        assert_eq!(config.gallery.max_concurrent_lists, 8);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.max_entries, 100);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_apply_override_imagekit() {
        let mut config = default_config();
        apply_override(&mut config, "imagekit.private_key", "private_xyz").unwrap();
        assert_eq!(config.imagekit.private_key.as_deref(), Some("private_xyz"));

        apply_override(&mut config, "imagekit.url_endpoint", "https://ik.example.com").unwrap();
        assert_eq!(config.imagekit.url_endpoint, "https://ik.example.com");
    }

    #[test]
    fn test_apply_override_cache() {
        let mut config = default_config();
        apply_override(&mut config, "cache.ttl_secs", "60").unwrap();
        assert_eq!(config.cache.ttl_secs, 60);

        apply_override(&mut config, "cache.enabled", "false").unwrap();
        assert!(!config.cache.enabled);

        assert!(apply_override(&mut config, "cache.ttl_secs", "soon").is_err());
        assert!(apply_override(&mut config, "cache.enabled", "maybe").is_err());
    }

    #[test]
    fn test_apply_override_rejects_unknown_keys() {
        let mut config = default_config();
        assert!(matches!(
            apply_override(&mut config, "imagekit.password", "x"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "nonsense", "x"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
    }

    #[test]
    fn test_parse_ini_config() {
        let mut ini = Ini::new();
        ini.read(
            r#"
[imagekit]
private_key = private_abc
url_endpoint = https://ik.example.com/test

[supabase]
url = https://project.supabase.co
anon_key = anon_abc

[gallery]
root = test-gallery
max_concurrent_lists = 4

[cache]
ttl_secs = 30
max_entries = 10
enabled = false
"#
            .to_string(),
        )
        .unwrap();

        let mut config = default_config();
        apply_ini_to_config(&mut config, &ini).unwrap();

        assert_eq!(config.imagekit.private_key.as_deref(), Some("private_abc"));
        assert_eq!(config.imagekit.url_endpoint, "https://ik.example.com/test");
        assert_eq!(config.supabase.url.as_deref(), Some("https://project.supabase.co"));
        assert_eq!(config.supabase.anon_key.as_deref(), Some("anon_abc"));
        assert_eq!(config.gallery.root, "test-gallery");
        assert_eq!(config.gallery.max_concurrent_lists, 4);
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.max_entries, 10);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_read_config_with_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sgal.ini");
        std::fs::write(
            &path,
            "[gallery]\nroot = from-file\n\n[cache]\nttl_secs = 45\n",
        )
        .unwrap();

        let source = ConfigSource {
            config_file: Some(path),
            override_file: None,
            overrides: vec![("cache.ttl_secs".to_string(), "90".to_string())],
        };
        let result = read_config(&source).unwrap();

        assert_eq!(result.config.gallery.root, "from-file");
        // Individual overrides win over the file.
        assert_eq!(result.config.cache.ttl_secs, 90);
    }

    #[test]
    fn test_read_config_override_file_layers_on_base() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("base.ini");
        let extra = dir.path().join("extra.ini");
        std::fs::write(&base, "[gallery]\nroot = base-root\nmax_concurrent_lists = 2\n").unwrap();
        std::fs::write(&extra, "[gallery]\nroot = extra-root\n").unwrap();

        let source = ConfigSource {
            config_file: Some(base),
            override_file: Some(extra),
            overrides: Vec::new(),
        };
        let result = read_config(&source).unwrap();

        assert_eq!(result.config.gallery.root, "extra-root");
        assert_eq!(result.config.gallery.max_concurrent_lists, 2);
    }

    #[test]
    fn test_read_config_missing_explicit_file_errors() {
        let source = ConfigSource {
            config_file: Some(PathBuf::from("/nonexistent/sgal.ini")),
            override_file: None,
            overrides: Vec::new(),
        };
        assert!(matches!(
            read_config(&source),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
