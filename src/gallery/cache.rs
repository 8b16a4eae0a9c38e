//! TTL cache for assembled gallery views.
//!
//! Entries expire a fixed interval after insertion and the cache holds a
//! bounded number of entries, evicting the oldest insertion when full. Any
//! successful write to the underlying stores clears the cache wholesale
//! rather than invalidating individual keys.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{Continent, GalleryImage};

// =============================================================================
// Clock
// =============================================================================

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Used by tests to cross the TTL
/// without sleeping.
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap();
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}

// =============================================================================
// Settings and Keys
// =============================================================================

/// Cache sizing and expiry settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: usize,
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 100,
            enabled: true,
        }
    }
}

/// Identifies one cacheable view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The full continent tree.
    Continents,
    /// The image list of a single location.
    Images {
        continent_slug: String,
        location_slug: String,
    },
}

/// A cached view. Arc-wrapped so hits hand out shared ownership without
/// copying the assembled data.
#[derive(Clone)]
pub enum CachedView {
    Continents(Arc<Vec<Continent>>),
    Images(Arc<Vec<GalleryImage>>),
}

struct CacheEntry {
    view: CachedView,
    inserted_at: Instant,
}

// =============================================================================
// ViewCache
// =============================================================================

/// Bounded TTL cache keyed by [`CacheKey`].
pub struct ViewCache {
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ViewCache {
    pub fn new(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Looks up a key. An expired entry is removed and treated as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachedView> {
        if !self.settings.enabled {
            return None;
        }
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(key) {
            if now.duration_since(entry.inserted_at) >= self.settings.ttl {
                debug!(?key, "cache entry expired");
                entries.remove(key);
                return None;
            }
            return Some(entry.view.clone());
        }
        None
    }

    /// Stores a view, evicting the oldest entry when the cache is full and
    /// the key is not already present.
    pub fn insert(&self, key: CacheKey, view: CachedView) {
        if !self.settings.enabled || self.settings.max_entries == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.settings.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(key = ?oldest, "evicting oldest cache entry");
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                view,
                inserted_at: self.clock.now(),
            },
        );
    }

    /// Drops every entry. Called after any successful write.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            debug!(dropped, "cleared view cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed lookup for the continent tree.
    pub fn continents(&self) -> Option<Arc<Vec<Continent>>> {
        match self.get(&CacheKey::Continents) {
            Some(CachedView::Continents(continents)) => Some(continents),
            _ => None,
        }
    }

    /// Typed lookup for a location's image list.
    pub fn images(&self, continent_slug: &str, location_slug: &str) -> Option<Arc<Vec<GalleryImage>>> {
        let key = CacheKey::Images {
            continent_slug: continent_slug.to_string(),
            location_slug: location_slug.to_string(),
        };
        match self.get(&key) {
            Some(CachedView::Images(images)) => Some(images),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images_key(n: usize) -> CacheKey {
        CacheKey::Images {
            continent_slug: "africa".to_string(),
            location_slug: format!("location-{}", n),
        }
    }

    fn empty_images() -> CachedView {
        CachedView::Images(Arc::new(Vec::new()))
    }

    fn cache_with_clock(settings: CacheSettings) -> (ViewCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ViewCache::new(settings, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_returns_inserted_view() {
        let (cache, _clock) = cache_with_clock(CacheSettings::default());

        cache.insert(CacheKey::Continents, CachedView::Continents(Arc::new(Vec::new())));

        let hit = cache.continents();
        assert!(hit.is_some());
        assert!(hit.unwrap().is_empty());
        assert!(cache.get(&images_key(0)).is_none());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let settings = CacheSettings {
            ttl: Duration::from_secs(300),
            ..CacheSettings::default()
        };
        let (cache, clock) = cache_with_clock(settings);

        cache.insert(images_key(0), empty_images());
        clock.advance(Duration::from_secs(299));
        assert!(cache.get(&images_key(0)).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&images_key(0)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_full_cache_evicts_oldest_insertion() {
        let settings = CacheSettings {
            max_entries: 3,
            ..CacheSettings::default()
        };
        let (cache, clock) = cache_with_clock(settings);

        for n in 0..3 {
            cache.insert(images_key(n), empty_images());
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(cache.len(), 3);

        cache.insert(images_key(3), empty_images());

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&images_key(0)).is_none());
        assert!(cache.get(&images_key(1)).is_some());
        assert!(cache.get(&images_key(3)).is_some());
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let settings = CacheSettings {
            max_entries: 2,
            ..CacheSettings::default()
        };
        let (cache, clock) = cache_with_clock(settings);

        cache.insert(images_key(0), empty_images());
        clock.advance(Duration::from_secs(1));
        cache.insert(images_key(1), empty_images());
        clock.advance(Duration::from_secs(1));

        cache.insert(images_key(1), empty_images());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&images_key(0)).is_some());
    }

    #[test]
    fn test_clear_drops_everything() {
        let (cache, _clock) = cache_with_clock(CacheSettings::default());

        cache.insert(CacheKey::Continents, CachedView::Continents(Arc::new(Vec::new())));
        cache.insert(images_key(0), empty_images());
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.continents().is_none());
    }

    #[test]
    fn test_disabled_cache_never_stores() {
        let settings = CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        };
        let (cache, _clock) = cache_with_clock(settings);

        cache.insert(images_key(0), empty_images());

        assert!(cache.is_empty());
        assert!(cache.get(&images_key(0)).is_none());
    }
}
