//! In-memory metadata store, intended primarily for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{CoverKey, Error, LocationRecord, LocationUpdate, MetadataStore, Result};

/// An in-memory implementation of `MetadataStore`.
///
/// Counts read calls and can be told to fail writes, so tests can observe
/// cache behavior and exercise failure paths.
pub struct MemoryMetadataStore {
    locations: RwLock<Vec<LocationRecord>>,
    covers: RwLock<HashMap<CoverKey, String>>,
    locations_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryMetadataStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            locations: RwLock::new(Vec::new()),
            covers: RwLock::new(HashMap::new()),
            locations_calls: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Number of `locations` calls made so far, including failed ones.
    pub fn locations_calls(&self) -> usize {
        self.locations_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent read call fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write call fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(Error::Other("metadata store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Other("metadata store rejected the write".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn locations(&self) -> Result<Vec<LocationRecord>> {
        self.locations_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        let mut records = self.locations.read().unwrap().clone();
        records.sort_by(|a, b| {
            a.continent_name
                .cmp(&b.continent_name)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(records)
    }

    async fn insert_location(&self, record: &LocationRecord) -> Result<()> {
        self.check_write()?;
        let mut locations = self.locations.write().unwrap();
        if locations.iter().any(|existing| existing.id == record.id) {
            return Err(Error::Other(format!("duplicate location id: {}", record.id)));
        }
        locations.push(record.clone());
        Ok(())
    }

    async fn update_location(&self, id: &str, update: &LocationUpdate) -> Result<()> {
        self.check_write()?;
        let mut locations = self.locations.write().unwrap();
        let record = locations
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
        Ok(())
    }

    async fn delete_location(&self, id: &str) -> Result<()> {
        self.check_write()?;
        let mut locations = self.locations.write().unwrap();
        locations.retain(|record| record.id != id);
        Ok(())
    }

    async fn covers(&self) -> Result<HashMap<CoverKey, String>> {
        self.check_read()?;
        Ok(self.covers.read().unwrap().clone())
    }

    async fn set_cover(&self, key: &CoverKey, url: &str) -> Result<()> {
        self.check_write()?;
        let mut covers = self.covers.write().unwrap();
        covers.insert(key.clone(), url.to_string());
        Ok(())
    }

    async fn remove_cover(&self, key: &CoverKey) -> Result<()> {
        self.check_write()?;
        let mut covers = self.covers.write().unwrap();
        covers.remove(key);
        Ok(())
    }
}
