use chrono::Utc;
use dashmap::DashMap;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::catalog::TrackingElementSet;
use crate::store::{CacheEntry, Freshness, PutOutcome, StoreError};

/// Last known-good element sets, one JSON document per catalog id.
///
/// Reads never wait on a writer of another id. Writers take a lock scoped to
/// their catalog id, so two writes for the same object are serialized while
/// writes for different objects run side by side. The in-memory map is only
/// updated after the document has been renamed into place.
pub struct ElementStore {
    folder: PathBuf,
    entries: DashMap<u32, CacheEntry>,
    write_locks: DashMap<u32, Arc<Mutex<()>>>,
}

impl ElementStore {
    pub fn open(folder: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&folder)?;

        let entries = DashMap::new();
        for entry in folder.read_dir()? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match load_entry(&path) {
                Ok(cached) => {
                    entries.insert(cached.elements.catalog_id, cached);
                }
                Err(e) => {
                    error!("Failed to load cached elements {}: {}", path.display(), e);
                }
            }
        }

        info!(
            "Element store at {} holds {} objects",
            folder.display(),
            entries.len()
        );

        Ok(Self {
            folder,
            entries,
            write_locks: DashMap::new(),
        })
    }

    pub fn get(&self, catalog_id: u32) -> Option<CacheEntry> {
        self.entries.get(&catalog_id).map(|e| e.value().clone())
    }

    /// Stores `elements` if its epoch is strictly newer than the cached one.
    /// Otherwise leaves the store untouched and returns the current entry.
    pub fn put(
        &self,
        catalog_id: u32,
        elements: TrackingElementSet,
    ) -> Result<PutOutcome, StoreError> {
        if elements.catalog_id != catalog_id {
            return Err(StoreError::KeyMismatch {
                key: catalog_id,
                catalog_id: elements.catalog_id,
            });
        }

        let lock = self.write_lock(catalog_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.get(catalog_id);
        if let Some(current) = current.as_ref() {
            if elements.epoch <= current.elements.epoch {
                debug!(
                    "Catalog {}: keeping epoch {} over candidate {}",
                    catalog_id, current.elements.epoch, elements.epoch
                );
                return Ok(PutOutcome::Unchanged(current.clone()));
            }
        }

        let entry = CacheEntry {
            elements,
            fetched_at: Utc::now(),
            freshness: Freshness::Live,
            previous: current.map(|c| c.elements),
        };

        self.persist(catalog_id, &entry)?;
        self.entries.insert(catalog_id, entry.clone());
        Ok(PutOutcome::Stored(entry))
    }

    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_lock(&self, catalog_id: u32) -> Arc<Mutex<()>> {
        self.write_locks.entry(catalog_id).or_default().clone()
    }

    fn entry_path(&self, catalog_id: u32) -> PathBuf {
        self.folder.join(format!("{}.json", catalog_id))
    }

    fn persist(&self, catalog_id: u32, entry: &CacheEntry) -> Result<(), StoreError> {
        let path = self.entry_path(catalog_id);
        let staging = self.folder.join(format!("{}.json.tmp", catalog_id));

        let content = serde_json::to_vec_pretty(entry)?;
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }
}

fn load_entry(path: &Path) -> Result<CacheEntry, StoreError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
