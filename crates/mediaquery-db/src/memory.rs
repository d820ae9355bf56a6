//! In-memory catalog backend
//!
//! Entries live in a `BTreeMap` keyed by name, so prefix filters become range scans and
//! listings come out ordered. A label → names index answers `label` filters without
//! touching entries that cannot match.

use async_trait::async_trait;
use mediaquery_core::{AppError, Label, ListFilter, MediaEntry, MediaType};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::CatalogStore;

#[derive(Debug, Default)]
struct CatalogState {
    entries: BTreeMap<String, MediaEntry>,
    label_index: HashMap<String, BTreeSet<String>>,
}

impl CatalogState {
    fn unindex(&mut self, entry: &MediaEntry) {
        for label in entry.label_names() {
            if let Some(names) = self.label_index.get_mut(label) {
                names.remove(&entry.name);
                if names.is_empty() {
                    self.label_index.remove(label);
                }
            }
        }
    }

    fn index(&mut self, entry: &MediaEntry) {
        for label in entry.label_names() {
            self.label_index
                .entry(label.to_string())
                .or_default()
                .insert(entry.name.clone());
        }
    }

    fn insert(&mut self, entry: MediaEntry) {
        if let Some(previous) = self.entries.remove(&entry.name) {
            self.unindex(&previous);
        }
        self.index(&entry);
        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove(&mut self, name: &str) -> Option<MediaEntry> {
        let removed = self.entries.remove(name)?;
        self.unindex(&removed);
        Some(removed)
    }

    fn select(&self, filter: &ListFilter) -> Vec<MediaEntry> {
        if let Some(label) = &filter.label {
            return match self.label_index.get(label) {
                Some(names) => names
                    .iter()
                    .filter_map(|name| self.entries.get(name))
                    .filter(|entry| filter.matches(entry))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            };
        }

        if let Some(prefix) = &filter.startswith {
            return self
                .entries
                .range(prefix.clone()..)
                .take_while(|(name, _)| name.starts_with(prefix.as_str()))
                .map(|(_, entry)| entry)
                .filter(|entry| filter.matches(entry))
                .cloned()
                .collect();
        }

        self.entries
            .values()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }
}

/// Process-local catalog. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.read().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::StoreUnavailable("in-memory catalog lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::StoreUnavailable("in-memory catalog lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn upsert(
        &self,
        name: &str,
        media_type: MediaType,
        labels: &[Label],
    ) -> Result<(), AppError> {
        let entry = MediaEntry::new(name, media_type, labels.to_vec());
        self.write()?.insert(entry);
        tracing::debug!(name = %name, label_count = labels.len(), "Catalog entry upserted");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<MediaEntry>, AppError> {
        Ok(self.read()?.entries.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        let removed = self.write()?.remove(name);
        tracing::debug!(name = %name, existed = removed.is_some(), "Catalog entry deleted");
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<MediaEntry>, AppError> {
        Ok(self.read()?.select(filter))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
