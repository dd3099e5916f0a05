//! Id-keyed definition catalogs.
//!
//! One generic [`Registry`] serves both templates and themes. Registries
//! are constructed values, dependency-injected into the compatibility
//! matrix, the CLI and the render pipeline — there is no ambient global
//! catalog.
//!
//! ## Concurrency
//!
//! Normal operation is read-mostly: populated once at startup, then shared
//! across render workers. The entry map lives behind an `Arc` snapshot
//! inside a single `RwLock`; readers clone the `Arc` and work on an
//! immutable map, writers build the replacement map off to the side and
//! swap it in one write-lock acquisition. A reload (clear + repopulate) is
//! therefore atomic from any reader's point of view — no reader ever
//! observes an empty or half-populated catalog, and snapshots taken before
//! the swap keep serving the old generation.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::definition::Definition;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("duplicate definition id \"{0}\"")]
    DuplicateId(String),
}

type Snapshot<T> = Arc<BTreeMap<String, Arc<T>>>;

pub struct Registry<T> {
    entries: RwLock<Snapshot<T>>,
    /// Bumped on every successful mutation; lets derived caches (the
    /// compatibility matrix) detect staleness without holding locks.
    generation: AtomicU64,
}

impl<T: Definition> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(BTreeMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Add one definition. Fails if the id is already present.
    pub fn register(&self, definition: T) -> Result<(), RegistryError> {
        let id = definition.id().to_string();
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        let mut next = BTreeMap::clone(&entries);
        next.insert(id, Arc::new(definition));
        *entries = Arc::new(next);
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Replace the whole catalog atomically. On a duplicate id nothing
    /// changes — readers keep the previous catalog.
    pub fn reload(&self, definitions: impl IntoIterator<Item = T>) -> Result<(), RegistryError> {
        let mut next = BTreeMap::new();
        for definition in definitions {
            let id = definition.id().to_string();
            if next.insert(id.clone(), Arc::new(definition)).is_some() {
                return Err(RegistryError::DuplicateId(id));
            }
        }
        *self.entries.write() = Arc::new(next);
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.entries.read().get(id).cloned()
    }

    /// All definitions, sorted by id.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.entries.read().values().cloned().collect()
    }

    /// Case-insensitive substring match over name, description and tags.
    pub fn search(&self, query: &str) -> Vec<Arc<T>> {
        let needle = query.to_lowercase();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.search_text().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<Arc<T>> {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.category() == category)
            .cloned()
            .collect()
    }

    /// Immutable view of the current catalog.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl<T: Definition> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ThemeConfig;

    fn theme(id: &str, name: &str, category: &str) -> ThemeConfig {
        ThemeConfig {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            ..ThemeConfig::default()
        }
    }

    #[test]
    fn register_then_get() {
        let registry = Registry::new();
        registry.register(theme("ocean", "Ocean", "nature")).unwrap();
        assert_eq!(registry.get("ocean").unwrap().name, "Ocean");
        assert!(registry.get("desert").is_none());
    }

    #[test]
    fn duplicate_id_is_rejected_and_leaves_catalog_unchanged() {
        let registry = Registry::new();
        registry.register(theme("ocean", "Ocean", "nature")).unwrap();
        let err = registry.register(theme("ocean", "Other", "x")).unwrap_err();
        assert!(err.to_string().contains("ocean"));
        assert_eq!(registry.get("ocean").unwrap().name, "Ocean");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn all_is_sorted_by_id() {
        let registry = Registry::new();
        registry.register(theme("zen", "Zen", "calm")).unwrap();
        registry.register(theme("arctic", "Arctic", "cold")).unwrap();
        let all = registry.all();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["arctic", "zen"]);
    }

    #[test]
    fn search_is_case_insensitive_over_name_description_tags() {
        let registry = Registry::new();
        let mut t = theme("ocean", "Ocean Blue", "nature");
        t.description = Some("Deep sea palette".to_string());
        t.tags = vec!["maritime".to_string()];
        registry.register(t).unwrap();

        assert_eq!(registry.search("OCEAN").len(), 1);
        assert_eq!(registry.search("deep SEA").len(), 1);
        assert_eq!(registry.search("maritime").len(), 1);
        assert!(registry.search("desert").is_empty());
    }

    #[test]
    fn by_category_filters() {
        let registry = Registry::new();
        registry.register(theme("ocean", "Ocean", "nature")).unwrap();
        registry.register(theme("forest", "Forest", "nature")).unwrap();
        registry.register(theme("mono", "Mono", "minimal")).unwrap();
        assert_eq!(registry.by_category("nature").len(), 2);
        assert_eq!(registry.by_category("minimal").len(), 1);
    }

    #[test]
    fn reload_replaces_catalog_atomically() {
        let registry = Registry::new();
        registry.register(theme("old", "Old", "x")).unwrap();

        let before = registry.snapshot();
        registry
            .reload(vec![theme("a", "A", "x"), theme("b", "B", "x")])
            .unwrap();

        // Pre-swap snapshots keep serving the old generation.
        assert!(before.contains_key("old"));
        assert!(registry.get("old").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn failed_reload_keeps_previous_catalog() {
        let registry = Registry::new();
        registry.register(theme("keep", "Keep", "x")).unwrap();

        let result = registry.reload(vec![theme("a", "A", "x"), theme("a", "Dup", "x")]);
        assert!(result.is_err());
        assert!(registry.get("keep").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn generation_bumps_on_mutation_only() {
        let registry = Registry::new();
        let g0 = registry.generation();
        registry.register(theme("a", "A", "x")).unwrap();
        let g1 = registry.generation();
        assert!(g1 > g0);

        registry.get("a");
        registry.search("a");
        assert_eq!(registry.generation(), g1);

        registry.reload(vec![theme("b", "B", "x")]).unwrap();
        assert!(registry.generation() > g1);
    }
}
