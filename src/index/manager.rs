//! Catalog of manual and automatic key indices
//!
//! Manual indices share one namespace across both element classes: a name
//! used by a vertex index cannot be reused for an edge index. Automatic key
//! indices are tracked per class and stored in the backend under a
//! reserved name derived from the property key.

use super::backend::{Generation, IndexBackend};
use crate::graph::{ElementClass, GraphError, GraphResult, PropertyValue};
use crate::storage::RESERVED_PREFIX;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Backend index name prefix for automatic key indices
pub const KEY_INDEX_PREFIX: &str = "__key.";

/// Backend index that mirrors property `key`
pub fn key_index_name(key: &str) -> String {
    format!("{}{}", KEY_INDEX_PREFIX, key)
}

/// A manual index as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub class: ElementClass,
}

#[derive(Debug, Default)]
struct Catalog {
    /// Manual indices in creation order
    manual: IndexMap<String, ElementClass>,
    keys: FxHashMap<ElementClass, BTreeSet<String>>,
}

/// Shared index bookkeeping for one graph
#[derive(Debug, Default)]
pub struct IndexCollection {
    catalog: RwLock<Catalog>,
}

pub(crate) fn validate_index_name(name: &str) -> GraphResult<()> {
    if name.is_empty() {
        return Err(GraphError::ArgumentInvalid("index name must not be empty".into()));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(GraphError::ArgumentInvalid(format!(
            "index name {} uses the reserved prefix {}",
            name, RESERVED_PREFIX
        )));
    }
    Ok(())
}

impl IndexCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> GraphResult<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|_| GraphError::InvariantViolation("index catalog lock poisoned".into()))
    }

    fn write(&self) -> GraphResult<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|_| GraphError::InvariantViolation("index catalog lock poisoned".into()))
    }

    /// Create a manual index. Fails if the name is taken by an index of
    /// either class.
    pub fn create_index(&self, backend: &dyn IndexBackend, name: &str, class: ElementClass) -> GraphResult<Generation> {
        validate_index_name(name)?;
        let mut catalog = self.write()?;
        if let Some(existing) = catalog.manual.get(name) {
            return Err(GraphError::AlreadyExists(format!(
                "index {} already exists ({} index)",
                name, existing
            )));
        }
        let generation = backend.create_index(class, name)?;
        catalog.manual.insert(name.to_string(), class);
        info!("Created {} index {}", class, name);
        Ok(generation)
    }

    /// Drop a manual index; `None` if no such index exists
    pub fn drop_index(&self, backend: &dyn IndexBackend, name: &str) -> GraphResult<Option<Generation>> {
        let mut catalog = self.write()?;
        let class = match catalog.manual.get(name) {
            Some(class) => *class,
            None => return Ok(None),
        };
        let generation = backend.drop_index(class, name)?;
        catalog.manual.shift_remove(name);
        info!("Dropped {} index {}", class, name);
        Ok(Some(generation))
    }

    pub fn index(&self, name: &str) -> GraphResult<Option<IndexInfo>> {
        Ok(self.read()?.manual.get(name).map(|class| IndexInfo {
            name: name.to_string(),
            class: *class,
        }))
    }

    /// All manual indices in creation order
    pub fn indices(&self) -> GraphResult<Vec<IndexInfo>> {
        Ok(self
            .read()?
            .manual
            .iter()
            .map(|(name, class)| IndexInfo {
                name: name.clone(),
                class: *class,
            })
            .collect())
    }

    /// Mark `key` as indexed for `class`. `None` if it already was; the
    /// caller is responsible for backfilling existing elements.
    pub fn create_key_index(&self, backend: &dyn IndexBackend, key: &str, class: ElementClass) -> GraphResult<Option<Generation>> {
        let mut catalog = self.write()?;
        if catalog.keys.get(&class).map_or(false, |keys| keys.contains(key)) {
            return Ok(None);
        }
        let generation = backend.create_index(class, &key_index_name(key))?;
        catalog.keys.entry(class).or_default().insert(key.to_string());
        info!("Created {} key index on {}", class, key);
        Ok(Some(generation))
    }

    pub fn drop_key_index(&self, backend: &dyn IndexBackend, key: &str, class: ElementClass) -> GraphResult<Option<Generation>> {
        let mut catalog = self.write()?;
        let removed = catalog
            .keys
            .get_mut(&class)
            .map_or(false, |keys| keys.remove(key));
        if !removed {
            return Ok(None);
        }
        let generation = backend.drop_index(class, &key_index_name(key))?;
        info!("Dropped {} key index on {}", class, key);
        Ok(Some(generation))
    }

    pub fn is_key_indexed(&self, class: ElementClass, key: &str) -> GraphResult<bool> {
        Ok(self
            .read()?
            .keys
            .get(&class)
            .map_or(false, |keys| keys.contains(key)))
    }

    pub fn indexed_keys(&self, class: ElementClass) -> GraphResult<Vec<String>> {
        Ok(self
            .read()?
            .keys
            .get(&class)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Mirror a property write into the key index for `key`, if any
    pub fn auto_update(
        &self,
        backend: &dyn IndexBackend,
        class: ElementClass,
        id: u64,
        key: &str,
        new_value: &PropertyValue,
        old_value: Option<&PropertyValue>,
    ) -> GraphResult<Option<Generation>> {
        if !self.is_key_indexed(class, key)? {
            return Ok(None);
        }
        let name = key_index_name(key);
        if let Some(old) = old_value {
            backend.remove(class, id, &name, key, old)?;
        }
        let generation = backend.set(class, id, &name, key, new_value)?;
        debug!("Key index {} {} {}: {} -> {}", class, id, key, old_value.map_or("-".to_string(), |v| v.to_string()), new_value);
        Ok(Some(generation))
    }

    /// Mirror a property removal into the key index for `key`, if any
    pub fn auto_remove(
        &self,
        backend: &dyn IndexBackend,
        class: ElementClass,
        id: u64,
        key: &str,
        old_value: &PropertyValue,
    ) -> GraphResult<Option<Generation>> {
        if !self.is_key_indexed(class, key)? {
            return Ok(None);
        }
        let generation = backend.remove(class, id, &key_index_name(key), key, old_value)?;
        Ok(Some(generation))
    }

    /// Candidate ids from the key index, or `None` when `key` is not
    /// indexed for `class` and the caller must scan.
    pub fn get(&self, backend: &dyn IndexBackend, class: ElementClass, key: &str, value: &PropertyValue) -> GraphResult<Option<Vec<u64>>> {
        if !self.is_key_indexed(class, key)? {
            return Ok(None);
        }
        let deleted = backend.deleted_documents(class)?;
        let ids = backend
            .get(class, &key_index_name(key), key, value)?
            .into_iter()
            .filter(|id| !deleted.contains(id))
            .collect();
        Ok(Some(ids))
    }
}
