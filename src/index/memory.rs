//! Synchronous in-memory index backend

use super::backend::{Generation, IndexBackend, IndexError, IndexResult};
use super::event::IndexOp;
use super::property_index::{index_name, IndexState};
use crate::graph::{ElementClass, PropertyValue};
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Applies every mutation before returning, so every generation is
/// already visible and waiting is a no-op.
#[derive(Debug, Default)]
pub struct MemoryIndexBackend {
    state: RwLock<IndexState>,
    generation: AtomicU64,
}

impl MemoryIndexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, op: IndexOp) -> IndexResult<Generation> {
        let mut state = self.state.write().map_err(|_| IndexError::Poisoned)?;
        state.apply(&op);
        Ok(Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn require(&self, class: ElementClass, name: &str) -> IndexResult<()> {
        if self.has_index(class, name)? {
            Ok(())
        } else {
            Err(IndexError::NoSuchIndex {
                class,
                name: name.to_string(),
            })
        }
    }
}

impl IndexBackend for MemoryIndexBackend {
    fn is_asynchronous(&self) -> bool {
        false
    }

    fn has_index(&self, class: ElementClass, name: &str) -> IndexResult<bool> {
        let state = self.state.read().map_err(|_| IndexError::Poisoned)?;
        Ok(state.contains(&index_name(class, name)))
    }

    fn create_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation> {
        if self.has_index(class, name)? {
            return Err(IndexError::IndexExists {
                class,
                name: name.to_string(),
            });
        }
        self.apply(IndexOp::CreateIndex {
            index: index_name(class, name),
        })
    }

    fn drop_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation> {
        self.require(class, name)?;
        self.apply(IndexOp::DropIndex {
            index: index_name(class, name),
        })
    }

    fn set(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation> {
        self.require(class, name)?;
        self.apply(IndexOp::Set {
            index: index_name(class, name),
            id,
            key: key.to_string(),
            value: value.clone(),
        })
    }

    fn remove(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation> {
        self.require(class, name)?;
        self.apply(IndexOp::Remove {
            index: index_name(class, name),
            id,
            key: key.to_string(),
            value: value.clone(),
        })
    }

    fn delete_documents(&self, class: ElementClass, id: u64) -> IndexResult<Generation> {
        self.apply(IndexOp::DeleteDocuments { class, id })
    }

    fn get(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Vec<u64>> {
        let state = self.state.read().map_err(|_| IndexError::Poisoned)?;
        Ok(state.get(&index_name(class, name), key, value))
    }

    fn count(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<usize> {
        let state = self.state.read().map_err(|_| IndexError::Poisoned)?;
        Ok(state.count(&index_name(class, name), key, value))
    }

    fn deleted_documents(&self, _class: ElementClass) -> IndexResult<FxHashSet<u64>> {
        Ok(FxHashSet::default())
    }

    fn wait_for_generation(&self, _generation: Generation, _timeout: Option<Duration>) -> IndexResult<()> {
        Ok(())
    }
}
