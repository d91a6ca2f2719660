//! B-Tree postings for exact-match index lookups

use super::backend::IndexName;
use super::event::IndexOp;
use crate::graph::{ElementClass, PropertyValue};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Value -> element ids for one key of one index
#[derive(Debug, Clone, Default)]
pub struct PropertyIndex {
    index: BTreeMap<PropertyValue, BTreeSet<u64>>,
}

impl PropertyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: PropertyValue, id: u64) {
        self.index.entry(value).or_default().insert(id);
    }

    pub fn remove(&mut self, value: &PropertyValue, id: u64) {
        if let Some(ids) = self.index.get_mut(value) {
            ids.remove(&id);
            if ids.is_empty() {
                self.index.remove(value);
            }
        }
    }

    /// Remove `id` under every value
    pub fn remove_element(&mut self, id: u64) {
        self.index.retain(|_, ids| {
            ids.remove(&id);
            !ids.is_empty()
        });
    }

    pub fn get(&self, value: &PropertyValue) -> Vec<u64> {
        self.index
            .get(value)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, value: &PropertyValue) -> usize {
        self.index.get(value).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Applied document state shared by the in-process backends:
/// index -> key -> postings
#[derive(Debug, Default)]
pub(crate) struct IndexState {
    indices: FxHashMap<IndexName, FxHashMap<String, PropertyIndex>>,
}

impl IndexState {
    pub fn contains(&self, index: &IndexName) -> bool {
        self.indices.contains_key(index)
    }

    pub fn apply(&mut self, op: &IndexOp) {
        match op {
            IndexOp::CreateIndex { index } => {
                self.indices.entry(index.clone()).or_default();
            }
            IndexOp::DropIndex { index } => {
                self.indices.remove(index);
            }
            IndexOp::Set { index, id, key, value } => {
                if let Some(keys) = self.indices.get_mut(index) {
                    keys.entry(key.clone()).or_default().insert(value.clone(), *id);
                }
            }
            IndexOp::Remove { index, id, key, value } => {
                if let Some(postings) = self.indices.get_mut(index).and_then(|k| k.get_mut(key)) {
                    postings.remove(value, *id);
                }
            }
            IndexOp::DeleteDocuments { class, id } => {
                for ((index_class, _), keys) in self.indices.iter_mut() {
                    if index_class == class {
                        for postings in keys.values_mut() {
                            postings.remove_element(*id);
                        }
                    }
                }
            }
        }
    }

    pub fn get(&self, index: &IndexName, key: &str, value: &PropertyValue) -> Vec<u64> {
        self.indices
            .get(index)
            .and_then(|keys| keys.get(key))
            .map(|postings| postings.get(value))
            .unwrap_or_default()
    }

    pub fn count(&self, index: &IndexName, key: &str, value: &PropertyValue) -> usize {
        self.indices
            .get(index)
            .and_then(|keys| keys.get(key))
            .map_or(0, |postings| postings.count(value))
    }
}

pub(crate) fn index_name(class: ElementClass, name: &str) -> IndexName {
    (class, name.to_string())
}
