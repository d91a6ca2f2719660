//! Index search backend contract
//!
//! A backend stores documents `(class, element id, index name, key, value)`
//! and answers exact-match lookups. Every mutation returns a
//! [`Generation`]; asynchronous backends may acknowledge a mutation before
//! it is visible to readers, and [`IndexBackend::wait_for_generation`]
//! blocks until a given generation has been applied.

use crate::graph::{ElementClass, PropertyValue};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Monotonic token assigned by a backend to each index mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Index errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("{class} index {name} does not exist")]
    NoSuchIndex { class: ElementClass, name: String },

    #[error("{class} index {name} already exists")]
    IndexExists { class: ElementClass, name: String },

    #[error("Timed out waiting for {wanted} (applied: {applied})")]
    WaitTimeout { wanted: Generation, applied: Generation },

    #[error("Index worker has stopped")]
    WorkerStopped,

    #[error("Index worker failed to start: {0}")]
    WorkerSpawn(String),

    #[error("Index lock poisoned")]
    Poisoned,
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Backend index identity: names are scoped per element class
pub type IndexName = (ElementClass, String);

pub trait IndexBackend: Send + Sync {
    /// Whether mutations may be acknowledged before they are readable
    fn is_asynchronous(&self) -> bool;

    fn has_index(&self, class: ElementClass, name: &str) -> IndexResult<bool>;

    fn create_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation>;

    /// Drop an index and every document in it
    fn drop_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation>;

    fn set(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation>;

    fn remove(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation>;

    /// Delete every document of an element, across all indices
    fn delete_documents(&self, class: ElementClass, id: u64) -> IndexResult<Generation>;

    /// Exact-match lookup against the applied state
    fn get(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Vec<u64>>;

    fn count(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<usize> {
        Ok(self.get(class, name, key, value)?.len())
    }

    /// Elements whose documents were deleted but whose deletion is not yet
    /// reflected in [`IndexBackend::get`]
    fn deleted_documents(&self, class: ElementClass) -> IndexResult<FxHashSet<u64>>;

    /// Block until `generation` has been applied. `None` waits forever.
    fn wait_for_generation(&self, generation: Generation, timeout: Option<Duration>) -> IndexResult<()>;

    /// Release background resources. Further mutations may fail.
    fn shutdown(&self) {}
}
