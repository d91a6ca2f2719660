//! Property/adjacency row store
//!
//! The graph layer sees storage as rows of cells: one row per element,
//! one cell per property key. Edge endpoints and labels live in reserved
//! cells (prefixed with [`RESERVED_PREFIX`]) that are never reported by
//! [`PropertyStore::columns_for_row`]. Vertex adjacency is kept per
//! direction and label as `(edge id, other vertex id)` pairs.

pub mod memory;
pub mod rocks;

pub use memory::MemoryStore;
pub use rocks::RocksStore;

use crate::graph::{Direction, ElementClass, PropertyValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns starting with this prefix are internal to the store
pub const RESERVED_PREFIX: &str = "__";

/// Reserved edge columns
pub const OUT_VERTEX_COLUMN: &str = "__out";
pub const IN_VERTEX_COLUMN: &str = "__in";
pub const LABEL_COLUMN: &str = "__label";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Row does not exist
    #[error("{class} row {row} not found")]
    RowNotFound { class: ElementClass, row: u64 },

    /// Adjacency is stored per concrete direction only
    #[error("adjacency requires a single direction, got {0:?}")]
    InvalidDirection(Direction),

    /// Malformed key or value on disk
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A lock guarding in-memory state was poisoned
    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One adjacency entry of a vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyEntry {
    pub label: String,
    pub edge: u64,
    pub other: u64,
}

/// Row-level storage for vertices and edges.
///
/// Implementations must be usable from many sessions at once; rows ids
/// are assigned by the store, start at 1 and are never reused.
pub trait PropertyStore: Send + Sync {
    fn read_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>>;

    fn write_cell(&self, class: ElementClass, row: u64, key: &str, value: &PropertyValue) -> StorageResult<()>;

    /// Delete a cell, returning its previous value
    fn delete_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>>;

    /// Property keys of a row, reserved columns excluded
    fn columns_for_row(&self, class: ElementClass, row: u64) -> StorageResult<Vec<String>>;

    fn has_row(&self, class: ElementClass, row: u64) -> StorageResult<bool>;

    fn add_row(&self, class: ElementClass) -> StorageResult<u64>;

    /// Delete a row with all its cells (and, for vertices, its adjacency)
    fn delete_row(&self, class: ElementClass, row: u64) -> StorageResult<()>;

    /// First live row in id order
    fn first_row(&self, class: ElementClass) -> StorageResult<Option<u64>>;

    /// Next live row with an id strictly greater than `after`
    fn next_row(&self, class: ElementClass, after: u64) -> StorageResult<Option<u64>>;

    fn add_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, other: u64) -> StorageResult<()>;

    fn delete_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, other: u64) -> StorageResult<()>;

    /// Adjacency entries of a vertex in one direction, optionally for one label
    fn adjacency(&self, row: u64, direction: Direction, label: Option<&str>) -> StorageResult<Vec<AdjacencyEntry>>;

    /// Whether rows survive a restart
    fn is_persistent(&self) -> bool {
        false
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Forward cursor over the rows of one class.
///
/// Rows are fetched one at a time so a consumer that stops early (a
/// limited query) never touches the rest of the table.
pub struct RowCursor<'a> {
    store: &'a dyn PropertyStore,
    class: ElementClass,
    last: Option<u64>,
    done: bool,
}

impl<'a> RowCursor<'a> {
    pub fn new(store: &'a dyn PropertyStore, class: ElementClass) -> Self {
        Self {
            store,
            class,
            last: None,
            done: false,
        }
    }
}

impl Iterator for RowCursor<'_> {
    type Item = StorageResult<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = match self.last {
            None => self.store.first_row(self.class),
            Some(last) => self.store.next_row(self.class, last),
        };
        match next {
            Ok(Some(row)) => {
                self.last = Some(row);
                Some(Ok(row))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub(crate) fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

pub(crate) fn single_direction(direction: Direction) -> StorageResult<Direction> {
    match direction {
        Direction::Both => Err(StorageError::InvalidDirection(direction)),
        d => Ok(d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_walks_rows_in_order() {
        let store = MemoryStore::new();
        let a = store.add_row(ElementClass::Vertex).unwrap();
        let b = store.add_row(ElementClass::Vertex).unwrap();
        let c = store.add_row(ElementClass::Vertex).unwrap();
        store.delete_row(ElementClass::Vertex, b).unwrap();

        let rows: Vec<u64> = RowCursor::new(&store, ElementClass::Vertex)
            .collect::<StorageResult<_>>()
            .unwrap();
        assert_eq!(rows, vec![a, c]);
    }

    #[test]
    fn test_cursor_on_empty_table() {
        let store = MemoryStore::new();
        assert_eq!(RowCursor::new(&store, ElementClass::Edge).count(), 0);
    }

    #[test]
    fn test_reserved_columns() {
        assert!(is_reserved(OUT_VERTEX_COLUMN));
        assert!(!is_reserved("name"));
        assert!(single_direction(Direction::Both).is_err());
    }
}
