//! In-memory row store

use super::{is_reserved, single_direction, AdjacencyEntry, PropertyStore, StorageError, StorageResult};
use crate::graph::{Direction, ElementClass, PropertyValue};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

#[derive(Debug)]
struct Table {
    rows: BTreeMap<u64, BTreeMap<String, PropertyValue>>,
    next_id: u64,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Adjacency {
    outgoing: Vec<AdjacencyEntry>,
    incoming: Vec<AdjacencyEntry>,
}

impl Adjacency {
    fn list_mut(&mut self, direction: Direction) -> &mut Vec<AdjacencyEntry> {
        match direction {
            Direction::In => &mut self.incoming,
            _ => &mut self.outgoing,
        }
    }

    fn list(&self, direction: Direction) -> &[AdjacencyEntry] {
        match direction {
            Direction::In => &self.incoming,
            _ => &self.outgoing,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    vertices: Table,
    edges: Table,
    adjacency: BTreeMap<u64, Adjacency>,
}

impl Inner {
    fn table(&self, class: ElementClass) -> &Table {
        match class {
            ElementClass::Vertex => &self.vertices,
            ElementClass::Edge => &self.edges,
        }
    }

    fn table_mut(&mut self, class: ElementClass) -> &mut Table {
        match class {
            ElementClass::Vertex => &mut self.vertices,
            ElementClass::Edge => &mut self.edges,
        }
    }
}

/// Row store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StorageError::Poisoned)
    }
}

impl PropertyStore for MemoryStore {
    fn read_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>> {
        let inner = self.read()?;
        Ok(inner
            .table(class)
            .rows
            .get(&row)
            .and_then(|cells| cells.get(key))
            .cloned())
    }

    fn write_cell(&self, class: ElementClass, row: u64, key: &str, value: &PropertyValue) -> StorageResult<()> {
        let mut inner = self.write()?;
        let cells = inner
            .table_mut(class)
            .rows
            .get_mut(&row)
            .ok_or(StorageError::RowNotFound { class, row })?;
        cells.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn delete_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>> {
        let mut inner = self.write()?;
        Ok(inner
            .table_mut(class)
            .rows
            .get_mut(&row)
            .and_then(|cells| cells.remove(key)))
    }

    fn columns_for_row(&self, class: ElementClass, row: u64) -> StorageResult<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .table(class)
            .rows
            .get(&row)
            .map(|cells| cells.keys().filter(|k| !is_reserved(k)).cloned().collect())
            .unwrap_or_default())
    }

    fn has_row(&self, class: ElementClass, row: u64) -> StorageResult<bool> {
        Ok(self.read()?.table(class).rows.contains_key(&row))
    }

    fn add_row(&self, class: ElementClass) -> StorageResult<u64> {
        let mut inner = self.write()?;
        let table = inner.table_mut(class);
        let id = table.next_id;
        table.next_id += 1;
        table.rows.insert(id, BTreeMap::new());
        Ok(id)
    }

    fn delete_row(&self, class: ElementClass, row: u64) -> StorageResult<()> {
        let mut inner = self.write()?;
        inner.table_mut(class).rows.remove(&row);
        if class == ElementClass::Vertex {
            inner.adjacency.remove(&row);
        }
        Ok(())
    }

    fn first_row(&self, class: ElementClass) -> StorageResult<Option<u64>> {
        Ok(self.read()?.table(class).rows.keys().next().copied())
    }

    fn next_row(&self, class: ElementClass, after: u64) -> StorageResult<Option<u64>> {
        Ok(self
            .read()?
            .table(class)
            .rows
            .range((Bound::Excluded(after), Bound::Unbounded))
            .next()
            .map(|(id, _)| *id))
    }

    fn add_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, other: u64) -> StorageResult<()> {
        let direction = single_direction(direction)?;
        let mut inner = self.write()?;
        if !inner.vertices.rows.contains_key(&row) {
            return Err(StorageError::RowNotFound {
                class: ElementClass::Vertex,
                row,
            });
        }
        inner
            .adjacency
            .entry(row)
            .or_default()
            .list_mut(direction)
            .push(AdjacencyEntry {
                label: label.to_string(),
                edge,
                other,
            });
        Ok(())
    }

    fn delete_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, other: u64) -> StorageResult<()> {
        let direction = single_direction(direction)?;
        let mut inner = self.write()?;
        if let Some(adj) = inner.adjacency.get_mut(&row) {
            adj.list_mut(direction)
                .retain(|e| !(e.edge == edge && e.other == other && e.label == label));
        }
        Ok(())
    }

    fn adjacency(&self, row: u64, direction: Direction, label: Option<&str>) -> StorageResult<Vec<AdjacencyEntry>> {
        let direction = single_direction(direction)?;
        let inner = self.read()?;
        Ok(inner
            .adjacency
            .get(&row)
            .map(|adj| {
                adj.list(direction)
                    .iter()
                    .filter(|e| label.map_or(true, |l| e.label == l))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
