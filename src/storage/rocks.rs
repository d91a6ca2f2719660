//! RocksDB row store
//!
//! Column families:
//! - `vertices` / `edges`: row markers `r:{row}` and cells `c:{row}:{key}`
//! - `adjacency`: `{vertex}:{o|i}:{label}\0{edge}` -> `AdjacencyEntry`
//! - `meta`: id counters
//!
//! Row ids are written as fixed-width hex so lexical key order equals id
//! order and cursors can seek. Cell values are `bincode`-encoded.

use super::{is_reserved, single_direction, AdjacencyEntry, PropertyStore, StorageError, StorageResult};
use crate::graph::{Direction, ElementClass, PropertyValue};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const VERTICES_CF: &str = "vertices";
const EDGES_CF: &str = "edges";
const ADJACENCY_CF: &str = "adjacency";
const META_CF: &str = "meta";

/// RocksDB-based persistent row store
pub struct RocksStore {
    db: Arc<DB>,
    /// Serializes id allocation (read-increment-write of the counter)
    id_lock: Mutex<()>,
    path: String,
}

impl RocksStore {
    /// Open or create a store at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        info!("Opening row store at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(VERTICES_CF, Self::cf_options()),
            ColumnFamilyDescriptor::new(EDGES_CF, Self::cf_options()),
            ColumnFamilyDescriptor::new(ADJACENCY_CF, Self::cf_options()),
            ColumnFamilyDescriptor::new(META_CF, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, &path_str, cf_descriptors)?;

        info!("Row store opened successfully");

        Ok(Self {
            db: Arc::new(db),
            id_lock: Mutex::new(()),
            path: path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    fn class_cf(&self, class: ElementClass) -> StorageResult<&ColumnFamily> {
        match class {
            ElementClass::Vertex => self.cf(VERTICES_CF),
            ElementClass::Edge => self.cf(EDGES_CF),
        }
    }

    fn row_key(row: u64) -> Vec<u8> {
        format!("r:{:016x}", row).into_bytes()
    }

    fn cell_prefix(row: u64) -> String {
        format!("c:{:016x}:", row)
    }

    fn cell_key(row: u64, key: &str) -> Vec<u8> {
        format!("c:{:016x}:{}", row, key).into_bytes()
    }

    fn adjacency_prefix(row: u64, direction: Direction, label: Option<&str>) -> String {
        let d = if direction == Direction::In { 'i' } else { 'o' };
        match label {
            Some(label) => format!("{:016x}:{}:{}\0", row, d, label),
            None => format!("{:016x}:{}:", row, d),
        }
    }

    fn adjacency_key(row: u64, direction: Direction, label: &str, edge: u64) -> Vec<u8> {
        let mut key = Self::adjacency_prefix(row, direction, Some(label));
        key.push_str(&format!("{:016x}", edge));
        key.into_bytes()
    }

    fn counter_key(class: ElementClass) -> &'static [u8] {
        match class {
            ElementClass::Vertex => &b"next:vertex"[..],
            ElementClass::Edge => &b"next:edge"[..],
        }
    }

    fn parse_row_key(key: &[u8]) -> StorageResult<u64> {
        let hex = key
            .strip_prefix(b"r:")
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| StorageError::Corrupt(format!("bad row key {:?}", key)))?;
        u64::from_str_radix(hex, 16).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    /// Collect `(key, value)` pairs sharing a prefix
    fn scan_prefix(&self, cf: &ColumnFamily, prefix: &[u8]) -> StorageResult<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key, value));
        }
        Ok(out)
    }

    fn seek_row(&self, class: ElementClass, from: u64) -> StorageResult<Option<u64>> {
        let cf = self.class_cf(class)?;
        let start = Self::row_key(from);
        let mut iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(start.as_slice(), rocksdb::Direction::Forward));
        match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                if key.starts_with(b"r:") {
                    Ok(Some(Self::parse_row_key(&key)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}

impl PropertyStore for RocksStore {
    fn read_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>> {
        let cf = self.class_cf(class)?;
        match self.db.get_cf(cf, Self::cell_key(row, key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_cell(&self, class: ElementClass, row: u64, key: &str, value: &PropertyValue) -> StorageResult<()> {
        if !self.has_row(class, row)? {
            return Err(StorageError::RowNotFound { class, row });
        }
        let cf = self.class_cf(class)?;
        let bytes = bincode::serialize(value)?;
        self.db.put_cf(cf, Self::cell_key(row, key), bytes)?;
        debug!("Wrote {} {} cell {}", class, row, key);
        Ok(())
    }

    fn delete_cell(&self, class: ElementClass, row: u64, key: &str) -> StorageResult<Option<PropertyValue>> {
        let previous = self.read_cell(class, row, key)?;
        if previous.is_some() {
            let cf = self.class_cf(class)?;
            self.db.delete_cf(cf, Self::cell_key(row, key))?;
        }
        Ok(previous)
    }

    fn columns_for_row(&self, class: ElementClass, row: u64) -> StorageResult<Vec<String>> {
        let cf = self.class_cf(class)?;
        let prefix = Self::cell_prefix(row);
        let mut keys = Vec::new();
        for (key, _) in self.scan_prefix(cf, prefix.as_bytes())? {
            let column = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| StorageError::Corrupt(e.to_string()))?;
            if !is_reserved(column) {
                keys.push(column.to_string());
            }
        }
        Ok(keys)
    }

    fn has_row(&self, class: ElementClass, row: u64) -> StorageResult<bool> {
        let cf = self.class_cf(class)?;
        Ok(self.db.get_cf(cf, Self::row_key(row))?.is_some())
    }

    fn add_row(&self, class: ElementClass) -> StorageResult<u64> {
        let _guard = self.id_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let meta = self.cf(META_CF)?;
        let next: u64 = match self.db.get_cf(meta, Self::counter_key(class))? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => 1,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(meta, Self::counter_key(class), bincode::serialize(&(next + 1))?);
        batch.put_cf(self.class_cf(class)?, Self::row_key(next), b"");
        self.db.write(batch)?;

        debug!("Added {} row {}", class, next);
        Ok(next)
    }

    fn delete_row(&self, class: ElementClass, row: u64) -> StorageResult<()> {
        let cf = self.class_cf(class)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(cf, Self::row_key(row));
        for (key, _) in self.scan_prefix(cf, Self::cell_prefix(row).as_bytes())? {
            batch.delete_cf(cf, key);
        }
        if class == ElementClass::Vertex {
            let adjacency = self.cf(ADJACENCY_CF)?;
            let prefix = format!("{:016x}:", row);
            for (key, _) in self.scan_prefix(adjacency, prefix.as_bytes())? {
                batch.delete_cf(adjacency, key);
            }
        }
        self.db.write(batch)?;

        debug!("Deleted {} row {}", class, row);
        Ok(())
    }

    fn first_row(&self, class: ElementClass) -> StorageResult<Option<u64>> {
        self.seek_row(class, 0)
    }

    fn next_row(&self, class: ElementClass, after: u64) -> StorageResult<Option<u64>> {
        match after.checked_add(1) {
            Some(from) => self.seek_row(class, from),
            None => Ok(None),
        }
    }

    fn add_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, other: u64) -> StorageResult<()> {
        let direction = single_direction(direction)?;
        if !self.has_row(ElementClass::Vertex, row)? {
            return Err(StorageError::RowNotFound {
                class: ElementClass::Vertex,
                row,
            });
        }
        let cf = self.cf(ADJACENCY_CF)?;
        let entry = AdjacencyEntry {
            label: label.to_string(),
            edge,
            other,
        };
        self.db.put_cf(
            cf,
            Self::adjacency_key(row, direction, label, edge),
            bincode::serialize(&entry)?,
        )?;
        Ok(())
    }

    fn delete_adjacency(&self, row: u64, direction: Direction, label: &str, edge: u64, _other: u64) -> StorageResult<()> {
        let direction = single_direction(direction)?;
        let cf = self.cf(ADJACENCY_CF)?;
        self.db
            .delete_cf(cf, Self::adjacency_key(row, direction, label, edge))?;
        Ok(())
    }

    fn adjacency(&self, row: u64, direction: Direction, label: Option<&str>) -> StorageResult<Vec<AdjacencyEntry>> {
        let direction = single_direction(direction)?;
        let cf = self.cf(ADJACENCY_CF)?;
        let prefix = Self::adjacency_prefix(row, direction, label);
        self.scan_prefix(cf, prefix.as_bytes())?
            .into_iter()
            .map(|(_, value)| Ok(bincode::deserialize(&value)?))
            .collect()
    }

    fn is_persistent(&self) -> bool {
        true
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed row store to disk");
        Ok(())
    }
}
