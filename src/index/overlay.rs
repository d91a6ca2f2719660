//! Transactional buffer in front of one manual index
//!
//! Puts and removes made inside a transaction stay in the overlay until
//! commit. Reads merge the buffered puts with the backend's committed
//! view. A buffered remove that matches a value masks every backend hit
//! for that value, not only the removed element.

use super::backend::{Generation, IndexBackend, IndexResult};
use crate::graph::{ElementClass, PropertyValue};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

type Buffer = FxHashMap<String, Vec<(PropertyValue, u64)>>;

#[derive(Debug, Clone)]
pub struct IndexOverlay {
    name: String,
    class: ElementClass,
    puts: Buffer,
    removes: Buffer,
}

impl IndexOverlay {
    pub fn new(name: impl Into<String>, class: ElementClass) -> Self {
        Self {
            name: name.into(),
            class,
            puts: Buffer::default(),
            removes: Buffer::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ElementClass {
        self.class
    }

    pub fn is_empty(&self) -> bool {
        self.puts.values().all(Vec::is_empty) && self.removes.values().all(Vec::is_empty)
    }

    pub fn put(&mut self, key: &str, value: PropertyValue, id: u64) {
        self.puts.entry(key.to_string()).or_default().push((value, id));
    }

    /// Cancel a buffered put of the same pair, or record a tombstone
    pub fn remove(&mut self, key: &str, value: PropertyValue, id: u64) {
        if let Some(pending) = self.puts.get_mut(key) {
            if let Some(pos) = pending.iter().position(|(v, e)| *e == id && *v == value) {
                pending.remove(pos);
                return;
            }
        }
        self.removes.entry(key.to_string()).or_default().push((value, id));
    }

    fn masks(&self, key: &str, value: &PropertyValue) -> bool {
        self.removes
            .get(key)
            .map_or(false, |tombstones| tombstones.iter().any(|(v, _)| v == value))
    }

    /// Buffered puts merged with the committed backend view
    pub fn get(&self, backend: &dyn IndexBackend, key: &str, value: &PropertyValue) -> IndexResult<Vec<u64>> {
        let deleted = backend.deleted_documents(self.class)?;
        let mut seen = FxHashSet::default();
        let mut ids = Vec::new();

        if let Some(pending) = self.puts.get(key) {
            for (v, id) in pending {
                if v == value && !deleted.contains(id) && seen.insert(*id) {
                    ids.push(*id);
                }
            }
        }

        if !self.masks(key, value) {
            for id in backend.get(self.class, &self.name, key, value)? {
                if !deleted.contains(&id) && seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    pub fn count(&self, backend: &dyn IndexBackend, key: &str, value: &PropertyValue) -> IndexResult<usize> {
        Ok(self.get(backend, key, value)?.len())
    }

    /// Replay puts, then removes, against the backend and clear the
    /// buffers. Returns the last generation produced, if anything was
    /// replayed.
    pub fn commit(&mut self, backend: &dyn IndexBackend) -> IndexResult<Option<Generation>> {
        let mut last = None;
        let puts = std::mem::take(&mut self.puts);
        let removes = std::mem::take(&mut self.removes);
        let replayed = puts.values().map(Vec::len).sum::<usize>() + removes.values().map(Vec::len).sum::<usize>();

        for (key, entries) in &puts {
            for (value, id) in entries {
                last = Some(backend.set(self.class, *id, &self.name, key, value)?);
            }
        }
        for (key, entries) in &removes {
            for (value, id) in entries {
                last = Some(backend.remove(self.class, *id, &self.name, key, value)?);
            }
        }
        debug!("Committed {} buffered changes to {} index {}", replayed, self.class, self.name);
        Ok(last)
    }

    pub fn rollback(&mut self) {
        self.puts.clear();
        self.removes.clear();
    }

    /// Drop every buffered change for an element that no longer exists
    pub fn discard_element(&mut self, id: u64) {
        for buffer in [&mut self.puts, &mut self.removes] {
            for entries in buffer.values_mut() {
                entries.retain(|(_, e)| *e != id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndexBackend;

    fn backend_with_index() -> MemoryIndexBackend {
        let backend = MemoryIndexBackend::new();
        backend.create_index(ElementClass::Vertex, "people").unwrap();
        backend
    }

    #[test]
    fn test_put_visible_before_commit() {
        let backend = backend_with_index();
        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.put("name", "marko".into(), 1);

        assert_eq!(overlay.get(&backend, "name", &"marko".into()).unwrap(), vec![1]);
        assert!(backend
            .get(ElementClass::Vertex, "people", "name", &"marko".into())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_remove_cancels_pending_put() {
        let backend = backend_with_index();
        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.put("name", "marko".into(), 1);
        overlay.remove("name", "marko".into(), 1);

        assert!(overlay.is_empty());
        assert_eq!(overlay.count(&backend, "name", &"marko".into()).unwrap(), 0);
    }

    #[test]
    fn test_tombstone_masks_all_backend_hits() {
        let backend = backend_with_index();
        backend
            .set(ElementClass::Vertex, 1, "people", "name", &"marko".into())
            .unwrap();
        backend
            .set(ElementClass::Vertex, 2, "people", "name", &"marko".into())
            .unwrap();

        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.remove("name", "marko".into(), 1);

        // element 2 was never removed but is masked as well
        assert!(overlay.get(&backend, "name", &"marko".into()).unwrap().is_empty());
    }

    #[test]
    fn test_commit_replays_and_clears() {
        let backend = backend_with_index();
        backend
            .set(ElementClass::Vertex, 3, "people", "name", &"josh".into())
            .unwrap();

        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.put("name", "marko".into(), 1);
        overlay.remove("name", "josh".into(), 3);
        assert!(overlay.commit(&backend).unwrap().is_some());
        assert!(overlay.is_empty());

        assert_eq!(
            backend.get(ElementClass::Vertex, "people", "name", &"marko".into()).unwrap(),
            vec![1]
        );
        assert!(backend
            .get(ElementClass::Vertex, "people", "name", &"josh".into())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_commit_produces_no_generation() {
        let backend = backend_with_index();
        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        assert_eq!(overlay.commit(&backend).unwrap(), None);
    }

    #[test]
    fn test_rollback_discards() {
        let backend = backend_with_index();
        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.put("name", "marko".into(), 1);
        overlay.rollback();

        assert!(overlay.get(&backend, "name", &"marko".into()).unwrap().is_empty());
        assert_eq!(overlay.commit(&backend).unwrap(), None);
    }

    #[test]
    fn test_discarded_element_is_not_replayed() {
        let backend = backend_with_index();
        let mut overlay = IndexOverlay::new("people", ElementClass::Vertex);
        overlay.put("name", "marko".into(), 1);
        overlay.put("name", "marko".into(), 2);
        overlay.discard_element(1);

        assert_eq!(overlay.get(&backend, "name", &"marko".into()).unwrap(), vec![2]);
        overlay.commit(&backend).unwrap();
        assert_eq!(
            backend.get(ElementClass::Vertex, "people", "name", &"marko".into()).unwrap(),
            vec![2]
        );
    }
}
