//! Sessions and the graph capability traits
//!
//! A [`Session`] is the explicit per-caller context: it carries the
//! generation tracker that gives read-your-writes over asynchronous index
//! backends, a cache of manual index handles and, while a transaction is
//! open, the overlays buffering manual index writes. Sessions are `Send`
//! but meant to be driven by one thread at a time.

use super::edge::Edge;
use super::element::Element;
use super::property::PropertyValue;
use super::store::{validate_property_key, GraphError, GraphInner, GraphResult};
use super::types::{Direction, EdgeId, ElementClass, GraphId, Label, VertexId};
use super::vertex::Vertex;
use crate::index::{Generation, GenerationTracker, Index, IndexInfo, IndexOverlay};
use crate::query::{GraphQuery, VertexQuery};
use crate::storage::{RowCursor, StorageError, StorageResult, IN_VERTEX_COLUMN, LABEL_COLUMN, OUT_VERTEX_COLUMN};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Core element operations
pub trait PropertyGraph {
    /// Create a vertex. The id hint is ignored; ids are assigned by the store.
    fn add_vertex(&mut self, id_hint: Option<u64>) -> GraphResult<Vertex>;

    fn get_vertex(&self, id: VertexId) -> GraphResult<Option<Vertex>>;

    /// Remove a vertex, its incident edges and its index entries
    fn remove_vertex(&mut self, vertex: &Vertex) -> GraphResult<()>;

    fn vertices(&self) -> GraphResult<Vec<Vertex>>;

    /// Vertices with `key == value`, through the key index when there is one
    fn get_vertices(&mut self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Vec<Vertex>>;

    fn add_edge(&mut self, id_hint: Option<u64>, out: &Vertex, inc: &Vertex, label: &str) -> GraphResult<Edge>;

    fn get_edge(&self, id: EdgeId) -> GraphResult<Option<Edge>>;

    fn remove_edge(&mut self, edge: &Edge) -> GraphResult<()>;

    fn edges(&self) -> GraphResult<Vec<Edge>>;

    fn get_edges(&mut self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Vec<Edge>>;

    fn get_property<T: Element>(&self, element: &T, key: &str) -> GraphResult<Option<PropertyValue>>;

    fn set_property<T: Element>(&mut self, element: &T, key: &str, value: impl Into<PropertyValue>) -> GraphResult<()>;

    /// Remove a property, returning its previous value
    fn remove_property<T: Element>(&mut self, element: &T, key: &str) -> GraphResult<Option<PropertyValue>>;

    fn property_keys<T: Element>(&self, element: &T) -> GraphResult<Vec<String>>;

    fn vertex_edges(&self, vertex: &Vertex, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Edge>>;

    /// The vertex at the other end of each incident edge
    fn adjacent_vertices(&self, vertex: &Vertex, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Vertex>>;

    /// One endpoint of an edge; `Both` is rejected
    fn edge_vertex(&self, edge: &Edge, direction: Direction) -> GraphResult<Vertex>;

    fn edge_label(&self, edge: &Edge) -> GraphResult<Label>;

    fn query(&mut self) -> GraphQuery<'_>;

    fn vertex_query(&self, vertex: &Vertex) -> GraphResult<VertexQuery<'_>>;
}

/// Manual and automatic key index management
pub trait Indexed {
    fn create_index<T: Element>(&mut self, name: &str) -> GraphResult<Index<T>>;

    /// `None` if there is no index `name` over `T`
    fn get_index<T: Element>(&mut self, name: &str) -> GraphResult<Option<Index<T>>>;

    fn get_indices(&self) -> GraphResult<Vec<IndexInfo>>;

    /// Drop a manual index; dropping an unknown name is a no-op
    fn drop_index(&mut self, name: &str) -> GraphResult<()>;

    /// Index `key` for `class` and backfill existing elements
    fn create_key_index(&mut self, key: &str, class: ElementClass) -> GraphResult<()>;

    fn drop_key_index(&mut self, key: &str, class: ElementClass) -> GraphResult<()>;

    fn indexed_keys(&self, class: ElementClass) -> GraphResult<Vec<String>>;
}

/// Buffering of manual index writes until commit
pub trait Transactional {
    fn begin(&mut self) -> GraphResult<()>;

    /// Replay buffered index writes and wait until they are readable
    fn commit(&mut self) -> GraphResult<()>;

    /// Discard buffered index writes
    fn rollback(&mut self) -> GraphResult<()>;

    fn in_transaction(&self) -> bool;
}

/// Per-caller context over a [`Graph`](super::Graph)
pub struct Session {
    graph: Arc<GraphInner>,
    tracker: GenerationTracker,
    index_cache: FxHashMap<String, ElementClass>,
    overlays: Option<FxHashMap<String, IndexOverlay>>,
    closed: bool,
}

fn to_cell(id: u64) -> GraphResult<PropertyValue> {
    i64::try_from(id)
        .map(PropertyValue::Integer)
        .map_err(|_| GraphError::InvariantViolation(format!("row id {} out of range", id)))
}

fn endpoint(graph: &GraphInner, edge: u64, column: &str) -> GraphResult<u64> {
    match graph.store.read_cell(ElementClass::Edge, edge, column)? {
        Some(PropertyValue::Integer(id)) if id > 0 => Ok(id as u64),
        Some(other) => Err(StorageError::Corrupt(format!("edge {} column {} holds {}", edge, column, other)).into()),
        None => Err(GraphError::NotFound(format!("edge {}", edge))),
    }
}

fn label_of(graph: &GraphInner, edge: u64) -> GraphResult<String> {
    match graph.store.read_cell(ElementClass::Edge, edge, LABEL_COLUMN)? {
        Some(PropertyValue::String(label)) => Ok(label),
        Some(other) => Err(StorageError::Corrupt(format!("edge {} label holds {}", edge, other)).into()),
        None => Err(GraphError::NotFound(format!("edge {}", edge))),
    }
}

impl Session {
    pub(crate) fn new(graph: Arc<GraphInner>) -> Self {
        Self {
            graph,
            tracker: GenerationTracker::new(),
            index_cache: FxHashMap::default(),
            overlays: None,
            closed: false,
        }
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.graph.is_closed()
    }

    /// Release the session. Buffered transaction state is discarded.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.overlays = None;
        self.index_cache.clear();
        self.graph.release_session();
        debug!("Closed session on graph {}", self.graph.id);
    }

    /// Highest generation produced by this session's index writes
    pub fn last_generation(&self) -> Generation {
        self.tracker.last_generation()
    }

    /// Whether an index write has not been waited for yet
    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Block until every index write of this session is readable
    pub fn wait_for_generation(&mut self) -> GraphResult<()> {
        let graph = self.open_graph()?;
        self.tracker.wait(graph.backend.as_ref(), graph.wait_timeout)?;
        Ok(())
    }

    pub(crate) fn open_graph(&self) -> GraphResult<Arc<GraphInner>> {
        if self.closed {
            return Err(GraphError::InvariantViolation("session is closed".into()));
        }
        if self.graph.is_closed() {
            return Err(GraphError::InvariantViolation(format!("graph {} is shut down", self.graph.id)));
        }
        Ok(Arc::clone(&self.graph))
    }

    /// Reject handles issued by another graph
    pub(crate) fn check_element<T: Element>(&self, element: &T) -> GraphResult<()> {
        if element.graph_id() != self.graph.id {
            return Err(GraphError::InvariantViolation(format!(
                "{} {} belongs to graph {}, not {}",
                T::CLASS,
                element.raw_id(),
                element.graph_id(),
                self.graph.id
            )));
        }
        Ok(())
    }

    fn record(&mut self, generation: Option<Generation>) {
        if let Some(generation) = generation {
            self.tracker.update(generation);
        }
    }

    fn require_row(&self, graph: &GraphInner, class: ElementClass, id: u64) -> GraphResult<()> {
        if graph.store.has_row(class, id)? {
            Ok(())
        } else {
            Err(GraphError::NotFound(format!("{} {}", class, id)))
        }
    }

    fn scan<T: Element>(&self) -> GraphResult<Vec<T>> {
        let graph = self.open_graph()?;
        let rows = RowCursor::new(graph.store.as_ref(), T::CLASS).collect::<StorageResult<Vec<u64>>>()?;
        Ok(rows.into_iter().map(|id| T::from_raw(graph.id, id)).collect())
    }

    fn lookup<T: Element>(&self, id: u64) -> GraphResult<Option<T>> {
        let graph = self.open_graph()?;
        Ok(graph
            .store
            .has_row(T::CLASS, id)?
            .then(|| T::from_raw(graph.id, id)))
    }

    /// Write a property cell and mirror it into the key index
    fn write_property(&mut self, class: ElementClass, id: u64, key: &str, value: PropertyValue) -> GraphResult<()> {
        let graph = self.open_graph()?;
        self.require_row(&graph, class, id)?;
        let old = graph.store.read_cell(class, id, key)?;
        graph.store.write_cell(class, id, key, &value)?;
        let generation = graph
            .indices
            .auto_update(graph.backend.as_ref(), class, id, key, &value, old.as_ref())?;
        self.record(generation);
        debug!("Set {} {} {} = {}", class, id, key, value);
        Ok(())
    }

    /// Delete a property cell and retract it from the key index
    fn erase_property(&mut self, class: ElementClass, id: u64, key: &str) -> GraphResult<Option<PropertyValue>> {
        let graph = self.open_graph()?;
        let old = graph.store.delete_cell(class, id, key)?;
        if let Some(old) = &old {
            let generation = graph
                .indices
                .auto_remove(graph.backend.as_ref(), class, id, key, old)?;
            self.record(generation);
            debug!("Removed {} {} {}", class, id, key);
        }
        Ok(old)
    }

    fn delete_edge(&mut self, graph: &GraphInner, edge: u64) -> GraphResult<()> {
        let out = endpoint(graph, edge, OUT_VERTEX_COLUMN)?;
        let inc = endpoint(graph, edge, IN_VERTEX_COLUMN)?;
        let label = label_of(graph, edge)?;
        graph.store.delete_adjacency(out, Direction::Out, &label, edge, inc)?;
        graph.store.delete_adjacency(inc, Direction::In, &label, edge, out)?;
        graph.store.delete_row(ElementClass::Edge, edge)?;
        let generation = graph.backend.delete_documents(ElementClass::Edge, edge)?;
        self.record(Some(generation));
        self.discard_pending(ElementClass::Edge, edge);
        debug!("Removed edge {} ({} -[{}]-> {})", edge, out, label, inc);
        Ok(())
    }

    /// Forget buffered manual index writes for a removed element
    fn discard_pending(&mut self, class: ElementClass, id: u64) {
        if let Some(overlays) = self.overlays.as_mut() {
            for overlay in overlays.values_mut().filter(|o| o.class() == class) {
                overlay.discard_element(id);
            }
        }
    }

    fn require_index(&self, graph: &GraphInner, name: &str, class: ElementClass) -> GraphResult<()> {
        match graph.indices.index(name)? {
            Some(info) if info.class == class => Ok(()),
            _ => Err(GraphError::NotFound(format!("{} index {}", class, name))),
        }
    }

    fn validate_index_key(key: &str) -> GraphResult<()> {
        if key.is_empty() {
            return Err(GraphError::ArgumentInvalid("index key must not be empty".into()));
        }
        Ok(())
    }

    pub(crate) fn index_put(&mut self, name: &str, class: ElementClass, key: &str, value: PropertyValue, id: u64) -> GraphResult<()> {
        Self::validate_index_key(key)?;
        let graph = self.open_graph()?;
        self.require_index(&graph, name, class)?;
        self.require_row(&graph, class, id)?;
        match self.overlays.as_mut() {
            Some(overlays) => overlays
                .entry(name.to_string())
                .or_insert_with(|| IndexOverlay::new(name, class))
                .put(key, value, id),
            None => {
                let generation = graph.backend.set(class, id, name, key, &value)?;
                self.record(Some(generation));
            }
        }
        Ok(())
    }

    pub(crate) fn index_remove(&mut self, name: &str, class: ElementClass, key: &str, value: PropertyValue, id: u64) -> GraphResult<()> {
        Self::validate_index_key(key)?;
        let graph = self.open_graph()?;
        self.require_index(&graph, name, class)?;
        match self.overlays.as_mut() {
            Some(overlays) => overlays
                .entry(name.to_string())
                .or_insert_with(|| IndexOverlay::new(name, class))
                .remove(key, value, id),
            None => {
                let generation = graph.backend.remove(class, id, name, key, &value)?;
                self.record(Some(generation));
            }
        }
        Ok(())
    }

    pub(crate) fn index_get(&mut self, name: &str, class: ElementClass, key: &str, value: &PropertyValue) -> GraphResult<Vec<u64>> {
        Self::validate_index_key(key)?;
        let graph = self.open_graph()?;
        self.require_index(&graph, name, class)?;
        self.wait_for_generation()?;
        let overlay = self.overlays.as_ref().and_then(|overlays| overlays.get(name));
        let candidates = match overlay {
            Some(overlay) => overlay.get(graph.backend.as_ref(), key, value)?,
            None => {
                let deleted = graph.backend.deleted_documents(class)?;
                graph
                    .backend
                    .get(class, name, key, value)?
                    .into_iter()
                    .filter(|id| !deleted.contains(id))
                    .collect()
            }
        };
        // postings may outlive their element
        let mut ids = Vec::with_capacity(candidates.len());
        for id in candidates {
            if graph.store.has_row(class, id)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("graph", &self.graph.id)
            .field("tracker", &self.tracker)
            .field("in_transaction", &self.overlays.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl PropertyGraph for Session {
    fn add_vertex(&mut self, _id_hint: Option<u64>) -> GraphResult<Vertex> {
        let graph = self.open_graph()?;
        let id = graph.store.add_row(ElementClass::Vertex)?;
        debug!("Added vertex {}", id);
        Ok(Vertex::new(graph.id, VertexId::new(id)))
    }

    fn get_vertex(&self, id: VertexId) -> GraphResult<Option<Vertex>> {
        self.lookup(id.as_u64())
    }

    fn remove_vertex(&mut self, vertex: &Vertex) -> GraphResult<()> {
        self.check_element(vertex)?;
        let graph = self.open_graph()?;
        let id = vertex.raw_id();
        self.require_row(&graph, ElementClass::Vertex, id)?;

        let mut incident = BTreeSet::new();
        for direction in Direction::Both.expand() {
            for entry in graph.store.adjacency(id, *direction, None)? {
                incident.insert(entry.edge);
            }
        }
        for edge in &incident {
            self.delete_edge(&graph, *edge)?;
        }

        graph.store.delete_row(ElementClass::Vertex, id)?;
        let generation = graph.backend.delete_documents(ElementClass::Vertex, id)?;
        self.record(Some(generation));
        self.discard_pending(ElementClass::Vertex, id);
        debug!("Removed vertex {} with {} incident edges", id, incident.len());
        Ok(())
    }

    fn vertices(&self) -> GraphResult<Vec<Vertex>> {
        self.scan()
    }

    fn get_vertices(&mut self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Vec<Vertex>> {
        self.query().has(key, value)?.vertices()
    }

    fn add_edge(&mut self, _id_hint: Option<u64>, out: &Vertex, inc: &Vertex, label: &str) -> GraphResult<Edge> {
        self.check_element(out)?;
        self.check_element(inc)?;
        if label.is_empty() {
            return Err(GraphError::ArgumentInvalid("edge label must not be empty".into()));
        }
        if label.contains('\0') {
            return Err(GraphError::ArgumentInvalid("edge label must not contain NUL".into()));
        }
        let graph = self.open_graph()?;
        let (out_id, in_id) = (out.raw_id(), inc.raw_id());
        self.require_row(&graph, ElementClass::Vertex, out_id)?;
        self.require_row(&graph, ElementClass::Vertex, in_id)?;

        let id = graph.store.add_row(ElementClass::Edge)?;
        graph.store.write_cell(ElementClass::Edge, id, OUT_VERTEX_COLUMN, &to_cell(out_id)?)?;
        graph.store.write_cell(ElementClass::Edge, id, IN_VERTEX_COLUMN, &to_cell(in_id)?)?;
        graph.store.write_cell(ElementClass::Edge, id, LABEL_COLUMN, &PropertyValue::from(label))?;
        graph.store.add_adjacency(out_id, Direction::Out, label, id, in_id)?;
        graph.store.add_adjacency(in_id, Direction::In, label, id, out_id)?;
        debug!("Added edge {} ({} -[{}]-> {})", id, out_id, label, in_id);
        Ok(Edge::new(graph.id, EdgeId::new(id)))
    }

    fn get_edge(&self, id: EdgeId) -> GraphResult<Option<Edge>> {
        self.lookup(id.as_u64())
    }

    fn remove_edge(&mut self, edge: &Edge) -> GraphResult<()> {
        self.check_element(edge)?;
        let graph = self.open_graph()?;
        self.require_row(&graph, ElementClass::Edge, edge.raw_id())?;
        self.delete_edge(&graph, edge.raw_id())
    }

    fn edges(&self) -> GraphResult<Vec<Edge>> {
        self.scan()
    }

    fn get_edges(&mut self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Vec<Edge>> {
        self.query().has(key, value)?.edges()
    }

    fn get_property<T: Element>(&self, element: &T, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.check_element(element)?;
        if key.starts_with(crate::storage::RESERVED_PREFIX) {
            return Ok(None);
        }
        let graph = self.open_graph()?;
        Ok(graph.store.read_cell(T::CLASS, element.raw_id(), key)?)
    }

    fn set_property<T: Element>(&mut self, element: &T, key: &str, value: impl Into<PropertyValue>) -> GraphResult<()> {
        self.check_element(element)?;
        validate_property_key(key, T::CLASS)?;
        let value = value.into();
        if value.is_null() {
            return Err(GraphError::ArgumentInvalid(format!("property {} cannot be set to null", key)));
        }
        self.write_property(T::CLASS, element.raw_id(), key, value)
    }

    fn remove_property<T: Element>(&mut self, element: &T, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.check_element(element)?;
        validate_property_key(key, T::CLASS)?;
        self.erase_property(T::CLASS, element.raw_id(), key)
    }

    fn property_keys<T: Element>(&self, element: &T) -> GraphResult<Vec<String>> {
        self.check_element(element)?;
        let graph = self.open_graph()?;
        Ok(graph.store.columns_for_row(T::CLASS, element.raw_id())?)
    }

    fn vertex_edges(&self, vertex: &Vertex, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Edge>> {
        self.vertex_query(vertex)?.direction(direction).labels(labels).edges()
    }

    fn adjacent_vertices(&self, vertex: &Vertex, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Vertex>> {
        self.check_element(vertex)?;
        let graph = self.open_graph()?;
        let mut adjacent = Vec::new();
        for dir in direction.expand() {
            if labels.is_empty() {
                for entry in graph.store.adjacency(vertex.raw_id(), *dir, None)? {
                    adjacent.push(Vertex::new(graph.id, VertexId::new(entry.other)));
                }
            } else {
                for label in labels {
                    for entry in graph.store.adjacency(vertex.raw_id(), *dir, Some(*label))? {
                        adjacent.push(Vertex::new(graph.id, VertexId::new(entry.other)));
                    }
                }
            }
        }
        Ok(adjacent)
    }

    fn edge_vertex(&self, edge: &Edge, direction: Direction) -> GraphResult<Vertex> {
        self.check_element(edge)?;
        let column = match direction {
            Direction::Out => OUT_VERTEX_COLUMN,
            Direction::In => IN_VERTEX_COLUMN,
            Direction::Both => {
                return Err(GraphError::Unsupported("an edge endpoint needs a single direction".into()))
            }
        };
        let graph = self.open_graph()?;
        let id = endpoint(&graph, edge.raw_id(), column)?;
        Ok(Vertex::new(graph.id, VertexId::new(id)))
    }

    fn edge_label(&self, edge: &Edge) -> GraphResult<Label> {
        self.check_element(edge)?;
        let graph = self.open_graph()?;
        Ok(Label::new(label_of(&graph, edge.raw_id())?))
    }

    fn query(&mut self) -> GraphQuery<'_> {
        GraphQuery::new(self)
    }

    fn vertex_query(&self, vertex: &Vertex) -> GraphResult<VertexQuery<'_>> {
        self.check_element(vertex)?;
        Ok(VertexQuery::new(self, *vertex))
    }
}

impl Indexed for Session {
    fn create_index<T: Element>(&mut self, name: &str) -> GraphResult<Index<T>> {
        let graph = self.open_graph()?;
        let generation = graph.indices.create_index(graph.backend.as_ref(), name, T::CLASS)?;
        self.record(Some(generation));
        self.index_cache.insert(name.to_string(), T::CLASS);
        Ok(Index::new(name))
    }

    fn get_index<T: Element>(&mut self, name: &str) -> GraphResult<Option<Index<T>>> {
        // other sessions may have dropped or recreated the name
        let graph = self.open_graph()?;
        let class = match graph.indices.index(name)? {
            Some(info) => info.class,
            None => {
                self.index_cache.remove(name);
                return Ok(None);
            }
        };
        if self.index_cache.get(name) != Some(&class) {
            debug!("Refreshed cached index {} as {}", name, class);
            self.index_cache.insert(name.to_string(), class);
        }
        Ok((class == T::CLASS).then(|| Index::new(name)))
    }

    fn get_indices(&self) -> GraphResult<Vec<IndexInfo>> {
        self.open_graph()?.indices.indices()
    }

    fn drop_index(&mut self, name: &str) -> GraphResult<()> {
        let graph = self.open_graph()?;
        let generation = graph.indices.drop_index(graph.backend.as_ref(), name)?;
        self.index_cache.remove(name);
        if let Some(overlays) = self.overlays.as_mut() {
            overlays.remove(name);
        }
        self.record(generation);
        Ok(())
    }

    fn create_key_index(&mut self, key: &str, class: ElementClass) -> GraphResult<()> {
        validate_property_key(key, class)?;
        let graph = self.open_graph()?;
        let generation = graph.indices.create_key_index(graph.backend.as_ref(), key, class)?;
        if generation.is_none() {
            return Ok(());
        }
        self.record(generation);

        let rows = RowCursor::new(graph.store.as_ref(), class).collect::<StorageResult<Vec<u64>>>()?;
        let mut backfilled = 0usize;
        for row in rows {
            if let Some(value) = self.erase_property(class, row, key)? {
                // A concurrent set_property between erase and restore has
                // already been mirrored; keep its value. The check and the
                // write are separate store calls, so a write landing in
                // between them can still be overwritten.
                if graph.store.read_cell(class, row, key)?.is_none() {
                    self.write_property(class, row, key, value)?;
                    backfilled += 1;
                }
            }
        }
        info!("Backfilled {} {} elements into key index {}", backfilled, class, key);
        Ok(())
    }

    fn drop_key_index(&mut self, key: &str, class: ElementClass) -> GraphResult<()> {
        let graph = self.open_graph()?;
        let generation = graph.indices.drop_key_index(graph.backend.as_ref(), key, class)?;
        self.record(generation);
        Ok(())
    }

    fn indexed_keys(&self, class: ElementClass) -> GraphResult<Vec<String>> {
        self.open_graph()?.indices.indexed_keys(class)
    }
}

impl Transactional for Session {
    fn begin(&mut self) -> GraphResult<()> {
        self.open_graph()?;
        if self.overlays.is_some() {
            return Err(GraphError::InvariantViolation("a transaction is already open".into()));
        }
        self.overlays = Some(FxHashMap::default());
        debug!("Transaction started on graph {}", self.graph.id);
        Ok(())
    }

    fn commit(&mut self) -> GraphResult<()> {
        let graph = self.open_graph()?;
        let overlays = self
            .overlays
            .take()
            .ok_or_else(|| GraphError::InvariantViolation("no transaction to commit".into()))?;
        for (_, mut overlay) in overlays {
            let generation = overlay.commit(graph.backend.as_ref())?;
            self.record(generation);
        }
        self.wait_for_generation()?;
        debug!("Transaction committed on graph {} at {}", self.graph.id, self.tracker.last_generation());
        Ok(())
    }

    fn rollback(&mut self) -> GraphResult<()> {
        let overlays = self
            .overlays
            .take()
            .ok_or_else(|| GraphError::InvariantViolation("no transaction to roll back".into()))?;
        for (_, mut overlay) in overlays {
            overlay.rollback();
        }
        debug!("Transaction rolled back on graph {}", self.graph.id);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.overlays.is_some()
    }
}
