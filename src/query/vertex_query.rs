//! Vertex-centric queries
//!
//! Candidates are the edges incident to one vertex, narrowed by direction
//! and label before the predicates run. [`VertexQuery::vertices`] yields
//! the out-vertex of every matching edge, whichever direction it was
//! reached from.

use super::predicate::{Comparator, HasContainer};
use super::element_matches;
use crate::graph::{Direction, Edge, Element, ElementClass, GraphError, GraphResult, PropertyValue, Session, Vertex, VertexId};
use rustc_hash::FxHashSet;
use tracing::debug;

pub struct VertexQuery<'a> {
    session: &'a Session,
    vertex: Vertex,
    direction: Direction,
    labels: Vec<String>,
    predicates: Vec<HasContainer>,
    limit: usize,
}

impl<'a> VertexQuery<'a> {
    pub(crate) fn new(session: &'a Session, vertex: Vertex) -> Self {
        Self {
            session,
            vertex,
            direction: Direction::Both,
            labels: Vec::new(),
            predicates: Vec::new(),
            limit: usize::MAX,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Restrict to edges with one of these labels; empty means any label
    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn has(self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.has_cmp(key, Comparator::Equal, value)
    }

    pub fn has_cmp(mut self, key: &str, comparator: Comparator, value: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.predicates.push(HasContainer::new(key, comparator, value)?);
        Ok(self)
    }

    pub fn interval(self, key: &str, start: impl Into<PropertyValue>, end: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.has_cmp(key, Comparator::GreaterThanEqual, start)?
            .has_cmp(key, Comparator::LessThan, end)
    }

    pub fn limit(mut self, max: usize) -> GraphResult<Self> {
        if max == 0 {
            return Err(GraphError::ArgumentInvalid("query limit must be positive".into()));
        }
        self.limit = max;
        Ok(self)
    }

    pub fn edges(self) -> GraphResult<Vec<Edge>> {
        let graph = self.session.graph_id();
        Ok(self
            .matching()?
            .into_iter()
            .map(|(edge, _)| Edge::from_raw(graph, edge))
            .collect())
    }

    /// Out-vertex of each matching edge
    pub fn vertices(self) -> GraphResult<Vec<Vertex>> {
        let graph = self.session.graph_id();
        Ok(self
            .matching()?
            .into_iter()
            .map(|(_, out)| Vertex::from_raw(graph, out))
            .collect())
    }

    pub fn count(self) -> GraphResult<usize> {
        Ok(self.matching()?.len())
    }

    /// Matching `(edge id, out-vertex id)` pairs. A self-loop reached in
    /// both directions is reported once.
    fn matching(&self) -> GraphResult<Vec<(u64, u64)>> {
        let graph = self.session.open_graph()?;
        let store = graph.store.as_ref();
        let vertex = self.vertex.raw_id();
        let mut seen = FxHashSet::default();
        let mut results = Vec::new();

        'directions: for direction in self.direction.expand() {
            let entries = if self.labels.is_empty() {
                store.adjacency(vertex, *direction, None)?
            } else {
                let mut entries = Vec::new();
                for label in &self.labels {
                    entries.extend(store.adjacency(vertex, *direction, Some(label.as_str()))?);
                }
                entries
            };

            for entry in entries {
                if results.len() >= self.limit {
                    break 'directions;
                }
                if !seen.insert(entry.edge) {
                    continue;
                }
                if element_matches(store, ElementClass::Edge, entry.edge, &self.predicates)? {
                    let out = match direction {
                        Direction::Out => vertex,
                        _ => entry.other,
                    };
                    results.push((entry.edge, out));
                }
            }
        }

        debug!(
            "Vertex query on {} ({:?}, {} labels): {} edges",
            VertexId::new(vertex),
            self.direction,
            self.labels.len(),
            results.len()
        );
        Ok(results)
    }
}
