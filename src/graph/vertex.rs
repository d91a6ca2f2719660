//! Vertex handle

use super::element::Element;
use super::types::{ElementClass, GraphId, VertexId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vertex of a property graph.
///
/// Equality is by graph and id. Properties and adjacency are read
/// through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    graph: GraphId,
    id: VertexId,
}

impl Vertex {
    pub(crate) fn new(graph: GraphId, id: VertexId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }
}

impl Element for Vertex {
    const CLASS: ElementClass = ElementClass::Vertex;

    fn graph_id(&self) -> GraphId {
        self.graph
    }

    fn raw_id(&self) -> u64 {
        self.id.as_u64()
    }

    fn from_raw(graph: GraphId, id: u64) -> Self {
        Self::new(graph, VertexId::new(id))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v[{}]", self.id.as_u64())
    }
}
