//! Edge handle
//!
//! An edge's out-vertex, in-vertex and label are fixed when it is created
//! and stored in reserved cells of its row; the handle itself only
//! carries the id.

use super::element::Element;
use super::types::{EdgeId, ElementClass, GraphId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed, labelled edge of a property graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    graph: GraphId,
    id: EdgeId,
}

impl Edge {
    pub(crate) fn new(graph: GraphId, id: EdgeId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }
}

impl Element for Edge {
    const CLASS: ElementClass = ElementClass::Edge;

    fn graph_id(&self) -> GraphId {
        self.graph
    }

    fn raw_id(&self) -> u64 {
        self.id.as_u64()
    }

    fn from_raw(graph: GraphId, id: u64) -> Self {
        Self::new(graph, EdgeId::new(id))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e[{}]", self.id.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;

    #[test]
    fn test_handles_compare_by_graph_and_id() {
        let a = Edge::from_raw(GraphId(1), 7);
        let b = Edge::from_raw(GraphId(1), 7);
        let c = Edge::from_raw(GraphId(2), 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.raw_id(), 7);
        assert_eq!(Vertex::from_raw(GraphId(1), 3).to_string(), "v[3]");
        assert_eq!(a.to_string(), "e[7]");
    }
}
