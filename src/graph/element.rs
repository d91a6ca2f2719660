//! Element handles
//!
//! Vertices and edges are lightweight `{graph id, element id}` handles.
//! They hold no properties and no reference to their graph; every access
//! goes through a [`Session`](super::Session), which resolves the handle
//! against the graph's row store.

use super::types::{ElementClass, GraphId};
use std::fmt;
use std::hash::Hash;

/// Common behaviour of [`Vertex`](super::Vertex) and [`Edge`](super::Edge)
pub trait Element: Copy + fmt::Debug + Eq + Hash + Send + Sync + 'static {
    const CLASS: ElementClass;

    /// Graph this handle was issued by
    fn graph_id(&self) -> GraphId;

    /// Row id in the store, unique within the element class
    fn raw_id(&self) -> u64;

    fn from_raw(graph: GraphId, id: u64) -> Self;
}
