//! Property graph model and facade
//!
//! This module implements the element model and the operations callers
//! use:
//! - Vertex and edge handles resolved through a session
//! - Closed tagged union of property values
//! - Sessions carrying per-caller index consistency state
//! - Graph construction from configuration or injected collaborators

pub mod builder;
pub mod edge;
pub mod element;
pub mod property;
pub mod session;
pub mod store;
pub mod types;
pub mod vertex;

// Re-export main types
pub use builder::GraphBuilder;
pub use edge::Edge;
pub use element::Element;
pub use property::PropertyValue;
pub use session::{Indexed, PropertyGraph, Session, Transactional};
pub use store::{Features, Graph, GraphError, GraphResult, ID_KEY, LABEL_KEY};
pub use types::{Direction, EdgeId, ElementClass, GraphId, Label, VertexId};
pub use vertex::Vertex;
