//! Propgraph: indexed property-graph storage core
//!
//! Vertices and edges carry string-keyed, dynamically typed properties and
//! live in a pluggable row store. On top of the store sit:
//!
//! - automatic key indices that mirror one property key, and manual
//!   indices filled by explicit puts
//! - predicate queries (`has`, `interval`, `limit`) that use a key index
//!   when an equality predicate allows it and scan otherwise
//! - a generation protocol giving each session read-your-writes over
//!   index backends that apply writes asynchronously
//! - a transactional overlay buffering manual index writes until commit
//!
//! ## Example Usage
//!
//! ```rust
//! use propgraph::{Comparator, ElementClass, GraphBuilder, Indexed, PropertyGraph};
//!
//! let graph = GraphBuilder::new().build().unwrap();
//! let mut session = graph.open_session().unwrap();
//!
//! let marko = session.add_vertex(None).unwrap();
//! let vadas = session.add_vertex(None).unwrap();
//! session.set_property(&marko, "age", 29i64).unwrap();
//! session.set_property(&vadas, "age", 27i64).unwrap();
//! let knows = session.add_edge(None, &marko, &vadas, "knows").unwrap();
//! session.set_property(&knows, "weight", 0.5).unwrap();
//!
//! session.create_key_index("age", ElementClass::Vertex).unwrap();
//! let found = session.query().has("age", 29i64).unwrap().vertices().unwrap();
//! assert_eq!(found, vec![marko]);
//!
//! let heavy = session
//!     .query()
//!     .has_cmp("weight", Comparator::GreaterThan, 0.4)
//!     .unwrap()
//!     .edges()
//!     .unwrap();
//! assert_eq!(heavy, vec![knows]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod index;
pub mod query;
pub mod storage;

// Re-export main types for convenience
pub use config::{ConfigError, GraphConfig, IndexConfig, StoreConfig};

pub use graph::{
    Direction, Edge, EdgeId, Element, ElementClass, Features, Graph, GraphBuilder, GraphError,
    GraphId, GraphResult, Indexed, Label, PropertyGraph, PropertyValue, Session, Transactional,
    Vertex, VertexId,
};

pub use index::{
    Generation, GenerationTracker, Index, IndexBackend, IndexCollection, IndexError, IndexInfo,
    IndexOverlay, IndexResult, MemoryIndexBackend, QueuedIndexBackend,
};

pub use query::{Comparator, GraphQuery, HasContainer, VertexQuery};

pub use storage::{MemoryStore, PropertyStore, RocksStore, StorageError, StorageResult};
