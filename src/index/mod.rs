//! Property indexing
//!
//! Index backends store `(key, value) -> element ids` documents and stamp
//! every mutation with a generation. On top of them sit the index catalog
//! (manual indices plus automatic key indices), the per-session
//! generation tracker and the transactional overlay.

pub mod backend;
pub mod event;
pub mod generation;
pub mod manager;
pub mod manual;
pub mod memory;
pub mod overlay;
pub mod property_index;
pub mod queued;

pub use backend::{Generation, IndexBackend, IndexError, IndexName, IndexResult};
pub use generation::GenerationTracker;
pub use manager::{key_index_name, IndexCollection, IndexInfo, KEY_INDEX_PREFIX};
pub use manual::Index;
pub use memory::MemoryIndexBackend;
pub use overlay::IndexOverlay;
pub use property_index::PropertyIndex;
pub use queued::QueuedIndexBackend;
