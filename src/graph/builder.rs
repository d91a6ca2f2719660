//! Graph construction
//!
//! Collaborators are either built from a [`GraphConfig`] or injected as
//! ready instances; an injected instance wins over the configured one.

use super::store::{Graph, GraphError, GraphResult};
use crate::config::{GraphConfig, IndexConfig, StoreConfig};
use crate::index::{IndexBackend, MemoryIndexBackend, QueuedIndexBackend};
use crate::storage::{MemoryStore, PropertyStore, RocksStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Default)]
pub struct GraphBuilder {
    config: GraphConfig,
    store: Option<Arc<dyn PropertyStore>>,
    backend: Option<Arc<dyn IndexBackend>>,
}

impl GraphBuilder {
    /// In-memory store and synchronous index backend
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn index_backend(mut self, backend: Arc<dyn IndexBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.config.max_sessions = Some(max);
        self
    }

    pub fn build(self) -> GraphResult<Graph> {
        self.config
            .validate()
            .map_err(|e| GraphError::ArgumentInvalid(e.to_string()))?;

        let store: Arc<dyn PropertyStore> = match self.store {
            Some(store) => store,
            None => match &self.config.store {
                StoreConfig::Memory => Arc::new(MemoryStore::new()),
                StoreConfig::Rocks { path } => {
                    info!("Opening RocksDB store at {}", path.display());
                    Arc::new(RocksStore::open(path)?)
                }
            },
        };

        let backend: Arc<dyn IndexBackend> = match self.backend {
            Some(backend) => backend,
            None => match &self.config.index {
                IndexConfig::Memory => Arc::new(MemoryIndexBackend::new()),
                IndexConfig::Queued { refresh_delay_ms } => {
                    Arc::new(QueuedIndexBackend::new(Duration::from_millis(*refresh_delay_ms))?)
                }
            },
        };

        Ok(Graph::from_parts(
            store,
            backend,
            self.config.wait_timeout(),
            self.config.max_sessions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_build() {
        let graph = GraphBuilder::new().build().unwrap();
        assert!(!graph.features().is_persistent);
        assert!(!graph.features().asynchronous_indexing);
    }

    #[test]
    fn test_build_from_config() {
        let dir = TempDir::new().unwrap();
        let config = GraphConfig {
            store: StoreConfig::Rocks {
                path: dir.path().join("graph"),
            },
            index: IndexConfig::Queued { refresh_delay_ms: 0 },
            ..Default::default()
        };
        let graph = GraphBuilder::from_config(config).build().unwrap();
        assert!(graph.features().is_persistent);
        assert!(graph.features().asynchronous_indexing);
        graph.shutdown().unwrap();
    }

    #[test]
    fn test_injected_instances_win() {
        let graph = GraphBuilder::from_config(GraphConfig {
            index: IndexConfig::Queued { refresh_delay_ms: 0 },
            ..Default::default()
        })
        .index_backend(Arc::new(MemoryIndexBackend::new()))
        .max_sessions(2)
        .build()
        .unwrap();
        assert!(!graph.features().asynchronous_indexing);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            GraphBuilder::new().max_sessions(0).build(),
            Err(GraphError::ArgumentInvalid(_))
        ));
        let config = GraphConfig {
            store: StoreConfig::Rocks { path: Default::default() },
            ..Default::default()
        };
        assert!(matches!(
            GraphBuilder::from_config(config).build(),
            Err(GraphError::ArgumentInvalid(_))
        ));
    }
}
