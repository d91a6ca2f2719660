//! Graph handle and shared graph state
//!
//! A [`Graph`] owns its collaborators (row store, index backend, index
//! catalog) behind an `Arc` and hands out [`Session`]s. All element and
//! index operations go through a session; the graph itself only manages
//! lifecycle.

use super::session::Session;
use super::types::{ElementClass, GraphId};
use crate::index::{IndexBackend, IndexCollection, IndexError};
use crate::storage::{PropertyStore, StorageError, RESERVED_PREFIX};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid argument: {0}")]
    ArgumentInvalid(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Property keys that may never be written through `set_property`
pub const ID_KEY: &str = "id";
pub const LABEL_KEY: &str = "label";

pub(crate) fn validate_property_key(key: &str, class: ElementClass) -> GraphResult<()> {
    if key.is_empty() {
        return Err(GraphError::ArgumentInvalid("property key must not be empty".into()));
    }
    if key.starts_with(RESERVED_PREFIX) {
        return Err(GraphError::ArgumentInvalid(format!(
            "property key {} uses the reserved prefix {}",
            key, RESERVED_PREFIX
        )));
    }
    if key == ID_KEY || (class == ElementClass::Edge && key == LABEL_KEY) {
        return Err(GraphError::ArgumentInvalid(format!(
            "property key {} is reserved on {} elements",
            key, class
        )));
    }
    Ok(())
}

/// What a graph instance supports, derived from its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub supports_key_indices: bool,
    pub supports_manual_indices: bool,
    pub supports_transactions: bool,
    pub supports_self_loops: bool,
    /// Ids passed to `add_vertex`/`add_edge` are ignored
    pub ignores_supplied_ids: bool,
    pub is_persistent: bool,
    /// Index writes become readable only after a generation wait
    pub asynchronous_indexing: bool,
}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by a graph and all of its sessions
pub(crate) struct GraphInner {
    pub(crate) id: GraphId,
    pub(crate) store: Arc<dyn PropertyStore>,
    pub(crate) backend: Arc<dyn IndexBackend>,
    pub(crate) indices: IndexCollection,
    pub(crate) wait_timeout: Option<Duration>,
    max_sessions: Option<usize>,
    sessions: AtomicUsize,
    closed: AtomicBool,
}

impl GraphInner {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn release_session(&self) {
        let _ = self
            .sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

/// A property graph
#[derive(Clone)]
pub struct Graph {
    inner: Arc<GraphInner>,
}

impl Graph {
    pub(crate) fn from_parts(
        store: Arc<dyn PropertyStore>,
        backend: Arc<dyn IndexBackend>,
        wait_timeout: Option<Duration>,
        max_sessions: Option<usize>,
    ) -> Self {
        let id = GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::SeqCst));
        info!(
            "Opened graph {} (persistent: {}, asynchronous indexing: {})",
            id,
            store.is_persistent(),
            backend.is_asynchronous()
        );
        Self {
            inner: Arc::new(GraphInner {
                id,
                store,
                backend,
                indices: IndexCollection::new(),
                wait_timeout,
                max_sessions,
                sessions: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> GraphId {
        self.inner.id
    }

    pub fn features(&self) -> Features {
        Features {
            supports_key_indices: true,
            supports_manual_indices: true,
            supports_transactions: true,
            supports_self_loops: true,
            ignores_supplied_ids: true,
            is_persistent: self.inner.store.is_persistent(),
            asynchronous_indexing: self.inner.backend.is_asynchronous(),
        }
    }

    /// Open a new session. Fails once the graph is shut down or the
    /// configured session limit is reached.
    pub fn open_session(&self) -> GraphResult<Session> {
        if self.inner.is_closed() {
            return Err(GraphError::InvariantViolation(format!("graph {} is shut down", self.inner.id)));
        }
        let limit = self.inner.max_sessions.unwrap_or(usize::MAX);
        self.inner
            .sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < limit).then_some(n + 1))
            .map_err(|open| {
                warn!("Session limit reached on graph {} ({} open)", self.inner.id, open);
                GraphError::InvariantViolation(format!("session limit of {} reached", limit))
            })?;
        debug!("Opened session on graph {}", self.inner.id);
        Ok(Session::new(Arc::clone(&self.inner)))
    }

    /// Number of sessions currently open
    pub fn session_count(&self) -> usize {
        self.inner.sessions.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Refuse new sessions, invalidate open ones, drain the index backend
    /// and flush the store. Calling it again is a no-op.
    pub fn shutdown(&self) -> GraphResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.backend.shutdown();
        self.inner.store.flush()?;
        info!("Graph {} shut down", self.inner.id);
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.inner.id)
            .field("sessions", &self.session_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
