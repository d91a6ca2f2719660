//! Per-session read-your-writes tracking
//!
//! A session records the highest generation returned by any of its index
//! mutations. Before an index-dependent read it waits for the backend to
//! reach that generation, once; later reads skip the wait until the
//! session writes again.

use super::backend::{Generation, IndexBackend, IndexResult};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct GenerationTracker {
    last: Generation,
    dirty: bool,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation produced by this session
    pub fn update(&mut self, generation: Generation) {
        if generation > self.last {
            self.last = generation;
        }
        self.dirty = true;
    }

    pub fn last_generation(&self) -> Generation {
        self.last
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Wait until the backend has applied everything this session wrote.
    ///
    /// On error the dirty flag is kept so the next read waits again.
    pub fn wait(&mut self, backend: &dyn IndexBackend, timeout: Option<Duration>) -> IndexResult<()> {
        if !self.dirty {
            return Ok(());
        }
        if backend.is_asynchronous() {
            debug!("Waiting for index {}", self.last);
            if let Err(e) = backend.wait_for_generation(self.last, timeout) {
                warn!("Index wait for {} failed: {}", self.last, e);
                return Err(e);
            }
        }
        self.dirty = false;
        Ok(())
    }
}
