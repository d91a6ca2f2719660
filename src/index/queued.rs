//! Asynchronous index backend
//!
//! Mutations are stamped with a generation and pushed onto an unbounded
//! channel; a background worker applies them in generation order after a
//! refresh delay. Readers only ever see applied state, which is what makes
//! the session-level generation wait necessary for read-your-writes.

use super::backend::{Generation, IndexBackend, IndexError, IndexName, IndexResult};
use super::event::IndexOp;
use super::property_index::{index_name, IndexState};
use crate::graph::{ElementClass, PropertyValue};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

#[derive(Debug)]
struct Queued {
    generation: Generation,
    op: IndexOp,
}

#[derive(Debug, Default)]
struct Progress {
    applied: Generation,
    /// Deletions acknowledged but not yet applied, with multiplicity
    pending_deletes: FxHashMap<(ElementClass, u64), usize>,
    stopped: bool,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<IndexState>,
    progress: Mutex<Progress>,
    applied_cond: Condvar,
    refresh_delay: Duration,
}

impl Shared {
    fn progress(&self) -> MutexGuard<'_, Progress> {
        // A panicking reader cannot leave Progress half-updated
        self.progress.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug)]
struct Submitter {
    sender: Option<UnboundedSender<Queued>>,
    next: u64,
}

/// Index backend with refresh latency
pub struct QueuedIndexBackend {
    shared: Arc<Shared>,
    submitter: Mutex<Submitter>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Index names known to writers, updated synchronously
    declared: RwLock<FxHashSet<IndexName>>,
}

impl QueuedIndexBackend {
    /// Start a backend whose worker waits `refresh_delay` before applying
    /// each batch of queued mutations
    pub fn new(refresh_delay: Duration) -> IndexResult<Self> {
        let (tx, rx) = unbounded_channel();
        let shared = Arc::new(Shared {
            state: RwLock::new(IndexState::default()),
            progress: Mutex::new(Progress::default()),
            applied_cond: Condvar::new(),
            refresh_delay,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("propgraph-indexer".to_string())
            .spawn(move || Self::run_worker(worker_shared, rx))
            .map_err(|e| IndexError::WorkerSpawn(e.to_string()))?;

        info!("Queued index backend started (refresh delay {:?})", refresh_delay);

        Ok(Self {
            shared,
            submitter: Mutex::new(Submitter {
                sender: Some(tx),
                next: 0,
            }),
            worker: Mutex::new(Some(worker)),
            declared: RwLock::new(FxHashSet::default()),
        })
    }

    /// Highest generation visible to readers
    pub fn applied_generation(&self) -> Generation {
        self.shared.progress().applied
    }

    fn run_worker(shared: Arc<Shared>, mut receiver: UnboundedReceiver<Queued>) {
        while let Some(first) = receiver.blocking_recv() {
            if !shared.refresh_delay.is_zero() {
                std::thread::sleep(shared.refresh_delay);
            }
            let mut batch = vec![first];
            while let Ok(next) = receiver.try_recv() {
                batch.push(next);
            }

            {
                let mut state = shared.state.write().unwrap_or_else(|p| p.into_inner());
                for queued in &batch {
                    state.apply(&queued.op);
                }
            }

            let mut progress = shared.progress();
            for queued in &batch {
                if let IndexOp::DeleteDocuments { class, id } = queued.op {
                    if let Some(n) = progress.pending_deletes.get_mut(&(class, id)) {
                        *n -= 1;
                        if *n == 0 {
                            progress.pending_deletes.remove(&(class, id));
                        }
                    }
                }
            }
            if let Some(last) = batch.last() {
                progress.applied = last.generation;
            }
            debug!("Applied {} index ops up to {}", batch.len(), progress.applied);
            drop(progress);
            shared.applied_cond.notify_all();
        }

        shared.progress().stopped = true;
        shared.applied_cond.notify_all();
        debug!("Index worker stopped");
    }

    fn submit(&self, op: IndexOp) -> IndexResult<Generation> {
        let mut submitter = self.submitter.lock().map_err(|_| IndexError::Poisoned)?;
        let sender = submitter.sender.clone().ok_or(IndexError::WorkerStopped)?;

        if let IndexOp::DeleteDocuments { class, id } = op {
            *self.shared.progress().pending_deletes.entry((class, id)).or_insert(0) += 1;
        }

        submitter.next += 1;
        let generation = Generation(submitter.next);
        sender
            .send(Queued { generation, op })
            .map_err(|_| IndexError::WorkerStopped)?;
        Ok(generation)
    }

    fn require(&self, class: ElementClass, name: &str) -> IndexResult<()> {
        if self.has_index(class, name)? {
            Ok(())
        } else {
            Err(IndexError::NoSuchIndex {
                class,
                name: name.to_string(),
            })
        }
    }
}

impl IndexBackend for QueuedIndexBackend {
    fn is_asynchronous(&self) -> bool {
        true
    }

    fn has_index(&self, class: ElementClass, name: &str) -> IndexResult<bool> {
        let declared = self.declared.read().map_err(|_| IndexError::Poisoned)?;
        Ok(declared.contains(&index_name(class, name)))
    }

    fn create_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation> {
        let index = index_name(class, name);
        {
            let mut declared = self.declared.write().map_err(|_| IndexError::Poisoned)?;
            if !declared.insert(index.clone()) {
                return Err(IndexError::IndexExists {
                    class,
                    name: name.to_string(),
                });
            }
        }
        self.submit(IndexOp::CreateIndex { index })
    }

    fn drop_index(&self, class: ElementClass, name: &str) -> IndexResult<Generation> {
        let index = index_name(class, name);
        {
            let mut declared = self.declared.write().map_err(|_| IndexError::Poisoned)?;
            if !declared.remove(&index) {
                return Err(IndexError::NoSuchIndex {
                    class,
                    name: name.to_string(),
                });
            }
        }
        self.submit(IndexOp::DropIndex { index })
    }

    fn set(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation> {
        self.require(class, name)?;
        self.submit(IndexOp::Set {
            index: index_name(class, name),
            id,
            key: key.to_string(),
            value: value.clone(),
        })
    }

    fn remove(&self, class: ElementClass, id: u64, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Generation> {
        self.require(class, name)?;
        self.submit(IndexOp::Remove {
            index: index_name(class, name),
            id,
            key: key.to_string(),
            value: value.clone(),
        })
    }

    fn delete_documents(&self, class: ElementClass, id: u64) -> IndexResult<Generation> {
        self.submit(IndexOp::DeleteDocuments { class, id })
    }

    fn get(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<Vec<u64>> {
        let state = self.shared.state.read().map_err(|_| IndexError::Poisoned)?;
        Ok(state.get(&index_name(class, name), key, value))
    }

    fn count(&self, class: ElementClass, name: &str, key: &str, value: &PropertyValue) -> IndexResult<usize> {
        let state = self.shared.state.read().map_err(|_| IndexError::Poisoned)?;
        Ok(state.count(&index_name(class, name), key, value))
    }

    fn deleted_documents(&self, class: ElementClass) -> IndexResult<FxHashSet<u64>> {
        let progress = self.shared.progress();
        Ok(progress
            .pending_deletes
            .keys()
            .filter(|(c, _)| *c == class)
            .map(|(_, id)| *id)
            .collect())
    }

    fn wait_for_generation(&self, generation: Generation, timeout: Option<Duration>) -> IndexResult<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut progress = self.shared.progress();
        while progress.applied < generation {
            if progress.stopped {
                return Err(IndexError::WorkerStopped);
            }
            progress = match deadline {
                None => self
                    .shared
                    .applied_cond
                    .wait(progress)
                    .map_err(|_| IndexError::Poisoned)?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(IndexError::WaitTimeout {
                            wanted: generation,
                            applied: progress.applied,
                        });
                    }
                    self.shared
                        .applied_cond
                        .wait_timeout(progress, deadline - now)
                        .map_err(|_| IndexError::Poisoned)?
                        .0
                }
            };
        }
        Ok(())
    }

    fn shutdown(&self) {
        if let Ok(mut submitter) = self.submitter.lock() {
            submitter.sender = None;
        }
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("Index worker panicked during shutdown");
            }
            info!("Queued index backend stopped");
        }
    }
}

impl Drop for QueuedIndexBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
