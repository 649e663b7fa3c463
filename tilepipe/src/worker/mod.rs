//! Per-provider worker pool.
//!
//! Each provider in the active chain gets its own pool of OS threads and a
//! bounded queue of pending jobs. Workers run the provider's blocking fetch,
//! decode the bytes into a pooled raster and post exactly one
//! [`ProviderEvent`] per job on the layer's event channel.
//!
//! ```text
//!   TileLayer::get_tile ──submit──▶ [pending queue] ──▶ worker threads
//!                                                           │ fetch_tile
//!                                                           │ decode
//!   layer event thread ◀──────── ProviderEvent ◀────────────┘
//! ```
//!
//! Submission never blocks: a full queue rejects the job with
//! [`ProviderError::QueueFull`] and the layer moves on to the next provider.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::cache::RasterPool;
use crate::chain::{RequestId, SlotId};
use crate::layer::LayerMessage;
use crate::log::Logger;
use crate::provider::{ProviderError, TileProvider};
use crate::tile::{Raster, TileDecoder, TileKey};
use crate::{log_debug, log_trace, log_warn};

/// A fetch waiting for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub request: RequestId,
    pub key: TileKey,
}

/// Result of one provider attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A fresh tile.
    Loaded(Raster),
    /// A usable tile the source itself considers stale.
    Expired(Raster),
    /// The provider could not supply the tile.
    Failed(ProviderError),
}

/// Message a worker posts for each job it finishes.
#[derive(Debug)]
pub struct ProviderEvent {
    pub request: RequestId,
    pub key: TileKey,
    pub slot: SlotId,
    pub outcome: AttemptOutcome,
}

/// Everything the workers of one pool share with the layer.
#[derive(Clone)]
pub(crate) struct WorkerEnv {
    pub decoder: Arc<dyn TileDecoder>,
    pub raster_pool: Arc<RasterPool>,
    pub events: Sender<LayerMessage>,
    pub logger: Arc<dyn Logger>,
}

struct PoolState {
    pending: VecDeque<Job>,
    working: HashSet<TileKey>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    available: Condvar,
    capacity: usize,
}

/// Bounded pool of worker threads serving one provider.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start `provider.worker_threads()` workers for `provider`.
    pub(crate) fn spawn(
        slot: SlotId,
        provider: Arc<dyn TileProvider>,
        env: WorkerEnv,
    ) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                pending: VecDeque::new(),
                working: HashSet::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
            capacity: provider.max_queue_size(),
        });

        let threads = provider.worker_threads().max(1);
        log_debug!(
            env.logger,
            "Starting {} worker(s) for provider '{}' (queue {})",
            threads,
            provider.name(),
            shared.capacity
        );

        let pool = Self {
            shared: Arc::clone(&shared),
            handles: Mutex::new(Vec::with_capacity(threads)),
        };

        for i in 0..threads {
            let worker = Worker {
                slot,
                provider: Arc::clone(&provider),
                env: env.clone(),
                shared: Arc::clone(&shared),
            };
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", provider.name(), i))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => pool.handles.lock().push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        Ok(pool)
    }

    /// Queue a job. Never blocks.
    pub fn submit(&self, job: Job) -> Result<(), ProviderError> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(ProviderError::Detached);
        }
        if state.pending.len() >= self.shared.capacity {
            return Err(ProviderError::QueueFull(state.pending.len()));
        }
        state.pending.push_back(job);
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Drop every pending job and return them.
    pub fn clear_queue(&self) -> Vec<Job> {
        self.shared.state.lock().pending.drain(..).collect()
    }

    /// Stop accepting work and let workers exit after their current job.
    ///
    /// Returns the jobs that were still pending.
    pub fn shutdown(&self) -> Vec<Job> {
        let drained = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.pending.drain(..).collect()
        };
        self.shared.available.notify_all();
        drained
    }

    /// Wait for all workers to exit. Call after [`shutdown`](Self::shutdown).
    pub fn join(&self) {
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn working_count(&self) -> usize {
        self.shared.state.lock().working.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    slot: SlotId,
    provider: Arc<dyn TileProvider>,
    env: WorkerEnv,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(self) {
        while let Some(job) = self.next_job() {
            let outcome = self.attempt(&job.key);
            let fatal = match &outcome {
                AttemptOutcome::Failed(e) if e.is_fatal() => Some(e.clone()),
                _ => None,
            };

            let delivered = self.report(job.request, job.key.clone(), outcome);
            self.shared.state.lock().working.remove(&job.key);
            if !delivered {
                break;
            }

            if let Some(error) = fatal {
                self.drain_pending(error);
            }
        }
        log_trace!(self.env.logger, "Worker for '{}' exiting", self.provider.name());
    }

    /// Newest job first; `None` once the pool shuts down.
    fn next_job(&self) -> Option<Job> {
        let mut state = self.shared.state.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(job) = state.pending.pop_back() {
                state.working.insert(job.key.clone());
                return Some(job);
            }
            self.shared.available.wait(&mut state);
        }
    }

    fn attempt(&self, key: &TileKey) -> AttemptOutcome {
        let fetched = match self.provider.fetch_tile(key) {
            Ok(fetched) => fetched,
            Err(e) => {
                log_trace!(
                    self.env.logger,
                    "Provider '{}' failed {}: {}",
                    self.provider.name(),
                    key,
                    e
                );
                return AttemptOutcome::Failed(e);
            }
        };

        let decoded = self.env.decoder.decode(&fetched.bytes, &self.env.raster_pool);
        self.env.raster_pool.recycle(fetched.bytes);
        match decoded {
            Ok(raster) if fetched.expired => AttemptOutcome::Expired(raster),
            Ok(raster) => AttemptOutcome::Loaded(raster),
            Err(e) => {
                log_warn!(
                    self.env.logger,
                    "Failed to decode {} from '{}': {}",
                    key,
                    self.provider.name(),
                    e
                );
                AttemptOutcome::Failed(ProviderError::Decode(e.to_string()))
            }
        }
    }

    /// Post the outcome; false when the layer is gone.
    fn report(&self, request: RequestId, key: TileKey, outcome: AttemptOutcome) -> bool {
        let event = ProviderEvent {
            request,
            key,
            slot: self.slot,
            outcome,
        };
        self.env.events.send(LayerMessage::Provider(event)).is_ok()
    }

    fn drain_pending(&self, error: ProviderError) {
        let drained: Vec<Job> = self.shared.state.lock().pending.drain(..).collect();
        if drained.is_empty() {
            return;
        }
        log_warn!(
            self.env.logger,
            "Provider '{}' cannot continue ({}), dropping {} queued request(s)",
            self.provider.name(),
            error,
            drained.len()
        );
        for job in drained {
            if !self.report(job.request, job.key, AttemptOutcome::Failed(error.clone())) {
                return;
            }
        }
    }
}
