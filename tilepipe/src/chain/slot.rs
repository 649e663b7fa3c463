use std::fmt;
use std::io;
use std::sync::Arc;

use crate::provider::{ProviderError, TileProvider};
use crate::worker::{Job, WorkerEnv, WorkerPool};

/// Identity of a provider's place in one provider list.
///
/// Unique for the layer's lifetime, so a slot from a replaced list never
/// matches a slot of the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// A provider together with the worker pool that runs it.
pub struct ProviderSlot {
    id: SlotId,
    provider: Arc<dyn TileProvider>,
    pool: WorkerPool,
}

impl ProviderSlot {
    pub(crate) fn spawn(
        id: SlotId,
        provider: Arc<dyn TileProvider>,
        env: WorkerEnv,
    ) -> io::Result<Self> {
        let pool = WorkerPool::spawn(id, Arc::clone(&provider), env)?;
        Ok(Self { id, provider, pool })
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn provider(&self) -> &Arc<dyn TileProvider> {
        &self.provider
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Whether the provider can still take requests.
    pub fn still_valid(&self) -> bool {
        !self.pool.is_shut_down() && self.provider.still_valid()
    }

    pub fn submit(&self, job: Job) -> Result<(), ProviderError> {
        self.pool.submit(job)
    }

    pub fn clear_queue(&self) -> Vec<Job> {
        self.pool.clear_queue()
    }

    pub fn shutdown(&self) -> Vec<Job> {
        self.pool.shutdown()
    }
}

impl fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .field("pending", &self.pool.pending_count())
            .finish()
    }
}
