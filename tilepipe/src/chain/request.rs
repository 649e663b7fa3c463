use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use super::slot::ProviderSlot;
use super::{check_eligibility, Ineligible, ProviderList};
use crate::tile::TileKey;

/// Identity of one registered request.
///
/// A new id is minted every time a key is registered, so outcomes addressed to
/// an earlier registration of the same key can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Where a request is in its provider chain.
///
/// ```text
/// PendingDispatch ─▶ Dispatched(slot) ─┬─▶ Succeeded
///                        ▲             ├─▶ failed  ─┐
///                        │             └─▶ expired ─┤
///                        └──── next eligible ◀──────┘
///                                    │ none left
///                                    ▼
///                                Exhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    PendingDispatch,
    Dispatched(super::SlotId),
    Succeeded,
    Exhausted,
}

/// Per-request cursor over the providers still to try.
///
/// The queue is consumed front to back and never replayed.
#[derive(Debug)]
pub struct TileRequestState {
    id: RequestId,
    key: TileKey,
    queue: VecDeque<Arc<ProviderSlot>>,
    current: Option<Arc<ProviderSlot>>,
    phase: RequestPhase,
}

impl TileRequestState {
    /// A request that will try every provider of `providers` in order.
    pub fn new(id: RequestId, key: TileKey, providers: &ProviderList) -> Self {
        Self {
            id,
            key,
            queue: providers.slots().iter().cloned().collect(),
            current: None,
            phase: RequestPhase::PendingDispatch,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn current(&self) -> Option<&Arc<ProviderSlot>> {
        self.current.as_ref()
    }

    /// Providers not yet tried.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == RequestPhase::Exhausted
    }

    /// Pop the next untried provider, eligible or not.
    pub fn next_provider(&mut self) -> Option<Arc<ProviderSlot>> {
        self.current = self.queue.pop_front();
        self.phase = match &self.current {
            Some(slot) => RequestPhase::Dispatched(slot.id()),
            None => RequestPhase::Exhausted,
        };
        self.current.clone()
    }

    /// Pop providers until one is eligible for this request.
    ///
    /// `on_skip` sees every provider passed over and why.
    pub fn next_eligible<F>(
        &mut self,
        providers: &ProviderList,
        use_network: bool,
        mut on_skip: F,
    ) -> Option<Arc<ProviderSlot>>
    where
        F: FnMut(&ProviderSlot, Ineligible),
    {
        while let Some(slot) = self.next_provider() {
            match check_eligibility(&slot, providers, &self.key, use_network) {
                Ok(()) => return Some(slot),
                Err(reason) => on_skip(&slot, reason),
            }
        }
        None
    }

    pub fn mark_succeeded(&mut self) {
        self.phase = RequestPhase::Succeeded;
    }
}
