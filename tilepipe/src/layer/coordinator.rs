//! Request coordination shared by the public handle and the event thread.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::events::{LayerMessage, TileEvent, TileListener};
use super::stats::LayerCounters;
use crate::cache::LruTileCache;
use crate::chain::{ProviderList, ProviderSlot, RequestId, SlotId, TileRequestState};
use crate::log::Logger;
use crate::provider::{ProviderError, TileProvider};
use crate::tile::{CachedTile, Raster, TileKey};
use crate::worker::{AttemptOutcome, Job, ProviderEvent, WorkerEnv};
use crate::{log_debug, log_info, log_trace};

/// State behind a [`TileLayer`](super::TileLayer).
///
/// Lock order is registry → cache and registry → provider list. Listener
/// callbacks run with no lock held.
pub(crate) struct LayerInner {
    pub cache: Mutex<LruTileCache>,
    pub in_flight: Mutex<HashMap<TileKey, TileRequestState>>,
    pub providers: RwLock<Arc<ProviderList>>,
    pub use_network: AtomicBool,
    pub detached: AtomicBool,
    pub listener: RwLock<Option<Arc<dyn TileListener>>>,
    pub counters: LayerCounters,
    pub env: WorkerEnv,
    next_request: AtomicU64,
    next_slot: AtomicU64,
}

impl LayerInner {
    pub fn new(cache: LruTileCache, use_network: bool, env: WorkerEnv) -> Self {
        Self {
            cache: Mutex::new(cache),
            in_flight: Mutex::new(HashMap::new()),
            providers: RwLock::new(Arc::new(ProviderList::default())),
            use_network: AtomicBool::new(use_network),
            detached: AtomicBool::new(false),
            listener: RwLock::new(None),
            counters: LayerCounters::default(),
            env,
            next_request: AtomicU64::new(1),
            next_slot: AtomicU64::new(1),
        }
    }

    fn logger(&self) -> &Arc<dyn Logger> {
        &self.env.logger
    }

    // =========================================================================
    // Lookup and dispatch
    // =========================================================================

    pub fn get_tile(&self, key: &TileKey) -> Option<CachedTile> {
        let cached = self.cache.lock().get(key);
        if matches!(&cached, Some(tile) if !tile.is_expired()) {
            return cached;
        }
        if self.detached.load(Ordering::Acquire) {
            return cached;
        }

        let mut in_flight = self.in_flight.lock();
        if in_flight.contains_key(key) {
            return cached;
        }

        // A request may have completed between the lookup above and taking
        // the registry lock.
        let cached = self.cache.lock().peek(key).cloned();
        if matches!(&cached, Some(tile) if !tile.is_expired()) {
            return cached;
        }

        let providers = Arc::clone(&self.providers.read());
        let id = RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed));
        let mut state = TileRequestState::new(id, key.clone(), &providers);
        self.counters.request();

        if self.dispatch(&mut state, &providers) {
            log_trace!(self.logger(), "Registered {} for {}", id, key);
            in_flight.insert(key.clone(), state);
        } else {
            drop(in_flight);
            log_debug!(self.logger(), "No eligible provider for {}", key);
            self.counters.failed();
            self.notify(TileEvent::Failed(key.clone()));
        }
        cached
    }

    /// Submit `state` to its next eligible provider. False once the chain is
    /// exhausted.
    fn dispatch(&self, state: &mut TileRequestState, providers: &ProviderList) -> bool {
        let use_network = self.use_network.load(Ordering::Acquire);
        let logger = self.logger();
        loop {
            let key = state.key().clone();
            let slot = state.next_eligible(providers, use_network, |slot, reason| {
                log_trace!(logger, "Skipping '{}' for {}: {}", slot.name(), key, reason);
            });
            let Some(slot) = slot else {
                return false;
            };

            let job = Job {
                request: state.id(),
                key,
            };
            match slot.submit(job) {
                Ok(()) => return true,
                Err(e) => {
                    self.counters.rejected();
                    log_debug!(logger, "'{}' rejected {}: {}", slot.name(), state.key(), e);
                }
            }
        }
    }

    // =========================================================================
    // Provider outcomes
    // =========================================================================

    /// Apply one provider outcome. Tiles from a provider no longer in the
    /// current list are never cached; the request moves on as if it failed.
    pub fn handle(&self, event: ProviderEvent) {
        let ProviderEvent {
            request,
            key,
            slot,
            outcome,
        } = event;
        let removed = !self.providers.read().contains(slot);
        match outcome {
            AttemptOutcome::Loaded(raster) | AttemptOutcome::Expired(raster) if removed => {
                log_debug!(
                    self.logger(),
                    "Dropping {} from removed provider {}",
                    key,
                    slot
                );
                self.env.raster_pool.recycle(raster.into_data());
                self.tile_request_failed(request, &key);
            }
            AttemptOutcome::Loaded(raster) => self.tile_request_completed(request, &key, raster),
            AttemptOutcome::Expired(raster) => self.tile_request_expired(request, &key, raster),
            AttemptOutcome::Failed(error) => {
                log_trace!(self.logger(), "{} failed on {}: {}", key, slot, error);
                self.tile_request_failed(request, &key);
            }
        }
    }

    /// A provider produced a fresh tile.
    pub fn tile_request_completed(&self, id: RequestId, key: &TileKey, raster: Raster) {
        let mut in_flight = self.in_flight.lock();
        if !Self::is_current(&in_flight, id, key) {
            drop(in_flight);
            self.discard(id, key, raster);
            return;
        }

        self.cache.lock().put(key.clone(), CachedTile::new(raster));
        if let Some(mut state) = in_flight.remove(key) {
            state.mark_succeeded();
        }
        drop(in_flight);

        self.counters.loaded();
        self.notify(TileEvent::Loaded(key.clone()));
    }

    /// The current provider had nothing usable; try the next one.
    pub fn tile_request_failed(&self, id: RequestId, key: &TileKey) {
        let mut in_flight = self.in_flight.lock();
        if !Self::is_current(&in_flight, id, key) {
            drop(in_flight);
            self.counters.stale();
            log_trace!(self.logger(), "Dropping failure for stale {} ({})", key, id);
            return;
        }
        let Some(state) = in_flight.get_mut(key) else {
            return;
        };

        let providers = Arc::clone(&self.providers.read());
        if self.dispatch(state, &providers) {
            return;
        }

        in_flight.remove(key);
        drop(in_flight);

        log_debug!(self.logger(), "All providers exhausted for {}", key);
        self.counters.failed();
        self.notify(TileEvent::Failed(key.clone()));
    }

    /// A provider produced a stale tile: show it, then keep looking.
    pub fn tile_request_expired(&self, id: RequestId, key: &TileKey, raster: Raster) {
        let in_flight = self.in_flight.lock();
        if !Self::is_current(&in_flight, id, key) {
            drop(in_flight);
            self.discard(id, key, raster);
            return;
        }
        self.cache
            .lock()
            .put(key.clone(), CachedTile::new(raster).into_expired());
        drop(in_flight);

        self.counters.expired();
        self.notify(TileEvent::Expired(key.clone()));
        self.tile_request_failed(id, key);
    }

    fn is_current(
        in_flight: &HashMap<TileKey, TileRequestState>,
        id: RequestId,
        key: &TileKey,
    ) -> bool {
        in_flight.get(key).is_some_and(|s| s.id() == id)
    }

    fn discard(&self, id: RequestId, key: &TileKey, raster: Raster) {
        self.counters.stale();
        log_trace!(self.logger(), "Dropping result for stale {} ({})", key, id);
        self.env.raster_pool.recycle(raster.into_data());
    }

    fn notify(&self, event: TileEvent) {
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_tile_event(event);
        }
    }

    // =========================================================================
    // Providers and lifecycle
    // =========================================================================

    fn spawn_slots(
        &self,
        providers: Vec<Arc<dyn TileProvider>>,
    ) -> io::Result<Vec<Arc<ProviderSlot>>> {
        let mut slots = Vec::with_capacity(providers.len());
        for provider in providers {
            let id = SlotId::new(self.next_slot.fetch_add(1, Ordering::Relaxed));
            match ProviderSlot::spawn(id, provider, self.env.clone()) {
                Ok(slot) => slots.push(Arc::new(slot)),
                Err(e) => {
                    for slot in &slots {
                        slot.shutdown();
                    }
                    return Err(e);
                }
            }
        }
        Ok(slots)
    }

    /// Swap in a new provider list. Jobs still queued on the old providers are
    /// reported as failed so their requests move on.
    pub fn set_providers(&self, providers: Vec<Arc<dyn TileProvider>>) -> io::Result<()> {
        let slots = self.spawn_slots(providers)?;
        let names: Vec<String> = slots.iter().map(|s| s.name().to_string()).collect();

        let old = {
            let mut current = self.providers.write();
            let next = ProviderList::new(current.generation() + 1, slots);
            std::mem::replace(&mut *current, Arc::new(next))
        };
        log_info!(
            self.logger(),
            "Provider chain is now [{}] (generation {})",
            names.join(", "),
            old.generation() + 1
        );

        for slot in old.slots() {
            for job in slot.shutdown() {
                let event = ProviderEvent {
                    request: job.request,
                    key: job.key,
                    slot: slot.id(),
                    outcome: AttemptOutcome::Failed(ProviderError::Detached),
                };
                let _ = self.env.events.send(LayerMessage::Provider(event));
            }
        }
        Ok(())
    }

    /// Forget all in-flight requests and stop every provider.
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        let abandoned = {
            let mut in_flight = self.in_flight.lock();
            let count = in_flight.len();
            in_flight.clear();
            count
        };
        let providers = Arc::clone(&self.providers.read());
        for slot in providers.slots() {
            slot.clear_queue();
            slot.shutdown();
        }
        log_debug!(
            self.logger(),
            "Detached, abandoned {} in-flight request(s)",
            abandoned
        );
    }

    /// Apply provider outcomes until told to stop.
    pub fn run_events(&self, events: Receiver<LayerMessage>) {
        for message in events {
            match message {
                LayerMessage::Provider(event) => self.handle(event),
                LayerMessage::Shutdown => break,
            }
        }
    }
}
