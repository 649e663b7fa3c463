//! Provider chain bookkeeping.
//!
//! A [`ProviderList`] is an immutable snapshot of the active providers.
//! Replacing the providers creates a new list with a higher generation; slots
//! carried over from the old list are not reused, so membership is a
//! [`SlotId`] lookup against the live list.
//!
//! Each registered request owns a [`TileRequestState`] that walks the list in
//! order, skipping providers that are ineligible for its key.

mod request;
mod slot;

pub use request::{RequestId, RequestPhase, TileRequestState};
pub use slot::{ProviderSlot, SlotId};

use std::fmt;
use std::sync::Arc;

use crate::tile::TileKey;

/// Why a provider was skipped for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// No longer part of the active provider list
    Removed,
    /// Shut down, or reports it cannot serve requests
    Invalid,
    /// Needs the network while the data connection is disabled
    NetworkDisabled,
    /// Key's zoom is outside the provider's range
    ZoomOutOfRange,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Ineligible::Removed => "removed from provider list",
            Ineligible::Invalid => "no longer valid",
            Ineligible::NetworkDisabled => "network disabled",
            Ineligible::ZoomOutOfRange => "zoom out of range",
        };
        f.write_str(reason)
    }
}

/// Generation-stamped snapshot of the active providers, in priority order.
#[derive(Debug, Default)]
pub struct ProviderList {
    generation: u64,
    slots: Vec<Arc<ProviderSlot>>,
}

impl ProviderList {
    pub fn new(generation: u64, slots: Vec<Arc<ProviderSlot>>) -> Self {
        Self { generation, slots }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slots(&self) -> &[Arc<ProviderSlot>] {
        &self.slots
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.slots.iter().any(|s| s.id() == id)
    }

    pub fn get(&self, id: SlotId) -> Option<&Arc<ProviderSlot>> {
        self.slots.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Whether `slot` may serve `key` right now.
pub fn check_eligibility(
    slot: &ProviderSlot,
    providers: &ProviderList,
    key: &TileKey,
    use_network: bool,
) -> Result<(), Ineligible> {
    if !providers.contains(slot.id()) {
        return Err(Ineligible::Removed);
    }
    if !slot.still_valid() {
        return Err(Ineligible::Invalid);
    }
    let provider = slot.provider();
    if provider.requires_network() && !use_network {
        return Err(Ineligible::NetworkDisabled);
    }
    if !provider.supports_zoom(key.zoom()) {
        return Err(Ineligible::ZoomOutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RasterPool;
    use crate::layer::LayerMessage;
    use crate::log::NoOpLogger;
    use crate::provider::{FetchedTile, ProviderError, TileProvider};
    use crate::tile::RawTileDecoder;
    use crate::worker::WorkerEnv;
    use std::sync::mpsc::{self, Receiver};

    struct Stub {
        name: &'static str,
        network: bool,
        zooms: (u8, u8),
    }

    impl TileProvider for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn fetch_tile(&self, _key: &TileKey) -> Result<FetchedTile, ProviderError> {
            Err(ProviderError::NotFound)
        }
        fn min_zoom(&self) -> u8 {
            self.zooms.0
        }
        fn max_zoom(&self) -> u8 {
            self.zooms.1
        }
        fn requires_network(&self) -> bool {
            self.network
        }
    }

    fn slot(id: u64, stub: Stub) -> (Arc<ProviderSlot>, Receiver<LayerMessage>) {
        let (tx, rx) = mpsc::channel();
        let env = WorkerEnv {
            decoder: Arc::new(RawTileDecoder),
            raster_pool: Arc::new(RasterPool::new(4)),
            events: tx,
            logger: Arc::new(NoOpLogger),
        };
        let slot = ProviderSlot::spawn(SlotId::new(id), Arc::new(stub), env).unwrap();
        (Arc::new(slot), rx)
    }

    fn stub(name: &'static str, network: bool, zooms: (u8, u8)) -> Stub {
        Stub {
            name,
            network,
            zooms,
        }
    }

    #[test]
    fn test_zoom_eligibility() {
        let (a, _rx) = slot(1, stub("a", false, (0, 4)));
        let list = ProviderList::new(1, vec![Arc::clone(&a)]);
        let key = TileKey::new("t", 5, 0, 0);
        assert_eq!(
            check_eligibility(&a, &list, &key, true),
            Err(Ineligible::ZoomOutOfRange)
        );
        let key = TileKey::new("t", 4, 0, 0);
        assert_eq!(check_eligibility(&a, &list, &key, true), Ok(()));
    }

    #[test]
    fn test_network_eligibility() {
        let (net, _rx) = slot(1, stub("net", true, (0, 22)));
        let list = ProviderList::new(1, vec![Arc::clone(&net)]);
        let key = TileKey::new("t", 3, 0, 0);
        assert_eq!(
            check_eligibility(&net, &list, &key, false),
            Err(Ineligible::NetworkDisabled)
        );
        assert_eq!(check_eligibility(&net, &list, &key, true), Ok(()));
    }

    #[test]
    fn test_removed_and_invalid() {
        let (a, _rx1) = slot(1, stub("a", false, (0, 22)));
        let (b, _rx2) = slot(2, stub("b", false, (0, 22)));
        let list = ProviderList::new(2, vec![Arc::clone(&b)]);
        let key = TileKey::new("t", 3, 0, 0);

        assert_eq!(
            check_eligibility(&a, &list, &key, true),
            Err(Ineligible::Removed)
        );
        b.shutdown();
        assert_eq!(
            check_eligibility(&b, &list, &key, true),
            Err(Ineligible::Invalid)
        );
    }

    #[test]
    fn test_request_walks_chain_once() {
        let (a, _rx1) = slot(1, stub("a", false, (0, 4)));
        let (b, _rx2) = slot(2, stub("b", true, (0, 22)));
        let (c, _rx3) = slot(3, stub("c", false, (0, 22)));
        let list = ProviderList::new(1, vec![a, b, c]);
        let mut request = TileRequestState::new(RequestId::new(1), TileKey::new("t", 5, 1, 1), &list);
        assert_eq!(request.phase(), RequestPhase::PendingDispatch);
        assert_eq!(request.remaining(), 3);

        let mut skipped = Vec::new();
        let chosen = request
            .next_eligible(&list, false, |s, why| skipped.push((s.name().to_string(), why)))
            .unwrap();
        assert_eq!(chosen.name(), "c");
        assert_eq!(request.phase(), RequestPhase::Dispatched(SlotId::new(3)));
        assert_eq!(
            skipped,
            vec![
                ("a".to_string(), Ineligible::ZoomOutOfRange),
                ("b".to_string(), Ineligible::NetworkDisabled),
            ]
        );

        assert!(request.next_eligible(&list, true, |_, _| {}).is_none());
        assert!(request.is_exhausted());
        assert!(request.next_provider().is_none());
    }

    #[test]
    fn test_list_lookup() {
        let (a, _rx) = slot(5, stub("a", false, (0, 22)));
        let list = ProviderList::new(3, vec![a]);
        assert_eq!(list.generation(), 3);
        assert!(list.contains(SlotId::new(5)));
        assert!(!list.contains(SlotId::new(6)));
        assert_eq!(list.get(SlotId::new(5)).map(|s| s.name()), Some("a"));
        assert_eq!(list.len(), 1);
    }
}
