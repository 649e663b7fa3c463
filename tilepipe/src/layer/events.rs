use std::fmt;

use crate::tile::TileKey;
use crate::worker::ProviderEvent;

/// Notification sent to the layer's listener.
///
/// Every registered request ends with exactly one `Loaded` or `Failed`.
/// `Expired` may precede either when a stale tile was shown in the meantime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileEvent {
    /// A fresh tile is now in the cache.
    Loaded(TileKey),
    /// A stale tile is in the cache; a fresher one is still being sought.
    Expired(TileKey),
    /// No provider could supply the tile.
    Failed(TileKey),
}

impl TileEvent {
    pub fn key(&self) -> &TileKey {
        match self {
            TileEvent::Loaded(key) | TileEvent::Expired(key) | TileEvent::Failed(key) => key,
        }
    }

    /// Whether this event ends the request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TileEvent::Expired(_))
    }
}

impl fmt::Display for TileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileEvent::Loaded(key) => write!(f, "loaded {}", key),
            TileEvent::Expired(key) => write!(f, "expired {}", key),
            TileEvent::Failed(key) => write!(f, "failed {}", key),
        }
    }
}

/// Receives tile notifications, typically to schedule a redraw.
///
/// Called on the layer's event thread with no layer locks held.
pub trait TileListener: Send + Sync {
    fn on_tile_event(&self, event: TileEvent);
}

impl<F> TileListener for F
where
    F: Fn(TileEvent) + Send + Sync,
{
    fn on_tile_event(&self, event: TileEvent) {
        self(event)
    }
}

/// Messages consumed by the layer's event thread.
#[derive(Debug)]
pub(crate) enum LayerMessage {
    Provider(ProviderEvent),
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_event_key_and_terminal() {
        let key = TileKey::new("t", 1, 0, 0);
        assert_eq!(TileEvent::Loaded(key.clone()).key(), &key);
        assert!(TileEvent::Loaded(key.clone()).is_terminal());
        assert!(TileEvent::Failed(key.clone()).is_terminal());
        assert!(!TileEvent::Expired(key).is_terminal());
    }

    #[test]
    fn test_closure_listener() {
        let seen = Mutex::new(Vec::new());
        let listener = |e: TileEvent| seen.lock().unwrap().push(e);
        listener.on_tile_event(TileEvent::Failed(TileKey::new("t", 2, 1, 1)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
