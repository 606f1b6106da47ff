//! Synchronous tile change fan-out.

use std::fmt;

use keeper_core::TileCoord;

/// Receives the coordinate of every tile whose state changed.
///
/// Listeners run before the triggering command returns and must not
/// mutate the world.
pub trait TileChangeListener {
    /// Invoked once per changed tile.
    fn on_tile_change(&mut self, tile: TileCoord);
}

impl<F> TileChangeListener for F
where
    F: FnMut(TileCoord),
{
    fn on_tile_change(&mut self, tile: TileCoord) {
        self(tile);
    }
}

/// Registered listeners in registration order.
#[derive(Default)]
pub(crate) struct ChangeListeners {
    listeners: Vec<Box<dyn TileChangeListener>>,
}

impl ChangeListeners {
    pub(crate) fn register(&mut self, listener: Box<dyn TileChangeListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn notify(&mut self, tile: TileCoord) {
        for listener in &mut self.listeners {
            listener.on_tile_change(tile);
        }
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
