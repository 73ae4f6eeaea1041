//! Concrete per-player perception view.

use std::collections::HashSet;

use meridian_protocol::{PlayerId, TileId};
use meridian_sync::Observer;

/// What one player can currently perceive, backed by their explored and
/// in-sight tile set. The controller layer mutates it as units move and
/// settlements grow; the dispatcher reads it during composition.
#[derive(Clone, Debug)]
pub struct PlayerView {
    id: PlayerId,
    visible_tiles: HashSet<TileId>,
}

impl PlayerView {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            visible_tiles: HashSet::new(),
        }
    }

    pub fn with_tiles(id: PlayerId, tiles: impl IntoIterator<Item = TileId>) -> Self {
        Self {
            id,
            visible_tiles: tiles.into_iter().collect(),
        }
    }

    /// Add a tile to the visible set. Returns false if already visible.
    pub fn reveal(&mut self, tile: TileId) -> bool {
        self.visible_tiles.insert(tile)
    }

    /// Drop a tile from the visible set. Returns false if it was not there.
    pub fn conceal(&mut self, tile: TileId) -> bool {
        self.visible_tiles.remove(&tile)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_tiles.len()
    }
}

impl Observer for PlayerView {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn sees_tile(&self, tile: TileId) -> bool {
        self.visible_tiles.contains(&tile)
    }
}
