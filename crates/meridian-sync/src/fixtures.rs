//! Shared test fixtures: a tile-set backed observer and snapshot builders.

use std::collections::HashSet;

use meridian_protocol::{
    EntityId, PlayerId, PlayerSnapshot, SettlementSnapshot, TileId, TileSnapshot, UnitSnapshot,
};

use crate::Observer;

pub(crate) struct TestView {
    id: PlayerId,
    tiles: HashSet<TileId>,
}

impl TestView {
    pub(crate) fn new(id: PlayerId) -> Self {
        Self {
            id,
            tiles: HashSet::new(),
        }
    }

    pub(crate) fn with_tiles(id: PlayerId, tiles: impl IntoIterator<Item = TileId>) -> Self {
        Self {
            id,
            tiles: tiles.into_iter().collect(),
        }
    }
}

impl Observer for TestView {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn sees_tile(&self, tile: TileId) -> bool {
        self.tiles.contains(&tile)
    }
}

pub(crate) fn unit_at(index: u32, owner: PlayerId, tile: TileId) -> UnitSnapshot {
    UnitSnapshot {
        id: EntityId::new(index, 0),
        type_name: "dragoon".into(),
        owner,
        tile,
        hp: 10,
        moves_left: 3,
        base_moves: 3,
        orders: None,
        cargo: vec![],
        automated: false,
        disposed: false,
    }
}

pub(crate) fn settlement_at(index: u32, owner: PlayerId, tile: TileId) -> SettlementSnapshot {
    SettlementSnapshot {
        id: EntityId::new(index, 0),
        name: "Havengate".into(),
        owner,
        tile,
        population: 4,
        stockpile: vec![],
        producing: None,
        disposed: false,
    }
}

pub(crate) fn tile_snapshot(tile: TileId) -> TileSnapshot {
    TileSnapshot {
        tile,
        terrain: "plains".into(),
        owner: None,
        settlement: None,
        improvement: None,
    }
}

pub(crate) fn player(id: PlayerId) -> PlayerSnapshot {
    PlayerSnapshot {
        id,
        name: format!("player-{}", id.0),
        nation: "thornmark".into(),
        is_ai: false,
        connected: true,
    }
}
