//! Recipient-visible object records.
//!
//! Changes and messages never reference live simulation state; they carry
//! these owned snapshot records, captured when the change is constructed.

use serde::{Deserialize, Serialize};

use crate::{ObjectId, PlayerId, SettlementId, TileId, UnitId};

/// A quantity of tradeable goods, e.g. cargo inside a unit's hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsSnapshot {
    pub kind: String,
    pub amount: u32,
}

/// Standing orders attached to a unit. Never revealed to non-owners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UnitOrders {
    Goto { path: Vec<TileId> },
    Fortify,
    Sentry,
    BuildImprovement { improvement: String },
}

/// Compact unit state for network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub type_name: String,
    pub owner: PlayerId,
    pub tile: TileId,
    pub hp: i32,
    pub moves_left: i32,
    pub base_moves: i32,
    #[serde(default)]
    pub orders: Option<UnitOrders>,
    #[serde(default)]
    pub cargo: Vec<GoodsSnapshot>,
    #[serde(default)]
    pub automated: bool,
    /// Set when the live unit was destroyed after this snapshot was taken.
    #[serde(default)]
    pub disposed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementSnapshot {
    pub id: SettlementId,
    pub name: String,
    pub owner: PlayerId,
    pub tile: TileId,
    pub population: u8,
    #[serde(default)]
    pub stockpile: Vec<GoodsSnapshot>,
    #[serde(default)]
    pub producing: Option<String>,
    #[serde(default)]
    pub disposed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub tile: TileId,
    pub terrain: String,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub settlement: Option<SettlementId>,
    #[serde(default)]
    pub improvement: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub nation: String,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub connected: bool,
}

/// Any synchronized object, as captured at change-construction time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectSnapshot {
    Unit(UnitSnapshot),
    Settlement(SettlementSnapshot),
    Tile(TileSnapshot),
    Player(PlayerSnapshot),
}

impl ObjectSnapshot {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Unit(u) => ObjectId::Unit(u.id),
            Self::Settlement(s) => ObjectId::Settlement(s.id),
            Self::Tile(t) => ObjectId::Tile(t.tile),
            Self::Player(p) => ObjectId::Player(p.id),
        }
    }

    /// Owning player, where the object has one. Tiles may be unowned.
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            Self::Unit(u) => Some(u.owner),
            Self::Settlement(s) => Some(s.owner),
            Self::Tile(t) => t.owner,
            Self::Player(p) => Some(p.id),
        }
    }

    /// Anchor tile, where the object has a location.
    pub fn tile(&self) -> Option<TileId> {
        match self {
            Self::Unit(u) => Some(u.tile),
            Self::Settlement(s) => Some(s.tile),
            Self::Tile(t) => Some(t.tile),
            Self::Player(_) => None,
        }
    }
}
