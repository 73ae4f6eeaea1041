//! Domain query surface for one connected player.
//!
//! The propagation core never inspects live game state; everything it needs
//! to know about an observer is behind this trait. The server crate supplies
//! a concrete view backed by the player's visible-tile set.

use meridian_protocol::{ObjectSnapshot, PlayerId, SettlementSnapshot, TileId, UnitSnapshot};

pub trait Observer {
    fn id(&self) -> PlayerId;

    /// Whether the observer currently perceives the given tile.
    fn sees_tile(&self, tile: TileId) -> bool;

    /// Whether the observer can already see this unit: owners always see
    /// their own units, others need the unit's tile in view.
    fn sees_unit(&self, unit: &UnitSnapshot) -> bool {
        unit.owner == self.id() || self.sees_tile(unit.tile)
    }

    fn sees_settlement(&self, settlement: &SettlementSnapshot) -> bool {
        settlement.owner == self.id() || self.sees_tile(settlement.tile)
    }

    fn sees(&self, object: &ObjectSnapshot) -> bool {
        match object {
            ObjectSnapshot::Unit(unit) => self.sees_unit(unit),
            ObjectSnapshot::Settlement(settlement) => self.sees_settlement(settlement),
            ObjectSnapshot::Tile(tile) => self.sees_tile(tile.tile),
            // Player records are public.
            ObjectSnapshot::Player(_) => true,
        }
    }

    fn owns_unit(&self, unit: &UnitSnapshot) -> bool {
        unit.owner == self.id()
    }

    fn owns(&self, object: &ObjectSnapshot) -> bool {
        object.owner() == Some(self.id())
    }
}
