//! Recipient-specific reduction of object snapshots.
//!
//! Never leak intent or internals for objects the recipient does not own:
//! no orders, no automation state, no cargo, and only the base movement stat
//! rather than remaining moves this turn. Settlement internals (stockpile,
//! production) are likewise owner-only.

use meridian_protocol::{ObjectSnapshot, SettlementSnapshot, UnitSnapshot};

use crate::Observer;

/// Reduce a unit snapshot to what a non-owner may learn.
pub fn redact_unit(unit: &UnitSnapshot) -> UnitSnapshot {
    let mut unit = unit.clone();
    unit.orders = None;
    unit.automated = false;
    unit.moves_left = unit.base_moves;
    unit.cargo.clear();
    unit
}

/// Reduce a settlement snapshot to what a non-owner may learn.
pub fn redact_settlement(settlement: &SettlementSnapshot) -> SettlementSnapshot {
    let mut settlement = settlement.clone();
    settlement.stockpile.clear();
    settlement.producing = None;
    settlement
}

/// The unit as this observer is entitled to see it.
pub fn unit_for(observer: &impl Observer, unit: &UnitSnapshot) -> UnitSnapshot {
    if observer.owns_unit(unit) {
        unit.clone()
    } else {
        redact_unit(unit)
    }
}

/// The object as this observer is entitled to see it.
pub fn object_for(observer: &impl Observer, object: &ObjectSnapshot) -> ObjectSnapshot {
    if observer.owns(object) {
        return object.clone();
    }
    match object {
        ObjectSnapshot::Unit(unit) => ObjectSnapshot::Unit(redact_unit(unit)),
        ObjectSnapshot::Settlement(settlement) => {
            ObjectSnapshot::Settlement(redact_settlement(settlement))
        }
        // Tiles and player records carry nothing owner-private.
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{unit_at, TestView};
    use meridian_protocol::{GoodsSnapshot, PlayerId, TileId, UnitOrders};

    #[test]
    fn redaction_strips_intent_and_cargo() {
        let mut unit = unit_at(1, PlayerId(0), TileId::new(0, 0));
        unit.orders = Some(UnitOrders::Fortify);
        unit.automated = true;
        unit.moves_left = 1;
        unit.base_moves = 4;
        unit.cargo.push(GoodsSnapshot {
            kind: "furs".into(),
            amount: 100,
        });

        let redacted = redact_unit(&unit);
        assert!(redacted.orders.is_none());
        assert!(!redacted.automated);
        assert_eq!(redacted.moves_left, 4);
        assert!(redacted.cargo.is_empty());
    }

    #[test]
    fn owner_sees_unit_unredacted() {
        let mut unit = unit_at(1, PlayerId(0), TileId::new(0, 0));
        unit.orders = Some(UnitOrders::Sentry);

        let owner = TestView::new(PlayerId(0));
        assert_eq!(unit_for(&owner, &unit), unit);

        let stranger = TestView::new(PlayerId(1));
        assert!(unit_for(&stranger, &unit).orders.is_none());
    }
}
