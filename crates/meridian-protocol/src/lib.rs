//! Wire-facing protocol for Meridian.
//!
//! Typed ids, recipient-visible snapshot records, the update-message catalog
//! with its priority table and merge rules, and the wire codec. The policy
//! for deciding who receives which message lives in `meridian-sync`; this
//! crate only defines the data that crosses the wire.

pub mod ids;
pub mod message;
pub mod priority;
pub mod snapshot;
pub mod wire;

pub use ids::{EntityId, ObjectId, PlayerId, SettlementId, TileId, UnitId};
pub use message::{merge_attribute_entries, Message, Stance};
pub use priority::Priority;
pub use snapshot::{
    GoodsSnapshot, ObjectSnapshot, PlayerSnapshot, SettlementSnapshot, TileSnapshot, UnitOrders,
    UnitSnapshot,
};
pub use wire::{payload_hash, WireError};
