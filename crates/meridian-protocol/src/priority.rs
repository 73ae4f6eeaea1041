//! Relative send order for message kinds.
//!
//! The numeric levels are an explicit table, not a formula: clients depend on
//! the wire order (animations play before removals, stance changes land
//! before object updates), so the values are pinned by tests and must not be
//! renumbered casually. Note that `Last` (99) sorts before `Removal` (100);
//! removal messages really do go out last.

use serde::{Deserialize, Serialize};

/// Send priority for a message kind. Lower levels are sent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Sentinel for attribute-only messages. These never enter the sorted
    /// list; they are diverted to the envelope's attribute bag.
    Attribute,
    Animation,
    Early,
    Stance,
    Partial,
    Update,
    Normal,
    Owned,
    Late,
    Last,
    Removal,
}

impl Priority {
    pub const fn level(self) -> i32 {
        match self {
            Self::Attribute => -1,
            Self::Animation => 0,
            Self::Early => 1,
            Self::Stance => 5,
            Self::Partial => 9,
            Self::Update => 10,
            Self::Normal => 15,
            Self::Owned => 20,
            Self::Late => 90,
            Self::Last => 99,
            Self::Removal => 100,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level().cmp(&other.level())
    }
}
