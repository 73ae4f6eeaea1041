//! Pending, recipient-agnostic records of "something happened".
//!
//! A `Change` wraps a [`Visibility`] predicate and knows three things per
//! observer: whether that observer should be told at all, how to render
//! itself into a recipient-specific [`Message`], and whether the rendering
//! decision implies a secondary change (e.g. a removal after a move out of
//! sight).
//!
//! The kind set is closed on purpose: every operation is an exhaustive
//! match, so a new kind cannot silently fall back to a wrong default rule.
//!
//! Changes own their payloads. Combat and movement snapshots are captured at
//! construction, never read back through to live domain objects: rendering
//! must not depend on when an observer's build happens to run.

use meridian_protocol::{
    Message, ObjectId, ObjectSnapshot, PlayerId, PlayerSnapshot, SettlementSnapshot, Stance,
    TileId, UnitSnapshot,
};
use thiserror::Error;

use crate::redact;
use crate::{Level, Observer, Visibility};

/// Malformed change detected at construction. A bad snapshot would corrupt
/// rendering much later, so these fail fast instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("removal change needs at least one object")]
    EmptyRemoval,
    #[error("attack change needs distinct attacker and defender")]
    SelfAttack,
    #[error("partial update needs at least one field")]
    EmptyPartial,
}

/// One pending mutation awaiting per-observer rendering.
#[derive(Clone, Debug)]
pub enum Change {
    /// Full refresh of one object.
    Update {
        visibility: Visibility,
        object: ObjectSnapshot,
    },
    /// Field-level update for an object the recipient already knows.
    Partial {
        visibility: Visibility,
        object: ObjectId,
        fields: Vec<(String, String)>,
    },
    /// A bare attribute pair; diverted to the envelope's attribute bag.
    Attribute {
        visibility: Visibility,
        key: String,
        value: String,
    },
    /// Feature added to or removed from a parent object.
    Feature {
        visibility: Visibility,
        parent: ObjectId,
        feature: String,
        add: bool,
        tile: Option<TileId>,
    },
    /// Unit movement between two tiles.
    Move {
        visibility: Visibility,
        unit: UnitSnapshot,
        old_tile: TileId,
        new_tile: TileId,
    },
    /// Combat between two units. Participants are frozen copies.
    Attack {
        visibility: Visibility,
        attacker: UnitSnapshot,
        defender: UnitSnapshot,
        success: bool,
        defender_in_settlement: bool,
    },
    /// Objects leaving play at a tile. The main object is last; anything
    /// before it is contents (e.g. goods inside a destroyed unit).
    Remove {
        visibility: Visibility,
        tile: TileId,
        settlement: Option<SettlementSnapshot>,
        objects: Vec<ObjectSnapshot>,
    },
    /// A player joined the game.
    PlayerJoin {
        visibility: Visibility,
        player: PlayerSnapshot,
    },
    /// Diplomatic stance change between two players.
    Stance {
        visibility: Visibility,
        first: PlayerId,
        second: PlayerId,
        stance: Stance,
    },
    /// Spy mission result; carries the full, unredacted settlement.
    Spy {
        visibility: Visibility,
        unit: UnitSnapshot,
        settlement: SettlementSnapshot,
    },
    /// A pre-rendered message carried through the pipeline as-is.
    Raw {
        visibility: Visibility,
        message: Message,
    },
}

impl Change {
    pub fn update(visibility: Visibility, object: ObjectSnapshot) -> Self {
        Self::Update { visibility, object }
    }

    pub fn partial(
        visibility: Visibility,
        object: ObjectId,
        fields: Vec<(String, String)>,
    ) -> Result<Self, ChangeError> {
        if fields.is_empty() {
            return Err(ChangeError::EmptyPartial);
        }
        Ok(Self::Partial {
            visibility,
            object,
            fields,
        })
    }

    pub fn attribute(
        visibility: Visibility,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Attribute {
            visibility,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn feature(
        visibility: Visibility,
        parent: ObjectId,
        feature: impl Into<String>,
        add: bool,
        tile: Option<TileId>,
    ) -> Self {
        Self::Feature {
            visibility,
            parent,
            feature: feature.into(),
            add,
            tile,
        }
    }

    /// Snapshot the moving unit; the live unit may change before rendering.
    pub fn movement(
        visibility: Visibility,
        unit: &UnitSnapshot,
        old_tile: TileId,
        new_tile: TileId,
    ) -> Self {
        Self::Move {
            visibility,
            unit: unit.clone(),
            old_tile,
            new_tile,
        }
    }

    /// Snapshot both combatants eagerly: either may be destroyed or healed
    /// between rule evaluation and an observer's build.
    pub fn attack(
        visibility: Visibility,
        attacker: &UnitSnapshot,
        defender: &UnitSnapshot,
        success: bool,
        defender_in_settlement: bool,
    ) -> Result<Self, ChangeError> {
        if attacker.id == defender.id {
            return Err(ChangeError::SelfAttack);
        }
        Ok(Self::Attack {
            visibility,
            attacker: attacker.clone(),
            defender: defender.clone(),
            success,
            defender_in_settlement,
        })
    }

    pub fn remove(
        visibility: Visibility,
        tile: TileId,
        settlement: Option<SettlementSnapshot>,
        objects: Vec<ObjectSnapshot>,
    ) -> Result<Self, ChangeError> {
        if objects.is_empty() {
            return Err(ChangeError::EmptyRemoval);
        }
        Ok(Self::Remove {
            visibility,
            tile,
            settlement,
            objects,
        })
    }

    pub fn player_join(visibility: Visibility, player: PlayerSnapshot) -> Self {
        Self::PlayerJoin { visibility, player }
    }

    pub fn stance(visibility: Visibility, first: PlayerId, second: PlayerId, stance: Stance) -> Self {
        Self::Stance {
            visibility,
            first,
            second,
            stance,
        }
    }

    /// Spy results are always scoped to the spying player.
    pub fn spy(spying_player: PlayerId, unit: &UnitSnapshot, settlement: &SettlementSnapshot) -> Self {
        Self::Spy {
            visibility: Visibility::only(spying_player),
            unit: unit.clone(),
            settlement: settlement.clone(),
        }
    }

    pub fn raw(visibility: Visibility, message: Message) -> Self {
        Self::Raw {
            visibility,
            message,
        }
    }

    pub fn visibility(&self) -> &Visibility {
        match self {
            Self::Update { visibility, .. }
            | Self::Partial { visibility, .. }
            | Self::Attribute { visibility, .. }
            | Self::Feature { visibility, .. }
            | Self::Move { visibility, .. }
            | Self::Attack { visibility, .. }
            | Self::Remove { visibility, .. }
            | Self::PlayerJoin { visibility, .. }
            | Self::Stance { visibility, .. }
            | Self::Spy { visibility, .. }
            | Self::Raw { visibility, .. } => visibility,
        }
    }

    /// Whether this observer should be told about the change at all.
    pub fn is_notifiable(&self, observer: &impl Observer) -> bool {
        match self.visibility().check(observer.id()) {
            Level::Visible => true,
            Level::Invisible => false,
            Level::Special => self.resolve_special(observer),
        }
    }

    /// Per-variant resolution of the SPECIAL visibility level.
    ///
    /// These rules are deliberately not uniform; each variant encodes its
    /// own perception policy and is tested independently.
    fn resolve_special(&self, observer: &impl Observer) -> bool {
        match self {
            Self::Update { object, .. } => observer.sees(object),
            // A bare id or key gives the observer nothing to perceive.
            Self::Partial { .. } | Self::Attribute { .. } | Self::Raw { .. } => false,
            Self::Feature { tile, .. } => tile.map(|t| observer.sees_tile(t)).unwrap_or(false),
            Self::Move {
                old_tile, new_tile, ..
            } => observer.sees_tile(*old_tile) || observer.sees_tile(*new_tile),
            // More permissive than per-unit perception on purpose: combat
            // must animate for anyone who can see the battlefield tiles,
            // even if a participant is hidden inside a settlement.
            Self::Attack {
                attacker, defender, ..
            } => {
                observer.owns_unit(attacker)
                    || observer.owns_unit(defender)
                    || (observer.sees_tile(attacker.tile) && observer.sees_tile(defender.tile))
            }
            Self::Remove {
                tile, settlement, ..
            } => {
                observer.sees_tile(*tile)
                    && settlement.as_ref().map_or(true, |s| {
                        s.disposed || s.owner == observer.id()
                    })
            }
            Self::PlayerJoin { .. } => true,
            Self::Stance { first, second, .. } => {
                observer.id() == *first || observer.id() == *second
            }
            // Spy results are constructed with only() scope; SPECIAL never
            // reveals them to anyone else.
            Self::Spy { .. } => false,
        }
    }

    /// Secondary change implied by this change's visibility outcome for one
    /// observer. Consequences do not chain further.
    pub fn consequence(&self, observer: &impl Observer) -> Option<Change> {
        match self {
            Self::Move {
                unit,
                old_tile,
                new_tile,
                ..
            } => {
                // A unit that walks out of an observer's view would linger
                // as a ghost without an explicit, observer-scoped removal.
                if observer.sees_tile(*old_tile)
                    && !observer.sees_tile(*new_tile)
                    && !unit.disposed
                {
                    let removal = Self::Remove {
                        visibility: Visibility::only(observer.id()),
                        tile: *old_tile,
                        settlement: None,
                        objects: vec![ObjectSnapshot::Unit(unit.clone())],
                    };
                    Some(removal)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Render the change for one observer, or `None` when not notifiable.
    /// Absence here is the normal filtering path, not a failure.
    pub fn to_message(&self, observer: &impl Observer) -> Option<Message> {
        if !self.is_notifiable(observer) {
            return None;
        }
        let message = match self {
            Self::Update { object, .. } => Message::Update {
                objects: vec![redact::object_for(observer, object)],
            },
            Self::Partial { object, fields, .. } => Message::Partial {
                object: *object,
                fields: fields.clone(),
            },
            Self::Attribute { key, value, .. } => Message::Attributes {
                entries: vec![(key.clone(), value.clone())],
            },
            Self::Feature {
                parent,
                feature,
                add,
                tile,
                ..
            } => Message::Feature {
                parent: *parent,
                add: *add,
                features: vec![feature.clone()],
                tile: *tile,
            },
            Self::Move {
                unit,
                old_tile,
                new_tile,
                ..
            } => Message::Animate {
                unit: redact::unit_for(observer, unit),
                from: *old_tile,
                to: *new_tile,
            },
            Self::Attack {
                attacker,
                defender,
                success,
                defender_in_settlement,
                ..
            } => {
                // Attach participant objects only when the recipient could
                // not already see them; anything else is redundant payload.
                let attacker_object = (!observer.sees_unit(attacker))
                    .then(|| redact::unit_for(observer, attacker));
                let defender_object = (!defender_in_settlement
                    && !observer.sees_unit(defender))
                .then(|| redact::unit_for(observer, defender));
                Message::Attack {
                    attacker: attacker.id,
                    defender: defender.id,
                    from: attacker.tile,
                    to: defender.tile,
                    success: *success,
                    attacker_object,
                    defender_object,
                }
            }
            Self::Remove { tile, objects, .. } => {
                let main = objects.last()?;
                // Non-owners never knew the internal contents; report only
                // the main object to them.
                let ids = if observer.owns(main) {
                    objects.iter().map(ObjectSnapshot::object_id).collect()
                } else {
                    vec![main.object_id()]
                };
                Message::Remove {
                    tile: *tile,
                    objects: ids,
                }
            }
            Self::PlayerJoin { player, .. } => Message::AddPlayer {
                player: player.clone(),
            },
            Self::Stance {
                first,
                second,
                stance,
                ..
            } => Message::SetStance {
                first: *first,
                second: *second,
                stance: *stance,
            },
            Self::Spy {
                unit, settlement, ..
            } => Message::SpyReport {
                unit: unit.id,
                settlement: settlement.clone(),
            },
            Self::Raw { message, .. } => message.clone(),
        };
        Some(message)
    }

    /// Identity test used for retraction. Only object-bearing variants can
    /// be retracted.
    pub fn matches(&self, object: ObjectId) -> bool {
        match self {
            Self::Update { object: o, .. } => o.object_id() == object,
            Self::Partial { object: o, .. } => *o == object,
            _ => false,
        }
    }
}
