//! All possible server→client update messages. Fully serializable.
//!
//! One message kind exists per change kind, plus the attribute bag, the
//! client error report, and the `Multi` envelope that coalesces a whole
//! change set into a single outbound unit.

use serde::{Deserialize, Serialize};

use crate::{
    ObjectId, ObjectSnapshot, PlayerId, PlayerSnapshot, Priority, SettlementSnapshot, TileId,
    UnitId, UnitSnapshot,
};

/// Diplomatic stance between two players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    War,
    Ceasefire,
    Peace,
    Alliance,
}

/// One recipient-specific protocol unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Full object refresh. Carries one or more objects after merging.
    Update { objects: Vec<ObjectSnapshot> },
    /// Field-level update for an object the recipient already knows.
    Partial {
        object: ObjectId,
        fields: Vec<(String, String)>,
    },
    /// Pure attribute bag (e.g. `sound=bell`). Trivially mergeable; never
    /// enters the priority-sorted list.
    Attributes { entries: Vec<(String, String)> },
    /// Feature added to or removed from a parent object.
    Feature {
        parent: ObjectId,
        add: bool,
        features: Vec<String>,
        #[serde(default)]
        tile: Option<TileId>,
    },
    /// Unit movement animation.
    Animate {
        unit: UnitSnapshot,
        from: TileId,
        to: TileId,
    },
    /// Combat animation. Participant objects are attached only when the
    /// recipient could not otherwise see them.
    Attack {
        attacker: UnitId,
        defender: UnitId,
        from: TileId,
        to: TileId,
        success: bool,
        #[serde(default)]
        attacker_object: Option<UnitSnapshot>,
        #[serde(default)]
        defender_object: Option<UnitSnapshot>,
    },
    /// Objects leaving the recipient's view. The main object is last.
    Remove {
        tile: TileId,
        objects: Vec<ObjectId>,
    },
    /// A player joined the game.
    AddPlayer { player: PlayerSnapshot },
    /// Diplomatic stance change between two players.
    SetStance {
        first: PlayerId,
        second: PlayerId,
        stance: Stance,
    },
    /// Result of a spy mission: the full settlement for the spying player.
    SpyReport {
        unit: UnitId,
        settlement: SettlementSnapshot,
    },
    /// Templated, localizable failure report for one recipient.
    Error {
        template: String,
        #[serde(default)]
        params: Vec<(String, String)>,
        #[serde(default)]
        diagnostic: Option<String>,
    },
    /// Envelope wrapping an ordered list of messages plus merged attributes.
    Multi {
        messages: Vec<Message>,
        #[serde(default)]
        attributes: Vec<(String, String)>,
    },
}

impl Message {
    /// Serde tag of this kind, as written on the wire.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Update { .. } => "Update",
            Self::Partial { .. } => "Partial",
            Self::Attributes { .. } => "Attributes",
            Self::Feature { .. } => "Feature",
            Self::Animate { .. } => "Animate",
            Self::Attack { .. } => "Attack",
            Self::Remove { .. } => "Remove",
            Self::AddPlayer { .. } => "AddPlayer",
            Self::SetStance { .. } => "SetStance",
            Self::SpyReport { .. } => "SpyReport",
            Self::Error { .. } => "Error",
            Self::Multi { .. } => "Multi",
        }
    }

    pub const fn priority(&self) -> Priority {
        match self {
            Self::Attributes { .. } => Priority::Attribute,
            Self::Animate { .. } | Self::Attack { .. } => Priority::Animation,
            Self::AddPlayer { .. } => Priority::Early,
            Self::SetStance { .. } => Priority::Stance,
            Self::Partial { .. } => Priority::Partial,
            Self::Update { .. } => Priority::Update,
            Self::Feature { .. } | Self::Multi { .. } => Priority::Normal,
            Self::SpyReport { .. } => Priority::Owned,
            Self::Error { .. } => Priority::Late,
            Self::Remove { .. } => Priority::Removal,
        }
    }

    /// True only for pure attribute bags, which bypass the sorted list.
    pub const fn is_trivial(&self) -> bool {
        matches!(self, Self::Attributes { .. })
    }

    /// Attempt to absorb `other` into `self`.
    ///
    /// Returns `None` when `other` was merged in, or hands `other` back when
    /// the two are incompatible. Incompatibility is control flow, not an
    /// error: the caller flushes its accumulator and starts a new one.
    pub fn try_merge(&mut self, other: Message) -> Option<Message> {
        match (&mut *self, other) {
            (Self::Update { objects }, Self::Update { objects: mut more }) => {
                objects.append(&mut more);
                None
            }
            (Self::Attributes { entries }, Self::Attributes { entries: more }) => {
                merge_attribute_entries(entries, more);
                None
            }
            (
                Self::Partial { object, fields },
                Self::Partial {
                    object: other_object,
                    fields: more,
                },
            ) if *object == other_object => {
                merge_attribute_entries(fields, more);
                None
            }
            (
                Self::Feature {
                    parent,
                    add,
                    features,
                    ..
                },
                Self::Feature {
                    parent: other_parent,
                    add: other_add,
                    features: more,
                    ..
                },
            ) if *parent == other_parent && *add == other_add => {
                for feature in more {
                    if !features.contains(&feature) {
                        features.push(feature);
                    }
                }
                None
            }
            (_, other) => Some(other),
        }
    }

    /// Construct an empty envelope.
    pub const fn multi() -> Self {
        Self::Multi {
            messages: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Append a sub-message to an envelope. Ignored on other kinds.
    pub fn push(&mut self, message: Message) {
        if let Self::Multi { messages, .. } = self {
            messages.push(message);
        }
    }

    /// Merge attribute entries into an envelope's bag (or directly into an
    /// attribute bag message). Ignored on other kinds.
    pub fn absorb_attributes(&mut self, src: Vec<(String, String)>) {
        match self {
            Self::Multi { attributes, .. } => merge_attribute_entries(attributes, src),
            Self::Attributes { entries } => merge_attribute_entries(entries, src),
            _ => {}
        }
    }

    /// Collapse an envelope that adds no information.
    ///
    /// An empty envelope disappears (unless it carries attributes); an
    /// envelope around exactly one message unwraps to that message, with the
    /// attribute bag pushed onto it when the message is itself an attribute
    /// bag. Envelopes with two or more messages pass through unchanged, as
    /// does any non-envelope message.
    pub fn simplify(self) -> Option<Message> {
        let (mut messages, attributes) = match self {
            Self::Multi {
                messages,
                attributes,
            } => (messages, attributes),
            other => return Some(other),
        };

        if messages.len() > 1 {
            return Some(Self::Multi {
                messages,
                attributes,
            });
        }

        let Some(inner) = messages.pop() else {
            if attributes.is_empty() {
                return None;
            }
            return Some(Self::Multi {
                messages,
                attributes,
            });
        };

        if attributes.is_empty() {
            return Some(inner);
        }

        // Only an attribute-bag message accepts externally merged attributes.
        if let Self::Attributes { mut entries } = inner {
            merge_attribute_entries(&mut entries, attributes);
            return Some(Self::Attributes { entries });
        }

        Some(Self::Multi {
            messages: vec![inner],
            attributes,
        })
    }
}

/// Union `src` into `dst`, last write winning per key.
pub fn merge_attribute_entries(dst: &mut Vec<(String, String)>, src: Vec<(String, String)>) {
    for (key, value) in src {
        if let Some(slot) = dst.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            dst.push((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityId, TileSnapshot};

    fn tile_object(q: i32) -> ObjectSnapshot {
        ObjectSnapshot::Tile(TileSnapshot {
            tile: TileId::new(q, 0),
            terrain: "plains".into(),
            owner: None,
            settlement: None,
            improvement: None,
        })
    }

    fn update(q: i32) -> Message {
        Message::Update {
            objects: vec![tile_object(q)],
        }
    }

    #[test]
    fn updates_always_merge() {
        let mut a = update(1);
        assert!(a.try_merge(update(2)).is_none());
        match a {
            Message::Update { objects } => assert_eq!(objects.len(), 2),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn merge_is_union_of_effects() {
        // Merging b into a must equal constructing a∪b directly.
        let mut merged = update(1);
        merged.try_merge(update(2));
        let direct = Message::Update {
            objects: vec![tile_object(1), tile_object(2)],
        };
        assert_eq!(merged, direct);
    }

    #[test]
    fn attribute_bags_union_with_last_write_wins() {
        let mut a = Message::Attributes {
            entries: vec![("sound".into(), "bell".into())],
        };
        let b = Message::Attributes {
            entries: vec![("sound".into(), "drum".into()), ("flash".into(), "1".into())],
        };
        assert!(a.try_merge(b).is_none());
        match a {
            Message::Attributes { entries } => {
                assert_eq!(
                    entries,
                    vec![
                        ("sound".to_string(), "drum".to_string()),
                        ("flash".to_string(), "1".to_string())
                    ]
                );
            }
            other => panic!("expected Attributes, got {other:?}"),
        }
    }

    #[test]
    fn features_merge_only_with_same_parent_and_direction() {
        let parent = ObjectId::Unit(EntityId::new(1, 0));
        let mut add = Message::Feature {
            parent,
            add: true,
            features: vec!["mission".into()],
            tile: None,
        };
        let remove = Message::Feature {
            parent,
            add: false,
            features: vec!["mission".into()],
            tile: None,
        };
        // Opposite direction is rejected and handed back.
        let rejected = add.try_merge(remove.clone());
        assert_eq!(rejected, Some(remove));

        let more = Message::Feature {
            parent,
            add: true,
            features: vec!["mission".into(), "charter".into()],
            tile: None,
        };
        assert!(add.try_merge(more).is_none());
        match add {
            Message::Feature { features, .. } => {
                assert_eq!(features, vec!["mission".to_string(), "charter".to_string()]);
            }
            other => panic!("expected Feature, got {other:?}"),
        }
    }

    #[test]
    fn partials_merge_only_for_same_object() {
        let object = ObjectId::Player(PlayerId(2));
        let mut a = Message::Partial {
            object,
            fields: vec![("gold".into(), "10".into())],
        };
        let other_object = Message::Partial {
            object: ObjectId::Player(PlayerId(3)),
            fields: vec![("gold".into(), "5".into())],
        };
        assert!(a.try_merge(other_object).is_some());

        let same_object = Message::Partial {
            object,
            fields: vec![("score".into(), "7".into())],
        };
        assert!(a.try_merge(same_object).is_none());
    }

    #[test]
    fn unrelated_kinds_reject() {
        let mut a = update(1);
        let stance = Message::SetStance {
            first: PlayerId(0),
            second: PlayerId(1),
            stance: Stance::War,
        };
        assert_eq!(a.try_merge(stance.clone()), Some(stance));
    }

    #[test]
    fn envelope_accumulates_messages_and_attributes() {
        let mut envelope = Message::multi();
        envelope.push(update(1));
        envelope.absorb_attributes(vec![("sound".into(), "bell".into())]);
        envelope.absorb_attributes(vec![("sound".into(), "drum".into())]);
        match envelope {
            Message::Multi {
                messages,
                attributes,
            } => {
                assert_eq!(messages.len(), 1);
                assert_eq!(attributes, vec![("sound".to_string(), "drum".to_string())]);
            }
            other => panic!("expected Multi, got {other:?}"),
        }
    }

    #[test]
    fn simplify_empty_envelope_vanishes() {
        assert_eq!(Message::multi().simplify(), None);
    }

    #[test]
    fn simplify_unwraps_singleton() {
        let inner = update(1);
        let wrapped = Message::Multi {
            messages: vec![inner.clone()],
            attributes: vec![],
        };
        assert_eq!(wrapped.simplify(), Some(inner));
    }

    #[test]
    fn simplify_keeps_attribute_only_envelope() {
        let wrapped = Message::Multi {
            messages: vec![],
            attributes: vec![("sound".into(), "bell".into())],
        };
        match wrapped.simplify() {
            Some(Message::Multi { attributes, .. }) => assert_eq!(attributes.len(), 1),
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn simplify_pushes_bag_onto_attribute_singleton() {
        let wrapped = Message::Multi {
            messages: vec![Message::Attributes {
                entries: vec![("flash".into(), "1".into())],
            }],
            attributes: vec![("sound".into(), "bell".into())],
        };
        match wrapped.simplify() {
            Some(Message::Attributes { entries }) => assert_eq!(entries.len(), 2),
            other => panic!("expected Attributes, got {other:?}"),
        }
    }

    #[test]
    fn simplify_keeps_wrapper_for_non_attribute_singleton_with_bag() {
        let wrapped = Message::Multi {
            messages: vec![update(1)],
            attributes: vec![("sound".into(), "bell".into())],
        };
        match wrapped.simplify() {
            Some(Message::Multi {
                messages,
                attributes,
            }) => {
                assert_eq!(messages.len(), 1);
                assert_eq!(attributes.len(), 1);
            }
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn simplify_passes_multi_element_envelope_through() {
        let wrapped = Message::Multi {
            messages: vec![update(1), update(2)],
            attributes: vec![],
        };
        match wrapped.simplify() {
            Some(Message::Multi { messages, .. }) => assert_eq!(messages.len(), 2),
            other => panic!("expected envelope, got {other:?}"),
        }
    }
}
