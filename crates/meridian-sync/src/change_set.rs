//! Accumulation of changes and per-recipient message composition.
//!
//! Rule code appends [`Change`]s as it mutates the game; at flush time the
//! server calls [`ChangeSet::build`] once per connected player. Build is a
//! pure function of the set and the observer, so the same set can be
//! rendered for any number of recipients in any order.

use tracing::trace;

use meridian_protocol::{Message, ObjectId, ObjectSnapshot, PlayerId, TileId};

use crate::change::{Change, ChangeError};
use crate::{Observer, Visibility};

/// An ordered batch of pending changes.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set carrying one error message for a single recipient.
    pub fn client_error(
        to: PlayerId,
        template: impl Into<String>,
        diagnostic: impl Into<String>,
    ) -> Self {
        let message = Message::Error {
            template: template.into(),
            params: vec![],
            diagnostic: Some(diagnostic.into()),
        };
        let mut set = Self::new();
        set.add(Change::raw(Visibility::only(to), message));
        set
    }

    /// A set announcing a player's AI-control flag to everyone.
    pub fn ai_control(player: PlayerId, is_ai: bool) -> Self {
        let mut set = Self::new();
        // The flag is public knowledge; a partial is enough, every client
        // already holds the player record.
        let fields = vec![("ai".to_string(), is_ai.to_string())];
        if let Ok(change) = Change::partial(Visibility::all(), ObjectId::Player(player), fields) {
            set.add(change);
        }
        set
    }

    pub fn add(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn add_update(&mut self, visibility: Visibility, object: ObjectSnapshot) -> &mut Self {
        self.add(Change::update(visibility, object))
    }

    pub fn add_partial(
        &mut self,
        visibility: Visibility,
        object: ObjectId,
        fields: Vec<(String, String)>,
    ) -> Result<&mut Self, ChangeError> {
        let change = Change::partial(visibility, object, fields)?;
        Ok(self.add(change))
    }

    pub fn add_attribute(
        &mut self,
        visibility: Visibility,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.add(Change::attribute(visibility, key, value))
    }

    pub fn add_message(&mut self, visibility: Visibility, message: Message) -> &mut Self {
        self.add(Change::raw(visibility, message))
    }

    pub fn add_remove(
        &mut self,
        visibility: Visibility,
        tile: TileId,
        objects: Vec<ObjectSnapshot>,
    ) -> Result<&mut Self, ChangeError> {
        let change = Change::remove(visibility, tile, None, objects)?;
        Ok(self.add(change))
    }

    /// Retract still-pending changes about an object, e.g. when a later rule
    /// disposes something an earlier rule updated. Returns how many were
    /// dropped.
    pub fn remove_matching(&mut self, object: ObjectId) -> usize {
        let before = self.changes.len();
        self.changes.retain(|change| !change.matches(object));
        before - self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Compose the full outgoing message for one observer.
    ///
    /// Pipeline: render each notifiable change (plus its one-level
    /// consequence), divert trivial attribute fragments into a side bag,
    /// stable-sort the rest by priority, merge adjacent compatibles, then
    /// simplify the envelope. `None` means this observer gets nothing.
    pub fn build(&self, observer: &impl Observer) -> Option<Message> {
        if self.changes.is_empty() {
            return None;
        }

        let mut main: Vec<Message> = Vec::new();
        let mut diverted: Vec<Message> = Vec::new();
        for change in &self.changes {
            if let Some(message) = change.to_message(observer) {
                if message.is_trivial() {
                    diverted.push(message);
                } else {
                    main.push(message);
                }
                // Consequences never chain: a consequence of a consequence
                // is not consulted.
                if let Some(extra) = change.consequence(observer) {
                    if let Some(message) = extra.to_message(observer) {
                        if message.is_trivial() {
                            diverted.push(message);
                        } else {
                            main.push(message);
                        }
                    }
                }
            }
        }
        trace!(
            observer = observer.id().0,
            pending = self.changes.len(),
            rendered = main.len(),
            diverted = diverted.len(),
            "composed change set"
        );

        // Stable sort keeps insertion order within a priority band.
        main.sort_by_key(|message| message.priority().level());

        let mut merged: Vec<Message> = Vec::new();
        for message in main {
            match merged.last_mut() {
                Some(last) => {
                    // A rejected merge is handed back and starts a new run;
                    // merging is adjacency-only, never across the batch.
                    if let Some(rejected) = last.try_merge(message) {
                        merged.push(rejected);
                    }
                }
                None => merged.push(message),
            }
        }

        let mut envelope = Message::multi();
        for message in merged {
            envelope.push(message);
        }
        for message in diverted {
            if let Message::Attributes { entries } = message {
                envelope.absorb_attributes(entries);
            }
        }
        envelope.simplify()
    }
}
