//! Who is allowed to learn about a change.
//!
//! A `Visibility` is attached to every [`Change`](crate::Change) and encodes
//! one of three base policies plus per-player overrides. Checking it yields a
//! three-valued answer: definitely visible, definitely invisible, or
//! "special", which defers to the change's own perception rule for this
//! observer.

use serde::{Deserialize, Serialize};

use meridian_protocol::PlayerId;

/// Base policy when no per-player override applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every connected player is told.
    All,
    /// Players are told if they can currently perceive the subject.
    Perhaps,
    /// Only the player named at construction is told.
    Only,
}

/// Result of checking a predicate against one observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Visible,
    Invisible,
    /// Defer to the change variant's own perception rule.
    Special,
}

/// Visibility predicate: base scope plus per-player overrides.
///
/// Builders normally set at most one override slot; the type does not
/// enforce this, callers must not contradict themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    scope: Scope,
    #[serde(default)]
    always: Option<PlayerId>,
    #[serde(default)]
    perhaps: Option<PlayerId>,
    #[serde(default)]
    never: Option<PlayerId>,
}

impl Visibility {
    /// Visible to everyone.
    pub const fn all() -> Self {
        Self {
            scope: Scope::All,
            always: None,
            perhaps: None,
            never: None,
        }
    }

    /// Visible to whoever can currently perceive the subject.
    pub const fn perhaps() -> Self {
        Self {
            scope: Scope::Perhaps,
            always: None,
            perhaps: None,
            never: None,
        }
    }

    /// Visible to exactly one player.
    pub const fn only(player: PlayerId) -> Self {
        Self {
            scope: Scope::Only,
            always: Some(player),
            perhaps: None,
            never: None,
        }
    }

    /// Force-exclude one player regardless of scope.
    pub const fn except(mut self, player: PlayerId) -> Self {
        self.never = Some(player);
        self
    }

    /// Force one player onto the perception-check path regardless of scope.
    pub const fn perhaps_only(mut self, player: PlayerId) -> Self {
        self.perhaps = Some(player);
        self
    }

    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Evaluate the predicate for one observer.
    ///
    /// Precedence: never-override, then always-override, then
    /// perhaps-override, then the base scope.
    pub fn check(&self, observer: PlayerId) -> Level {
        if self.never == Some(observer) {
            return Level::Invisible;
        }
        if self.always == Some(observer) {
            return Level::Visible;
        }
        if self.perhaps == Some(observer) {
            return Level::Special;
        }
        match self.scope {
            Scope::All => Level::Visible,
            Scope::Perhaps => Level::Special,
            Scope::Only => Level::Invisible,
        }
    }
}
