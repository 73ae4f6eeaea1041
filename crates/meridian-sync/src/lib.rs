//! Change propagation for the Meridian server.
//!
//! Server-side rule code records what happened as [`Change`]s in a
//! [`ChangeSet`]; this crate decides per player what they are allowed to
//! learn and composes a single outgoing [`Message`](meridian_protocol::Message)
//! for each of them. Visibility, redaction, consequence generation, priority
//! ordering and fragment merging all live here; the transport does not.

pub mod change;
pub mod change_set;
pub mod observer;
pub mod redact;
pub mod visibility;

#[cfg(test)]
mod fixtures;

pub use change::{Change, ChangeError};
pub use change_set::ChangeSet;
pub use observer::Observer;
pub use visibility::{Level, Scope, Visibility};
