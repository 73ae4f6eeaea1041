//! Meridian Multiplayer Server
//!
//! Authoritative orchestration layer: session registry, per-player
//! perception views, and the broadcaster that composes and queues one
//! payload per connected recipient.

pub mod config;
pub mod dispatch;
pub mod session;
pub mod view;

pub use config::{RateLimitConfig, ServerConfig};
pub use dispatch::{channel_id, Broadcaster, DispatchError, Outbound};
pub use session::{Session, SessionError, SessionManager, SessionState};
pub use view::PlayerView;
