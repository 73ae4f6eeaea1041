//! Session lifecycle: join, disconnect, reconnect, AI takeover.
//!
//! Connection state and the player registry are managed together so a
//! disconnect racing a reconnect cannot leave a token pointing at a ghost.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;
use tracing::{info, warn};

use meridian_protocol::PlayerId;

use crate::config::{RateLimitConfig, ServerConfig};

/// Session lifecycle state
#[derive(Clone, Debug)]
pub enum SessionState {
    /// Connected and playing
    Connected {
        connected_at: Instant,
        last_activity: Instant,
    },
    /// Disconnected, in grace period
    Disconnected { disconnected_at: Instant },
    /// AI has taken over after grace period
    AiControlled { takeover_at: Instant },
}

/// One player's session record
#[derive(Clone, Debug)]
pub struct Session {
    pub player_id: PlayerId,
    pub name: String,
    pub client_id: Option<u64>,
    pub reconnect_token: String,
    pub state: SessionState,
    pub is_observer: bool,
    /// Rate limiting: message count in current window
    message_count: u32,
    /// Rate limiting: window start time
    rate_window_start: Instant,
}

/// Errors for session operations
#[derive(Clone, Debug, thiserror::Error)]
pub enum SessionError {
    #[error("game is full")]
    GameFull,
    #[error("observers full")]
    ObserversFull,
    #[error("no player slot available")]
    NoFreeSlot,
    #[error("invalid reconnect token")]
    InvalidToken,
    #[error("player already connected")]
    AlreadyConnected,
}

/// Registry of all sessions, keyed by player id.
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,
    client_to_player: HashMap<u64, PlayerId>,
    tokens: HashMap<String, PlayerId>,
    config: ServerConfig,
}

impl SessionManager {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            client_to_player: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Admit a new client, issuing a player id and a reconnect token.
    pub fn join(
        &mut self,
        client_id: u64,
        name: String,
        is_observer: bool,
    ) -> Result<(PlayerId, String), SessionError> {
        if is_observer {
            if self.observer_count() >= self.config.max_observers as usize {
                return Err(SessionError::ObserversFull);
            }
        } else if self.player_count() >= self.config.max_players as usize {
            return Err(SessionError::GameFull);
        }

        let player_id = self.next_player_id()?;
        let token = generate_token();
        let now = Instant::now();

        let session = Session {
            player_id,
            name: name.clone(),
            client_id: Some(client_id),
            reconnect_token: token.clone(),
            state: SessionState::Connected {
                connected_at: now,
                last_activity: now,
            },
            is_observer,
            message_count: 0,
            rate_window_start: now,
        };

        self.sessions.insert(player_id, session);
        self.client_to_player.insert(client_id, player_id);
        self.tokens.insert(token.clone(), player_id);

        info!(player = player_id.0, name = %name, is_observer, "player joined");
        Ok((player_id, token))
    }

    /// Mark a client disconnected; the session enters its grace period.
    pub fn disconnect(&mut self, client_id: u64) -> Option<PlayerId> {
        let player_id = self.client_to_player.remove(&client_id)?;
        let session = self.sessions.get_mut(&player_id)?;

        if let SessionState::Connected { .. } = session.state {
            session.state = SessionState::Disconnected {
                disconnected_at: Instant::now(),
            };
            session.client_id = None;
            warn!(player = player_id.0, "player disconnected, grace period started");
        }

        Some(player_id)
    }

    /// Reconnect a client using their token. Re-entry is allowed from both
    /// the grace period and AI control; the caller decides whether to hand
    /// control back.
    pub fn reconnect(&mut self, client_id: u64, token: &str) -> Result<PlayerId, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;

        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Connected { .. } => Err(SessionError::AlreadyConnected),
            SessionState::Disconnected { .. } | SessionState::AiControlled { .. } => {
                let now = Instant::now();
                session.state = SessionState::Connected {
                    connected_at: now,
                    last_activity: now,
                };
                session.client_id = Some(client_id);
                self.client_to_player.insert(client_id, player_id);
                info!(player = player_id.0, "player reconnected");
                Ok(player_id)
            }
        }
    }

    /// Expire grace periods. Returns the players whose control flipped to
    /// AI; the caller broadcasts an AI-control change set for each.
    pub fn process_disconnections(&mut self) -> Vec<PlayerId> {
        let now = Instant::now();
        let grace = self.config.disconnect_grace;
        let mut takeovers = Vec::new();

        for session in self.sessions.values_mut() {
            if session.is_observer {
                continue;
            }
            if let SessionState::Disconnected { disconnected_at } = session.state {
                if now.duration_since(disconnected_at) >= grace {
                    session.state = SessionState::AiControlled { takeover_at: now };
                    warn!(player = session.player_id.0, "grace expired, AI takeover");
                    takeovers.push(session.player_id);
                }
            }
        }

        takeovers
    }

    /// Count a message against the client's window. False means over limit.
    pub fn check_rate_limit(&mut self, client_id: u64) -> bool {
        let Some(player_id) = self.client_to_player.get(&client_id).copied() else {
            // Unknown client, let the message through for error handling.
            return true;
        };
        let Some(session) = self.sessions.get_mut(&player_id) else {
            return true;
        };

        let RateLimitConfig { messages, window } = self.config.rate_limit;
        let now = Instant::now();
        if now.duration_since(session.rate_window_start) >= window {
            session.rate_window_start = now;
            session.message_count = 0;
        }
        session.message_count += 1;
        session.message_count <= messages
    }

    /// Refresh the activity timestamp for a connected client.
    pub fn update_activity(&mut self, client_id: u64) {
        if let Some(player_id) = self.client_to_player.get(&client_id) {
            if let Some(session) = self.sessions.get_mut(player_id) {
                if let SessionState::Connected { last_activity, .. } = &mut session.state {
                    *last_activity = Instant::now();
                }
            }
        }
    }

    pub fn session(&self, player_id: PlayerId) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    pub fn player_for_client(&self, client_id: u64) -> Option<PlayerId> {
        self.client_to_player.get(&client_id).copied()
    }

    pub fn client_for_player(&self, player_id: PlayerId) -> Option<u64> {
        self.sessions.get(&player_id).and_then(|s| s.client_id)
    }

    /// Connected, non-observer players.
    pub fn connected_players(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .sessions
            .values()
            .filter(|s| !s.is_observer)
            .filter(|s| matches!(s.state, SessionState::Connected { .. }))
            .map(|s| s.player_id)
            .collect();
        ids.sort_by_key(|p| p.0);
        ids
    }

    pub fn player_count(&self) -> usize {
        self.sessions.values().filter(|s| !s.is_observer).count()
    }

    pub fn observer_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_observer).count()
    }

    fn next_player_id(&self) -> Result<PlayerId, SessionError> {
        (0..u8::MAX)
            .map(PlayerId)
            .find(|id| !self.sessions.contains_key(id))
            .ok_or(SessionError::NoFreeSlot)
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}
