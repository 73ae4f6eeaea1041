//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: SocketAddr,
    /// Maximum players allowed (2-8)
    pub max_players: u8,
    /// Maximum observers allowed
    pub max_observers: u8,
    /// Grace period before AI takeover on disconnect
    pub disconnect_grace: Duration,
    /// Per-client rate limit settings
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_players: 8,
            max_observers: 4,
            disconnect_grace: Duration::from_secs(60),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_bind_address() -> SocketAddr {
    use std::net::{IpAddr, Ipv4Addr};
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 7777)
}

/// Per-client message rate limit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Messages allowed per window
    pub messages: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            messages: 60,
            window: Duration::from_secs(1),
        }
    }
}
