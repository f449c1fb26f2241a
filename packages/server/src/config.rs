//! Server configuration.
//!
//! Command-line flags (with environment fallbacks) are parsed by clap into
//! [`ServerConfig`], which is then validated into the plain structs the rest
//! of the crate consumes.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Args;
use thiserror::Error;

/// Default capacity of each connection's outbound buffer
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// Time allowed to write a frame to the peer
pub const DEFAULT_WRITE_WAIT: Duration = Duration::from_secs(10);
/// Time allowed between two pongs from the peer
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(60);
/// Maximum inbound message size in bytes
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("ping period {ping:?} must be shorter than pong wait {pong:?}")]
    PingNotBelowPong { ping: Duration, pong: Duration },

    #[error("invalid listen address {0}")]
    InvalidAddress(String),
}

/// Keepalive and framing limits of one connection.
///
/// The ping period is always derived from the pong wait (90% of it) so the
/// two cannot drift apart and evict idle-but-alive clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    pub write_wait: Duration,
    pub pong_wait: Duration,
    pub ping_period: Duration,
    pub max_message_size: usize,
}

impl KeepaliveConfig {
    pub fn new(
        write_wait: Duration,
        pong_wait: Duration,
        max_message_size: usize,
    ) -> Result<Self, ConfigError> {
        if write_wait.is_zero() {
            return Err(ConfigError::Zero("write wait"));
        }
        if max_message_size == 0 {
            return Err(ConfigError::Zero("max message size"));
        }
        let ping_period = pong_wait * 9 / 10;
        if ping_period.is_zero() || ping_period >= pong_wait {
            return Err(ConfigError::PingNotBelowPong {
                ping: ping_period,
                pong: pong_wait,
            });
        }
        Ok(Self {
            write_wait,
            pong_wait,
            ping_period,
            max_message_size,
        })
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            write_wait: DEFAULT_WRITE_WAIT,
            pong_wait: DEFAULT_PONG_WAIT,
            ping_period: DEFAULT_PONG_WAIT * 9 / 10,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Per-connection settings shared by every connection of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Outbound buffer capacity; a full buffer never blocks a producer
    pub outbound_capacity: usize,
    /// Whether a team broadcast also reaches the sending connection
    pub echo_to_sender: bool,
    pub keepalive: KeepaliveConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            echo_to_sender: true,
            keepalive: KeepaliveConfig::default(),
        }
    }
}

/// Command-line configuration of the `serve` command
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HUBBUB_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "HUBBUB_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// JSON file seeding the in-memory channel directory
    #[arg(long, env = "HUBBUB_CHANNELS_FILE")]
    pub channels_file: Option<PathBuf>,

    /// Capacity of each connection's outbound buffer
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    pub outbound_capacity: usize,

    /// Seconds allowed for writing one frame
    #[arg(long, default_value_t = DEFAULT_WRITE_WAIT.as_secs())]
    pub write_wait_secs: u64,

    /// Seconds allowed between pongs before the connection is dropped
    #[arg(long, default_value_t = DEFAULT_PONG_WAIT.as_secs())]
    pub pong_wait_secs: u64,

    /// Maximum inbound message size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,

    /// Do not echo team broadcasts back to the sending connection
    #[arg(long)]
    pub no_echo: bool,
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
    }

    /// Validated per-connection settings.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        if self.outbound_capacity == 0 {
            return Err(ConfigError::Zero("outbound capacity"));
        }
        let keepalive = KeepaliveConfig::new(
            Duration::from_secs(self.write_wait_secs),
            Duration::from_secs(self.pong_wait_secs),
            self.max_message_size,
        )?;
        Ok(ConnectionConfig {
            outbound_capacity: self.outbound_capacity,
            echo_to_sender: !self.no_echo,
            keepalive,
        })
    }
}
