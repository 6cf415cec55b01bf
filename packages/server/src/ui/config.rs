//! Command-line and environment configuration.

use clap::Parser;

use crate::{
    domain::{RoomName, ValueObjectError},
    infrastructure::registry::RegistryConfig,
};

/// Parlor multi-room chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "parlor-server")]
#[command(about = "Multi-room WebSocket chat server")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "PARLOR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PARLOR_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Name of the permanent lobby room
    #[arg(long, env = "PARLOR_LOBBY_NAME", default_value = "Lobby")]
    pub lobby_name: String,

    /// Treat room names that differ only in case as the same room
    #[arg(long, env = "PARLOR_CASE_INSENSITIVE_ROOM_NAMES")]
    pub case_insensitive_room_names: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PARLOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Registry settings derived from the flags.
    ///
    /// # Errors
    ///
    /// Returns a `ValueObjectError` if the lobby name is not a valid room name.
    pub fn registry_config(&self) -> Result<RegistryConfig, ValueObjectError> {
        let lobby_name = RoomName::new(self.lobby_name.clone())?;
        Ok(RegistryConfig {
            case_insensitive_names: self.case_insensitive_room_names,
            ..RegistryConfig::with_lobby(lobby_name)
        })
    }
}
