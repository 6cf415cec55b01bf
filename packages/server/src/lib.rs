//! Multi-room WebSocket chat server library.
//!
//! Clients land in a permanent lobby, pick a display name and chat. Slash
//! commands create or join rooms, `@name` tokens turn a line into a private
//! message, and rooms close on their own once the last member leaves.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::{ServerConfig, run as run_server};
