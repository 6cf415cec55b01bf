//! WebSocket chat server: HTTP routing, WebSocket sessions and startup.

mod config;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use config::ServerConfig;
pub use runner::{build_app, run};
