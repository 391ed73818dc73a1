//! Authoritative snake-arena simulation and websocket server.

pub mod collision;
pub mod config;
pub mod entity;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{run, serve, Command, Frame, GameState, Outbound, Recipient};
