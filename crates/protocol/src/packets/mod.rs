//! Message envelopes.
//!
//! Every frame is a UTF-8 JSON object tagged by a `type` field.

mod client;
mod server;

pub use client::ClientMessage;
pub use server::ServerMessage;
