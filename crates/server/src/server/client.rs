//! Client session state.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client, as seen by the simulation. Keyed by its agent id.
#[derive(Debug, Clone)]
pub struct Session {
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

impl Session {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connected_at: Instant::now(),
        }
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
