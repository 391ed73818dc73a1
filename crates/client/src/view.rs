//! Client-side view of one simulation instance.
//!
//! Applies every server message to a local copy of the game and exposes what a
//! renderer needs: interpolated agent poses, the latest world snapshot and a
//! leaderboard.

use crate::interpolation::RemoteAgent;
use glam::Vec2;
use protocol::{AbilityKind, AgentSnapshot, ServerMessage, WorldSnapshot};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Something a presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The server accepted us and assigned our agent id.
    Welcome { your_id: u32 },
    PlayerJoined { id: u32, name: String },
    PlayerLeft { id: u32 },
    PlayerDied { id: u32, local: bool },
    PlayerRespawned { id: u32, local: bool },
    AbilityUsed { id: u32, ability: AbilityKind },
    PlayerEaten {
        eater_name: String,
        victim_name: String,
        growth_gained: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: u32,
    pub name: String,
    pub score: u32,
    pub is_local: bool,
}

#[derive(Debug, Default)]
pub struct ClientView {
    local_id: Option<u32>,
    agents: BTreeMap<u32, RemoteAgent>,
    world: WorldSnapshot,
    /// Simulation time of the newest snapshot applied.
    server_time: Option<u64>,
}

impl ClientView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn world(&self) -> &WorldSnapshot {
        &self.world
    }

    pub fn server_time(&self) -> Option<u64> {
        self.server_time
    }

    pub fn agent(&self, id: u32) -> Option<&RemoteAgent> {
        self.agents.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &RemoteAgent> {
        self.agents.values()
    }

    /// Parse and apply one text frame. Undecodable frames are logged and dropped.
    pub fn handle_text(&mut self, text: &str, now: f64) -> Option<ClientEvent> {
        match ServerMessage::parse(text) {
            Ok(message) => self.apply(message, now),
            Err(e) => {
                warn!("Failed to decode server message: {}", e);
                None
            }
        }
    }

    /// Apply one server message received at local time `now` (ms).
    pub fn apply(&mut self, message: ServerMessage, now: f64) -> Option<ClientEvent> {
        match message {
            ServerMessage::GameState {
                your_id,
                timestamp,
                players,
                world,
            } => {
                self.local_id = Some(your_id);
                self.agents = players
                    .iter()
                    .map(|p| (p.id, RemoteAgent::new(p, now)))
                    .collect();
                self.world = world;
                self.server_time = Some(timestamp);
                Some(ClientEvent::Welcome { your_id })
            }
            ServerMessage::GameUpdate {
                timestamp,
                players,
                world,
            } => {
                if self.server_time.is_some_and(|t| timestamp < t) {
                    debug!("Ignoring stale snapshot at {} (have {:?})", timestamp, self.server_time);
                    return None;
                }
                self.sync_agents(&players, now);
                self.world = world;
                self.server_time = Some(timestamp);
                None
            }
            ServerMessage::PlayerJoined { player } => {
                let event = ClientEvent::PlayerJoined {
                    id: player.id,
                    name: player.name.clone(),
                };
                self.agents.insert(player.id, RemoteAgent::new(&player, now));
                Some(event)
            }
            ServerMessage::PlayerLeft { player_id } => {
                self.agents.remove(&player_id);
                Some(ClientEvent::PlayerLeft { id: player_id })
            }
            ServerMessage::PlayerDied { player_id } => {
                if let Some(agent) = self.agents.get_mut(&player_id) {
                    agent.alive = false;
                    agent.moving = false;
                }
                Some(ClientEvent::PlayerDied {
                    id: player_id,
                    local: self.is_local(player_id),
                })
            }
            ServerMessage::PlayerRespawned { player_id, player } => {
                // A respawn is a jump, not motion; start a fresh buffer.
                self.agents.insert(player_id, RemoteAgent::new(&player, now));
                Some(ClientEvent::PlayerRespawned {
                    id: player_id,
                    local: self.is_local(player_id),
                })
            }
            ServerMessage::AbilityUsed { player_id, ability } => Some(ClientEvent::AbilityUsed {
                id: player_id,
                ability,
            }),
            ServerMessage::PlayerEaten {
                eater_name,
                victim_name,
                growth_gained,
                ..
            } => Some(ClientEvent::PlayerEaten {
                eater_name,
                victim_name,
                growth_gained,
            }),
        }
    }

    fn sync_agents(&mut self, players: &[AgentSnapshot], now: f64) {
        self.agents
            .retain(|id, _| players.iter().any(|p| p.id == *id));
        for player in players {
            match self.agents.get_mut(&player.id) {
                Some(agent) => agent.apply_snapshot(player, now),
                None => {
                    self.agents.insert(player.id, RemoteAgent::new(player, now));
                }
            }
        }
    }

    fn is_local(&self, id: u32) -> bool {
        self.local_id == Some(id)
    }

    /// Interpolated pose of every agent at `now`.
    pub fn render_poses(&self, now: f64) -> Vec<(u32, Vec<Vec2>)> {
        self.agents
            .values()
            .map(|agent| (agent.id, agent.render_pose(now)))
            .collect()
    }

    /// Alive agents ordered by score, highest first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .agents
            .values()
            .filter(|agent| agent.alive)
            .map(|agent| LeaderboardEntry {
                id: agent.id,
                name: agent.name.clone(),
                score: agent.score,
                is_local: self.is_local(agent.id),
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        entries
    }
}
