//! Server -> Client messages.

use crate::{AbilityKind, AgentSnapshot, ProtocolError, WorldSnapshot};
use serde::{Deserialize, Serialize};

/// A message emitted by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full snapshot, sent once to a newly joined client.
    #[serde(rename_all = "camelCase")]
    GameState {
        your_id: u32,
        timestamp: u64,
        players: Vec<AgentSnapshot>,
        world: WorldSnapshot,
    },
    /// Periodic broadcast snapshot.
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        timestamp: u64,
        players: Vec<AgentSnapshot>,
        world: WorldSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: AgentSnapshot },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: u32 },
    #[serde(rename_all = "camelCase")]
    PlayerDied { player_id: u32 },
    #[serde(rename_all = "camelCase")]
    PlayerRespawned { player_id: u32, player: AgentSnapshot },
    #[serde(rename_all = "camelCase")]
    AbilityUsed { player_id: u32, ability: AbilityKind },
    #[serde(rename_all = "camelCase")]
    PlayerEaten {
        eater_id: u32,
        victim_id: u32,
        eater_name: String,
        victim_name: String,
        growth_gained: u32,
    },
}

impl ServerMessage {
    /// Parse a server message from a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Envelope tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameState { .. } => "gameState",
            Self::GameUpdate { .. } => "gameUpdate",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::PlayerDied { .. } => "playerDied",
            Self::PlayerRespawned { .. } => "playerRespawned",
            Self::AbilityUsed { .. } => "abilityUsed",
            Self::PlayerEaten { .. } => "playerEaten",
        }
    }
}
