//! Client -> Server messages.

use crate::{AbilityKind, ProtocolError};
use serde::{Deserialize, Serialize};

/// Parsed client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// New aim point for the sender's agent.
    UpdateTarget {
        x: f32,
        y: f32,
        #[serde(default = "default_moving")]
        moving: bool,
    },
    /// Trigger one of the four abilities.
    UseAbility {
        #[serde(alias = "name")]
        ability: AbilityKind,
    },
    /// Bring a dead agent back.
    Respawn,
}

fn default_moving() -> bool {
    true
}

impl ClientMessage {
    /// Parse a client message from a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        if let ClientMessage::UpdateTarget { x, y, .. } = message {
            if !x.is_finite() || !y.is_finite() {
                return Err(ProtocolError::NonFiniteCoordinate("updateTarget"));
            }
        }
        Ok(message)
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
