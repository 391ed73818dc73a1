//! Snapshot payloads.
//!
//! A snapshot is a point-in-time copy of every agent and world entity.
//! The server builds one per broadcast; clients treat it as render input only.

use crate::{Color, Point, PowerKind};
use serde::{Deserialize, Serialize};

/// One agent as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    pub id: u32,
    pub name: String,
    pub color: Color,
    /// Head first.
    pub segments: Vec<Point>,
    pub score: u32,
    pub alive: bool,
    pub moving: bool,
    pub abilities: AbilityStates,
    #[serde(default)]
    pub powers: Vec<PowerKind>,
}

/// Cooldown and activation state of a single ability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilitySnapshot {
    pub cooldown_ms: u64,
    pub last_used_at: Option<u64>,
    pub active: bool,
    pub ends_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbilityStates {
    pub dash: AbilitySnapshot,
    pub bullets: AbilitySnapshot,
    pub magnet: AbilitySnapshot,
    pub shield: AbilitySnapshot,
}

/// All non-agent entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub size: f32,
    pub food: Vec<FoodSnapshot>,
    pub bonus_boxes: Vec<BonusBoxSnapshot>,
    pub hazards: Vec<HazardSnapshot>,
    pub interactive_objects: Vec<ObjectSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BonusKind {
    SpeedBonus,
    GrowthBonus,
    SpeedMalus,
    ShrinkMalus,
}

impl BonusKind {
    pub fn is_malus(self) -> bool {
        matches!(self, Self::SpeedMalus | Self::ShrinkMalus)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusBoxSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: BonusKind,
    /// Speed multiplier or segment amount, depending on `kind`.
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HazardSnapshot {
    /// Axis-aligned rectangle anchored at its top-left corner.
    MovingWall {
        id: u32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        vx: f32,
        vy: f32,
    },
    PoisonZone {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
        intensity: f32,
    },
    SpeedTrap {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
    },
    Teleporter {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
        rotation: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectSnapshot {
    #[serde(rename_all = "camelCase")]
    Portal {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
        linked_id: u32,
    },
    BouncePad {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
        direction: f32,
        power: f32,
    },
    Checkpoint {
        id: u32,
        x: f32,
        y: f32,
        radius: f32,
        activated: bool,
    },
    /// Rectangle centred on `(x, y)`.
    TreasureChest {
        id: u32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        opened: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: i32,
    pub owner_id: u32,
}
