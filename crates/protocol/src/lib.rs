//! Shared protocol crate for snake-arena.
//!
//! This crate contains:
//! - The JSON message envelopes exchanged over the websocket
//! - Snapshot types describing agents and world entities
//! - Shared types (Color, Point, ability and power names)

mod error;
pub mod packets;
pub mod snapshot;

pub use error::ProtocolError;
pub use packets::{ClientMessage, ServerMessage};
pub use snapshot::{
    AbilitySnapshot, AbilityStates, AgentSnapshot, BonusBoxSnapshot, BonusKind, BulletSnapshot,
    FoodSnapshot, HazardSnapshot, ObjectSnapshot, WorldSnapshot,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color, carried on the wire as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ProtocolError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ProtocolError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ProtocolError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

/// A 2D point as it appears on the wire (`{"x": .., "y": ..}`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<glam::Vec2> for Point {
    fn from(v: glam::Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point> for glam::Vec2 {
    fn from(p: Point) -> Self {
        glam::Vec2::new(p.x, p.y)
    }
}

/// The four player-triggered abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbilityKind {
    Dash,
    Bullets,
    Magnet,
    Shield,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 4] = [Self::Dash, Self::Bullets, Self::Magnet, Self::Shield];
}

/// Temporary powers granted by treasure chests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerKind {
    GhostMode,
    DoubleScore,
    FreezeTime,
    Invincibility,
}

impl PowerKind {
    pub const ALL: [PowerKind; 4] = [
        Self::GhostMode,
        Self::DoubleScore,
        Self::FreezeTime,
        Self::Invincibility,
    ];

    /// How long the power lasts once granted.
    pub const fn duration_ms(self) -> u64 {
        match self {
            Self::GhostMode => 15_000,
            Self::DoubleScore => 30_000,
            Self::FreezeTime => 5_000,
            Self::Invincibility => 15_000,
        }
    }
}
