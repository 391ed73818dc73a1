//! Food pellet.

use glam::Vec2;
use protocol::{Color, FoodSnapshot};
use rand::Rng;

/// Collision radius of a food pellet.
pub const FOOD_RADIUS: f32 = 6.0;

const FOOD_COLORS: [Color; 8] = [
    Color::new(0xFF, 0x6B, 0x6B),
    Color::new(0x4E, 0xCD, 0xC4),
    Color::new(0x45, 0xB7, 0xD1),
    Color::new(0x96, 0xCE, 0xB4),
    Color::new(0xFF, 0xEA, 0xA7),
    Color::new(0xDD, 0xA0, 0xDD),
    Color::new(0xFF, 0x9F, 0x43),
    Color::new(0x26, 0xDE, 0x81),
];

/// A food pellet that agents eat to grow.
#[derive(Debug, Clone)]
pub struct Food {
    pub id: u32,
    pub position: Vec2,
    pub color: Color,
}

impl Food {
    /// Create a food pellet with a random palette color.
    pub fn new(id: u32, position: Vec2) -> Self {
        let color = FOOD_COLORS[rand::rng().random_range(0..FOOD_COLORS.len())];
        Self { id, position, color }
    }

    pub fn snapshot(&self) -> FoodSnapshot {
        FoodSnapshot {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            color: self.color,
        }
    }
}
