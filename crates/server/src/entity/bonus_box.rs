//! Bonus and malus boxes.

use glam::Vec2;
use protocol::{BonusBoxSnapshot, BonusKind};
use rand::Rng;

/// Collision radius of a bonus box.
pub const BONUS_BOX_RADIUS: f32 = 12.0;
/// How long a box's speed effect lasts.
pub const SPEED_EFFECT_MS: u64 = 15_000;

const SPEED_BONUS_MULTIPLIERS: [f32; 3] = [2.0, 3.0, 5.0];
const GROWTH_BONUS_AMOUNTS: [u32; 5] = [10, 20, 30, 40, 50];
const SPEED_MALUS_MULTIPLIERS: [f32; 3] = [0.5, 0.75, 1.0];
const SHRINK_MALUS_AMOUNT: u32 = 10;

/// What a box does when collected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BonusEffect {
    SpeedBonus { multiplier: f32 },
    GrowthBonus { amount: u32 },
    SpeedMalus { multiplier: f32 },
    ShrinkMalus { amount: u32 },
}

impl BonusEffect {
    /// Weighted draw: 30% speed bonus, 20% growth bonus, 25% speed malus, 25% shrink malus.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f32 = rng.random();
        if roll < 0.3 {
            Self::SpeedBonus {
                multiplier: pick(rng, &SPEED_BONUS_MULTIPLIERS),
            }
        } else if roll < 0.5 {
            Self::GrowthBonus {
                amount: pick(rng, &GROWTH_BONUS_AMOUNTS),
            }
        } else if rng.random_bool(0.5) {
            Self::SpeedMalus {
                multiplier: pick(rng, &SPEED_MALUS_MULTIPLIERS),
            }
        } else {
            Self::ShrinkMalus {
                amount: SHRINK_MALUS_AMOUNT,
            }
        }
    }

    pub fn kind(&self) -> BonusKind {
        match self {
            Self::SpeedBonus { .. } => BonusKind::SpeedBonus,
            Self::GrowthBonus { .. } => BonusKind::GrowthBonus,
            Self::SpeedMalus { .. } => BonusKind::SpeedMalus,
            Self::ShrinkMalus { .. } => BonusKind::ShrinkMalus,
        }
    }

    pub fn is_malus(&self) -> bool {
        self.kind().is_malus()
    }

    fn value(&self) -> f32 {
        match *self {
            Self::SpeedBonus { multiplier } | Self::SpeedMalus { multiplier } => multiplier,
            Self::GrowthBonus { amount } | Self::ShrinkMalus { amount } => amount as f32,
        }
    }
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, options: &[T]) -> T {
    options[rng.random_range(0..options.len())]
}

/// A collectible box.
#[derive(Debug, Clone)]
pub struct BonusBox {
    pub id: u32,
    pub position: Vec2,
    pub effect: BonusEffect,
}

impl BonusBox {
    pub fn new(id: u32, position: Vec2, effect: BonusEffect) -> Self {
        Self { id, position, effect }
    }

    pub fn snapshot(&self) -> BonusBoxSnapshot {
        BonusBoxSnapshot {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            kind: self.effect.kind(),
            value: self.effect.value(),
        }
    }
}
