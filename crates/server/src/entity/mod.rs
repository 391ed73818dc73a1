//! Game entities.
//!
//! Agents plus every kind of world entity they interact with.

mod agent;
mod bonus_box;
mod bullet;
mod food;
mod hazard;
mod object;

pub use agent::{Abilities, Ability, Agent, SpeedEffect, ARRIVAL_RADIUS, HEAD_RADIUS, MIN_SEGMENTS, SEGMENT_SPACING};
pub use bonus_box::{BonusBox, BonusEffect, BONUS_BOX_RADIUS, SPEED_EFFECT_MS};
pub use bullet::{Bullet, BULLET_LIFE, BULLET_SIZE, BULLET_SPEED, BURST_SIZE};
pub use food::{Food, FOOD_RADIUS};
pub use hazard::{
    Hazard, HazardKind, MOVING_WALL_SIZE, SPEED_TRAP_EFFECT_MS, SPEED_TRAP_FACTOR, WALL_BOUNCE_DISTANCE,
};
pub use object::{InteractiveObject, ObjectKind, BOUNCE_DISTANCE_PER_POWER, BOUNCE_PAD_POWER, INTERACTION_COOLDOWN_MS};
