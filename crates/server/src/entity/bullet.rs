//! Bullets fired by the bullets ability.

use glam::Vec2;
use protocol::BulletSnapshot;
use std::f32::consts::TAU;

/// Collision size of a bullet.
pub const BULLET_SIZE: f32 = 4.0;
pub const BULLET_SPEED: f32 = 8.0;
/// Lifetime in ticks.
pub const BULLET_LIFE: i32 = 120;
/// Bullets per ability use.
pub const BURST_SIZE: usize = 16;

#[derive(Debug, Clone)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: i32,
    pub owner: u32,
}

impl Bullet {
    /// A ring of `BURST_SIZE` bullets evenly spaced in angle around `origin`.
    pub fn burst(origin: Vec2, owner: u32) -> impl Iterator<Item = Bullet> {
        (0..BURST_SIZE).map(move |i| {
            let angle = i as f32 / BURST_SIZE as f32 * TAU;
            Bullet {
                position: origin,
                velocity: Vec2::from_angle(angle) * BULLET_SPEED,
                life: BULLET_LIFE,
                owner,
            }
        })
    }

    /// Move one tick and burn one tick of life.
    pub fn advance(&mut self) {
        self.position += self.velocity;
        self.life -= 1;
    }

    pub fn is_spent(&self) -> bool {
        self.life <= 0
    }

    pub fn snapshot(&self) -> BulletSnapshot {
        BulletSnapshot {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            life: self.life,
            owner_id: self.owner,
        }
    }
}
