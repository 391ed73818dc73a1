//! Persistent hazards.
//!
//! Hazards are spawned once with the world and are never replenished. Each
//! variant owns its geometry and, where it has one, its re-trigger cooldown.

use crate::world::WorldBorder;
use glam::Vec2;
use protocol::HazardSnapshot;
use std::f32::consts::TAU;

pub const MOVING_WALL_SIZE: Vec2 = Vec2::new(20.0, 100.0);
/// Distance a head is pushed away from a wall's center.
pub const WALL_BOUNCE_DISTANCE: f32 = 50.0;

pub const POISON_RADIUS: f32 = 80.0;
pub const POISON_COOLDOWN_MS: u64 = 1000;

pub const SPEED_TRAP_RADIUS: f32 = 60.0;
pub const SPEED_TRAP_FACTOR: f32 = 0.3;
pub const SPEED_TRAP_EFFECT_MS: u64 = 10_000;
pub const SPEED_TRAP_COOLDOWN_MS: u64 = 2000;

pub const TELEPORTER_RADIUS: f32 = 25.0;
pub const TELEPORTER_COOLDOWN_MS: u64 = 2000;
const TELEPORTER_SPIN: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub enum HazardKind {
    /// Rectangle anchored at its top-left corner, drifting by `velocity` each tick.
    MovingWall { origin: Vec2, velocity: Vec2 },
    PoisonZone {
        center: Vec2,
        intensity: f32,
        last_damage_at: Option<u64>,
    },
    SpeedTrap {
        center: Vec2,
        last_triggered_at: Option<u64>,
    },
    Teleporter {
        center: Vec2,
        rotation: f32,
        last_triggered_at: Option<u64>,
    },
}

#[derive(Debug, Clone)]
pub struct Hazard {
    pub id: u32,
    pub kind: HazardKind,
}

impl Hazard {
    pub fn moving_wall(id: u32, origin: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            kind: HazardKind::MovingWall { origin, velocity },
        }
    }

    pub fn poison_zone(id: u32, center: Vec2) -> Self {
        Self {
            id,
            kind: HazardKind::PoisonZone {
                center,
                intensity: 0.5,
                last_damage_at: None,
            },
        }
    }

    pub fn speed_trap(id: u32, center: Vec2) -> Self {
        Self {
            id,
            kind: HazardKind::SpeedTrap {
                center,
                last_triggered_at: None,
            },
        }
    }

    pub fn teleporter(id: u32, center: Vec2) -> Self {
        Self {
            id,
            kind: HazardKind::Teleporter {
                center,
                rotation: 0.0,
                last_triggered_at: None,
            },
        }
    }

    /// Center of the hazard's footprint.
    pub fn center(&self) -> Vec2 {
        match self.kind {
            HazardKind::MovingWall { origin, .. } => origin + MOVING_WALL_SIZE / 2.0,
            HazardKind::PoisonZone { center, .. }
            | HazardKind::SpeedTrap { center, .. }
            | HazardKind::Teleporter { center, .. } => center,
        }
    }

    /// Whether `point` touches the hazard. Circles are widened by `padding`;
    /// walls use a strict containment test.
    pub fn hits(&self, point: Vec2, padding: f32) -> bool {
        match self.kind {
            HazardKind::MovingWall { origin, .. } => {
                let max = origin + MOVING_WALL_SIZE;
                point.x >= origin.x && point.x <= max.x && point.y >= origin.y && point.y <= max.y
            }
            HazardKind::PoisonZone { center, .. } => point.distance(center) < POISON_RADIUS + padding,
            HazardKind::SpeedTrap { center, .. } => point.distance(center) < SPEED_TRAP_RADIUS + padding,
            HazardKind::Teleporter { center, .. } => point.distance(center) < TELEPORTER_RADIUS + padding,
        }
    }

    /// Whether the hazard's own cooldown has elapsed. Walls have none.
    pub fn ready(&self, now: u64) -> bool {
        let (last, cooldown) = match self.kind {
            HazardKind::MovingWall { .. } => return true,
            HazardKind::PoisonZone { last_damage_at, .. } => (last_damage_at, POISON_COOLDOWN_MS),
            HazardKind::SpeedTrap { last_triggered_at, .. } => (last_triggered_at, SPEED_TRAP_COOLDOWN_MS),
            HazardKind::Teleporter { last_triggered_at, .. } => (last_triggered_at, TELEPORTER_COOLDOWN_MS),
        };
        last.is_none_or(|at| now.saturating_sub(at) >= cooldown)
    }

    pub fn mark_triggered(&mut self, now: u64) {
        match &mut self.kind {
            HazardKind::MovingWall { .. } => {}
            HazardKind::PoisonZone { last_damage_at, .. } => *last_damage_at = Some(now),
            HazardKind::SpeedTrap { last_triggered_at, .. }
            | HazardKind::Teleporter { last_triggered_at, .. } => *last_triggered_at = Some(now),
        }
    }

    /// Per-tick animation. Walls drift and bounce off the border unless `frozen`.
    pub fn update(&mut self, dt: f32, now: u64, border: &WorldBorder, frozen: bool) {
        match &mut self.kind {
            HazardKind::MovingWall { origin, velocity } => {
                if frozen {
                    return;
                }
                *origin += *velocity * dt;
                let max = Vec2::splat(border.size) - MOVING_WALL_SIZE;
                if origin.x <= 0.0 || origin.x >= max.x {
                    velocity.x = -velocity.x;
                    origin.x = origin.x.clamp(0.0, max.x);
                }
                if origin.y <= 0.0 || origin.y >= max.y {
                    velocity.y = -velocity.y;
                    origin.y = origin.y.clamp(0.0, max.y);
                }
            }
            HazardKind::PoisonZone { intensity, .. } => {
                *intensity = (0.3 + (now as f64 * 0.005).sin() * 0.3) as f32;
            }
            HazardKind::SpeedTrap { .. } => {}
            HazardKind::Teleporter { rotation, .. } => {
                *rotation = (*rotation + TELEPORTER_SPIN * dt) % TAU;
            }
        }
    }

    pub fn snapshot(&self) -> HazardSnapshot {
        let id = self.id;
        match self.kind {
            HazardKind::MovingWall { origin, velocity } => HazardSnapshot::MovingWall {
                id,
                x: origin.x,
                y: origin.y,
                width: MOVING_WALL_SIZE.x,
                height: MOVING_WALL_SIZE.y,
                vx: velocity.x,
                vy: velocity.y,
            },
            HazardKind::PoisonZone { center, intensity, .. } => HazardSnapshot::PoisonZone {
                id,
                x: center.x,
                y: center.y,
                radius: POISON_RADIUS,
                intensity,
            },
            HazardKind::SpeedTrap { center, .. } => HazardSnapshot::SpeedTrap {
                id,
                x: center.x,
                y: center.y,
                radius: SPEED_TRAP_RADIUS,
            },
            HazardKind::Teleporter { center, rotation, .. } => HazardSnapshot::Teleporter {
                id,
                x: center.x,
                y: center.y,
                radius: TELEPORTER_RADIUS,
                rotation,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_bounces_off_border() {
        let border = WorldBorder::new(1000.0);
        let mut wall = Hazard::moving_wall(1, Vec2::new(0.5, 500.0), Vec2::new(-1.0, 0.0));
        wall.update(1.0, 0, &border, false);
        match wall.kind {
            HazardKind::MovingWall { origin, velocity } => {
                assert_eq!(origin.x, 0.0);
                assert_eq!(velocity.x, 1.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_frozen_wall_stays_put() {
        let border = WorldBorder::new(1000.0);
        let mut wall = Hazard::moving_wall(1, Vec2::new(500.0, 500.0), Vec2::new(0.7, -0.4));
        wall.update(1.0, 0, &border, true);
        assert_eq!(wall.center(), Vec2::new(510.0, 550.0));
    }

    #[test]
    fn test_wall_hit_is_rectangular() {
        let wall = Hazard::moving_wall(1, Vec2::new(100.0, 100.0), Vec2::ZERO);
        assert!(wall.hits(Vec2::new(110.0, 190.0), 10.0));
        assert!(!wall.hits(Vec2::new(125.0, 150.0), 10.0));
    }

    #[test]
    fn test_cooldown() {
        let mut trap = Hazard::speed_trap(2, Vec2::new(300.0, 300.0));
        assert!(trap.ready(0));
        trap.mark_triggered(100);
        assert!(!trap.ready(2099));
        assert!(trap.ready(2100));
        assert!(trap.hits(Vec2::new(369.0, 300.0), 10.0));
        assert!(!trap.hits(Vec2::new(370.0, 300.0), 10.0));
    }

    #[test]
    fn test_poison_intensity_pulses() {
        let border = WorldBorder::new(1000.0);
        let mut zone = Hazard::poison_zone(3, Vec2::new(500.0, 500.0));
        for now in [0, 314, 628, 942] {
            zone.update(1.0, now, &border, false);
            if let HazardKind::PoisonZone { intensity, .. } = zone.kind {
                assert!((0.0..=0.6).contains(&intensity));
            }
        }
    }
}
