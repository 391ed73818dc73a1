//! World state management.
//!
//! Owns every non-agent entity. Food and bonus boxes are kept at their target
//! populations by replacing consumed entities on the spot; hazards and
//! interactive objects are spawned once and only ever removed.

use crate::config::WorldConfig;
use crate::entity::{BonusBox, BonusEffect, Bullet, Food, Hazard, InteractiveObject, ObjectKind, BOUNCE_PAD_POWER};
use glam::Vec2;
use protocol::WorldSnapshot;
use rand::Rng;
use std::f32::consts::TAU;

/// Margin kept between a fresh spawn and the border.
const SPAWN_MARGIN: f32 = 100.0;

/// Square world bounds, `[0, size]` on both axes.
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub size: f32,
}

impl WorldBorder {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::splat(self.size / 2.0)
    }

    /// Get a random position within the border.
    #[inline]
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(rng.random_range(0.0..self.size), rng.random_range(0.0..self.size))
    }

    /// Random agent spawn point, away from the edges.
    pub fn random_spawn(&self) -> Vec2 {
        let mut rng = rand::rng();
        let max = self.size - SPAWN_MARGIN;
        Vec2::new(
            rng.random_range(SPAWN_MARGIN..max),
            rng.random_range(SPAWN_MARGIN..max),
        )
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(Vec2::ZERO, Vec2::splat(self.size))
    }

    /// Mirror a point that left the world back inside it.
    pub fn reflect(&self, point: Vec2) -> Vec2 {
        Vec2::new(reflect_axis(point.x, self.size), reflect_axis(point.y, self.size))
    }
}

fn reflect_axis(mut value: f32, max: f32) -> f32 {
    if value < 0.0 {
        value = -value;
    }
    if value > max {
        value = 2.0 * max - value;
    }
    // A jump longer than the whole world can still land outside after one fold.
    value.clamp(0.0, max)
}

/// The game world containing all non-agent entities.
#[derive(Debug)]
pub struct World {
    /// Next entity ID to assign.
    next_entity_id: u32,

    pub border: WorldBorder,
    pub food: Vec<Food>,
    pub bonus_boxes: Vec<BonusBox>,
    pub hazards: Vec<Hazard>,
    pub objects: Vec<InteractiveObject>,
    pub bullets: Vec<Bullet>,

    food_target: usize,
    bonus_target: usize,
}

impl World {
    /// Create an empty world. Use [`World::populate`] to spawn entities.
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            next_entity_id: 1,
            border: WorldBorder::new(config.size),
            food: Vec::with_capacity(config.food_count),
            bonus_boxes: Vec::with_capacity(config.bonus_box_count),
            hazards: Vec::new(),
            objects: Vec::new(),
            bullets: Vec::new(),
            food_target: config.food_count,
            bonus_target: config.bonus_box_count,
        }
    }

    /// Spawn the initial populations of every entity family.
    pub fn populate(&mut self, config: &WorldConfig) {
        while self.food.len() < self.food_target {
            self.spawn_food();
        }
        while self.bonus_boxes.len() < self.bonus_target {
            self.spawn_bonus_box();
        }
        self.spawn_hazards(config);
        self.spawn_objects(config);
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1).max(1);
        id
    }

    pub fn food_target(&self) -> usize {
        self.food_target
    }

    pub fn bonus_target(&self) -> usize {
        self.bonus_target
    }

    pub fn spawn_food(&mut self) -> u32 {
        let id = self.next_id();
        let position = self.border.random_position();
        self.food.push(Food::new(id, position));
        id
    }

    /// Spawn a box with a weighted-random effect.
    pub fn spawn_bonus_box(&mut self) -> u32 {
        let effect = BonusEffect::random(&mut rand::rng());
        self.spawn_bonus_box_with(effect, self.border.random_position())
    }

    pub fn spawn_bonus_box_with(&mut self, effect: BonusEffect, position: Vec2) -> u32 {
        let id = self.next_id();
        self.bonus_boxes.push(BonusBox::new(id, position, effect));
        id
    }

    /// Remove the food at `index` and spawn its replacement in the same call.
    pub fn replace_food(&mut self, index: usize) -> Food {
        let eaten = self.food.swap_remove(index);
        self.spawn_food();
        eaten
    }

    /// Remove the box at `index` and spawn a freshly rolled one.
    pub fn replace_bonus_box(&mut self, index: usize) -> BonusBox {
        let taken = self.bonus_boxes.swap_remove(index);
        self.spawn_bonus_box();
        taken
    }

    fn spawn_hazards(&mut self, config: &WorldConfig) {
        let mut rng = rand::rng();
        for _ in 0..config.moving_walls {
            let id = self.next_id();
            let velocity = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            let origin = self.border.random_position();
            self.hazards.push(Hazard::moving_wall(id, origin, velocity));
        }
        for _ in 0..config.poison_zones {
            let id = self.next_id();
            self.hazards.push(Hazard::poison_zone(id, self.border.random_position()));
        }
        for _ in 0..config.speed_traps {
            let id = self.next_id();
            self.hazards.push(Hazard::speed_trap(id, self.border.random_position()));
        }
        for _ in 0..config.teleporters {
            let id = self.next_id();
            self.hazards.push(Hazard::teleporter(id, self.border.random_position()));
        }
    }

    fn spawn_objects(&mut self, config: &WorldConfig) {
        let mut rng = rand::rng();
        for _ in 0..config.portal_pairs {
            let (a, b) = (self.next_id(), self.next_id());
            let (pos_a, pos_b) = (self.border.random_position(), self.border.random_position());
            self.objects.push(InteractiveObject::new(a, pos_a, ObjectKind::Portal { linked: b }));
            self.objects.push(InteractiveObject::new(b, pos_b, ObjectKind::Portal { linked: a }));
        }
        for _ in 0..config.bounce_pads {
            let id = self.next_id();
            let kind = ObjectKind::BouncePad {
                direction: rng.random_range(0.0..TAU),
                power: BOUNCE_PAD_POWER,
            };
            self.objects.push(InteractiveObject::new(id, self.border.random_position(), kind));
        }
        for _ in 0..config.checkpoints {
            let id = self.next_id();
            let kind = ObjectKind::Checkpoint { activated: false };
            self.objects.push(InteractiveObject::new(id, self.border.random_position(), kind));
        }
        for _ in 0..config.treasure_chests {
            let id = self.next_id();
            let kind = ObjectKind::TreasureChest { opened: false };
            self.objects.push(InteractiveObject::new(id, self.border.random_position(), kind));
        }
    }

    pub fn add_hazard(&mut self, build: impl FnOnce(u32) -> Hazard) -> u32 {
        let id = self.next_id();
        self.hazards.push(build(id));
        id
    }

    pub fn add_object(&mut self, position: Vec2, kind: ObjectKind) -> u32 {
        let id = self.next_id();
        self.objects.push(InteractiveObject::new(id, position, kind));
        id
    }

    pub fn object_position(&self, id: u32) -> Option<Vec2> {
        self.objects.iter().find(|o| o.id == id).map(|o| o.position)
    }

    /// Fire a bullet ring from `origin`.
    pub fn spawn_bullet_burst(&mut self, origin: Vec2, owner: u32) {
        self.bullets.extend(Bullet::burst(origin, owner));
    }

    /// Pull food and bonus boxes within `range` of `head` toward it.
    pub fn apply_magnet(&mut self, head: Vec2, range: f32) {
        let pull = |position: &mut Vec2| {
            let offset = head - *position;
            let distance = offset.length();
            if distance > 0.0 && distance < range {
                let force = (300.0 / distance).max(1.0).min(distance);
                *position += offset / distance * force;
            }
        };
        self.food.iter_mut().for_each(|f| pull(&mut f.position));
        self.bonus_boxes.iter_mut().for_each(|b| pull(&mut b.position));
    }

    /// Animate hazards for one tick.
    pub fn update_hazards(&mut self, dt: f32, now: u64, frozen: bool) {
        let border = self.border;
        for hazard in &mut self.hazards {
            hazard.update(dt, now, &border, frozen);
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            size: self.border.size,
            food: self.food.iter().map(Food::snapshot).collect(),
            bonus_boxes: self.bonus_boxes.iter().map(BonusBox::snapshot).collect(),
            hazards: self.hazards.iter().map(Hazard::snapshot).collect(),
            interactive_objects: self.objects.iter().map(InteractiveObject::snapshot).collect(),
            bullets: self.bullets.iter().map(Bullet::snapshot).collect(),
        }
    }
}
