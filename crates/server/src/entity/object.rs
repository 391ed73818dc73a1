//! Interactive objects.

use glam::Vec2;
use protocol::ObjectSnapshot;

pub const PORTAL_RADIUS: f32 = 20.0;
pub const BOUNCE_PAD_RADIUS: f32 = 15.0;
pub const BOUNCE_PAD_POWER: f32 = 8.0;
/// Launch distance per unit of pad power.
pub const BOUNCE_DISTANCE_PER_POWER: f32 = 80.0;
pub const CHECKPOINT_RADIUS: f32 = 18.0;
pub const CHEST_SIZE: Vec2 = Vec2::new(30.0, 25.0);
/// Minimum time between two triggers of the same object by the same agent.
pub const INTERACTION_COOLDOWN_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Sends the head to the object with id `linked`.
    Portal { linked: u32 },
    /// `direction` in radians.
    BouncePad { direction: f32, power: f32 },
    Checkpoint { activated: bool },
    TreasureChest { opened: bool },
}

#[derive(Debug, Clone)]
pub struct InteractiveObject {
    pub id: u32,
    pub position: Vec2,
    pub kind: ObjectKind,
}

impl InteractiveObject {
    pub fn new(id: u32, position: Vec2, kind: ObjectKind) -> Self {
        Self { id, position, kind }
    }

    fn radius(&self) -> f32 {
        match self.kind {
            ObjectKind::Portal { .. } => PORTAL_RADIUS,
            ObjectKind::BouncePad { .. } => BOUNCE_PAD_RADIUS,
            ObjectKind::Checkpoint { .. } => CHECKPOINT_RADIUS,
            ObjectKind::TreasureChest { .. } => CHEST_SIZE.max_element() / 2.0,
        }
    }

    /// Whether `point` touches the object. Chests are a centred rectangle and
    /// ignore `padding`.
    pub fn hits(&self, point: Vec2, padding: f32) -> bool {
        match self.kind {
            ObjectKind::TreasureChest { .. } => {
                let half = CHEST_SIZE / 2.0;
                let offset = (point - self.position).abs();
                offset.x <= half.x && offset.y <= half.y
            }
            _ => point.distance(self.position) < self.radius() + padding,
        }
    }

    /// Checkpoints and chests are spent after their first use.
    pub fn is_consumed(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Checkpoint { activated: true } | ObjectKind::TreasureChest { opened: true }
        )
    }

    pub fn snapshot(&self) -> ObjectSnapshot {
        let (id, x, y) = (self.id, self.position.x, self.position.y);
        match self.kind {
            ObjectKind::Portal { linked } => ObjectSnapshot::Portal {
                id,
                x,
                y,
                radius: PORTAL_RADIUS,
                linked_id: linked,
            },
            ObjectKind::BouncePad { direction, power } => ObjectSnapshot::BouncePad {
                id,
                x,
                y,
                radius: BOUNCE_PAD_RADIUS,
                direction,
                power,
            },
            ObjectKind::Checkpoint { activated } => ObjectSnapshot::Checkpoint {
                id,
                x,
                y,
                radius: CHECKPOINT_RADIUS,
                activated,
            },
            ObjectKind::TreasureChest { opened } => ObjectSnapshot::TreasureChest {
                id,
                x,
                y,
                width: CHEST_SIZE.x,
                height: CHEST_SIZE.y,
                opened,
            },
        }
    }
}
