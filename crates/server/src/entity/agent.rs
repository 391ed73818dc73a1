//! Player-controlled snake.

use crate::config::AbilityConfig;
use crate::world::WorldBorder;
use glam::Vec2;
use protocol::{AbilityKind, AbilitySnapshot, AbilityStates, AgentSnapshot, Color, PowerKind};
use std::collections::{HashMap, VecDeque};

/// Maximum distance between consecutive segments.
pub const SEGMENT_SPACING: f32 = 20.0;
/// An agent never has fewer segments than this.
pub const MIN_SEGMENTS: usize = 5;
/// The head stops once it is this close to its target.
pub const ARRIVAL_RADIUS: f32 = 5.0;
/// Radius used for head pickups and hazard checks.
pub const HEAD_RADIUS: f32 = 10.0;

/// Cooldown bookkeeping for one ability.
#[derive(Debug, Clone, Copy)]
pub struct Ability {
    pub cooldown_ms: u64,
    /// Zero for instant abilities (dash, bullets).
    pub duration_ms: u64,
    pub last_used_at: Option<u64>,
    pub active: bool,
    pub ends_at: Option<u64>,
}

impl Ability {
    fn instant(cooldown_ms: u64) -> Self {
        Self::timed(cooldown_ms, 0)
    }

    fn timed(cooldown_ms: u64, duration_ms: u64) -> Self {
        Self {
            cooldown_ms,
            duration_ms,
            last_used_at: None,
            active: false,
            ends_at: None,
        }
    }

    /// Whether the cooldown has elapsed at `now`.
    pub fn ready(&self, now: u64) -> bool {
        self.last_used_at
            .is_none_or(|used| now.saturating_sub(used) >= self.cooldown_ms)
    }

    fn fire(&mut self, now: u64) {
        self.last_used_at = Some(now);
        if self.duration_ms > 0 {
            self.active = true;
            self.ends_at = Some(now + self.duration_ms);
        }
    }

    fn expire(&mut self, now: u64) {
        if self.active && self.ends_at.is_some_and(|end| now >= end) {
            self.active = false;
        }
    }

    fn snapshot(&self) -> AbilitySnapshot {
        AbilitySnapshot {
            cooldown_ms: self.cooldown_ms,
            last_used_at: self.last_used_at,
            active: self.active,
            ends_at: self.ends_at,
        }
    }
}

/// The fixed ability set every agent carries.
#[derive(Debug, Clone)]
pub struct Abilities {
    pub dash: Ability,
    pub bullets: Ability,
    pub magnet: Ability,
    pub shield: Ability,
}

impl Abilities {
    pub fn new(config: &AbilityConfig) -> Self {
        Self {
            dash: Ability::instant(config.cooldown_ms),
            bullets: Ability::instant(config.cooldown_ms),
            magnet: Ability::timed(config.cooldown_ms, config.magnet_duration_ms),
            shield: Ability::timed(config.cooldown_ms, config.shield_duration_ms),
        }
    }

    pub fn get(&self, kind: AbilityKind) -> &Ability {
        match kind {
            AbilityKind::Dash => &self.dash,
            AbilityKind::Bullets => &self.bullets,
            AbilityKind::Magnet => &self.magnet,
            AbilityKind::Shield => &self.shield,
        }
    }

    fn get_mut(&mut self, kind: AbilityKind) -> &mut Ability {
        match kind {
            AbilityKind::Dash => &mut self.dash,
            AbilityKind::Bullets => &mut self.bullets,
            AbilityKind::Magnet => &mut self.magnet,
            AbilityKind::Shield => &mut self.shield,
        }
    }

    fn expire(&mut self, now: u64) {
        for kind in AbilityKind::ALL {
            self.get_mut(kind).expire(now);
        }
    }

    fn deactivate(&mut self) {
        for kind in AbilityKind::ALL {
            self.get_mut(kind).active = false;
        }
    }
}

/// A timed speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedEffect {
    pub multiplier: f32,
    pub ends_at: u64,
}

/// A snake controlled by one connected player.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub color: Color,
    /// Head at index 0.
    segments: VecDeque<Vec2>,
    pub target: Vec2,
    pub moving: bool,
    base_speed: f32,
    speed: f32,
    /// Tail pops still owed to growth.
    pub growth_queue: u32,
    pub alive: bool,
    pub score: u32,
    pub abilities: Abilities,
    /// In application order; the last one wins.
    speed_effects: Vec<SpeedEffect>,
    /// Power -> expiry time.
    powers: HashMap<PowerKind, u64>,
}

impl Agent {
    /// Create a new agent with a fresh chain whose head sits at `spawn`.
    pub fn new(id: u32, color: Color, spawn: Vec2, base_speed: f32, abilities: &AbilityConfig) -> Self {
        Self {
            id,
            name: format!("Player {id}"),
            color,
            segments: initial_chain(spawn),
            target: spawn,
            moving: false,
            base_speed,
            speed: base_speed,
            growth_queue: 0,
            alive: true,
            score: 0,
            abilities: Abilities::new(abilities),
            speed_effects: Vec::new(),
            powers: HashMap::new(),
        }
    }

    #[inline]
    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    pub fn segments(&self) -> &VecDeque<Vec2> {
        &self.segments
    }

    /// Number of segments in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn shield_active(&self) -> bool {
        self.abilities.shield.active
    }

    pub fn magnet_active(&self) -> bool {
        self.abilities.magnet.active
    }

    pub fn has_power(&self, power: PowerKind) -> bool {
        self.powers.contains_key(&power)
    }

    /// Store a new aim point. Ignored while dead.
    pub fn set_target(&mut self, target: Vec2, moving: bool, border: &WorldBorder) {
        if !self.alive {
            return;
        }
        self.target = border.clamp(target);
        self.moving = moving;
    }

    /// Try to use an ability. Returns false, changing nothing, if dead or on cooldown.
    ///
    /// Bullets are spawned by the caller; this only stamps the cooldown for them.
    pub fn trigger_ability(
        &mut self,
        kind: AbilityKind,
        now: u64,
        dash_distance: f32,
        border: &WorldBorder,
    ) -> bool {
        if !self.alive {
            return false;
        }
        let ability = self.abilities.get_mut(kind);
        if !ability.ready(now) {
            return false;
        }
        ability.fire(now);

        if kind == AbilityKind::Dash {
            if let Some(heading) = (self.target - self.head()).try_normalize() {
                self.displace_head(heading * dash_distance, border);
            }
        }
        true
    }

    /// Step the head toward the target and drag the body behind it.
    ///
    /// `dt` is measured in ticks.
    pub fn advance(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        if self.moving {
            let head = self.head();
            let to_target = self.target - head;
            let distance = to_target.length();
            if distance < ARRIVAL_RADIUS {
                self.moving = false;
            } else {
                let step = (self.speed * dt).min(distance);
                self.segments.push_front(head + to_target / distance * step);
                if self.growth_queue > 0 {
                    self.growth_queue -= 1;
                } else {
                    self.segments.pop_back();
                }
            }
        }
        self.rechain();
    }

    /// Pull every trailing segment to within `SEGMENT_SPACING` of its predecessor.
    fn rechain(&mut self) {
        for i in 1..self.segments.len() {
            let leader = self.segments[i - 1];
            let offset = self.segments[i] - leader;
            let distance = offset.length();
            if distance > SEGMENT_SPACING {
                self.segments[i] = leader + offset / distance * SEGMENT_SPACING;
            }
        }
    }

    /// Move the head to `position`, reflected into the world.
    pub fn relocate_head(&mut self, position: Vec2, border: &WorldBorder) {
        self.segments[0] = border.reflect(position);
        self.rechain();
    }

    pub fn displace_head(&mut self, offset: Vec2, border: &WorldBorder) {
        self.relocate_head(self.head() + offset, border);
    }

    /// Relocate head and target together.
    pub fn teleport(&mut self, position: Vec2, border: &WorldBorder) {
        self.relocate_head(position, border);
        self.target = self.head();
    }

    pub fn apply_speed_effect(&mut self, multiplier: f32, now: u64, duration_ms: u64) {
        self.speed_effects.push(SpeedEffect {
            multiplier,
            ends_at: now + duration_ms,
        });
        self.recompute_speed();
    }

    pub fn grant_power(&mut self, power: PowerKind, now: u64) {
        self.powers.insert(power, now + power.duration_ms());
    }

    /// Drop expired abilities, speed effects and powers.
    pub fn update_effects(&mut self, now: u64) {
        self.abilities.expire(now);
        self.speed_effects.retain(|effect| effect.ends_at > now);
        self.powers.retain(|_, ends_at| *ends_at > now);
        self.recompute_speed();
    }

    fn recompute_speed(&mut self) {
        let multiplier = self.speed_effects.last().map_or(1.0, |e| e.multiplier);
        self.speed = self.base_speed * multiplier;
    }

    pub fn grow(&mut self, amount: u32) {
        self.growth_queue = self.growth_queue.saturating_add(amount);
    }

    /// Pop up to `amount` tail segments without going below `MIN_SEGMENTS`.
    /// Returns how many were removed.
    pub fn shrink(&mut self, amount: usize) -> usize {
        let removed = amount.min(self.segments.len().saturating_sub(MIN_SEGMENTS));
        self.segments.truncate(self.segments.len() - removed);
        removed
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn kill(&mut self) {
        self.alive = false;
        self.moving = false;
    }

    /// Fresh chain at `spawn`, cleared effects, score reduced by `penalty`.
    pub fn respawn(&mut self, spawn: Vec2, penalty: u32) {
        self.segments = initial_chain(spawn);
        self.target = spawn;
        self.moving = false;
        self.growth_queue = 0;
        self.speed_effects.clear();
        self.powers.clear();
        self.abilities.deactivate();
        self.speed = self.base_speed;
        self.score = self.score.saturating_sub(penalty);
        self.alive = true;
    }

    #[cfg(test)]
    pub(crate) fn set_segments(&mut self, segments: impl IntoIterator<Item = Vec2>) {
        self.segments = segments.into_iter().collect();
        self.target = self.head();
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let mut powers: Vec<PowerKind> = self.powers.keys().copied().collect();
        powers.sort();
        AgentSnapshot {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            segments: self.segments.iter().map(|&s| s.into()).collect(),
            score: self.score,
            alive: self.alive,
            moving: self.moving,
            abilities: AbilityStates {
                dash: self.abilities.dash.snapshot(),
                bullets: self.abilities.bullets.snapshot(),
                magnet: self.abilities.magnet.snapshot(),
                shield: self.abilities.shield.snapshot(),
            },
            powers,
        }
    }
}

fn initial_chain(head: Vec2) -> VecDeque<Vec2> {
    (0..MIN_SEGMENTS)
        .map(|i| head - Vec2::new(i as f32 * SEGMENT_SPACING, 0.0))
        .collect()
}
