//! Collision detection and resolution.
//!
//! Runs once per tick, after every agent has advanced. This module handles:
//! - Head pickups (food, bonus boxes) and magnet pull
//! - Hazard and interactive-object effects
//! - Agent-vs-agent eating
//! - Bullet flight and bullet strikes
//!
//! Every check here is pure geometry against stored timestamps, so nothing
//! can fail. Guards (dead agent, spent object, cooldown) are silent no-ops.

use crate::config::Config;
use crate::entity::{
    Agent, BonusEffect, HazardKind, ObjectKind, BONUS_BOX_RADIUS, BOUNCE_DISTANCE_PER_POWER,
    BULLET_SIZE, FOOD_RADIUS, HEAD_RADIUS, INTERACTION_COOLDOWN_MS, SPEED_EFFECT_MS,
    SPEED_TRAP_EFFECT_MS, SPEED_TRAP_FACTOR, WALL_BOUNCE_DISTANCE,
};
use crate::world::World;
use fixedbitset::FixedBitSet;
use glam::Vec2;
use protocol::{PowerKind, ServerMessage};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Heads closer than this collide head-on.
pub const HEAD_TO_HEAD_DISTANCE: f32 = 20.0;
/// A head closer than this to another agent's body segment collides with it.
pub const BODY_HIT_DISTANCE: f32 = 15.0;

/// Last trigger time per (agent, object) pair.
#[derive(Debug, Default)]
pub struct InteractionCooldowns {
    last: HashMap<(u32, u32), u64>,
}

impl InteractionCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and stamps the pair if its cooldown has elapsed.
    pub fn try_begin(&mut self, agent: u32, object: u32, now: u64) -> bool {
        match self.last.get(&(agent, object)) {
            Some(&at) if now.saturating_sub(at) < INTERACTION_COOLDOWN_MS => false,
            _ => {
                self.last.insert((agent, object), now);
                true
            }
        }
    }

    pub fn stamp(&mut self, agent: u32, object: u32, now: u64) {
        self.last.insert((agent, object), now);
    }

    /// Drop entries whose cooldown has already run out.
    pub fn prune(&mut self, now: u64) {
        self.last
            .retain(|_, at| now.saturating_sub(*at) < INTERACTION_COOLDOWN_MS);
    }

    pub fn forget_agent(&mut self, agent: u32) {
        self.last.retain(|(a, _), _| *a != agent);
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

/// Resolve one agent's head against every world entity.
pub fn resolve_agent(
    agent: &mut Agent,
    world: &mut World,
    cooldowns: &mut InteractionCooldowns,
    config: &Config,
    now: u64,
) {
    if !agent.alive {
        return;
    }
    if agent.magnet_active() {
        world.apply_magnet(agent.head(), config.abilities.magnet_range);
    }
    eat_food(agent, world, config);
    collect_bonus_box(agent, world, now);
    resolve_hazards(agent, world, now);
    resolve_objects(agent, world, cooldowns, config, now);
}

/// At most one pellet per tick.
fn eat_food(agent: &mut Agent, world: &mut World, config: &Config) {
    let head = agent.head();
    let Some(index) = world
        .food
        .iter()
        .position(|f| head.distance(f.position) < FOOD_RADIUS + HEAD_RADIUS)
    else {
        return;
    };
    world.replace_food(index);

    let mut points = config.agent.food_points;
    if agent.has_power(PowerKind::DoubleScore) {
        points *= 2;
    }
    agent.add_score(points);
    agent.grow(config.agent.food_growth);
}

/// At most one box per tick. The box is consumed even when a shield voids its malus.
fn collect_bonus_box(agent: &mut Agent, world: &mut World, now: u64) {
    let head = agent.head();
    let Some(index) = world
        .bonus_boxes
        .iter()
        .position(|b| head.distance(b.position) < BONUS_BOX_RADIUS + HEAD_RADIUS)
    else {
        return;
    };
    let effect = world.replace_bonus_box(index).effect;
    apply_bonus(agent, effect, now);
}

pub fn apply_bonus(agent: &mut Agent, effect: BonusEffect, now: u64) {
    if effect.is_malus() && agent.shield_active() {
        return;
    }
    match effect {
        BonusEffect::SpeedBonus { multiplier } | BonusEffect::SpeedMalus { multiplier } => {
            agent.apply_speed_effect(multiplier, now, SPEED_EFFECT_MS);
        }
        BonusEffect::GrowthBonus { amount } => {
            agent.grow(amount);
            agent.add_score(amount);
        }
        BonusEffect::ShrinkMalus { amount } => {
            agent.shrink(amount as usize);
        }
    }
}

fn resolve_hazards(agent: &mut Agent, world: &mut World, now: u64) {
    if agent.shield_active() || agent.has_power(PowerKind::Invincibility) {
        return;
    }
    let border = world.border;
    for hazard in &mut world.hazards {
        let head = agent.head();
        if !hazard.hits(head, HEAD_RADIUS) || !hazard.ready(now) {
            continue;
        }
        match hazard.kind {
            HazardKind::MovingWall { .. } => {
                if let Some(away) = (head - hazard.center()).try_normalize() {
                    agent.displace_head(away * WALL_BOUNCE_DISTANCE, &border);
                }
            }
            HazardKind::PoisonZone { .. } => {
                if agent.shrink(1) == 1 {
                    hazard.mark_triggered(now);
                }
            }
            HazardKind::SpeedTrap { .. } => {
                agent.apply_speed_effect(SPEED_TRAP_FACTOR, now, SPEED_TRAP_EFFECT_MS);
                hazard.mark_triggered(now);
            }
            HazardKind::Teleporter { .. } => {
                agent.teleport(border.random_position(), &border);
                hazard.mark_triggered(now);
            }
        }
    }
}

fn resolve_objects(
    agent: &mut Agent,
    world: &mut World,
    cooldowns: &mut InteractionCooldowns,
    config: &Config,
    now: u64,
) {
    let border = world.border;
    for index in 0..world.objects.len() {
        let object = &world.objects[index];
        if object.is_consumed() || !object.hits(agent.head(), HEAD_RADIUS) {
            continue;
        }
        let (id, kind) = (object.id, object.kind);
        if !cooldowns.try_begin(agent.id, id, now) {
            continue;
        }

        match kind {
            ObjectKind::Portal { linked } => {
                // A partner destroyed by a bullet leaves a dead portal.
                if let Some(destination) = world.object_position(linked) {
                    agent.teleport(destination, &border);
                    cooldowns.stamp(agent.id, linked, now);
                }
            }
            ObjectKind::BouncePad { direction, power } => {
                let launch = Vec2::from_angle(direction) * BOUNCE_DISTANCE_PER_POWER * power;
                agent.displace_head(launch, &border);
            }
            ObjectKind::Checkpoint { .. } => {
                world.objects[index].kind = ObjectKind::Checkpoint { activated: true };
                agent.add_score(config.agent.checkpoint_score);
            }
            ObjectKind::TreasureChest { .. } => {
                world.objects[index].kind = ObjectKind::TreasureChest { opened: true };
                agent.add_score(config.agent.chest_score);
                agent.grow(config.agent.chest_growth);
                let power = PowerKind::ALL[rand::rng().random_range(0..PowerKind::ALL.len())];
                agent.grant_power(power, now);
            }
        }
    }
}

/// Agent-vs-agent collisions.
///
/// Head-on contacts are settled first for every unordered pair; then each
/// surviving head is tested against every other agent's body. Pairs where
/// either side holds a shield are skipped. Own-body contact is ignored.
pub fn resolve_pvp(agents: &mut BTreeMap<u32, Agent>, events: &mut Vec<ServerMessage>) {
    let ids: Vec<u32> = agents.keys().copied().collect();

    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let (Some(first), Some(second)) = (agents.get(&a), agents.get(&b)) else {
                continue;
            };
            if !can_fight(first, second) {
                continue;
            }
            if first.head().distance(second.head()) >= HEAD_TO_HEAD_DISTANCE {
                continue;
            }
            match first.len().cmp(&second.len()) {
                Ordering::Greater => devour(agents, a, b, events),
                Ordering::Less => devour(agents, b, a, events),
                Ordering::Equal => {
                    for id in [a, b] {
                        if let Some(agent) = agents.get_mut(&id) {
                            agent.kill();
                            events.push(ServerMessage::PlayerDied { player_id: id });
                        }
                    }
                }
            }
        }
    }

    for &actor in &ids {
        for &other in &ids {
            if actor == other {
                continue;
            }
            let (Some(acting), Some(opponent)) = (agents.get(&actor), agents.get(&other)) else {
                continue;
            };
            if !can_fight(acting, opponent) || acting.has_power(PowerKind::GhostMode) {
                continue;
            }
            let head = acting.head();
            let hit = opponent
                .segments()
                .iter()
                .skip(1)
                .any(|segment| head.distance(*segment) < BODY_HIT_DISTANCE);
            if !hit {
                continue;
            }
            if acting.len() > opponent.len() {
                devour(agents, actor, other, events);
            } else {
                devour(agents, other, actor, events);
            }
        }
    }
}

fn can_fight(a: &Agent, b: &Agent) -> bool {
    a.alive && b.alive && !a.shield_active() && !b.shield_active()
}

/// `eater` consumes `victim`: the victim dies and the eater gains half its length.
fn devour(agents: &mut BTreeMap<u32, Agent>, eater: u32, victim: u32, events: &mut Vec<ServerMessage>) {
    let Some(prey) = agents.get_mut(&victim) else {
        return;
    };
    let reward = (prey.len() / 2) as u32;
    let victim_name = prey.name.clone();
    prey.kill();

    let Some(winner) = agents.get_mut(&eater) else {
        return;
    };
    winner.grow(reward);
    winner.add_score(reward);

    events.push(ServerMessage::PlayerEaten {
        eater_id: eater,
        victim_id: victim,
        eater_name: winner.name.clone(),
        victim_name,
        growth_gained: reward,
    });
    events.push(ServerMessage::PlayerDied { player_id: victim });
}

/// Move every bullet one tick and apply the first strike each one makes.
pub fn resolve_bullets(world: &mut World) {
    let mut spent = FixedBitSet::with_capacity(world.bullets.len());
    for index in 0..world.bullets.len() {
        let bullet = &mut world.bullets[index];
        bullet.advance();
        if bullet.is_spent() {
            spent.insert(index);
            continue;
        }
        let position = bullet.position;
        if strike(world, position) {
            spent.insert(index);
        }
    }

    let mut index = 0;
    world.bullets.retain(|_| {
        let keep = !spent.contains(index);
        index += 1;
        keep
    });
}

/// Food, then bonus boxes, then hazards, then objects. Food and boxes are
/// replaced; hazards and objects are gone for good.
fn strike(world: &mut World, point: Vec2) -> bool {
    if let Some(index) = world
        .food
        .iter()
        .position(|f| point.distance(f.position) < FOOD_RADIUS + BULLET_SIZE)
    {
        world.replace_food(index);
        return true;
    }
    if let Some(index) = world
        .bonus_boxes
        .iter()
        .position(|b| point.distance(b.position) < BONUS_BOX_RADIUS + BULLET_SIZE)
    {
        world.replace_bonus_box(index);
        return true;
    }
    if let Some(index) = world.hazards.iter().position(|h| h.hits(point, BULLET_SIZE)) {
        world.hazards.remove(index);
        return true;
    }
    if let Some(index) = world.objects.iter().position(|o| o.hits(point, BULLET_SIZE)) {
        world.objects.remove(index);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::entity::{Bullet, Food, Hazard, MIN_SEGMENTS, SEGMENT_SPACING};
    use protocol::{AbilityKind, Color};

    fn config() -> Config {
        Config::default()
    }

    /// A world with only the populations a test adds itself.
    fn empty_world() -> World {
        World::new(&WorldConfig {
            food_count: 1,
            bonus_box_count: 1,
            ..WorldConfig::default()
        })
    }

    fn agent_at(id: u32, head: Vec2) -> Agent {
        Agent::new(id, Color::new(1, 2, 3), head, 8.0, &config().abilities)
    }

    /// Agent whose chain runs from `head` in `direction` with `len` segments.
    fn agent_with_len(id: u32, head: Vec2, direction: Vec2, len: usize) -> Agent {
        let mut agent = agent_at(id, head);
        agent.set_segments((0..len).map(|i| head + direction * SEGMENT_SPACING * i as f32));
        agent
    }

    fn shield(agent: &mut Agent) {
        let border = crate::world::WorldBorder::new(5000.0);
        assert!(agent.trigger_ability(AbilityKind::Shield, 0, 100.0, &border));
    }

    fn resolve(agent: &mut Agent, world: &mut World, now: u64) {
        let mut cooldowns = InteractionCooldowns::new();
        resolve_agent(agent, world, &mut cooldowns, &config(), now);
    }

    #[test]
    fn test_food_eaten_and_replaced_same_tick() {
        let mut world = empty_world();
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        world.food.push(Food::new(99, Vec2::new(1015.0, 1000.0)));

        resolve(&mut agent, &mut world, 0);

        assert_eq!(world.food.len(), world.food_target());
        assert!(world.food.iter().all(|f| f.id != 99));
        assert_eq!(agent.score, 10);
        assert_eq!(agent.growth_queue, 10);
    }

    #[test]
    fn test_food_out_of_reach_is_left() {
        let mut world = empty_world();
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        world.food.push(Food::new(99, Vec2::new(1016.0, 1000.0)));
        resolve(&mut agent, &mut world, 0);
        assert_eq!(world.food[0].id, 99);
        assert_eq!(agent.score, 0);
    }

    #[test]
    fn test_double_score_doubles_food_points() {
        let mut world = empty_world();
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        agent.grant_power(PowerKind::DoubleScore, 0);
        world.food.push(Food::new(99, Vec2::new(1000.0, 1000.0)));
        resolve(&mut agent, &mut world, 0);
        assert_eq!(agent.score, 20);
    }

    #[test]
    fn test_repeated_shrink_never_below_minimum() {
        let mut agent = agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 12);
        for _ in 0..5 {
            apply_bonus(&mut agent, BonusEffect::ShrinkMalus { amount: 10 }, 0);
            assert!(agent.len() >= MIN_SEGMENTS);
        }
        assert_eq!(agent.len(), MIN_SEGMENTS);
    }

    #[test]
    fn test_bonus_box_replaced_and_applied() {
        let mut world = empty_world();
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        world.spawn_bonus_box_with(BonusEffect::SpeedBonus { multiplier: 3.0 }, Vec2::new(1020.0, 1000.0));

        resolve(&mut agent, &mut world, 500);

        assert_eq!(world.bonus_boxes.len(), world.bonus_target());
        assert_eq!(agent.speed(), 24.0);
        agent.update_effects(500 + SPEED_EFFECT_MS);
        assert_eq!(agent.speed(), 8.0);
    }

    #[test]
    fn test_poison_zone_cooldown() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::poison_zone(id, Vec2::new(1000.0, 1000.0)));
        let mut agent = agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 10);

        resolve(&mut agent, &mut world, 0);
        assert_eq!(agent.len(), 9);
        resolve(&mut agent, &mut world, 999);
        assert_eq!(agent.len(), 9);
        resolve(&mut agent, &mut world, 1000);
        assert_eq!(agent.len(), 8);
    }

    #[test]
    fn test_speed_trap_slows() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::speed_trap(id, Vec2::new(1000.0, 1000.0)));
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        resolve(&mut agent, &mut world, 0);
        assert!((agent.speed() - 8.0 * SPEED_TRAP_FACTOR).abs() < 1e-5);
        agent.update_effects(SPEED_TRAP_EFFECT_MS);
        assert_eq!(agent.speed(), 8.0);
    }

    #[test]
    fn test_teleporter_moves_head_and_target() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::teleporter(id, Vec2::new(1000.0, 1000.0)));
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        resolve(&mut agent, &mut world, 0);
        assert_eq!(agent.target, agent.head());
        assert!(!world.hazards[0].ready(1999));
    }

    #[test]
    fn test_moving_wall_bounces_head_away() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::moving_wall(id, Vec2::new(1000.0, 1000.0), Vec2::ZERO));
        // Wall center is (1010, 1050).
        let mut agent = agent_at(1, Vec2::new(1010.0, 1010.0));
        resolve(&mut agent, &mut world, 0);
        assert!((agent.head() - Vec2::new(1010.0, 960.0)).length() < 1e-3);
    }

    #[test]
    fn test_shield_blocks_all_damage() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::poison_zone(id, Vec2::new(1000.0, 1000.0)));
        world.add_hazard(|id| Hazard::speed_trap(id, Vec2::new(1000.0, 1000.0)));
        let mut agent = agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 10);
        shield(&mut agent);

        resolve(&mut agent, &mut world, 0);
        apply_bonus(&mut agent, BonusEffect::ShrinkMalus { amount: 10 }, 0);
        apply_bonus(&mut agent, BonusEffect::SpeedMalus { multiplier: 0.5 }, 0);
        assert_eq!(agent.len(), 10);
        assert_eq!(agent.speed(), 8.0);
        assert!(agent.alive);

        let mut agents = BTreeMap::new();
        agents.insert(1, agent);
        agents.insert(2, agent_with_len(2, Vec2::new(1005.0, 1000.0), Vec2::X, 20));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);
        assert!(agents[&1].alive);
        assert_eq!(agents[&1].len(), 10);
        assert!(events.is_empty());
    }

    #[test]
    fn test_invincibility_ignores_hazards() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::poison_zone(id, Vec2::new(1000.0, 1000.0)));
        let mut agent = agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 10);
        agent.grant_power(PowerKind::Invincibility, 0);
        resolve(&mut agent, &mut world, 0);
        assert_eq!(agent.len(), 10);
    }

    #[test]
    fn test_portal_sends_to_partner_once() {
        let mut world = empty_world();
        let a = world.add_object(Vec2::new(1000.0, 1000.0), ObjectKind::Portal { linked: 0 });
        let b = world.add_object(Vec2::new(3000.0, 3000.0), ObjectKind::Portal { linked: a });
        world.objects[0].kind = ObjectKind::Portal { linked: b };

        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        let mut cooldowns = InteractionCooldowns::new();
        resolve_agent(&mut agent, &mut world, &mut cooldowns, &config(), 0);
        assert_eq!(agent.head(), Vec2::new(3000.0, 3000.0));
        assert_eq!(agent.target, Vec2::new(3000.0, 3000.0));

        // Standing on the destination does not bounce straight back.
        resolve_agent(&mut agent, &mut world, &mut cooldowns, &config(), 16);
        assert_eq!(agent.head(), Vec2::new(3000.0, 3000.0));
    }

    #[test]
    fn test_bounce_pad_reflects_into_bounds() {
        let mut world = empty_world();
        world.add_object(
            Vec2::new(100.0, 2500.0),
            ObjectKind::BouncePad {
                direction: std::f32::consts::PI,
                power: 8.0,
            },
        );
        let mut agent = agent_at(1, Vec2::new(100.0, 2500.0));
        resolve(&mut agent, &mut world, 0);
        // 100 - 640 = -540, mirrored to 540.
        assert!((agent.head().x - 540.0).abs() < 1e-2);
        assert!((agent.head().y - 2500.0).abs() < 1e-2);
    }

    #[test]
    fn test_checkpoint_is_one_shot() {
        let mut world = empty_world();
        world.add_object(Vec2::new(1000.0, 1000.0), ObjectKind::Checkpoint { activated: false });
        let mut cooldowns = InteractionCooldowns::new();

        let mut first = agent_at(1, Vec2::new(1000.0, 1000.0));
        let mut second = agent_at(2, Vec2::new(1000.0, 1000.0));
        resolve_agent(&mut first, &mut world, &mut cooldowns, &config(), 0);
        resolve_agent(&mut second, &mut world, &mut cooldowns, &config(), 0);

        assert_eq!(first.score, config().agent.checkpoint_score);
        assert_eq!(second.score, 0);
        assert!(world.objects[0].is_consumed());
    }

    #[test]
    fn test_treasure_chest_rewards() {
        let mut world = empty_world();
        world.add_object(Vec2::new(1000.0, 1000.0), ObjectKind::TreasureChest { opened: false });
        let mut agent = agent_at(1, Vec2::new(1000.0, 1000.0));
        resolve(&mut agent, &mut world, 0);

        assert_eq!(agent.score, 100);
        assert_eq!(agent.growth_queue, 20);
        assert!(PowerKind::ALL.iter().any(|&p| agent.has_power(p)));
        assert_eq!(world.objects[0].kind, ObjectKind::TreasureChest { opened: true });
    }

    #[test]
    fn test_interaction_cooldown() {
        let mut cooldowns = InteractionCooldowns::new();
        assert!(cooldowns.try_begin(1, 7, 0));
        assert!(!cooldowns.try_begin(1, 7, 999));
        assert!(cooldowns.try_begin(2, 7, 999));
        assert!(cooldowns.try_begin(1, 7, 1000));

        cooldowns.prune(2500);
        assert!(cooldowns.is_empty());
    }

    #[test]
    fn test_head_on_equal_length_both_die() {
        let mut agents = BTreeMap::new();
        agents.insert(1, agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 6));
        agents.insert(2, agent_with_len(2, Vec2::new(1010.0, 1000.0), Vec2::X, 6));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);

        assert!(!agents[&1].alive);
        assert!(!agents[&2].alive);
        assert!(events.contains(&ServerMessage::PlayerDied { player_id: 1 }));
        assert!(events.contains(&ServerMessage::PlayerDied { player_id: 2 }));
    }

    #[test]
    fn test_head_on_longer_survives() {
        let mut agents = BTreeMap::new();
        agents.insert(1, agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 6));
        agents.insert(2, agent_with_len(2, Vec2::new(1010.0, 1000.0), Vec2::X, 9));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);

        assert!(!agents[&1].alive);
        assert!(agents[&2].alive);
        assert_eq!(agents[&2].score, 3);
        assert_eq!(agents[&2].growth_queue, 3);
        assert!(events.contains(&ServerMessage::PlayerEaten {
            eater_id: 2,
            victim_id: 1,
            eater_name: "Player 2".into(),
            victim_name: "Player 1".into(),
            growth_gained: 3,
        }));
    }

    #[test]
    fn test_head_into_longer_body_dies() {
        let mut agents = BTreeMap::new();
        agents.insert(1, agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 5));
        // Vertical body passing through (1000, 1000) at index 5.
        agents.insert(2, agent_with_len(2, Vec2::new(1000.0, 1100.0), Vec2::NEG_Y, 10));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);

        assert!(!agents[&1].alive);
        assert!(agents[&2].alive);
        assert_eq!(agents[&2].score, 2);
    }

    #[test]
    fn test_head_into_body_tie_kills_actor() {
        let mut agents = BTreeMap::new();
        agents.insert(1, agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 5));
        agents.insert(2, agent_with_len(2, Vec2::new(1000.0, 1040.0), Vec2::NEG_Y, 5));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);

        assert!(!agents[&1].alive);
        assert!(agents[&2].alive);
    }

    #[test]
    fn test_ghost_passes_through_bodies() {
        let mut agents = BTreeMap::new();
        let mut ghost = agent_with_len(1, Vec2::new(1000.0, 1000.0), Vec2::NEG_X, 5);
        ghost.grant_power(PowerKind::GhostMode, 0);
        agents.insert(1, ghost);
        agents.insert(2, agent_with_len(2, Vec2::new(1000.0, 1100.0), Vec2::NEG_Y, 10));
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);
        assert!(agents[&1].alive);
        assert!(agents[&2].alive);
    }

    #[test]
    fn test_own_body_is_ignored() {
        let mut agents = BTreeMap::new();
        let mut coiled = agent_at(1, Vec2::new(1000.0, 1000.0));
        coiled.set_segments([
            Vec2::new(1000.0, 1000.0),
            Vec2::new(1010.0, 1000.0),
            Vec2::new(1010.0, 1010.0),
            Vec2::new(1000.0, 1010.0),
            Vec2::new(1000.0, 1001.0),
        ]);
        agents.insert(1, coiled);
        let mut events = Vec::new();
        resolve_pvp(&mut agents, &mut events);
        assert!(agents[&1].alive);
    }

    #[test]
    fn test_bullet_hits_food_first_and_food_respawns() {
        let mut world = empty_world();
        world.food.push(Food::new(50, Vec2::new(108.0, 100.0)));
        world.add_hazard(|id| Hazard::speed_trap(id, Vec2::new(108.0, 100.0)));
        world.bullets.push(Bullet {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(8.0, 0.0),
            life: 120,
            owner: 1,
        });

        resolve_bullets(&mut world);

        assert!(world.bullets.is_empty());
        assert_eq!(world.food.len(), 1);
        assert!(world.food.iter().all(|f| f.id != 50));
        assert_eq!(world.hazards.len(), 1);
    }

    #[test]
    fn test_bullet_removes_hazard_permanently() {
        let mut world = empty_world();
        world.add_hazard(|id| Hazard::speed_trap(id, Vec2::new(500.0, 100.0)));
        world.add_object(Vec2::new(2000.0, 2000.0), ObjectKind::Checkpoint { activated: false });
        world.bullets.push(Bullet {
            position: Vec2::new(440.0, 100.0),
            velocity: Vec2::new(8.0, 0.0),
            life: 120,
            owner: 1,
        });

        resolve_bullets(&mut world);

        assert!(world.hazards.is_empty());
        assert!(world.bullets.is_empty());
        assert_eq!(world.objects.len(), 1);
    }

    #[test]
    fn test_bullet_expires_without_effect() {
        let mut world = empty_world();
        world.food.push(Food::new(50, Vec2::new(108.0, 100.0)));
        world.bullets.push(Bullet {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(8.0, 0.0),
            life: 1,
            owner: 1,
        });
        resolve_bullets(&mut world);
        assert!(world.bullets.is_empty());
        assert_eq!(world.food[0].id, 50);
    }
}
