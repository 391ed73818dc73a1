//! Simulation state and main loop.

use crate::collision::{self, InteractionCooldowns};
use crate::config::Config;
use crate::entity::Agent;
use crate::world::World;
use glam::Vec2;
use protocol::{AbilityKind, AgentSnapshot, ClientMessage, Color, PowerKind, ServerMessage};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::client::Session;
use super::Frame;

/// Simulation step per tick. Speeds and velocities are expressed per tick.
const TICK_DT: f32 = 1.0;

const PLAYER_PALETTE: [Color; 16] = [
    Color::new(0xFF, 0x6B, 0x6B),
    Color::new(0x4E, 0xCD, 0xC4),
    Color::new(0x45, 0xB7, 0xD1),
    Color::new(0x96, 0xCE, 0xB4),
    Color::new(0xFF, 0xEA, 0xA7),
    Color::new(0xDD, 0xA0, 0xDD),
    Color::new(0x98, 0xD8, 0xC8),
    Color::new(0xF7, 0xDC, 0x6F),
    Color::new(0xFF, 0x9F, 0x43),
    Color::new(0x10, 0xAC, 0x84),
    Color::new(0xEE, 0x5A, 0x6F),
    Color::new(0x0F, 0xB9, 0xB1),
    Color::new(0xA5, 0x5E, 0xEA),
    Color::new(0x26, 0xDE, 0x81),
    Color::new(0xFD, 0x79, 0xA8),
    Color::new(0xFD, 0xCB, 0x6E),
];

/// Input queued by connection tasks and drained once per tick.
#[derive(Debug, Clone)]
pub enum Command {
    Join { client_id: u32, addr: SocketAddr },
    Leave { client_id: u32 },
    Client { client_id: u32, message: ClientMessage },
}

/// Who an outbound message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    AllExcept(u32),
    Only(u32),
}

impl Recipient {
    pub fn includes(self, client_id: u32) -> bool {
        match self {
            Recipient::All => true,
            Recipient::AllExcept(id) => id != client_id,
            Recipient::Only(id) => id == client_id,
        }
    }
}

/// A server message paired with its audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn all(message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::All,
            message,
        }
    }

    pub fn all_except(client_id: u32, message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::AllExcept(client_id),
            message,
        }
    }

    pub fn only(client_id: u32, message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::Only(client_id),
            message,
        }
    }
}

/// One simulation instance. Owned by exactly one task.
pub struct GameState {
    pub config: Config,
    pub world: World,
    agents: BTreeMap<u32, Agent>,
    sessions: HashMap<u32, Session>,
    cooldowns: InteractionCooldowns,
    tick_count: u64,
}

impl GameState {
    /// Create a simulation with a freshly populated world.
    pub fn new(config: &Config) -> Self {
        let mut world = World::new(&config.world);
        world.populate(&config.world);
        info!(
            "World initialized: {} food, {} bonus boxes, {} hazards, {} objects",
            world.food.len(),
            world.bonus_boxes.len(),
            world.hazards.len(),
            world.objects.len()
        );

        Self {
            config: config.clone(),
            world,
            agents: BTreeMap::new(),
            sessions: HashMap::new(),
            cooldowns: InteractionCooldowns::new(),
            tick_count: 0,
        }
    }

    pub fn agent(&self, id: u32) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Apply one queued command. Commands for unknown agents are dropped.
    pub fn handle_command(&mut self, command: Command, now: u64) -> Vec<Outbound> {
        match command {
            Command::Join { client_id, addr } => self.add_player(client_id, addr, now),
            Command::Leave { client_id } => self.remove_player(client_id),
            Command::Client { client_id, message } => self.handle_message(client_id, message, now),
        }
    }

    fn add_player(&mut self, client_id: u32, addr: SocketAddr, now: u64) -> Vec<Outbound> {
        let spawn = self.world.border.random_spawn();
        let color = PLAYER_PALETTE[rand::rng().random_range(0..PLAYER_PALETTE.len())];
        let agent = Agent::new(
            client_id,
            color,
            spawn,
            self.config.agent.base_speed,
            &self.config.abilities,
        );
        let joined = agent.snapshot();
        self.agents.insert(client_id, agent);
        self.sessions.insert(client_id, Session::new(addr));
        info!("Player {} joined from {}", client_id, addr);

        let full = ServerMessage::GameState {
            your_id: client_id,
            timestamp: now,
            players: self.players(),
            world: self.world.snapshot(),
        };
        vec![
            Outbound::only(client_id, full),
            Outbound::all_except(client_id, ServerMessage::PlayerJoined { player: joined }),
        ]
    }

    fn remove_player(&mut self, client_id: u32) -> Vec<Outbound> {
        if self.agents.remove(&client_id).is_none() {
            return Vec::new();
        }
        self.cooldowns.forget_agent(client_id);
        if let Some(session) = self.sessions.remove(&client_id) {
            info!(
                "Player {} ({}) left after {:.1}s",
                client_id,
                session.addr,
                session.connected_for().as_secs_f64()
            );
        }
        vec![Outbound::all(ServerMessage::PlayerLeft { player_id: client_id })]
    }

    fn handle_message(&mut self, client_id: u32, message: ClientMessage, now: u64) -> Vec<Outbound> {
        let border = self.world.border;
        let Some(agent) = self.agents.get_mut(&client_id) else {
            debug!("Dropping {:?} for unknown player {}", message, client_id);
            return Vec::new();
        };

        match message {
            ClientMessage::UpdateTarget { x, y, moving } => {
                agent.set_target(Vec2::new(x, y), moving, &border);
                Vec::new()
            }
            ClientMessage::UseAbility { ability } => {
                let dash_distance = self.config.abilities.dash_distance;
                if !agent.trigger_ability(ability, now, dash_distance, &border) {
                    return Vec::new();
                }
                if ability == AbilityKind::Bullets {
                    self.world.spawn_bullet_burst(agent.head(), client_id);
                }
                vec![Outbound::all(ServerMessage::AbilityUsed {
                    player_id: client_id,
                    ability,
                })]
            }
            ClientMessage::Respawn => {
                if agent.alive {
                    return Vec::new();
                }
                agent.respawn(border.random_spawn(), self.config.agent.respawn_penalty);
                vec![Outbound::all(ServerMessage::PlayerRespawned {
                    player_id: client_id,
                    player: agent.snapshot(),
                })]
            }
        }
    }

    /// Run one simulation step at simulation time `now` (ms).
    ///
    /// Order: effect expiry, movement, per-agent interactions, agent-vs-agent,
    /// bullets, hazard animation.
    pub fn tick(&mut self, now: u64) -> Vec<Outbound> {
        self.tick_count += 1;

        for agent in self.agents.values_mut() {
            agent.update_effects(now);
            agent.advance(TICK_DT);
        }

        for agent in self.agents.values_mut() {
            collision::resolve_agent(agent, &mut self.world, &mut self.cooldowns, &self.config, now);
        }

        let mut events = Vec::new();
        collision::resolve_pvp(&mut self.agents, &mut events);
        collision::resolve_bullets(&mut self.world);

        let frozen = self.agents.values().any(|a| a.has_power(PowerKind::FreezeTime));
        self.world.update_hazards(TICK_DT, now, frozen);
        self.cooldowns.prune(now);

        events.into_iter().map(Outbound::all).collect()
    }

    fn players(&self) -> Vec<AgentSnapshot> {
        self.agents.values().map(Agent::snapshot).collect()
    }

    /// The periodic broadcast snapshot.
    pub fn snapshot_message(&self, now: u64) -> ServerMessage {
        ServerMessage::GameUpdate {
            timestamp: now,
            players: self.players(),
            world: self.world.snapshot(),
        }
    }
}

/// Serialize each message once and fan it out. Sending with no subscribers is not an error.
fn publish(frames: &broadcast::Sender<Frame>, outbound: Vec<Outbound>) {
    for Outbound { recipient, message } in outbound {
        match message.to_json() {
            Ok(text) => {
                let _ = frames.send(Frame {
                    recipient,
                    text: Arc::from(text),
                });
            }
            Err(e) => error!("Failed to encode {}: {}", message.kind(), e),
        }
    }
}

/// Drive the simulation until `shutdown` flips.
///
/// Ticks and snapshot broadcasts run on two independent timers. A late timer
/// fires once per missed period, so no tick is ever dropped.
pub async fn run_game_loop(
    mut state: GameState,
    mut commands: mpsc::Receiver<Command>,
    frames: broadcast::Sender<Frame>,
    mut shutdown: watch::Receiver<bool>,
) {
    let tick_period = Duration::from_secs_f64(state.config.tick_interval_ms() / 1000.0);
    let broadcast_period = Duration::from_secs_f64(state.config.broadcast_interval_ms() / 1000.0);

    let origin = Instant::now();
    let mut ticker = interval_at(origin + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut broadcaster = interval_at(origin + broadcast_period, broadcast_period);
    broadcaster.set_missed_tick_behavior(MissedTickBehavior::Burst);

    info!(
        "Game loop started ({} Hz ticks, {} Hz broadcasts)",
        state.config.server.tick_rate_hz, state.config.server.broadcast_rate_hz
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = origin.elapsed().as_millis() as u64;
                let tick_start = std::time::Instant::now();

                let mut outbound = Vec::new();
                while let Ok(command) = commands.try_recv() {
                    outbound.extend(state.handle_command(command, now));
                }
                outbound.extend(state.tick(now));
                publish(&frames, outbound);

                let elapsed = tick_start.elapsed();
                if elapsed > tick_period {
                    warn!(
                        "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} bullets, {} cooldowns",
                        state.tick_count(),
                        elapsed.as_secs_f64() * 1000.0,
                        tick_period.as_secs_f64() * 1000.0,
                        state.agent_count(),
                        state.world.bullets.len(),
                        state.cooldowns.len()
                    );
                }
            }
            _ = broadcaster.tick() => {
                if state.agent_count() == 0 {
                    continue;
                }
                let now = origin.elapsed().as_millis() as u64;
                publish(&frames, vec![Outbound::all(state.snapshot_message(now))]);
            }
            _ = shutdown.changed() => break,
        }
    }

    info!("Game loop stopped after {} ticks", state.tick_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::entity::{BonusBox, BonusEffect, Food, ARRIVAL_RADIUS, BULLET_LIFE, BULLET_SPEED, BURST_SIZE};
    use std::f32::consts::TAU;

    fn addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    /// A world with no entities, so nothing but input moves an agent.
    fn bare_config() -> Config {
        Config {
            world: WorldConfig {
                food_count: 0,
                bonus_box_count: 0,
                moving_walls: 0,
                poison_zones: 0,
                speed_traps: 0,
                teleporters: 0,
                portal_pairs: 0,
                bounce_pads: 0,
                checkpoints: 0,
                treasure_chests: 0,
                ..WorldConfig::default()
            },
            ..Config::default()
        }
    }

    fn join(state: &mut GameState, id: u32) -> Vec<Outbound> {
        state.handle_command(Command::Join { client_id: id, addr: addr() }, 0)
    }

    fn send(state: &mut GameState, id: u32, message: ClientMessage, now: u64) -> Vec<Outbound> {
        state.handle_command(Command::Client { client_id: id, message }, now)
    }

    #[test]
    fn test_join_sends_state_then_announces() {
        let mut state = GameState::new(&Config::default());
        join(&mut state, 1);
        let outbound = join(&mut state, 2);

        assert_eq!(outbound.len(), 2);
        assert_eq!(outbound[0].recipient, Recipient::Only(2));
        match &outbound[0].message {
            ServerMessage::GameState { your_id, players, world, .. } => {
                assert_eq!(*your_id, 2);
                assert_eq!(players.len(), 2);
                assert_eq!(world.food.len(), 20);
            }
            other => panic!("expected gameState, got {:?}", other),
        }
        assert_eq!(outbound[1].recipient, Recipient::AllExcept(2));
        assert!(matches!(
            &outbound[1].message,
            ServerMessage::PlayerJoined { player } if player.id == 2 && player.name == "Player 2"
        ));
    }

    #[test]
    fn test_leave_removes_agent() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        let outbound = state.handle_command(Command::Leave { client_id: 1 }, 10);
        assert_eq!(
            outbound,
            vec![Outbound::all(ServerMessage::PlayerLeft { player_id: 1 })]
        );
        assert!(state.agent(1).is_none());

        // Leaving twice is harmless.
        assert!(state.handle_command(Command::Leave { client_id: 1 }, 20).is_empty());
    }

    #[test]
    fn test_unknown_player_is_ignored() {
        let mut state = GameState::new(&bare_config());
        let outbound = send(&mut state, 42, ClientMessage::Respawn, 0);
        assert!(outbound.is_empty());
        assert_eq!(state.agent_count(), 0);
    }

    #[test]
    fn test_move_to_target_end_to_end() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        let border = state.world.border;
        let center = border.center();
        state.agents.get_mut(&1).unwrap().teleport(center, &border);

        send(
            &mut state,
            1,
            ClientMessage::UpdateTarget {
                x: center.x + 100.0,
                y: center.y,
                moving: true,
            },
            0,
        );
        let speed = state.agent(1).unwrap().speed();
        let ticks = (100.0 / speed).ceil() as u64;
        for tick in 1..=ticks {
            state.tick(tick * 16);
        }

        let agent = state.agent(1).unwrap();
        assert!((agent.head().x - (center.x + 100.0)).abs() <= ARRIVAL_RADIUS);
        assert!(!agent.moving);
    }

    #[test]
    fn test_bullets_ability_fires_ring() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        let outbound = send(
            &mut state,
            1,
            ClientMessage::UseAbility { ability: AbilityKind::Bullets },
            0,
        );
        assert_eq!(
            outbound,
            vec![Outbound::all(ServerMessage::AbilityUsed {
                player_id: 1,
                ability: AbilityKind::Bullets,
            })]
        );

        let bullets = &state.world.bullets;
        assert_eq!(bullets.len(), BURST_SIZE);
        for (i, bullet) in bullets.iter().enumerate() {
            assert!((bullet.velocity.length() - BULLET_SPEED).abs() < 1e-4);
            assert_eq!(bullet.life, BULLET_LIFE);
            let expected = Vec2::from_angle(i as f32 / BURST_SIZE as f32 * TAU) * BULLET_SPEED;
            assert!((bullet.velocity - expected).length() < 1e-4);
        }

        // Still cooling down: no event, no extra bullets.
        let again = send(
            &mut state,
            1,
            ClientMessage::UseAbility { ability: AbilityKind::Bullets },
            100,
        );
        assert!(again.is_empty());
        assert_eq!(state.world.bullets.len(), BURST_SIZE);
    }

    #[test]
    fn test_magnet_pulls_until_it_expires() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        let border = state.world.border;
        let head = border.center();
        state.agents.get_mut(&1).unwrap().teleport(head, &border);

        state.world.food.push(Food::new(1, head + Vec2::new(200.0, 0.0)));
        state.world.food.push(Food::new(2, head + Vec2::new(-1000.0, 0.0)));
        state.world.bonus_boxes.push(BonusBox::new(
            3,
            head + Vec2::new(0.0, 300.0),
            BonusEffect::GrowthBonus { amount: 10 },
        ));

        let outbound = send(
            &mut state,
            1,
            ClientMessage::UseAbility { ability: AbilityKind::Magnet },
            0,
        );
        assert_eq!(outbound.len(), 1);
        state.tick(16);

        // Pull strength is 300 / distance, at least 1, per tick.
        let near = state.world.food[0].position;
        assert!((near - (head + Vec2::new(198.5, 0.0))).length() < 1e-3);
        assert_eq!(state.world.food[1].position, head + Vec2::new(-1000.0, 0.0));
        let boxed = state.world.bonus_boxes[0].position;
        assert!((boxed - (head + Vec2::new(0.0, 299.0))).length() < 1e-3);

        state.tick(32);
        assert!(state.world.food[0].position.x < near.x);

        let duration = state.config.abilities.magnet_duration_ms;
        let food_before = state.world.food[0].position;
        let box_before = state.world.bonus_boxes[0].position;
        state.tick(duration);
        assert!(!state.agent(1).unwrap().magnet_active());
        assert_eq!(state.world.food[0].position, food_before);
        assert_eq!(state.world.bonus_boxes[0].position, box_before);
    }

    #[test]
    fn test_respawn_only_when_dead() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        assert!(send(&mut state, 1, ClientMessage::Respawn, 0).is_empty());

        state.agents.get_mut(&1).unwrap().kill();
        let outbound = send(&mut state, 1, ClientMessage::Respawn, 0);
        assert_eq!(outbound.len(), 1);
        assert!(matches!(
            &outbound[0].message,
            ServerMessage::PlayerRespawned { player_id: 1, player } if player.alive
        ));
        assert!(state.agent(1).unwrap().alive);
    }

    #[test]
    fn test_dead_agents_stay_until_respawn() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        state.agents.get_mut(&1).unwrap().kill();
        let head = state.agent(1).unwrap().head();
        state.tick(16);
        assert_eq!(state.agent_count(), 1);
        assert_eq!(state.agent(1).unwrap().head(), head);
    }

    #[test]
    fn test_snapshot_message_carries_timestamp() {
        let mut state = GameState::new(&bare_config());
        join(&mut state, 1);
        match state.snapshot_message(1234) {
            ServerMessage::GameUpdate { timestamp, players, .. } => {
                assert_eq!(timestamp, 1234);
                assert_eq!(players.len(), 1);
            }
            other => panic!("expected gameUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_recipient_includes() {
        assert!(Recipient::All.includes(3));
        assert!(!Recipient::AllExcept(3).includes(3));
        assert!(Recipient::AllExcept(3).includes(4));
        assert!(Recipient::Only(3).includes(3));
        assert!(!Recipient::Only(3).includes(4));
    }

    #[tokio::test]
    async fn test_game_loop_answers_join_and_stops() {
        let state = GameState::new(&bare_config());
        let (command_tx, command_rx) = mpsc::channel(16);
        let (frame_tx, mut frame_rx) = broadcast::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_game_loop(state, command_rx, frame_tx, shutdown_rx));

        command_tx
            .send(Command::Join { client_id: 7, addr: addr() })
            .await
            .unwrap();
        let frame = tokio::time::timeout(Duration::from_secs(2), frame_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame.recipient, Recipient::Only(7));
        assert!(frame.text.contains(r#""type":"gameState""#));
        assert!(frame.text.contains(r#""yourId":7"#));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
