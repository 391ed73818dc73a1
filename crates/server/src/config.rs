//! Server configuration.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub abilities: AbilityConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(Path::new("config.toml"))?;
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.tick_rate_hz == 0 || self.server.broadcast_rate_hz == 0 {
            bail!("tick_rate_hz and broadcast_rate_hz must be positive");
        }
        if self.server.broadcast_rate_hz > self.server.tick_rate_hz {
            bail!(
                "broadcast_rate_hz ({}) cannot exceed tick_rate_hz ({})",
                self.server.broadcast_rate_hz,
                self.server.tick_rate_hz
            );
        }
        if self.world.size < 400.0 {
            bail!("world size {} is too small (minimum 400)", self.world.size);
        }
        if self.agent.base_speed <= 0.0 {
            bail!("agent base_speed must be positive");
        }
        Ok(())
    }

    /// Tick period in milliseconds.
    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.server.tick_rate_hz)
    }

    /// Broadcast period in milliseconds.
    pub fn broadcast_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.server.broadcast_rate_hz)
    }
}

/// Networking and clock settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum simultaneous connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: u32,
    /// Snapshot broadcasts per second.
    #[serde(default = "default_broadcast_rate")]
    pub broadcast_rate_hz: u32,
    /// Capacity of the inbound command queue.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
    /// Outbound frames a connection may fall behind before it starts missing them.
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            tick_rate_hz: default_tick_rate(),
            broadcast_rate_hz: default_broadcast_rate(),
            command_buffer: default_command_buffer(),
            frame_buffer: default_frame_buffer(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    200
}
fn default_tick_rate() -> u32 {
    60
}
fn default_broadcast_rate() -> u32 {
    30
}
fn default_command_buffer() -> usize {
    1024
}
fn default_frame_buffer() -> usize {
    256
}

/// World dimensions and entity populations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    /// Side length of the square world.
    #[serde(default = "default_world_size")]
    pub size: f32,
    #[serde(default = "default_food_count")]
    pub food_count: usize,
    #[serde(default = "default_bonus_box_count")]
    pub bonus_box_count: usize,
    #[serde(default = "default_moving_walls")]
    pub moving_walls: usize,
    #[serde(default = "default_poison_zones")]
    pub poison_zones: usize,
    #[serde(default = "default_speed_traps")]
    pub speed_traps: usize,
    #[serde(default = "default_teleporters")]
    pub teleporters: usize,
    #[serde(default = "default_portal_pairs")]
    pub portal_pairs: usize,
    #[serde(default = "default_bounce_pads")]
    pub bounce_pads: usize,
    #[serde(default = "default_checkpoints")]
    pub checkpoints: usize,
    #[serde(default = "default_treasure_chests")]
    pub treasure_chests: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: default_world_size(),
            food_count: default_food_count(),
            bonus_box_count: default_bonus_box_count(),
            moving_walls: default_moving_walls(),
            poison_zones: default_poison_zones(),
            speed_traps: default_speed_traps(),
            teleporters: default_teleporters(),
            portal_pairs: default_portal_pairs(),
            bounce_pads: default_bounce_pads(),
            checkpoints: default_checkpoints(),
            treasure_chests: default_treasure_chests(),
        }
    }
}

fn default_world_size() -> f32 {
    5000.0
}
fn default_food_count() -> usize {
    20
}
fn default_bonus_box_count() -> usize {
    8
}
fn default_moving_walls() -> usize {
    5
}
fn default_poison_zones() -> usize {
    3
}
fn default_speed_traps() -> usize {
    4
}
fn default_teleporters() -> usize {
    3
}
fn default_portal_pairs() -> usize {
    2
}
fn default_bounce_pads() -> usize {
    6
}
fn default_checkpoints() -> usize {
    4
}
fn default_treasure_chests() -> usize {
    2
}

/// Agent movement and scoring.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Units moved per tick with no speed effect active.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Score deducted on respawn.
    #[serde(default = "default_respawn_penalty")]
    pub respawn_penalty: u32,
    #[serde(default = "default_food_points")]
    pub food_points: u32,
    #[serde(default = "default_food_growth")]
    pub food_growth: u32,
    #[serde(default = "default_checkpoint_score")]
    pub checkpoint_score: u32,
    #[serde(default = "default_chest_score")]
    pub chest_score: u32,
    #[serde(default = "default_chest_growth")]
    pub chest_growth: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            respawn_penalty: default_respawn_penalty(),
            food_points: default_food_points(),
            food_growth: default_food_growth(),
            checkpoint_score: default_checkpoint_score(),
            chest_score: default_chest_score(),
            chest_growth: default_chest_growth(),
        }
    }
}

fn default_base_speed() -> f32 {
    8.0
}
fn default_respawn_penalty() -> u32 {
    1
}
fn default_food_points() -> u32 {
    10
}
fn default_food_growth() -> u32 {
    10
}
fn default_checkpoint_score() -> u32 {
    50
}
fn default_chest_score() -> u32 {
    100
}
fn default_chest_growth() -> u32 {
    20
}

/// Ability tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AbilityConfig {
    #[serde(default = "default_ability_cooldown")]
    pub cooldown_ms: u64,
    #[serde(default = "default_magnet_duration")]
    pub magnet_duration_ms: u64,
    #[serde(default = "default_shield_duration")]
    pub shield_duration_ms: u64,
    #[serde(default = "default_dash_distance")]
    pub dash_distance: f32,
    #[serde(default = "default_magnet_range")]
    pub magnet_range: f32,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_ability_cooldown(),
            magnet_duration_ms: default_magnet_duration(),
            shield_duration_ms: default_shield_duration(),
            dash_distance: default_dash_distance(),
            magnet_range: default_magnet_range(),
        }
    }
}

fn default_ability_cooldown() -> u64 {
    8000
}
fn default_magnet_duration() -> u64 {
    20_000
}
fn default_shield_duration() -> u64 {
    30_000
}
fn default_dash_distance() -> f32 {
    100.0
}
fn default_magnet_range() -> f32 {
    750.0
}
