//! Tunable server and gameplay settings.
//!
//! Every constant the simulation reads lives here so tests can shrink or
//! stretch timings without touching the engine. The defaults are what the
//! `server` binary runs with.

use shared::Vector2;
use std::net::IpAddr;
use std::time::Duration;

/// Session, timing and networking settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of concurrent sessions
    pub max_players: usize,
    /// Silence after which a session is evicted
    pub timeout: Duration,
    /// Simulation step length (physics, steering, combat)
    pub step_interval: Duration,
    /// Broadcast tick length (chicken updates, timeouts)
    pub tick_interval: Duration,
    /// Pause between two loop iterations when nothing is pending
    pub sleep_time: Duration,
    /// Upper bound on the wall-clock delta fed to the accumulators
    pub max_frame_time: Duration,
    /// Origins refused with `Blacklisted`
    pub blacklist: Vec<IpAddr>,
    /// Seed for the spawn RNG, random when absent
    pub rng_seed: Option<u64>,
    pub gameplay: GameplayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            timeout: Duration::from_secs(5),
            step_interval: Duration::from_secs_f64(1.0 / 60.0),
            tick_interval: Duration::from_secs_f64(1.0 / 20.0),
            sleep_time: Duration::from_millis(5),
            max_frame_time: Duration::from_millis(250),
            blacklist: Vec::new(),
            rng_seed: None,
            gameplay: GameplayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Builds the intervals from rates in Hz.
    pub fn with_rates(mut self, step_rate: u32, tick_rate: u32) -> Self {
        self.step_interval = Duration::from_secs_f64(1.0 / step_rate.max(1) as f64);
        self.tick_interval = Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64);
        self
    }
}

/// Steering, combat and loot constants
#[derive(Debug, Clone)]
pub struct GameplayConfig {
    pub seed_lifetime: Duration,
    /// Seeds further than this are invisible to a chicken
    pub seed_impact_distance: f32,
    /// Multiplier on the squared distance to the chicken's own seed
    pub owner_seed_priority: f32,
    /// Multiplier on the squared distance to someone else's seed
    pub other_seed_priority: f32,
    /// A seed wins focus when `weighted * factor < enemy distance²`
    pub seed_preference_factor: f32,
    pub target_detection_distance: f32,
    /// Angular error in degrees under which no rotation happens
    pub rotation_deadzone: f32,
    pub rotation_speed: f32,
    /// Seeds closer than this turn the chicken `close_turn_multiplier` times faster
    pub close_turn_distance: f32,
    pub close_turn_multiplier: f32,
    pub seed_pickup_distance: f32,
    pub item_pickup_distance: f32,
    /// Cosine of the half-angle of the firing cone
    pub firing_cone_cos: f32,
    /// Muzzle position relative to a chicken facing 0°
    pub weapon_offset: Vector2,
    pub bullet_speed: f32,
    pub bullet_hit_radius: f32,
    pub item_spawn_interval: Duration,
    pub max_items: usize,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            seed_lifetime: Duration::from_secs(10),
            seed_impact_distance: 300.0,
            owner_seed_priority: 0.5,
            other_seed_priority: 1.0,
            seed_preference_factor: 1.0,
            target_detection_distance: 250.0,
            rotation_deadzone: 2.0,
            rotation_speed: 180.0,
            close_turn_distance: 64.0,
            close_turn_multiplier: 3.0,
            seed_pickup_distance: 20.0,
            item_pickup_distance: 30.0,
            firing_cone_cos: 30.0f32.to_radians().cos(),
            weapon_offset: Vector2::new(20.0, 10.0),
            bullet_speed: 400.0,
            bullet_hit_radius: 20.0,
            item_spawn_interval: Duration::from_secs(5),
            max_items: 5,
        }
    }
}
