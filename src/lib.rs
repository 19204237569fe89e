//! Tram Hop - A side-scrolling platformer on moving trams
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, per-tick transitions)
//! - `input`: Held-key tracking and edge-triggered actions
//! - `clock`: Fixed-cadence timers and generation-tagged deferred events
//! - `session`: Lifecycle controller that drives the simulation on timers
//! - `settings`: Key bindings and run configuration
//! - `tuning`: Data-driven game balance

pub mod clock;
pub mod input;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use input::{Action, InputEvent, InputState, Key};
pub use session::GameSession;
pub use settings::{ConfigError, KeyBindings, Settings};
pub use tuning::Tuning;

/// Canonical layout constants
pub mod consts {
    /// Playfield dimensions (logical units, y grows downward)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 400.0;

    /// Player size and spawn point
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    pub const SPAWN_X: f32 = 100.0;
    pub const SPAWN_Y: f32 = 300.0;
    /// Lowest resting y for the player's top edge (gravity stops here)
    pub const GROUND_Y: f32 = 300.0;

    /// Trams (platforms)
    pub const PLATFORM_WIDTH: f32 = 120.0;
    pub const PLATFORM_HEIGHT: f32 = 80.0;
    pub const PLATFORM_Y: f32 = 280.0;
    pub const PLATFORM_XS: [f32; 3] = [200.0, 400.0, 600.0];
    pub const PLATFORM_COLORS: [u32; 3] = [0xFF6B35, 0x4A90E2, 0xFFD700];

    /// Coins (collectibles)
    pub const COLLECTIBLE_SIZE: f32 = 20.0;
    pub const COLLECTIBLE_POSITIONS: [(f32, f32); 5] = [
        (250.0, 200.0),
        (450.0, 200.0),
        (650.0, 200.0),
        (350.0, 150.0),
        (550.0, 150.0),
    ];

    /// Obstacle (hazard)
    pub const HAZARD_SIZE: f32 = 30.0;
    pub const HAZARD_POS: (f32, f32) = (300.0, 260.0);

    /// Movement speeds (units per tick / per poll)
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLATFORM_SPEED: f32 = 2.0;
    /// Downward step per tick while airborne
    pub const GRAVITY_STEP: f32 = 5.0;
    /// Slack when deciding between a top landing and a side hit
    pub const LANDING_TOLERANCE: f32 = 10.0;
    /// Recycled trams reappear within this distance past the right edge
    pub const RECYCLE_SPREAD: f32 = 200.0;

    /// Scripted jump arc
    pub const JUMP_HEIGHT: f32 = 120.0;
    pub const JUMP_DURATION_MS: f64 = 600.0;

    /// Scoring and lives
    pub const COLLECTIBLE_REWARD: u64 = 100;
    pub const LEVEL_BONUS: u64 = 1000;
    pub const STARTING_LIVES: u32 = 3;

    /// Simulation cadence (60 Hz) and continuous-movement poll interval
    pub const TICK_RATE_HZ: f64 = 60.0;
    pub const POLL_INTERVAL_MS: f64 = 16.0;
    /// Maximum catch-up steps per timer per host frame, to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Clamp a horizontal position so an entity of `width` stays inside the playfield
#[inline]
pub fn clamp_x(x: f32, width: f32) -> f32 {
    x.clamp(0.0, (consts::PLAYFIELD_WIDTH - width).max(0.0))
}
