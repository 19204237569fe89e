//! Game state and core simulation types
//!
//! One `GameState` is one immutable snapshot: transitions in `tick` take a
//! snapshot by reference and return the next one.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::entity::{Color, Entity, EntityKind};
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Start screen, waiting for the player
    NotStarted,
    /// Active gameplay
    Running,
    /// Frozen snapshot, no ticks
    Paused,
    /// Out of lives
    Over,
}

/// Why a life was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    /// Ran into the side of a tram
    Side,
    /// Fell below the playfield
    Void,
}

/// Things that happened during a transition, for sound/UI consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    CollectibleTaken { id: String, points: u64 },
    PlatformLanded { id: String },
    LifeLost { cause: LossCause, lives_left: u32 },
    LevelCleared { level: u32, bonus: u64 },
    GameOver { score: u64 },
    Jumped,
    Landed,
}

/// Complete game state (deterministic, serializable for renderers)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Platform recycling RNG, advanced only by ticks
    #[serde(skip)]
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub player: Entity,
    /// Trams, in stable order (collision tie-breaks follow this order)
    pub platforms: Vec<Entity>,
    pub collectibles: Vec<Entity>,
    pub hazards: Vec<Entity>,
    pub score: u64,
    pub lives: u32,
    /// Current level (1-based)
    pub level: u32,
    /// Set between a jump's rise and its scripted landing
    pub mid_jump: bool,
    /// Identifies the jump in flight; stale landings carry an older value
    pub jump_seq: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next collectible id suffix
    next_id: u32,
}

impl GameState {
    /// Canonical initial layout in the `NotStarted` phase
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let player = layout_entity(
            "player",
            Vec2::new(SPAWN_X, SPAWN_Y),
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            EntityKind::Player,
        );

        let platforms = PLATFORM_XS
            .iter()
            .zip(PLATFORM_COLORS)
            .enumerate()
            .map(|(i, (&x, rgb))| {
                layout_entity(
                    format!("tram{}", i + 1),
                    Vec2::new(x, PLATFORM_Y),
                    Vec2::new(PLATFORM_WIDTH, PLATFORM_HEIGHT),
                    EntityKind::Platform {
                        color: Color::from_rgb(rgb),
                    },
                )
            })
            .collect();

        let (hx, hy) = HAZARD_POS;
        let hazards = vec![layout_entity(
            "obstacle1",
            Vec2::new(hx, hy),
            Vec2::splat(HAZARD_SIZE),
            EntityKind::Hazard,
        )];

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::NotStarted,
            player,
            platforms,
            collectibles: Vec::new(),
            hazards,
            score: 0,
            lives: tuning.starting_lives,
            level: 1,
            mid_jump: false,
            jump_seq: 0,
            time_ticks: 0,
            next_id: 1,
        };
        state.collectibles = state.fresh_collectibles();
        state
    }

    /// Allocate a new collectible id
    pub fn next_collectible_id(&mut self) -> String {
        let id = format!("coin{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// A full set of uncollected coins at the canonical positions
    pub fn fresh_collectibles(&mut self) -> Vec<Entity> {
        COLLECTIBLE_POSITIONS
            .iter()
            .map(|&(x, y)| {
                let id = self.next_collectible_id();
                layout_entity(
                    id,
                    Vec2::new(x, y),
                    Vec2::splat(COLLECTIBLE_SIZE),
                    EntityKind::Collectible { collected: false },
                )
            })
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Number of coins still on the field
    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles.iter().filter(|c| !c.is_collected()).count()
    }

    /// Take one life, put the player back at spawn and cancel any jump.
    /// Ends the run when the last life goes.
    pub(crate) fn lose_life(&mut self, cause: LossCause, events: &mut Vec<GameEvent>) {
        self.lives = self.lives.saturating_sub(1);
        self.player.pos = Vec2::new(SPAWN_X, SPAWN_Y);
        self.mid_jump = false;
        log::debug!("Life lost ({:?}), {} left", cause, self.lives);
        events.push(GameEvent::LifeLost {
            cause,
            lives_left: self.lives,
        });

        if self.lives == 0 {
            self.phase = GamePhase::Over;
            log::info!("Game over with score {}", self.score);
            events.push(GameEvent::GameOver { score: self.score });
        }
    }
}

/// Layout geometry comes from compile-time constants that already satisfy
/// `Entity::new`'s checks (pinned by `test_layout_passes_validation`).
fn layout_entity(id: impl Into<String>, pos: Vec2, size: Vec2, kind: EntityKind) -> Entity {
    Entity {
        id: id.into(),
        pos,
        size,
        kind,
    }
}
