//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Transitions take a snapshot and return a new one
//! - Seeded RNG only, carried inside the state
//! - Stable iteration order (trams resolve in stored order)
//! - No timers, rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod state;
pub mod tick;

pub use collision::{Bounded, Rect, overlaps};
pub use entity::{Color, Entity, EntityError, EntityKind};
pub use state::{GameEvent, GamePhase, GameState, LossCause};
pub use tick::{
    TickInput, Transition, begin_jump, land_jump, move_player, restart, start, tick, toggle_pause,
};
