//! Fixed timestep simulation tick
//!
//! Pure transitions: each function reads one snapshot and returns the next,
//! so readers never observe a half-applied update.
//!
//! Tick order:
//!   1. Tram motion (recycle past the left edge)
//!   2. Coin pickup against the pre-tick player
//!   3. Tram contact: first overlapping tram wins (landing or side hit)
//!   4. Gravity (skipped on contact or mid-jump)
//!   5. Fall below the playfield
//!   6. Level clear and coin regeneration
//!
//! Held-key movement and the jump arc run on their own timers and have
//! their own transitions (`move_player`, `begin_jump`, `land_jump`).

use rand::Rng;

use super::collision::overlaps;
use super::state::{GameEvent, GamePhase, GameState, LossCause};
use crate::clamp_x;
use crate::consts::*;
use crate::tuning::Tuning;

/// Held movement keys sampled by the input poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
}

/// A new snapshot plus the events that produced it
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl Transition {
    fn quiet(state: GameState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }
}

/// How the player met the trams this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    None,
    Landed,
    Side,
}

/// Advance the game state by one fixed timestep
pub fn tick(prev: &GameState, tuning: &Tuning) -> Transition {
    if prev.phase != GamePhase::Running {
        return Transition::quiet(prev.clone());
    }

    let mut next = prev.clone();
    let mut events = Vec::new();
    next.time_ticks += 1;

    move_platforms(&mut next, tuning);
    collect_coins(prev, &mut next, tuning, &mut events);
    let contact = resolve_platform_contact(prev, &mut next, tuning, &mut events);

    if contact == Contact::None && !prev.mid_jump {
        apply_gravity(prev, &mut next, tuning);
    }

    // One life per tick at most: a side hit already respawned the player
    if contact != Contact::Side && prev.player.pos.y > PLAYFIELD_HEIGHT {
        next.lose_life(LossCause::Void, &mut events);
    }

    check_level_clear(&mut next, tuning, &mut events);

    Transition {
        state: next,
        events,
    }
}

fn move_platforms(next: &mut GameState, tuning: &Tuning) {
    let GameState { platforms, rng, .. } = next;
    for platform in platforms.iter_mut() {
        platform.pos.x -= tuning.platform_speed;
        if platform.pos.x + platform.width() < 0.0 {
            let offset = if tuning.recycle_spread > 0.0 {
                rng.random_range(0.0..tuning.recycle_spread)
            } else {
                0.0
            };
            platform.pos.x = PLAYFIELD_WIDTH + offset;
        }
    }
}

fn collect_coins(
    prev: &GameState,
    next: &mut GameState,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    for coin in next.collectibles.iter_mut() {
        if !coin.is_collected() && overlaps(&prev.player, coin) {
            coin.collect();
            next.score += tuning.collectible_reward;
            events.push(GameEvent::CollectibleTaken {
                id: coin.id.clone(),
                points: tuning.collectible_reward,
            });
        }
    }
}

/// Resolve the first tram (in stored order) that overlaps the pre-tick player.
/// Later trams are not considered this tick.
fn resolve_platform_contact(
    prev: &GameState,
    next: &mut GameState,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> Contact {
    let player = &prev.player;
    let hit = next
        .platforms
        .iter()
        .zip(&prev.platforms)
        .find(|(moved, _)| overlaps(player, *moved));

    let Some((moved, before)) = hit else {
        return Contact::None;
    };

    let player_bottom = player.pos.y + player.height();
    if player_bottom - tuning.landing_tolerance <= moved.pos.y {
        // Ride the tram: snap onto its roof and follow its displacement
        let carry = moved.pos.x - before.pos.x;
        let id = moved.id.clone();
        next.player.pos.y = moved.pos.y - player.height();
        next.player.pos.x = clamp_x(player.pos.x + carry, player.width());
        events.push(GameEvent::PlatformLanded { id });
        Contact::Landed
    } else {
        next.lose_life(LossCause::Side, events);
        Contact::Side
    }
}

fn apply_gravity(prev: &GameState, next: &mut GameState, tuning: &Tuning) {
    let y = prev.player.pos.y;
    if y < GROUND_Y {
        next.player.pos.y = (y + tuning.gravity_step).min(GROUND_Y);
    }
}

fn check_level_clear(next: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    if next.remaining_collectibles() > 0 {
        return;
    }

    next.score += tuning.level_bonus;
    next.level += 1;
    next.collectibles = next.fresh_collectibles();
    log::info!("Level cleared, now on level {} (score {})", next.level, next.score);
    events.push(GameEvent::LevelCleared {
        level: next.level,
        bonus: tuning.level_bonus,
    });
}

/// One held-key movement step. Left is applied before right, so holding
/// both cancels out (modulo clamping at the walls).
pub fn move_player(prev: &GameState, input: &TickInput, tuning: &Tuning) -> GameState {
    let mut next = prev.clone();
    if prev.phase != GamePhase::Running {
        return next;
    }

    let width = next.player.width();
    if input.left {
        next.player.pos.x = clamp_x(next.player.pos.x - tuning.player_speed, width);
    }
    if input.right {
        next.player.pos.x = clamp_x(next.player.pos.x + tuning.player_speed, width);
    }
    next
}

/// Start the scripted jump arc. Returns `None` when the request is a no-op
/// (not running, or already mid-jump). The returned state's `jump_seq`
/// identifies the landing that must follow.
pub fn begin_jump(prev: &GameState, tuning: &Tuning) -> Option<Transition> {
    if prev.phase != GamePhase::Running || prev.mid_jump {
        return None;
    }

    let mut next = prev.clone();
    next.player.pos.y -= tuning.jump_height;
    next.mid_jump = true;
    next.jump_seq += 1;
    log::debug!("Jump #{} from y={}", next.jump_seq, prev.player.pos.y);

    Some(Transition {
        state: next,
        events: vec![GameEvent::Jumped],
    })
}

/// Finish jump `seq`: undo the upward offset and clear `mid_jump` in one
/// replacement. Returns `None` if that jump is no longer in flight (the
/// player respawned, or the state was replaced).
pub fn land_jump(prev: &GameState, seq: u64, tuning: &Tuning) -> Option<Transition> {
    if !prev.mid_jump || prev.jump_seq != seq {
        return None;
    }

    let mut next = prev.clone();
    next.player.pos.y += tuning.jump_height;
    next.mid_jump = false;

    Some(Transition {
        state: next,
        events: vec![GameEvent::Landed],
    })
}

/// NotStarted -> Running; anything else is left alone
pub fn start(prev: &GameState) -> GameState {
    let mut next = prev.clone();
    if prev.phase == GamePhase::NotStarted {
        next.phase = GamePhase::Running;
        log::info!("Game started (seed {})", prev.seed);
    }
    next
}

/// Running <-> Paused; a no-op in any other phase
pub fn toggle_pause(prev: &GameState) -> GameState {
    let mut next = prev.clone();
    match prev.phase {
        GamePhase::Running => {
            next.phase = GamePhase::Paused;
            log::info!("Paused at tick {}", prev.time_ticks);
        }
        GamePhase::Paused => {
            next.phase = GamePhase::Running;
            log::info!("Resumed at tick {}", prev.time_ticks);
        }
        GamePhase::NotStarted | GamePhase::Over => {}
    }
    next
}

/// Fresh canonical state in the Running phase. Only valid from Over.
pub fn restart(prev: &GameState, seed: u64, tuning: &Tuning) -> Option<GameState> {
    if prev.phase != GamePhase::Over {
        return None;
    }
    let mut next = GameState::new(seed, tuning);
    next.phase = GamePhase::Running;
    log::info!("Restarted (previous score {})", prev.score);
    Some(next)
}
