//! Game session lifecycle
//!
//! Owns the live snapshot and drives the simulation from three timers on a
//! virtual clock: the fixed-cadence tick, the held-key movement poll and the
//! deferred jump landing. The host calls `advance` with elapsed frame time
//! and forwards key edges; readers take `snapshot()`.
//!
//! Every change publishes a whole new `Arc<GameState>`, so a reader holding
//! an older snapshot never sees a partial update.

use std::sync::Arc;

use crate::clock::{DeferredQueue, Periodic};
use crate::consts::MAX_SUBSTEPS;
use crate::input::{Action, InputEvent, InputState};
use crate::settings::{ConfigError, KeyBindings, Settings};
use crate::sim::{self, GameEvent, GamePhase, GameState, Transition};
use crate::tuning::Tuning;

/// Deferred work scheduled by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    /// Scripted landing of jump `seq`
    Land { seq: u64 },
}

/// Which timer fires next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Deferred,
    Tick,
    Poll,
}

pub struct GameSession {
    state: Arc<GameState>,
    tuning: Tuning,
    bindings: KeyBindings,
    input: InputState,
    /// Base seed; each restart derives a new one from it
    seed: u64,
    /// Bumped on restart and teardown; deferred events from older
    /// generations are discarded when they fire
    generation: u64,
    now_ms: f64,
    tick_timer: Periodic,
    poll_timer: Periodic,
    deferred: DeferredQueue<Scheduled>,
    events: Vec<GameEvent>,
    /// Set by `shutdown`; a closed session ignores every request
    closed: bool,
}

impl GameSession {
    /// New session on the start screen. Settings are validated first.
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seed = settings.resolved_seed();
        let tuning = settings.tuning;
        log::info!("New session (seed {seed})");
        Ok(Self {
            state: Arc::new(GameState::new(seed, &tuning)),
            tick_timer: Periodic::new(tuning.tick_interval_ms()),
            poll_timer: Periodic::new(tuning.poll_interval_ms),
            tuning,
            bindings: settings.bindings,
            input: InputState::new(),
            seed,
            generation: 0,
            now_ms: 0.0,
            deferred: DeferredQueue::new(),
            events: Vec::new(),
            closed: false,
        })
    }

    /// Cheap handle on the current snapshot
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start(&mut self) {
        if self.closed {
            return;
        }
        let next = sim::start(&self.state);
        self.publish(next);
    }

    pub fn toggle_pause(&mut self) {
        if self.closed {
            return;
        }
        let next = sim::toggle_pause(&self.state);
        self.publish(next);
    }

    /// Fresh run from the game-over screen; ignored in any other phase
    pub fn restart(&mut self) {
        if self.closed {
            return;
        }
        let seed = self.seed.wrapping_add(self.generation + 1);
        let Some(next) = sim::restart(&self.state, seed, &self.tuning) else {
            return;
        };
        self.generation += 1;
        self.deferred.clear();
        self.tick_timer.stop();
        self.poll_timer.stop();
        self.publish(next);
    }

    /// Jump now; the landing is scheduled `jump_duration_ms` later
    pub fn jump(&mut self) {
        if self.closed {
            return;
        }
        let Some(transition) = sim::begin_jump(&self.state, &self.tuning) else {
            return;
        };
        let seq = transition.state.jump_seq;
        self.deferred.schedule(
            self.now_ms,
            self.tuning.jump_duration_ms,
            self.generation,
            Scheduled::Land { seq },
        );
        self.apply(transition);
    }

    /// Forward a raw key edge (`KeyboardEvent.code` style); unbound codes
    /// are ignored
    pub fn handle_key(&mut self, code: &str, pressed: bool) {
        if self.closed {
            return;
        }
        if let Some(event) = self.bindings.event(code, pressed) {
            self.input.handle_code(event, code);
            self.perform_pending();
        }
    }

    /// Forward a logical key edge. Actions take effect immediately.
    pub fn handle_input(&mut self, event: InputEvent) {
        if self.closed {
            return;
        }
        self.input.handle(event);
        self.perform_pending();
    }

    fn perform_pending(&mut self) {
        for action in self.input.drain_actions() {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Jump if self.phase() == GamePhase::NotStarted => self.start(),
            Action::Jump => self.jump(),
            Action::TogglePause => self.toggle_pause(),
            Action::Restart => self.restart(),
        }
    }

    /// Run every timer that falls due within the next `elapsed_ms`
    pub fn advance(&mut self, elapsed_ms: f64) {
        if self.closed {
            return;
        }
        let target = self.now_ms + elapsed_ms.max(0.0);

        for (name, timer) in [("tick", &mut self.tick_timer), ("poll", &mut self.poll_timer)] {
            let dropped = timer.limit_backlog(target, MAX_SUBSTEPS);
            if dropped > 0 {
                log::debug!("Dropped {dropped} {name} steps to catch up");
            }
        }

        while let Some((due, which)) = self.next_due(target) {
            self.now_ms = due;
            match which {
                Due::Deferred => self.fire_deferred(due),
                Due::Tick => {
                    self.tick_timer.fire();
                    let transition = sim::tick(&self.state, &self.tuning);
                    self.apply(transition);
                }
                Due::Poll => {
                    self.poll_timer.fire();
                    let movement = self.input.movement();
                    if movement != sim::TickInput::default() {
                        let next = sim::move_player(&self.state, &movement, &self.tuning);
                        self.publish(next);
                    }
                }
            }
        }

        self.now_ms = target;
    }

    /// Earliest timer due at or before `target`. Ties go to deferred events,
    /// then the tick, then the poll.
    fn next_due(&self, target: f64) -> Option<(f64, Due)> {
        [
            (self.deferred.next_due(), Due::Deferred),
            (self.tick_timer.due(), Due::Tick),
            (self.poll_timer.due(), Due::Poll),
        ]
        .into_iter()
        .filter_map(|(due, which)| due.filter(|&t| t <= target).map(|t| (t, which)))
        .fold(None, |best: Option<(f64, Due)>, candidate| match best {
            Some(b) if b.0 <= candidate.0 => Some(b),
            _ => Some(candidate),
        })
    }

    fn fire_deferred(&mut self, due: f64) {
        let Some(item) = self.deferred.pop_due(due) else {
            return;
        };
        if item.generation != self.generation {
            log::debug!(
                "Discarding {:?} from generation {} (now {})",
                item.event,
                item.generation,
                self.generation
            );
            return;
        }
        match item.event {
            Scheduled::Land { seq } => {
                if let Some(transition) = sim::land_jump(&self.state, seq, &self.tuning) {
                    self.apply(transition);
                }
            }
        }
    }

    /// Tear down: cancel every timer and pending event, release keys and
    /// close the session. The last snapshot stays readable.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.generation += 1;
        self.tick_timer.stop();
        self.poll_timer.stop();
        self.deferred.clear();
        self.input.clear();
        log::info!(
            "Session closed at level {} with score {}",
            self.state.level,
            self.state.score
        );
    }

    fn apply(&mut self, transition: Transition) {
        self.events.extend(transition.events);
        self.publish(transition.state);
    }

    /// Swap in the next snapshot and bring the timers in line with its phase
    fn publish(&mut self, next: GameState) {
        if self.closed {
            return;
        }
        let now = self.now_ms;
        match next.phase {
            GamePhase::Running => {
                if !self.tick_timer.is_running() {
                    self.tick_timer.start(now);
                    self.poll_timer.start(now);
                }
                self.deferred.thaw(now);
            }
            GamePhase::Paused => {
                self.tick_timer.stop();
                self.poll_timer.stop();
                self.deferred.freeze(now);
            }
            GamePhase::NotStarted | GamePhase::Over => {
                self.tick_timer.stop();
                self.poll_timer.stop();
                self.deferred.clear();
            }
        }
        self.state = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use crate::sim::LossCause;

    const FRAME_MS: f64 = 16.0;

    fn session() -> GameSession {
        GameSession::new(Settings {
            seed: Some(12345),
            ..Default::default()
        })
        .unwrap()
    }

    /// Advance in host-sized frames so the catch-up cap never kicks in
    fn run(s: &mut GameSession, ms: f64) {
        let mut left = ms;
        while left > 0.0 {
            let step = left.min(FRAME_MS);
            s.advance(step);
            left -= step;
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::NotStarted);

        // Nothing ticks before start
        s.advance(1000.0);
        assert_eq!(s.state().time_ticks, 0);

        s.start();
        assert_eq!(s.phase(), GamePhase::Running);
        s.advance(110.0);
        assert_eq!(s.state().time_ticks, 6);

        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Paused);
        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Running);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut s = session();
        s.start();
        run(&mut s, 200.0);
        s.toggle_pause();
        let frozen = s.snapshot();

        s.handle_input(InputEvent::KeyDown(Key::Right));
        s.advance(5000.0);
        assert_eq!(*s.snapshot(), *frozen);
    }

    #[test]
    fn test_resume_does_not_catch_up() {
        let mut s = session();
        s.start();
        run(&mut s, 200.0);
        s.toggle_pause();
        s.advance(10_000.0);
        s.toggle_pause();
        let ticks = s.state().time_ticks;

        s.advance(0.0);
        assert_eq!(s.state().time_ticks, ticks);
        s.advance(17.0);
        assert_eq!(s.state().time_ticks, ticks + 1);
    }

    #[test]
    fn test_jump_lands_after_duration() {
        let mut s = session();
        s.start();
        s.jump();
        assert_eq!(s.state().player.pos.y, 180.0);
        assert!(s.state().mid_jump);

        run(&mut s, 100.0);
        // Second request while airborne is ignored
        s.jump();
        assert_eq!(s.state().player.pos.y, 180.0);

        run(&mut s, 499.0);
        assert!(s.state().mid_jump);
        run(&mut s, 1.0);
        assert!(!s.state().mid_jump);
        assert_eq!(s.state().player.pos.y, 300.0);

        let events = s.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Jumped).count(), 1);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Landed).count(), 1);
    }

    #[test]
    fn test_pause_holds_pending_landing() {
        let mut s = session();
        s.start();
        s.jump();
        run(&mut s, 300.0);
        s.toggle_pause();
        s.advance(5000.0);
        assert!(s.state().mid_jump);

        s.toggle_pause();
        run(&mut s, 299.0);
        assert!(s.state().mid_jump);
        run(&mut s, 1.0);
        assert!(!s.state().mid_jump);
    }

    #[test]
    fn test_stale_generation_landing_is_dropped() {
        let mut s = session();
        s.start();
        s.jump();
        // As if the session had been replaced while the landing was pending
        s.generation += 1;
        run(&mut s, 600.0);
        assert!(s.state().mid_jump);
        assert_eq!(s.state().player.pos.y, 180.0);
    }

    #[test]
    fn test_held_key_moves_player() {
        let mut s = session();
        s.start();
        s.handle_key("ArrowLeft", true);
        run(&mut s, 160.0); // ten polls
        assert_eq!(s.state().player.pos.x, 50.0);

        s.handle_key("ArrowLeft", false);
        run(&mut s, 160.0);
        assert_eq!(s.state().player.pos.x, 50.0);

        // Walls clamp
        s.handle_key("ArrowLeft", true);
        run(&mut s, 320.0);
        assert_eq!(s.state().player.pos.x, 0.0);
    }

    #[test]
    fn test_jump_key_starts_game() {
        let mut s = session();
        s.handle_key("Space", true);
        assert_eq!(s.phase(), GamePhase::Running);
        assert!(!s.state().mid_jump);

        // Held key does not jump on repeat
        s.handle_key("Space", true);
        assert!(!s.state().mid_jump);
        s.handle_key("Space", false);
        s.handle_key("Space", true);
        assert!(s.state().mid_jump);
    }

    #[test]
    fn test_standing_still_ends_run_and_restart() {
        let mut s = session();
        s.start();
        // Tram 1 reaches the spawn point and keeps knocking the player out
        run(&mut s, 2000.0);
        assert_eq!(s.phase(), GamePhase::Over);
        assert_eq!(s.state().lives, 0);
        let ticks = s.state().time_ticks;
        run(&mut s, 1000.0);
        assert_eq!(s.state().time_ticks, ticks);

        let events = s.drain_events();
        let losses = events
            .iter()
            .filter(|e| matches!(e, GameEvent::LifeLost { cause: LossCause::Side, .. }))
            .count();
        assert_eq!(losses, 3);
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));

        s.handle_key("KeyR", true);
        assert_eq!(s.phase(), GamePhase::Running);
        assert_eq!(s.generation(), 1);
        assert_eq!(s.state().lives, 3);
        assert_eq!(s.state().score, 0);
        assert_eq!(s.state().time_ticks, 0);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let mut s = session();
        s.start();
        s.advance(1000.0);
        assert_eq!(s.state().time_ticks, u64::from(MAX_SUBSTEPS));
        assert_eq!(s.now_ms(), 1000.0);
    }

    #[test]
    fn test_restart_ignored_while_running() {
        let mut s = session();
        s.start();
        s.advance(50.0);
        let before = s.snapshot();
        s.restart();
        assert_eq!(s.generation(), 0);
        assert!(Arc::ptr_eq(&before, &s.snapshot()));
    }

    #[test]
    fn test_snapshot_is_stable_for_readers() {
        let mut s = session();
        s.start();
        let held = s.snapshot();
        run(&mut s, 500.0);
        assert_eq!(held.time_ticks, 0);
        assert!(s.state().time_ticks > 0);
    }

    #[test]
    fn test_shutdown_cancels_timers() {
        let mut s = session();
        s.start();
        s.jump();
        s.shutdown();
        let ticks = s.state().time_ticks;
        s.advance(1000.0);
        assert_eq!(s.state().time_ticks, ticks);
        assert!(s.state().mid_jump);
    }

    #[test]
    fn test_closed_session_ignores_input() {
        let mut s = session();
        s.start();
        s.shutdown();
        assert!(s.is_closed());
        let closed = s.snapshot();

        s.handle_key("Space", true);
        s.handle_key("ArrowLeft", true);
        s.handle_input(InputEvent::KeyDown(Key::Pause));
        s.advance(100.0);
        s.toggle_pause();
        s.jump();
        s.start();
        s.restart();

        assert!(Arc::ptr_eq(&closed, &s.snapshot()));
        assert_eq!(s.state().time_ticks, 0);
        assert!(!s.state().mid_jump);
        assert!(s.drain_events().is_empty());
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn test_invalid_cadence_is_rejected() {
        for tuning in [
            Tuning {
                poll_interval_ms: 0.0,
                ..Default::default()
            },
            Tuning {
                tick_rate_hz: 0.0,
                ..Default::default()
            },
        ] {
            let settings = Settings {
                seed: Some(1),
                tuning,
                ..Default::default()
            };
            assert!(matches!(
                GameSession::new(settings),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn test_aliased_direction_keys_keep_moving() {
        let mut s = session();
        s.start();
        s.handle_key("ArrowLeft", true);
        s.handle_key("KeyA", true);
        s.handle_key("KeyA", false);
        run(&mut s, 16.0);
        assert_eq!(s.state().player.pos.x, 95.0);

        s.handle_key("ArrowLeft", false);
        run(&mut s, 16.0);
        assert_eq!(s.state().player.pos.x, 95.0);
    }
}
