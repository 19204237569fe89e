//! Input state tracker
//!
//! Tracks which keys are currently held down, enabling:
//!   - Continuous movement while a direction key is held
//!   - Edge-triggered actions (jump, pause, restart) that fire once per
//!     physical press, never on OS key-repeat
//!
//! Raw key codes are mapped to `Key`s by `settings::KeyBindings`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::sim::TickInput;

/// Logical keys the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Left,
    Right,
    Jump,
    Pause,
    Restart,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Left => "left",
            Key::Right => "right",
            Key::Jump => "jump",
            Key::Pause => "pause",
            Key::Restart => "restart",
        }
    }

    /// The one-shot action a fresh press of this key requests, if any
    fn action(&self) -> Option<Action> {
        match self {
            Key::Left | Key::Right => None,
            Key::Jump => Some(Action::Jump),
            Key::Pause => Some(Action::TogglePause),
            Key::Restart => Some(Action::Restart),
        }
    }
}

/// A key edge reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
}

/// Edge-triggered requests for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Jump,
    TogglePause,
    /// Honoured only once the game is over
    Restart,
}

#[derive(Debug, Default)]
pub struct InputState {
    /// Raw codes currently held down, per key. A key is held while any of
    /// its codes is.
    held: HashMap<Key, HashSet<String>>,
    /// Actions from fresh presses since the last drain, in press order
    pending: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashMap::with_capacity(8),
            pending: Vec::with_capacity(8),
        }
    }

    /// A logical key edge with no raw code behind it
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) | InputEvent::KeyUp(key) => {
                self.handle_code(event, key.as_str())
            }
        }
    }

    /// A key edge that came from raw code `code`
    pub fn handle_code(&mut self, event: InputEvent, code: &str) {
        match event {
            InputEvent::KeyDown(key) => self.press(key, code),
            InputEvent::KeyUp(key) => self.release(key, code),
        }
    }

    /// A press (or OS repeat) of `code`. Only the transition from no code
    /// held to one code held queues an action.
    fn press(&mut self, key: Key, code: &str) {
        let codes = self.held.entry(key).or_default();
        let was_held = !codes.is_empty();
        if codes.insert(code.to_owned()) && !was_held {
            if let Some(action) = key.action() {
                self.pending.push(action);
            }
        }
    }

    fn release(&mut self, key: Key, code: &str) {
        if let Some(codes) = self.held.get_mut(&key) {
            codes.remove(code);
            if codes.is_empty() {
                self.held.remove(&key);
            }
        }
    }

    fn is_held(&self, key: Key) -> bool {
        self.held.contains_key(&key)
    }

    /// Held direction keys for the movement poll
    pub fn movement(&self) -> TickInput {
        TickInput {
            left: self.is_held(Key::Left),
            right: self.is_held(Key::Right),
        }
    }

    /// Take all queued actions, oldest first
    pub fn drain_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }

    /// Forget every held key and queued action (focus loss, teardown)
    pub fn clear(&mut self) {
        self.held.clear();
        self.pending.clear();
    }
}
