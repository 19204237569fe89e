//! Game settings and preferences
//!
//! Loaded from an optional JSON file. Every field has a default, so a file
//! only needs the values it changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{InputEvent, Key};
use crate::tuning::Tuning;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Key codes (DOM `KeyboardEvent.code` names) bound to each logical key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub jump: Vec<String>,
    pub pause: Vec<String>,
    pub restart: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let codes = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            left: codes(&["ArrowLeft", "KeyA"]),
            right: codes(&["ArrowRight", "KeyD"]),
            jump: codes(&["Space", "ArrowUp", "KeyW"]),
            pause: codes(&["Escape", "KeyP"]),
            restart: codes(&["KeyR"]),
        }
    }
}

impl KeyBindings {
    fn entries(&self) -> [(Key, &Vec<String>); 5] {
        [
            (Key::Left, &self.left),
            (Key::Right, &self.right),
            (Key::Jump, &self.jump),
            (Key::Pause, &self.pause),
            (Key::Restart, &self.restart),
        ]
    }

    /// Logical key for a raw code; unbound codes map to nothing
    pub fn resolve(&self, code: &str) -> Option<Key> {
        self.entries()
            .into_iter()
            .find(|(_, codes)| codes.iter().any(|c| c == code))
            .map(|(key, _)| key)
    }

    /// Translate a raw key edge from the host
    pub fn event(&self, code: &str, pressed: bool) -> Option<InputEvent> {
        let key = self.resolve(code)?;
        Some(if pressed {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        })
    }

    /// Every key needs at least one code and no code may serve two keys
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut owner: HashMap<&str, Key> = HashMap::new();
        for (key, codes) in self.entries() {
            if codes.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "bindings",
                    reason: format!("no key bound to `{}`", key.as_str()),
                });
            }
            for code in codes {
                if let Some(other) = owner.insert(code.as_str(), key) {
                    if other != key {
                        return Err(ConfigError::Invalid {
                            field: "bindings",
                            reason: format!(
                                "`{code}` is bound to both `{}` and `{}`",
                                other.as_str(),
                                key.as_str()
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
    pub bindings: KeyBindings,
    pub tuning: Tuning,
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bindings.validate()?;
        self.tuning.validate()
    }

    /// The configured seed, or a fresh random one
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
