//! Data-driven game balance
//!
//! Every number that shapes how the game plays. Defaults reproduce the
//! canonical game; a settings file may override any subset.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Horizontal player step per input poll
    pub player_speed: f32,
    /// Leftward tram step per tick
    pub platform_speed: f32,
    /// Downward player step per tick while airborne
    pub gravity_step: f32,
    /// Slack between a top landing and a side hit
    pub landing_tolerance: f32,
    /// Recycled trams reappear in `[playfield width, playfield width + spread)`
    pub recycle_spread: f32,
    /// Upward offset applied at jump start and undone at landing
    pub jump_height: f32,
    pub jump_duration_ms: f64,
    pub collectible_reward: u64,
    pub level_bonus: u64,
    pub starting_lives: u32,
    /// Simulation ticks per second
    pub tick_rate_hz: f64,
    /// Interval between held-key movement polls
    pub poll_interval_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            platform_speed: PLATFORM_SPEED,
            gravity_step: GRAVITY_STEP,
            landing_tolerance: LANDING_TOLERANCE,
            recycle_spread: RECYCLE_SPREAD,
            jump_height: JUMP_HEIGHT,
            jump_duration_ms: JUMP_DURATION_MS,
            collectible_reward: COLLECTIBLE_REWARD,
            level_bonus: LEVEL_BONUS,
            starting_lives: STARTING_LIVES,
            tick_rate_hz: TICK_RATE_HZ,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl Tuning {
    /// Period of the simulation tick in milliseconds
    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / self.tick_rate_hz
    }

    /// Reject values that would break the simulation invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive_f32 = [
            ("player_speed", self.player_speed),
            ("platform_speed", self.platform_speed),
            ("gravity_step", self.gravity_step),
            ("jump_height", self.jump_height),
        ];
        for (field, value) in positive_f32 {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        let non_negative = [
            ("landing_tolerance", self.landing_tolerance),
            ("recycle_spread", self.recycle_spread),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be zero or more, got {value}"),
                });
            }
        }

        let positive_f64 = [
            ("jump_duration_ms", self.jump_duration_ms),
            ("tick_rate_hz", self.tick_rate_hz),
            ("poll_interval_ms", self.poll_interval_ms),
        ];
        for (field, value) in positive_f64 {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_canonical() {
        let t = Tuning::default();
        assert_eq!(t.player_speed, 5.0);
        assert_eq!(t.platform_speed, 2.0);
        assert_eq!(t.jump_height, 120.0);
        assert_eq!(t.jump_duration_ms, 600.0);
        assert_eq!(t.starting_lives, 3);
        assert!((t.tick_interval_ms() - 16.666).abs() < 0.01);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let t: Tuning = serde_json::from_str(r#"{ "platform_speed": 3.5 }"#).unwrap();
        assert_eq!(t.platform_speed, 3.5);
        assert_eq!(t.player_speed, PLAYER_SPEED);
    }

    #[test]
    fn test_validate_rejects() {
        let t = Tuning {
            starting_lives: 0,
            ..Default::default()
        };
        assert!(matches!(
            t.validate(),
            Err(ConfigError::Invalid { field: "starting_lives", .. })
        ));

        let t = Tuning {
            tick_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(t.validate().is_err());

        let t = Tuning {
            player_speed: f32::NAN,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }
}
