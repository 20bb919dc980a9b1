//! Data-driven game balance
//!
//! Physics constants are per-tick quantities (the simulation runs at a fixed
//! 60 Hz, so "units per tick" is the natural unit). Level variants that want a
//! faster scroll or wider spike margins ship a different `Tuning` instead of
//! touching the physics code.

use serde::{Deserialize, Serialize};

/// Physics and collision tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Horizontal scroll per tick
    pub scroll_speed: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Upward velocity applied by a jump
    pub jump_strength: f32,
    /// Jump multiplier granted inside the beat window
    pub beat_assist_multiplier: f32,
    /// Half-width of the beat window (seconds)
    pub beat_assist_window: f64,
    /// Squash/stretch phase lost per tick
    pub squash_decay: f32,
    /// Horizontal margin shaved off each side of a spike's hit-box
    pub spike_inset: f32,
    /// Height of the spike hit-box above the ground line
    pub spike_height: f32,
    /// Remaining map distance at which the level counts as complete
    pub completion_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            scroll_speed: 3.2,
            gravity: 0.6,
            jump_strength: 10.5,
            beat_assist_multiplier: 1.15,
            beat_assist_window: 0.14,
            squash_decay: 0.08,
            spike_inset: 6.0,
            spike_height: 36.0,
            completion_threshold: 200.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "scroll_speed": 4.0, "spike_inset": 8.0 }"#).unwrap();
        assert_eq!(tuning.scroll_speed, 4.0);
        assert_eq!(tuning.spike_inset, 8.0);
        assert_eq!(tuning.gravity, Tuning::default().gravity);
        assert_eq!(tuning.jump_strength, 10.5);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Tuning::from_json("{ scroll_speed: }").is_err());
    }
}
