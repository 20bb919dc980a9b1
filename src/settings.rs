//! Player preferences
//!
//! Persisted in LocalStorage on the web. These are preferences only; there is
//! no save-game or progress data.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Next preset, wrapping from High back to Low
    pub fn next(self) -> Self {
        match self {
            QualityPreset::Low => QualityPreset::Medium,
            QualityPreset::Medium => QualityPreset::High,
            QualityPreset::High => QualityPreset::Low,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 512,
        }
    }

    /// Whether to render the parallax starfield
    pub fn starfield_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Jump/landing/death particle bursts
    pub particles: bool,
    /// Squash/stretch and idle bounce on the player block
    pub squash_stretch: bool,
    /// Beat bar pulse in the HUD
    pub beat_bar: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no squash/stretch, no parallax drift)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            particles: true,
            squash_stretch: true,
            beat_bar: true,

            master_volume: 0.8,
            music_volume: 0.7,
            mute_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        if preset == QualityPreset::Low {
            self.squash_stretch = false;
        }
    }

    /// Step to the next quality preset and return it
    pub fn cycle_quality(&mut self) -> QualityPreset {
        self.apply_preset(self.quality.next());
        self.quality
    }

    /// Effective particle pool capacity (0 disables bursts)
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective squash/stretch (respects reduced_motion)
    pub fn effective_squash(&self) -> bool {
        self.squash_stretch && !self.reduced_motion
    }

    /// Effective starfield drift (respects reduced_motion)
    pub fn effective_starfield(&self) -> bool {
        self.quality.starfield_enabled() && !self.reduced_motion
    }

    /// Volume handed to the music transport
    pub fn music_level(&self) -> f32 {
        (self.master_volume * self.music_volume).clamp(0.0, 1.0)
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "rhythm_dash_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_cap_follows_preset_and_toggle() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.max_particles(), 512);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_reduced_motion_overrides_effects() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.effective_squash());
        assert!(!settings.effective_starfield());
    }

    #[test]
    fn test_low_preset_disables_squash() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert!(!settings.squash_stretch);
        assert!(!settings.quality.starfield_enabled());
    }

    #[test]
    fn test_quality_cycles_through_presets() {
        let mut settings = Settings::default();
        assert_eq!(settings.cycle_quality(), QualityPreset::High);
        assert_eq!(settings.max_particles(), 512);
        assert_eq!(settings.cycle_quality(), QualityPreset::Low);
        assert!(!settings.effective_squash());
        assert!(!settings.effective_starfield());
        assert_eq!(settings.cycle_quality(), QualityPreset::Medium);
    }

    #[test]
    fn test_music_level_and_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{ "music_volume": 0.5 }"#).unwrap();
        assert_eq!(settings.master_volume, 0.8);
        assert!((settings.music_level() - 0.4).abs() < 1e-6);
    }
}
