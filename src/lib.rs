//! Rhythm Dash - A side-scrolling rhythm platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (beat clock, physics, session state machine)
//! - `scheduler`: Fixed-timestep accumulator driving the simulation
//! - `game`: Owns the simulation, the scheduler and the audio transport
//! - `audio`: Audio transport abstraction with graceful degradation
//! - `renderer`: Render sink trait and WebGPU rendering pipeline
//! - `tuning`: Data-driven physics constants

pub mod audio;
pub mod game;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{FrameSnapshot, Game};
pub use scheduler::FixedStepScheduler;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one physics tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Upper bound on a single frame delta (avoids a catch-up storm after tab resume)
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Logical viewport size
    pub const VIEW_WIDTH: f32 = 960.0;
    pub const VIEW_HEIGHT: f32 = 540.0;

    /// Width of one map column
    pub const TILE_WIDTH: f32 = 40.0;
    /// Height of the ground band under the ground line
    pub const GROUND_DEPTH: f32 = 80.0;
    /// Y of the walkable surface (screen coords, y grows downward)
    pub const GROUND_LINE: f32 = VIEW_HEIGHT - GROUND_DEPTH;

    /// Player block defaults (x is fixed on screen, the world scrolls under it)
    pub const PLAYER_X: f32 = 140.0;
    pub const PLAYER_SIZE: f32 = 32.0;

    /// Overlay hides once this share of its fade window has elapsed
    pub const OVERLAY_HIDE_RATIO: f32 = 0.85;

    /// Fade curtain speed (opacity per tick) and snap distance
    pub const FADE_SPEED: f32 = 0.05;
    pub const FADE_SNAP: f32 = 0.02;
}

/// Linear interpolation between two colors
#[inline]
pub fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Convert a `#rrggbb` hex literal to linear-ish RGBA floats
#[inline]
pub const fn rgb(hex: u32, alpha: f32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        alpha,
    ]
}
