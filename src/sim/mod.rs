//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (particles)
//! - Audio time is an input, read once per step by the caller
//! - No rendering or platform dependencies

pub mod beat;
pub mod collision;
pub mod level;
pub mod particles;
pub mod session;
pub mod state;
pub mod tick;

pub use beat::{BeatClock, BeatEvent};
pub use collision::{Rect, spike_hit, spike_hitbox};
pub use level::{Catalog, Level, Overlay, OverlayWindow, TileKind};
pub use particles::{Particle, ParticleKind, ParticlePool};
pub use session::{AudioCue, TransitionOutcome};
pub use state::{Command, Fade, FadeAction, PlayerBody, ScrollState, SessionState, SimulationState};
pub use tick::{TickEvents, step_physics, tick};
