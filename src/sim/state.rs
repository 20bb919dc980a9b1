//! Simulation state and core types
//!
//! Everything the fixed step mutates lives in [`SimulationState`]. It is owned
//! by the game loop and never shared; input reaches it only through the
//! command queue, which the tick drains once per step.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::beat::BeatClock;
use super::collision::Rect;
use super::level::{Catalog, Level};
use super::particles::ParticlePool;
use crate::consts::*;
use crate::tuning::Tuning;

/// Session phase, tagged with the catalog index of the active level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Level select
    Menu,
    /// Curtain closing before the level resets
    Loading(usize),
    /// Active gameplay
    Playing(usize),
    /// Player hit a spike
    Dead(usize),
    /// Map exhausted
    Complete(usize),
}

impl SessionState {
    /// Level index for every in-level phase
    pub fn level(&self) -> Option<usize> {
        match *self {
            SessionState::Menu => None,
            SessionState::Loading(i)
            | SessionState::Playing(i)
            | SessionState::Dead(i)
            | SessionState::Complete(i) => Some(i),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, SessionState::Playing(_))
    }

    /// Whether the session is inside a level (retry/advance/quit apply)
    pub fn in_level(&self) -> bool {
        matches!(
            self,
            SessionState::Playing(_) | SessionState::Dead(_) | SessionState::Complete(_)
        )
    }
}

/// Input commands, queued between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Edge-triggered jump press
    Jump,
    /// Restart the current level
    Retry,
    /// Move to the next level (clamped to the last one)
    Advance,
    /// Back to the menu
    Quit,
    /// Start a specific level from the menu
    Select(usize),
    /// Move the menu cursor left (wraps)
    MenuPrev,
    /// Move the menu cursor right (wraps)
    MenuNext,
    /// Start the level under the menu cursor
    MenuConfirm,
}

/// The player's block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    pub pos: Vec2,
    pub vel_y: f32,
    pub size: Vec2,
    pub on_ground: bool,
    pub alive: bool,
    /// Squash/stretch phase in [0, 1]; cosmetic only
    pub squash: f32,
}

impl Default for PlayerBody {
    fn default() -> Self {
        let size = Vec2::splat(PLAYER_SIZE);
        Self {
            pos: Vec2::new(PLAYER_X, GROUND_LINE - size.y),
            vel_y: 0.0,
            size,
            on_ground: true,
            alive: true,
            squash: 0.0,
        }
    }
}

impl PlayerBody {
    /// Resting y when standing on the ground line
    pub fn ground_y(&self) -> f32 {
        GROUND_LINE - self.size.y
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Bottom-center of the body (particle origin)
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Launch upward with the given speed; no-op unless grounded and alive
    pub fn try_jump(&mut self, speed: f32) -> bool {
        if !(self.on_ground && self.alive) {
            return false;
        }
        self.vel_y = -speed;
        self.on_ground = false;
        self.squash = 1.0;
        true
    }
}

/// Horizontal progress through the level
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    pub distance: f32,
}

/// Transition fired when the fade curtain reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeAction {
    /// Reset and start the level at this index
    Load(usize),
    /// Stop the level and return to the menu
    ToMenu,
}

/// Full-screen fade curtain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fade {
    pub opacity: f32,
    target: f32,
    active: bool,
    pending: Option<FadeAction>,
}

impl Fade {
    /// Start moving toward `target`, firing `action` on arrival
    pub fn start(&mut self, target: f32, action: Option<FadeAction>) {
        self.target = target.clamp(0.0, 1.0);
        self.active = true;
        self.pending = action;
    }

    /// Whether a transition is waiting on the curtain
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Step the curtain; returns the pending action on arrival
    pub fn update(&mut self) -> Option<FadeAction> {
        if !self.active {
            return None;
        }
        let diff = self.target - self.opacity;
        if diff.abs() < FADE_SNAP {
            self.opacity = self.target;
            self.active = false;
            self.pending.take()
        } else {
            self.opacity = (self.opacity + diff.signum() * FADE_SPEED).clamp(0.0, 1.0);
            None
        }
    }
}

/// Complete simulation state (deterministic for a given seed and command stream)
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub catalog: Catalog,
    pub tuning: Tuning,
    pub session: SessionState,
    /// Level the menu cursor points at
    pub menu_cursor: usize,
    pub player: PlayerBody,
    pub scroll: ScrollState,
    pub beat: BeatClock,
    pub fade: Fade,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticlePool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Level loads since start; salts the particle RNG
    pub loads: u64,
    seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) commands: VecDeque<Command>,
}

impl SimulationState {
    pub fn new(catalog: Catalog, tuning: Tuning, seed: u64) -> Self {
        let beat = BeatClock::from_bpm(catalog.get(0).tempo_bpm, tuning.beat_assist_window);
        Self {
            catalog,
            tuning,
            session: SessionState::Menu,
            menu_cursor: 0,
            player: PlayerBody::default(),
            scroll: ScrollState::default(),
            beat,
            fade: Fade::default(),
            particles: ParticlePool::default(),
            time_ticks: 0,
            loads: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            commands: VecDeque::new(),
        }
    }

    /// Queue a command for the next step
    pub fn push_command(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Active level (the menu cursor's level while in the menu)
    pub fn level(&self) -> &Level {
        let index = self.session.level().unwrap_or(self.menu_cursor);
        self.catalog.get(index)
    }

    /// Caption opacity for the active level (0 outside a level)
    pub fn overlay_opacity(&self) -> f32 {
        if self.session.in_level() {
            self.level().overlay.window.opacity(self.scroll.distance)
        } else {
            0.0
        }
    }

    /// Put the body, scroll, particles and beat grid back to a level's start
    pub(crate) fn reset_for_level(&mut self, index: usize) {
        let index = self.catalog.clamp_index(index);
        let level = self.catalog.get(index);
        self.beat = BeatClock::from_bpm(level.tempo_bpm, self.tuning.beat_assist_window);
        self.player = PlayerBody::default();
        self.scroll = ScrollState::default();
        self.particles.clear();
        // Same level, same particle stream: retries replay identically
        self.rng = Pcg32::seed_from_u64(self.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.loads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_starts_grounded() {
        let body = PlayerBody::default();
        assert!(body.on_ground);
        assert!(body.alive);
        assert_eq!(body.pos.y, body.ground_y());
        assert_eq!(body.pos.x, PLAYER_X);
    }

    #[test]
    fn test_try_jump_requires_ground() {
        let mut body = PlayerBody::default();
        assert!(body.try_jump(10.5));
        assert_eq!(body.vel_y, -10.5);
        assert!(!body.on_ground);

        // Airborne: velocity untouched
        body.vel_y = -3.0;
        assert!(!body.try_jump(10.5));
        assert_eq!(body.vel_y, -3.0);
    }

    #[test]
    fn test_dead_body_cannot_jump() {
        let mut body = PlayerBody {
            alive: false,
            ..Default::default()
        };
        assert!(!body.try_jump(10.5));
        assert_eq!(body.vel_y, 0.0);
    }

    #[test]
    fn test_fade_fires_once_on_arrival() {
        let mut fade = Fade::default();
        fade.start(1.0, Some(FadeAction::Load(2)));
        assert!(fade.is_pending());

        let mut fired = Vec::new();
        for _ in 0..40 {
            if let Some(action) = fade.update() {
                fired.push(action);
            }
        }
        assert_eq!(fired, vec![FadeAction::Load(2)]);
        assert_eq!(fade.opacity, 1.0);
        assert!(!fade.is_active());
    }

    #[test]
    fn test_session_level_tags() {
        assert_eq!(SessionState::Menu.level(), None);
        assert_eq!(SessionState::Dead(3).level(), Some(3));
        assert!(SessionState::Complete(0).in_level());
        assert!(!SessionState::Loading(0).in_level());
    }
}
