//! Session state machine
//!
//! Menu → Loading → Playing → Dead/Complete → (retry | advance | quit).
//! Loading and quitting are gated on the fade curtain: the reset happens only
//! once the screen is fully covered, then the curtain lifts again.

use super::particles::ParticleKind;
use super::state::{Command, FadeAction, SessionState, SimulationState};

/// Audio work requested by a transition, applied by the game loop after the step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Stop whatever is playing and start this level's track
    Start(usize),
    /// Stop the current track
    Stop,
}

/// Side effects of handling a command or fade arrival
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionOutcome {
    pub audio: Option<AudioCue>,
    /// Set when a jump command was honoured; true if beat-assisted
    pub jumped: Option<bool>,
}

impl TransitionOutcome {
    fn merge(&mut self, other: TransitionOutcome) {
        if other.audio.is_some() {
            self.audio = other.audio;
        }
        if other.jumped.is_some() {
            self.jumped = other.jumped;
        }
    }
}

impl SimulationState {
    /// Route one command through the state machine
    pub fn handle_command(&mut self, command: Command, audio_time: Option<f64>) -> TransitionOutcome {
        let mut out = TransitionOutcome::default();

        if command == Command::Jump {
            out.jumped = self.jump(audio_time);
            return out;
        }

        // The curtain is already carrying a transition; let it land first
        if self.fade.is_pending() {
            log::debug!("Ignoring {:?} during transition", command);
            return out;
        }

        match (command, self.session) {
            (Command::MenuPrev, SessionState::Menu) => {
                let n = self.catalog.len();
                self.menu_cursor = (self.menu_cursor + n - 1) % n;
            }
            (Command::MenuNext, SessionState::Menu) => {
                self.menu_cursor = (self.menu_cursor + 1) % self.catalog.len();
            }
            (Command::MenuConfirm, SessionState::Menu) => {
                self.begin_load(self.menu_cursor);
            }
            (Command::Select(index), SessionState::Menu) => {
                self.begin_load(index);
            }
            (Command::Retry, state) if state.in_level() => {
                if let Some(index) = state.level() {
                    self.session = SessionState::Loading(index);
                    out.merge(self.finish_load(index));
                }
            }
            (Command::Advance, state) if state.in_level() => {
                if let Some(index) = state.level() {
                    self.begin_load(index + 1);
                }
            }
            (Command::Quit, state) if state.in_level() => {
                log::info!("Leaving level, returning to menu");
                self.fade.start(1.0, Some(FadeAction::ToMenu));
            }
            (command, state) => {
                log::debug!("Command {:?} has no effect in {:?}", command, state);
            }
        }

        out
    }

    /// Apply a fade arrival
    pub fn handle_fade_action(&mut self, action: FadeAction) -> TransitionOutcome {
        match action {
            FadeAction::Load(index) => self.finish_load(index),
            FadeAction::ToMenu => {
                if let Some(index) = self.session.level() {
                    self.menu_cursor = index;
                }
                self.session = SessionState::Menu;
                self.particles.clear();
                self.beat.disarm();
                self.fade.start(0.0, None);
                TransitionOutcome {
                    audio: Some(AudioCue::Stop),
                    jumped: None,
                }
            }
        }
    }

    /// Jump if legal; returns whether the jump was beat-assisted
    ///
    /// The beat only ever makes a jump higher. Missing the beat never blocks a
    /// jump, and without an audio clock every jump uses the plain strength.
    pub fn jump(&mut self, audio_time: Option<f64>) -> Option<bool> {
        if !self.session.is_playing() {
            return None;
        }
        let assisted = self.beat.is_near_beat(audio_time);
        let multiplier = if assisted {
            self.tuning.beat_assist_multiplier
        } else {
            1.0
        };
        if !self.player.try_jump(self.tuning.jump_strength * multiplier) {
            return None;
        }
        let origin = self.player.feet();
        self.particles
            .spawn_burst(&mut self.rng, origin, ParticleKind::Jump);
        Some(assisted)
    }

    /// Close the curtain and queue a load of `index` (clamped)
    fn begin_load(&mut self, index: usize) {
        let index = self.catalog.clamp_index(index);
        log::info!("Loading {}", self.catalog.get(index).name);
        self.session = SessionState::Loading(index);
        self.fade.start(1.0, Some(FadeAction::Load(index)));
    }

    /// Reset for `index`, start its track, mark ready and lift the curtain
    fn finish_load(&mut self, index: usize) -> TransitionOutcome {
        let index = self.catalog.clamp_index(index);
        self.reset_for_level(index);
        self.menu_cursor = index;
        // Loading --ready--> Playing
        self.session = SessionState::Playing(index);
        if self.fade.opacity > 0.0 {
            self.fade.start(0.0, None);
        }
        let level = self.catalog.get(index);
        log::info!("{} ready (BPM {})", level.name, level.tempo_bpm);
        TransitionOutcome {
            audio: Some(AudioCue::Start(index)),
            jumped: None,
        }
    }
}
