//! Fixed timestep simulation tick
//!
//! One call advances the simulation by exactly one step. Order within a step:
//! fade curtain, beat clock, queued commands, physics, outcome evaluation,
//! particles. The audio time is read once by the caller and passed in.

use super::beat::BeatEvent;
use super::collision::spike_hit;
use super::particles::ParticleKind;
use super::session::AudioCue;
use super::state::{SessionState, SimulationState};

/// Everything observable that happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEvents {
    /// Beats crossed this step
    pub beat: Option<BeatEvent>,
    /// A jump happened; true if it was beat-assisted
    pub jumped: Option<bool>,
    /// The player touched down this step
    pub landed: bool,
    /// The player hit a spike this step
    pub died: bool,
    /// The map ran out this step
    pub completed: bool,
    /// Audio work for the game loop to apply before the next step
    pub audio: Option<AudioCue>,
}

/// Outcome of one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsOutcome {
    pub landed: bool,
    pub died: bool,
    pub completed: bool,
}

/// Advance the simulation by one fixed step
pub fn tick(state: &mut SimulationState, audio_time: Option<f64>) -> TickEvents {
    let mut events = TickEvents::default();

    if let Some(action) = state.fade.update() {
        events.audio = state.handle_fade_action(action).audio;
    }
    // A track that starts this step makes the sampled time stale
    let audio_time = match events.audio {
        Some(AudioCue::Start(_)) => None,
        _ => audio_time,
    };

    events.beat = state.beat.advance(audio_time);

    while let Some(command) = state.commands.pop_front() {
        let outcome = state.handle_command(command, audio_time);
        if outcome.audio.is_some() {
            events.audio = outcome.audio;
        }
        if outcome.jumped.is_some() {
            events.jumped = outcome.jumped;
        }
    }

    if let SessionState::Playing(index) = state.session {
        let outcome = step_physics(state);
        events.landed = outcome.landed;
        if outcome.died {
            log::info!("Hit spike at {:.0}", state.scroll.distance);
            state.session = SessionState::Dead(index);
            events.died = true;
        } else if outcome.completed {
            log::info!("{} complete", state.level().name);
            state.session = SessionState::Complete(index);
            events.completed = true;
        }
    }

    state.particles.update();
    state.time_ticks += 1;

    events
}

/// Advance scroll and player kinematics, then resolve collisions
///
/// Only meaningful while playing; callers gate on the session.
pub fn step_physics(state: &mut SimulationState) -> PhysicsOutcome {
    let mut out = PhysicsOutcome::default();
    let tuning = state.tuning;

    if !state.player.alive {
        return out;
    }

    // Scroll: the world moves, the player's x never does
    state.scroll.distance += tuning.scroll_speed;

    // Gravity
    let player = &mut state.player;
    player.vel_y += tuning.gravity;
    player.pos.y += player.vel_y;

    // Squash/stretch decay (cosmetic)
    if player.squash > 0.0 {
        player.squash = (player.squash - tuning.squash_decay).max(0.0);
    }

    // Ground
    let ground_y = player.ground_y();
    if player.pos.y >= ground_y {
        if !player.on_ground {
            out.landed = true;
        }
        player.pos.y = ground_y;
        player.vel_y = 0.0;
        player.on_ground = true;
    } else {
        player.on_ground = false;
    }
    if out.landed {
        let feet = state.player.feet();
        state
            .particles
            .spawn_burst(&mut state.rng, feet, ParticleKind::Land);
    }

    // Spikes
    let level = state.catalog.get(state.session.level().unwrap_or(0));
    if spike_hit(&state.player.rect(), level, state.scroll.distance, &tuning).is_some() {
        state.player.alive = false;
        out.died = true;
        let center = state.player.center();
        state
            .particles
            .spawn_burst(&mut state.rng, center, ParticleKind::Death);
        return out;
    }

    // End of map
    if level.length() - state.scroll.distance < tuning.completion_threshold {
        out.completed = true;
    }

    out
}
