//! Game loop glue
//!
//! [`Game`] owns the simulation, the fixed-step scheduler and the audio
//! transport. Each display frame it runs the due fixed steps, applies the
//! audio cues the simulation emitted, and hands one read-only
//! [`FrameSnapshot`] to a render sink.

use crate::audio::{AudioStatus, TransportHandle};
use crate::renderer::RenderSink;
use crate::scheduler::FixedStepScheduler;
use crate::settings::Settings;
use crate::sim::{
    AudioCue, Catalog, Command, Level, ParticlePool, PlayerBody, SessionState, SimulationState,
    TickEvents, tick,
};
use crate::tuning::Tuning;

/// Shown instead of the level line while the host refuses to start music
pub const AUTOPLAY_HINT: &str = "Tap or press Space/Enter to start audio (autoplay blocked).";

/// Keyboard mapping (`KeyboardEvent.code`) for the current session phase
pub fn key_command(code: &str, session: SessionState) -> Option<Command> {
    let in_menu = session == SessionState::Menu;
    match code {
        "Space" | "Enter" | "NumpadEnter" if in_menu => Some(Command::MenuConfirm),
        "ArrowLeft" if in_menu => Some(Command::MenuPrev),
        "ArrowRight" if in_menu => Some(Command::MenuNext),
        "Space" => Some(Command::Jump),
        "KeyR" => Some(Command::Retry),
        "KeyN" => Some(Command::Advance),
        "Escape" => Some(Command::Quit),
        _ => None,
    }
}

/// Read-only view of the latest post-step state
#[derive(Debug, Clone)]
pub struct FrameSnapshot<'a> {
    pub player: &'a PlayerBody,
    pub scroll: f32,
    pub level: &'a Level,
    pub session: SessionState,
    pub overlay_opacity: f32,
    pub fade_opacity: f32,
    /// Beat bar intensity in [0, 1]
    pub beat_proximity: f32,
    pub particles: &'a ParticlePool,
    pub status_text: String,
    pub menu_cursor: usize,
    pub audio: AudioStatus,
    /// Simulation ticks since start (drives idle animation)
    pub time_ticks: u64,
}

/// What happened during one display frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Fixed steps executed
    pub steps: u32,
    pub beats: u32,
    pub jumps: u32,
    pub assisted_jumps: u32,
    pub landings: u32,
    pub died: bool,
    pub completed: bool,
}

impl FrameReport {
    fn record(&mut self, events: &TickEvents) {
        if let Some(beat) = events.beat {
            self.beats += beat.count;
        }
        if let Some(assisted) = events.jumped {
            self.jumps += 1;
            if assisted {
                self.assisted_jumps += 1;
            }
        }
        if events.landed {
            self.landings += 1;
        }
        self.died |= events.died;
        self.completed |= events.completed;
    }
}

pub struct Game {
    state: SimulationState,
    scheduler: FixedStepScheduler,
    audio: TransportHandle,
    audio_status: AudioStatus,
    /// Transport time observed by the latest step
    last_audio_time: Option<f64>,
    volume: f32,
    muted: bool,
}

impl Game {
    pub fn new(catalog: Catalog, tuning: Tuning, seed: u64, audio: TransportHandle) -> Self {
        Self {
            state: SimulationState::new(catalog, tuning, seed),
            scheduler: FixedStepScheduler::default(),
            audio,
            audio_status: AudioStatus::Idle,
            last_audio_time: None,
            volume: 1.0,
            muted: false,
        }
    }

    /// Apply player preferences (particle budget, music volume)
    pub fn apply_settings(&mut self, settings: &Settings) {
        let capacity = settings.max_particles();
        if capacity != self.state.particles.capacity() {
            self.state.particles = ParticlePool::with_capacity(capacity);
        }
        self.volume = settings.music_level();
        self.sync_volume();
    }

    /// Silence music without touching the preferred volume (window blur)
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sync_volume();
    }

    fn sync_volume(&mut self) {
        let volume = if self.muted { 0.0 } else { self.volume };
        self.audio.set_volume(volume);
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn scheduler(&self) -> &FixedStepScheduler {
        &self.scheduler
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.audio_status
    }

    /// Queue a command for the next fixed step
    ///
    /// Every command comes from a user gesture, which is also the moment a
    /// blocked transport may retry playback.
    pub fn push(&mut self, command: Command) {
        self.audio.resume();
        self.state.push_command(command);
    }

    /// Run the fixed steps due for `frame_dt` seconds of wall time
    pub fn update(&mut self, frame_dt: f64) -> FrameReport {
        let mut report = FrameReport {
            steps: self.scheduler.accumulate(frame_dt),
            ..Default::default()
        };

        for _ in 0..report.steps {
            // One transport read per step
            let now = self.audio.current_time();
            self.last_audio_time = now;
            let events = tick(&mut self.state, now);
            report.record(&events);
            if let Some(cue) = events.audio {
                self.apply_cue(cue);
            }
        }

        self.audio_status = self.audio.status();
        report
    }

    fn apply_cue(&mut self, cue: AudioCue) {
        match cue {
            AudioCue::Start(index) => {
                let track = self.state.catalog.get(index).track.clone();
                self.audio_status = self.audio.acquire(&track);
                self.scheduler.reset();
            }
            AudioCue::Stop => {
                self.audio.release();
                self.audio_status = self.audio.status();
                self.last_audio_time = None;
            }
        }
    }

    /// Build the snapshot of the latest post-step state
    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        let state = &self.state;
        FrameSnapshot {
            player: &state.player,
            scroll: state.scroll.distance,
            level: state.level(),
            session: state.session,
            overlay_opacity: state.overlay_opacity(),
            fade_opacity: state.fade.opacity,
            beat_proximity: state.beat.proximity(self.last_audio_time),
            particles: &state.particles,
            status_text: self.status_text(),
            menu_cursor: state.menu_cursor,
            audio: self.audio_status,
            time_ticks: state.time_ticks,
        }
    }

    /// Status line for the current session phase
    pub fn status_text(&self) -> String {
        let level = self.state.level();
        match self.state.session {
            SessionState::Playing(_) | SessionState::Loading(_)
                if self.audio_status == AudioStatus::Blocked =>
            {
                AUTOPLAY_HINT.to_string()
            }
            SessionState::Playing(_) | SessionState::Loading(_) => {
                format!("{} · BPM {} · Space to jump", level.name, level.tempo_bpm)
            }
            SessionState::Dead(_) => "Hit spike! R to retry · N for next".to_string(),
            SessionState::Complete(_) => {
                format!("{} complete! Press N for next level.", level.name)
            }
            SessionState::Menu => "Menu".to_string(),
        }
    }

    /// Update, then render once with the post-step state
    pub fn frame<S: RenderSink + ?Sized>(&mut self, frame_dt: f64, sink: &mut S) -> FrameReport {
        let report = self.update(frame_dt);
        sink.present(&self.snapshot());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ManualClock, ManualTransport};
    use crate::consts::SIM_DT;

    const FRAME: f64 = SIM_DT as f64;

    fn silent_game() -> Game {
        Game::new(Catalog::builtin(), Tuning::default(), 99, TransportHandle::silent())
    }

    fn manual_game() -> (Game, ManualClock) {
        let transport = ManualTransport::new();
        let clock = transport.clock();
        let game = Game::new(
            Catalog::builtin(),
            Tuning::default(),
            99,
            TransportHandle::with_transport(transport),
        );
        (game, clock)
    }

    /// Advance frames (and the transport clock) until the session is playing
    fn start_level(game: &mut Game, clock: Option<&ManualClock>, index: usize) {
        game.push(Command::Select(index));
        for _ in 0..120 {
            if let Some(clock) = clock {
                clock.advance(FRAME);
            }
            game.update(FRAME);
            if game.state().session.is_playing() && game.state().fade.opacity == 0.0 {
                return;
            }
        }
        panic!("level never started");
    }

    #[test]
    fn test_silent_audio_still_plays() {
        let mut game = silent_game();
        start_level(&mut game, None, 0);
        assert_eq!(game.audio_status(), AudioStatus::Unavailable);

        let mut report = FrameReport::default();
        for i in 0..300 {
            if i % 45 == 0 {
                game.push(Command::Jump);
            }
            let r = game.update(FRAME);
            report.beats += r.beats;
            report.assisted_jumps += r.assisted_jumps;
        }
        assert_eq!(report.beats, 0);
        assert_eq!(report.assisted_jumps, 0);
        assert!(game.state().scroll.distance > 0.0);
    }

    #[test]
    fn test_start_cue_acquires_track() {
        let (mut game, clock) = manual_game();
        start_level(&mut game, Some(&clock), 2);
        assert_eq!(game.audio_status(), AudioStatus::Playing);

        // 110 BPM: first beat lands one interval after the clock arms
        let mut beats = 0;
        for _ in 0..120 {
            clock.advance(FRAME);
            beats += game.update(FRAME).beats;
        }
        assert!(beats >= 3, "only {beats} beats in two seconds");
    }

    #[test]
    fn test_advance_rearms_beats_on_new_track() {
        let (mut game, clock) = manual_game();
        start_level(&mut game, Some(&clock), 0);
        for _ in 0..660 {
            clock.advance(FRAME);
            game.update(FRAME);
        }

        game.push(Command::Advance);
        for _ in 0..120 {
            clock.advance(FRAME);
            game.update(FRAME);
            if game.state().session == SessionState::Playing(1) && game.state().fade.opacity == 0.0 {
                break;
            }
        }
        assert_eq!(game.state().session, SessionState::Playing(1));
        assert!(game.state().beat.next_beat_time() < 1.0);

        // 128 BPM over two seconds
        let mut beats = 0;
        for _ in 0..120 {
            clock.advance(FRAME);
            beats += game.update(FRAME).beats;
        }
        assert!(beats >= 3, "only {beats} beats after advancing");
    }

    #[test]
    fn test_quit_releases_audio() {
        let (mut game, clock) = manual_game();
        start_level(&mut game, Some(&clock), 0);
        game.push(Command::Quit);
        for _ in 0..60 {
            clock.advance(FRAME);
            game.update(FRAME);
        }
        assert_eq!(game.state().session, SessionState::Menu);
        assert_eq!(game.audio_status(), AudioStatus::Idle);
        assert_eq!(game.snapshot().beat_proximity, 0.0);
    }

    #[test]
    fn test_blocked_audio_shows_hint_until_gesture() {
        let transport = ManualTransport::blocked();
        let clock = transport.clock();
        let mut game = Game::new(
            Catalog::builtin(),
            Tuning::default(),
            5,
            TransportHandle::with_transport(transport),
        );
        // Menu gesture happens before the track exists, so it cannot unblock
        start_level(&mut game, Some(&clock), 0);
        assert_eq!(game.audio_status(), AudioStatus::Blocked);
        assert_eq!(game.status_text(), AUTOPLAY_HINT);

        game.push(Command::Jump);
        clock.advance(FRAME);
        game.update(FRAME);
        assert_eq!(game.audio_status(), AudioStatus::Playing);
        assert_eq!(game.status_text(), "Level 1 · BPM 120 · Space to jump");
    }

    #[test]
    fn test_status_text_per_phase() {
        let mut game = silent_game();
        assert_eq!(game.status_text(), "Menu");
        start_level(&mut game, None, 1);

        game.state.session = SessionState::Dead(1);
        assert_eq!(game.status_text(), "Hit spike! R to retry · N for next");
        game.state.session = SessionState::Complete(1);
        assert_eq!(game.status_text(), "Level 2 complete! Press N for next level.");
    }

    #[test]
    fn test_frame_renders_once_with_post_step_state() {
        let mut game = silent_game();
        start_level(&mut game, None, 0);
        let before = game.state().scroll.distance;

        let mut seen = Vec::new();
        let mut sink = |snapshot: &FrameSnapshot<'_>| seen.push(snapshot.scroll);
        // Three steps worth of time, one render
        let report = game.frame(FRAME * 3.0, &mut sink);
        assert_eq!(report.steps, 3);
        assert_eq!(seen.len(), 1);
        assert!((seen[0] - (before + 3.0 * 3.2)).abs() < 1e-3);
    }

    #[test]
    fn test_settings_resize_particle_pool() {
        let mut game = silent_game();
        let settings = Settings {
            particles: false,
            ..Default::default()
        };
        game.apply_settings(&settings);
        assert_eq!(game.state().particles.capacity(), 0);

        start_level(&mut game, None, 0);
        game.push(Command::Jump);
        game.update(FRAME);
        assert!(game.state().particles.is_empty());
    }

    #[test]
    fn test_key_mapping_depends_on_phase() {
        let menu = SessionState::Menu;
        let playing = SessionState::Playing(0);
        assert_eq!(key_command("Space", menu), Some(Command::MenuConfirm));
        assert_eq!(key_command("Space", playing), Some(Command::Jump));
        assert_eq!(key_command("ArrowLeft", menu), Some(Command::MenuPrev));
        assert_eq!(key_command("ArrowRight", playing), None);
        assert_eq!(key_command("KeyR", SessionState::Dead(0)), Some(Command::Retry));
        assert_eq!(key_command("KeyN", SessionState::Complete(0)), Some(Command::Advance));
        assert_eq!(key_command("Escape", playing), Some(Command::Quit));
        assert_eq!(key_command("KeyQ", playing), None);
    }

    #[test]
    fn test_frame_jitter_does_not_change_trajectory() {
        let started = || {
            let mut game = silent_game();
            start_level(&mut game, None, 0);
            game.push(Command::Jump);
            game
        };

        let mut jittery = started();
        let mut steps = 0;
        for dt in [0.5, 1.5, 2.0, 0.25, 0.75, 3.0, 1.0] {
            steps += jittery.update(FRAME * dt).steps;
        }

        let mut even = started();
        for _ in 0..steps {
            assert_eq!(even.update(FRAME).steps, 1);
        }

        assert_eq!(even.state().scroll, jittery.state().scroll);
        assert_eq!(even.state().player, jittery.state().player);
    }
}
