//! Music transport
//!
//! The simulation never talks to audio hardware. It reads one number per step
//! (the track clock) and emits start/stop cues at level transitions. This
//! module owns the transport behind those two touch points:
//!
//! - [`AudioTransport`]: the black-box player (`start`, `pause`, `current_time`)
//! - [`TransportHandle`]: lazy construction, acquire/release, degraded mode
//! - [`SilentTransport`] and [`ManualTransport`]: native and test transports
//! - `WebAudioTransport` (wasm32): an `HtmlAudioElement` per track
//!
//! Every failure degrades to "no audio, no beat assist" and is logged; none
//! is fatal.

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

/// Audio failures, all recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The host refused to start playback without a user gesture
    #[error("playback blocked by autoplay policy")]
    PlaybackBlocked,
    /// No audio subsystem on this host
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
    /// The track could not be created or loaded
    #[error("failed to load track {0}")]
    TrackLoad(String),
}

/// What the player should be told about audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioStatus {
    /// Nothing requested yet, or stopped
    #[default]
    Idle,
    Playing,
    /// Waiting on a user gesture
    Blocked,
    /// Running silently without a clock
    Unavailable,
}

/// Black-box music player
pub trait AudioTransport {
    /// Stop anything playing and start `track` from its beginning
    fn start(&mut self, track: &str) -> Result<(), AudioError>;

    /// Stop playback and release the current track
    fn pause(&mut self);

    /// Retry a blocked start after a user gesture
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    /// Seconds since the current track started; `None` without a running clock
    fn current_time(&self) -> Option<f64>;

    fn status(&self) -> AudioStatus;

    /// Music volume in [0, 1]
    fn set_volume(&mut self, _volume: f32) {}
}

/// Transport for hosts without audio; never has a clock
#[derive(Debug, Default)]
pub struct SilentTransport;

impl AudioTransport for SilentTransport {
    fn start(&mut self, _track: &str) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn current_time(&self) -> Option<f64> {
        None
    }

    fn status(&self) -> AudioStatus {
        AudioStatus::Unavailable
    }
}

/// Shared wall clock for [`ManualTransport`]
///
/// Cloned out before the transport is boxed into a handle, so the owner can
/// keep driving time afterwards.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds.max(0.0));
    }

    pub fn now(&self) -> f64 {
        self.0.get()
    }
}

/// Transport driven by hand: time only moves when its clock is advanced
///
/// Used by the native autopilot and by tests that need a beat grid.
#[derive(Debug)]
pub struct ManualTransport {
    clock: ManualClock,
    track: Option<String>,
    started_at: f64,
    blocked: bool,
    volume: f32,
}

impl Default for ManualTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTransport {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::default(),
            track: None,
            started_at: 0.0,
            blocked: false,
            volume: 1.0,
        }
    }

    /// A transport whose `start` fails until `resume` is called
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Self::new()
        }
    }

    /// Handle to the clock driving this transport
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl AudioTransport for ManualTransport {
    fn start(&mut self, track: &str) -> Result<(), AudioError> {
        self.track = Some(track.to_string());
        self.started_at = self.clock.now();
        if self.blocked {
            Err(AudioError::PlaybackBlocked)
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.track = None;
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.blocked {
            self.blocked = false;
            // Playback really begins now
            self.started_at = self.clock.now();
        }
        Ok(())
    }

    fn current_time(&self) -> Option<f64> {
        match (&self.track, self.blocked) {
            (Some(_), false) => Some(self.clock.now() - self.started_at),
            _ => None,
        }
    }

    fn status(&self) -> AudioStatus {
        match (&self.track, self.blocked) {
            (None, _) => AudioStatus::Idle,
            (Some(_), true) => AudioStatus::Blocked,
            (Some(_), false) => AudioStatus::Playing,
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

/// Builds the transport on first use
pub type TransportFactory = Box<dyn FnMut() -> Result<Box<dyn AudioTransport>, AudioError>>;

/// Owned, lazily constructed transport
///
/// Acquired when a level starts and released when the session leaves the
/// level. A failed construction is remembered: the handle stays silent for
/// the rest of the run instead of retrying every level.
pub struct TransportHandle {
    factory: Option<TransportFactory>,
    transport: Option<Box<dyn AudioTransport>>,
    status: AudioStatus,
    last_error: Option<AudioError>,
    volume: f32,
}

impl TransportHandle {
    pub fn new(factory: TransportFactory) -> Self {
        Self {
            factory: Some(factory),
            transport: None,
            status: AudioStatus::Idle,
            last_error: None,
            volume: 1.0,
        }
    }

    /// Handle that never produces sound
    pub fn silent() -> Self {
        Self::new(Box::new(|| Ok(Box::new(SilentTransport) as Box<dyn AudioTransport>)))
    }

    /// Handle around an existing transport
    pub fn with_transport<T: AudioTransport + 'static>(transport: T) -> Self {
        let mut slot = Some(transport);
        Self::new(Box::new(move || match slot.take() {
            Some(t) => Ok(Box::new(t) as Box<dyn AudioTransport>),
            None => Err(AudioError::AudioUnavailable("transport already taken".into())),
        }))
    }

    fn ensure(&mut self) -> Option<&mut Box<dyn AudioTransport>> {
        if self.transport.is_none() {
            let mut factory = self.factory.take()?;
            match factory() {
                Ok(mut transport) => {
                    transport.set_volume(self.volume);
                    log::info!("Audio transport ready");
                    self.transport = Some(transport);
                }
                Err(err) => {
                    log::warn!("Audio disabled: {err}");
                    self.status = AudioStatus::Unavailable;
                    self.last_error = Some(err);
                    return None;
                }
            }
        }
        self.transport.as_mut()
    }

    /// Stop the previous track and start `track`
    pub fn acquire(&mut self, track: &str) -> AudioStatus {
        let volume = self.volume;
        let result = match self.ensure() {
            Some(transport) => {
                transport.pause();
                transport.set_volume(volume);
                transport.start(track).map(|_| transport.status())
            }
            None => Err(self
                .last_error
                .clone()
                .unwrap_or_else(|| AudioError::AudioUnavailable("no transport".into()))),
        };

        self.status = match result {
            Ok(status) => {
                log::info!("Playing {track}");
                self.last_error = None;
                status
            }
            Err(AudioError::PlaybackBlocked) => {
                log::warn!("Autoplay blocked for {track}; waiting for a gesture");
                self.last_error = Some(AudioError::PlaybackBlocked);
                AudioStatus::Blocked
            }
            Err(err) => {
                log::warn!("Continuing without audio: {err}");
                self.last_error = Some(err);
                AudioStatus::Unavailable
            }
        };
        self.status
    }

    /// Stop playback; the transport itself is kept for the next level
    pub fn release(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.pause();
        }
        if self.status != AudioStatus::Unavailable {
            self.status = AudioStatus::Idle;
        }
    }

    /// Forward a user gesture to a blocked transport
    pub fn resume(&mut self) {
        if self.status != AudioStatus::Blocked {
            return;
        }
        if let Some(transport) = self.transport.as_mut() {
            match transport.resume() {
                Ok(()) => {
                    self.status = transport.status();
                    log::info!("Audio resumed");
                }
                Err(err) => log::warn!("Audio resume failed: {err}"),
            }
        }
    }

    /// Track clock, read once per fixed step
    pub fn current_time(&self) -> Option<f64> {
        match self.status {
            AudioStatus::Playing | AudioStatus::Blocked => {
                self.transport.as_ref().and_then(|t| t.current_time())
            }
            _ => None,
        }
    }

    /// Latest status, refreshed from the transport (async rejections land here)
    pub fn status(&mut self) -> AudioStatus {
        if matches!(self.status, AudioStatus::Playing | AudioStatus::Blocked) {
            if let Some(transport) = self.transport.as_ref() {
                self.status = transport.status();
            }
        }
        self.status
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(transport) = self.transport.as_mut() {
            transport.set_volume(self.volume);
        }
    }

    /// Whether the transport has been constructed
    pub fn is_acquired(&self) -> bool {
        self.transport.is_some()
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioTransport;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlAudioElement;

    use super::{AudioError, AudioStatus, AudioTransport};

    /// Browser transport: one `<audio>` element per track
    ///
    /// `play()` resolves asynchronously, so an autoplay rejection is recorded
    /// in a shared cell and picked up by the next `status()` poll.
    pub struct WebAudioTransport {
        element: Option<HtmlAudioElement>,
        state: Rc<Cell<AudioStatus>>,
        volume: f64,
    }

    impl WebAudioTransport {
        pub fn new() -> Result<Self, AudioError> {
            // Probe that the host can create media elements at all
            HtmlAudioElement::new()
                .map_err(|e| AudioError::AudioUnavailable(format!("{e:?}")))?;
            Ok(Self {
                element: None,
                state: Rc::new(Cell::new(AudioStatus::Idle)),
                volume: 1.0,
            })
        }

        fn play_current(&self) -> Result<(), AudioError> {
            let Some(element) = &self.element else {
                return Ok(());
            };
            let promise = element.play().map_err(|_| AudioError::PlaybackBlocked)?;
            let state = self.state.clone();
            state.set(AudioStatus::Playing);
            wasm_bindgen_futures::spawn_local(async move {
                if JsFuture::from(promise).await.is_err() {
                    state.set(AudioStatus::Blocked);
                }
            });
            Ok(())
        }
    }

    impl AudioTransport for WebAudioTransport {
        fn start(&mut self, track: &str) -> Result<(), AudioError> {
            self.pause();
            let element = HtmlAudioElement::new_with_src(track)
                .map_err(|_| AudioError::TrackLoad(track.to_string()))?;
            element.set_loop(false);
            element.set_volume(self.volume);
            self.element = Some(element);
            self.play_current()
        }

        fn pause(&mut self) {
            if let Some(element) = self.element.take() {
                let _ = element.pause();
                element.set_src("");
            }
            self.state.set(AudioStatus::Idle);
        }

        fn resume(&mut self) -> Result<(), AudioError> {
            self.play_current()
        }

        fn current_time(&self) -> Option<f64> {
            let element = self.element.as_ref()?;
            (self.state.get() == AudioStatus::Playing).then(|| element.current_time())
        }

        fn status(&self) -> AudioStatus {
            self.state.get()
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0) as f64;
            if let Some(element) = &self.element {
                element.set_volume(self.volume);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_handle_has_no_clock() {
        let mut handle = TransportHandle::silent();
        assert_eq!(handle.acquire("level1.mp3"), AudioStatus::Unavailable);
        assert_eq!(handle.current_time(), None);
    }

    #[test]
    fn test_factory_failure_degrades_once() {
        let mut calls = 0;
        let mut handle = TransportHandle::new(Box::new(move || {
            calls += 1;
            assert_eq!(calls, 1, "factory retried");
            Err(AudioError::AudioUnavailable("no device".into()))
        }));
        assert_eq!(handle.acquire("a.mp3"), AudioStatus::Unavailable);
        assert_eq!(handle.acquire("b.mp3"), AudioStatus::Unavailable);
        assert_eq!(handle.current_time(), None);
    }

    #[test]
    fn test_lazy_construction() {
        let handle = TransportHandle::with_transport(ManualTransport::new());
        assert!(!handle.is_acquired());
        let mut handle = handle;
        assert_eq!(handle.acquire("level1.mp3"), AudioStatus::Playing);
        assert!(handle.is_acquired());
        assert_eq!(handle.current_time(), Some(0.0));
    }

    #[test]
    fn test_release_stops_clock() {
        let mut handle = TransportHandle::with_transport(ManualTransport::new());
        handle.acquire("level1.mp3");
        handle.release();
        assert_eq!(handle.status(), AudioStatus::Idle);
        assert_eq!(handle.current_time(), None);
    }

    #[test]
    fn test_blocked_playback_recovers_on_gesture() {
        let mut handle = TransportHandle::with_transport(ManualTransport::blocked());
        assert_eq!(handle.acquire("level1.mp3"), AudioStatus::Blocked);
        assert_eq!(handle.current_time(), None);

        handle.resume();
        assert_eq!(handle.status(), AudioStatus::Playing);
        assert_eq!(handle.current_time(), Some(0.0));
    }

    #[test]
    fn test_manual_clock_is_rooted_at_track_start() {
        let mut t = ManualTransport::new();
        let clock = t.clock();
        clock.advance(1.0);
        assert_eq!(t.current_time(), None);
        t.start("x").unwrap();
        clock.advance(0.25);
        assert_eq!(t.current_time(), Some(0.25));
        t.start("y").unwrap();
        assert_eq!(t.current_time(), Some(0.0));
        t.pause();
        assert_eq!(t.current_time(), None);
    }

    #[test]
    fn test_clock_survives_boxing() {
        let transport = ManualTransport::new();
        let clock = transport.clock();
        let mut handle = TransportHandle::with_transport(transport);
        handle.acquire("level1.mp3");
        clock.advance(0.5);
        assert_eq!(handle.current_time(), Some(0.5));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AudioError::PlaybackBlocked.to_string(),
            "playback blocked by autoplay policy"
        );
        assert_eq!(
            AudioError::TrackLoad("a.mp3".into()).to_string(),
            "failed to load track a.mp3"
        );
    }
}
