//! Beat clock
//!
//! Tracks the musical beat grid against the audio transport's clock. The
//! clock is fed the transport time once per fixed step as an `Option<f64>`;
//! `None` means there is no usable audio clock and the beat clock stays inert.
//!
//! Beat times are derived from the reference time and the beat index rather
//! than by repeated addition, so long tracks do not drift.

use serde::{Deserialize, Serialize};

/// One or more beats crossed during a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Index of the first beat crossed (0 = first beat after the reference)
    pub first_index: u64,
    /// Number of beats crossed this step (> 1 only after a stall)
    pub count: u32,
}

/// Beat grid tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatClock {
    reference_time: f64,
    interval_seconds: f64,
    next_beat_time: f64,
    assist_window_seconds: f64,
    /// Beats already emitted since the reference
    beats_emitted: u64,
    /// Whether a reference time has been observed yet
    armed: bool,
}

impl BeatClock {
    /// Create an unarmed clock; it arms on the first observed audio time
    pub fn new(interval_seconds: f64, assist_window_seconds: f64) -> Self {
        Self {
            reference_time: 0.0,
            interval_seconds: interval_seconds.max(f64::EPSILON),
            next_beat_time: 0.0,
            assist_window_seconds,
            beats_emitted: 0,
            armed: false,
        }
    }

    /// Create a clock for a tempo in beats per minute
    pub fn from_bpm(bpm: f32, assist_window_seconds: f64) -> Self {
        Self::new(60.0 / bpm.max(1.0) as f64, assist_window_seconds)
    }

    /// Create a clock already armed at `reference_time`
    pub fn armed_at(interval_seconds: f64, assist_window_seconds: f64, reference_time: f64) -> Self {
        let mut clock = Self::new(interval_seconds, assist_window_seconds);
        clock.arm(reference_time);
        clock
    }

    /// Anchor the beat grid: the first beat lands one interval after `reference_time`
    pub fn arm(&mut self, reference_time: f64) {
        self.reference_time = reference_time;
        self.beats_emitted = 0;
        self.next_beat_time = reference_time + self.interval_seconds;
        self.armed = true;
    }

    /// Forget the reference; the next observed time re-arms the clock
    pub fn disarm(&mut self) {
        self.armed = false;
        self.beats_emitted = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn next_beat_time(&self) -> f64 {
        self.next_beat_time
    }

    /// Total beats emitted since arming
    pub fn beats_emitted(&self) -> u64 {
        self.beats_emitted
    }

    /// Advance to `now`, reporting every beat crossed since the last call
    ///
    /// Loops rather than stepping once, so a stall that skipped several
    /// intervals still reports each beat exactly once.
    pub fn advance(&mut self, now: Option<f64>) -> Option<BeatEvent> {
        let now = now.filter(|t| t.is_finite())?;
        if !self.armed {
            self.arm(now);
            return None;
        }

        let first_index = self.beats_emitted;
        let mut count = 0u32;
        while now >= self.next_beat_time {
            count += 1;
            self.beats_emitted += 1;
            self.next_beat_time =
                self.reference_time + (self.beats_emitted + 1) as f64 * self.interval_seconds;
        }

        (count > 0).then_some(BeatEvent { first_index, count })
    }

    /// Whether `now` falls inside the assist window around the next beat
    pub fn is_near_beat(&self, now: Option<f64>) -> bool {
        match now {
            Some(t) if self.armed && t.is_finite() => {
                (t - self.next_beat_time).abs() < self.assist_window_seconds
            }
            _ => false,
        }
    }

    /// Cosmetic beat-bar intensity in [0, 1], peaking on the beat
    pub fn proximity(&self, now: Option<f64>) -> f32 {
        match now {
            Some(t) if self.armed && self.assist_window_seconds > 0.0 => {
                let dist = (t - self.next_beat_time).abs();
                (1.0 - dist / self.assist_window_seconds).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }
}
