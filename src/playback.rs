//! Playback parameters, index stepping and the frame timer.

use std::time::{Duration, Instant};

/// Slowest accepted rate, in frames per second.
pub const MIN_RATE: f32 = 0.1;
pub const DEFAULT_RATE: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    /// Frames to advance per tick, at least 1.
    pub step: usize,
    /// Ticks per second, always positive.
    pub rate: f32,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playing: false,
            step: 1,
            rate: DEFAULT_RATE,
        }
    }
}

impl PlaybackState {
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = clamp_step(step);
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = clamp_rate(rate);
        self
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.rate)
    }
}

pub fn clamp_step(step: usize) -> usize {
    step.max(1)
}

pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_finite() && rate >= MIN_RATE {
        rate
    } else {
        MIN_RATE
    }
}

/// Next index after one tick. Wraps to 0 instead of taking the remainder, so
/// a sequence of 10 stepped by 3 plays 0, 3, 6, 9, 0.
pub fn advance(index: usize, step: usize, len: usize) -> usize {
    match index.checked_add(step) {
        Some(next) if next < len => next,
        _ => 0,
    }
}

/// Polled playback clock.
///
/// Fires at most once per [`poll`][Self::poll]. A late poll restarts the
/// interval from `now`, so slow renders drop frames instead of catching up.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    interval: Duration,
    last: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.last = Some(now);
    }

    pub fn disarm(&mut self) {
        self.last = None;
    }

    pub fn is_armed(&self) -> bool {
        self.last.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left until the next tick, for scheduling repaints.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.last
            .map(|last| (last + self.interval).saturating_duration_since(now))
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        if now.saturating_duration_since(last) >= self.interval {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}
