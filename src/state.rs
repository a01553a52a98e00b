//! Viewer state and its transitions.
//!
//! [`ViewerState::update`] is pure: it maps an event to the next state and
//! does no I/O. The controller compares the old and new state to decide which
//! side effects to run.

use crate::field::FieldSelection;
use crate::playback::{advance, clamp_rate, clamp_step, PlaybackState};

/// User or clock driven input.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A load request was issued.
    LoadStarted,
    /// A new sequence of `len` frames replaced the old one.
    Loaded { len: usize },
    Seek(usize),
    /// Start playing, optionally from a given index.
    Play { from: Option<usize> },
    Stop,
    TogglePlay,
    /// One timer period elapsed.
    Tick,
    Select(FieldSelection),
    SetStep(usize),
    SetRate(f32),
    HeightMap(bool),
    Recording(bool),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewerState {
    pub index: usize,
    pub playback: PlaybackState,
    pub field: FieldSelection,
    pub height_map: bool,
    pub recording: bool,
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

impl ViewerState {
    pub fn is_playing(&self) -> bool {
        self.playback.playing
    }

    /// Next state after `event`, given a sequence of `len` frames.
    pub fn update(mut self, event: Event, len: usize) -> Self {
        match event {
            Event::LoadStarted => {
                self.playback.playing = false;
            }
            Event::Loaded { .. } => {
                self.index = 0;
                self.playback.playing = false;
                self.field = FieldSelection::None;
                self.height_map = false;
            }
            Event::Seek(index) => {
                self.index = clamp_index(index, len);
            }
            Event::Play { from } => {
                if len > 0 {
                    if let Some(from) = from {
                        self.index = clamp_index(from, len);
                    }
                    self.playback.playing = true;
                }
            }
            Event::Stop => {
                self.playback.playing = false;
            }
            Event::TogglePlay => {
                let next = if self.playback.playing {
                    Event::Stop
                } else {
                    Event::Play { from: None }
                };
                return self.update(next, len);
            }
            Event::Tick => {
                if self.playback.playing && len > 0 {
                    self.index = advance(self.index, self.playback.step, len);
                }
            }
            Event::Select(field) => {
                if field == FieldSelection::None {
                    self.height_map = false;
                }
                self.field = field;
            }
            Event::SetStep(step) => {
                self.playback.step = clamp_step(step);
            }
            Event::SetRate(rate) => {
                self.playback.rate = clamp_rate(rate);
            }
            Event::HeightMap(enabled) => {
                // needs a field to map
                self.height_map = enabled && self.field != FieldSelection::None;
            }
            Event::Recording(enabled) => {
                self.recording = enabled;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(index: usize) -> ViewerState {
        ViewerState::default().update(Event::Play { from: Some(index) }, 10)
    }

    #[test]
    fn test_play_stop_toggle() {
        let state = playing(4);
        assert!(state.is_playing());
        assert_eq!(state.index, 4);

        let state = state.update(Event::TogglePlay, 10);
        assert!(!state.is_playing());
        let state = state.update(Event::TogglePlay, 10);
        assert!(state.is_playing());
        assert_eq!(state.index, 4);
        assert!(!state.update(Event::Stop, 10).is_playing());
    }

    #[test]
    fn test_play_empty_sequence_stays_stopped() {
        let state = ViewerState::default().update(Event::Play { from: Some(3) }, 0);
        assert!(!state.is_playing());
        assert_eq!(state.index, 0);
    }

    #[test]
    fn test_tick_advances_only_while_playing() {
        let state = ViewerState::default()
            .update(Event::SetStep(3), 10)
            .update(Event::Tick, 10);
        assert_eq!(state.index, 0);

        let mut state = state.update(Event::Play { from: Some(0) }, 10);
        let mut seen = vec![];
        for _ in 0..4 {
            state = state.update(Event::Tick, 10);
            seen.push(state.index);
        }
        assert_eq!(seen, vec![3, 6, 9, 0]);
    }

    #[test]
    fn test_seek_clamps() {
        let state = ViewerState::default().update(Event::Seek(42), 5);
        assert_eq!(state.index, 4);
        assert_eq!(playing(20).index, 9);
    }

    #[test]
    fn test_load_resets() {
        let state = playing(3)
            .update(Event::Select(FieldSelection::select("p")), 10)
            .update(Event::HeightMap(true), 10)
            .update(Event::SetRate(30.0), 10)
            .update(Event::Recording(true), 10);
        assert!(state.height_map);

        let stopped = state.clone().update(Event::LoadStarted, 10);
        assert!(!stopped.is_playing());
        assert_eq!(stopped.index, 3);

        let loaded = stopped.update(Event::Loaded { len: 7 }, 7);
        assert_eq!(loaded.index, 0);
        assert_eq!(loaded.field, FieldSelection::None);
        assert!(!loaded.height_map);
        assert_eq!(loaded.playback.rate, 30.0);
        assert!(loaded.recording);
    }

    #[test]
    fn test_height_map_needs_field() {
        let state = ViewerState::default().update(Event::HeightMap(true), 3);
        assert!(!state.height_map);

        let state = state
            .update(Event::Select(FieldSelection::select("p")), 3)
            .update(Event::HeightMap(true), 3);
        assert!(state.height_map);

        let state = state.update(Event::Select(FieldSelection::None), 3);
        assert!(!state.height_map);
    }

    #[test]
    fn test_step_and_rate_clamped() {
        let state = ViewerState::default()
            .update(Event::SetStep(0), 3)
            .update(Event::SetRate(0.0), 3);
        assert_eq!(state.playback.step, 1);
        assert!(state.playback.rate > 0.0);
    }
}
