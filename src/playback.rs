use serde::{Deserialize, Serialize};

use crate::history::{CatMapSession, StepOutcome};

pub const DEFAULT_TIMESTEP_MS: u32 = 300;
pub const MIN_TIMESTEP_MS: u32 = 50;
pub const MAX_TIMESTEP_MS: u32 = 1000;

/// Playback state for an external driver.
///
/// The driver owns the clock: while [`Playback::is_playing`] it calls
/// [`Playback::tick`] every [`Playback::timestep_ms`] milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playback {
    playing: bool,
    timestep_ms: u32,
}

impl Playback {
    pub fn new(timestep_ms: u32) -> Self {
        Self {
            playing: false,
            timestep_ms: timestep_ms.clamp(MIN_TIMESTEP_MS, MAX_TIMESTEP_MS),
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn timestep_ms(&self) -> u32 {
        self.timestep_ms
    }

    /// Shifts the timestep by `delta_ms` and returns the clamped result.
    pub fn adjust_timestep(&mut self, delta_ms: i32) -> u32 {
        let next = (self.timestep_ms as i64 + delta_ms as i64)
            .clamp(MIN_TIMESTEP_MS as i64, MAX_TIMESTEP_MS as i64);
        self.timestep_ms = next as u32;
        self.timestep_ms
    }

    /// Advances `session` one step if playing. Playback stops when the
    /// session loops back at its period.
    pub fn tick(&mut self, session: &mut CatMapSession) -> Option<StepOutcome> {
        if !self.playing {
            return None;
        }
        let outcome = session.step_forward();
        if let StepOutcome::Wrapped { .. } = outcome {
            self.stop();
        }
        Some(outcome)
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTEP_MS)
    }
}
