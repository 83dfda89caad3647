//! Play/pause state and the frame-rate gate for animated layers

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zenith_algorithms::TemporalWindow;
use zenith_core::Result;

use crate::config::PlaybackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Paused,
    Playing,
}

/// Snapshot of the scrubber controls of one animated layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackCursor {
    pub current_step: usize,
    pub window_steps: usize,
    pub paused: bool,
    pub fps: f32,
}

/// Decides once per frame whether a [`TemporalWindow`] moves forward
///
/// Starts paused. While playing, the window advances by one step whenever
/// at least `1 / fps` has passed since the previous advance; the clock
/// starts on the first playing frame. While paused, every frame only
/// refreshes the window bounds so scrubbing shows up immediately.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    config: PlaybackConfig,
    state: PlaybackState,
    fps: f32,
    last_advance: Option<Instant>,
}

impl PlaybackController {
    /// Fails with [`zenith_core::Error::InvalidConfig`] when the fps range is unusable
    pub fn new(config: PlaybackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: PlaybackConfig) -> Self {
        Self {
            config,
            state: PlaybackState::Paused,
            fps: config.default_fps,
            last_advance: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set the frame rate, clamped into the configured range.
    ///
    /// NaN and infinite values are ignored. The stored rate is always positive.
    pub fn set_fps(&mut self, fps: f32) {
        if !fps.is_finite() {
            return;
        }
        let fps = fps.clamp(self.config.fps_min, self.config.fps_max);
        if fps > 0.0 {
            self.fps = fps;
        }
    }

    /// Minimum time between two advances
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    pub fn toggle(&mut self) {
        self.set_paused(!self.is_paused());
    }

    pub fn set_paused(&mut self, paused: bool) {
        let state = if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        if state != self.state {
            debug!(?state, "playback state changed");
            self.state = state;
            self.last_advance = None;
        }
    }

    /// Run the gate for one frame. Returns `true` if the window advanced.
    pub fn tick(&mut self, window: &mut TemporalWindow, now: Instant) -> bool {
        match self.state {
            PlaybackState::Paused => {
                window.advance(0);
                false
            }
            PlaybackState::Playing => {
                let Some(last) = self.last_advance else {
                    self.last_advance = Some(now);
                    window.advance(0);
                    return false;
                };
                if now.saturating_duration_since(last) >= self.frame_interval() {
                    window.advance(1);
                    self.last_advance = Some(now);
                    trace!(step = window.current_step(), "advanced playback");
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Snapshot the controls for `window`
    pub fn cursor(&self, window: &TemporalWindow) -> PlaybackCursor {
        PlaybackCursor {
            current_step: window.current_step(),
            window_steps: window.window_steps(),
            paused: self.is_paused(),
            fps: self.fps,
        }
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::with_valid_config(PlaybackConfig::default())
    }
}
