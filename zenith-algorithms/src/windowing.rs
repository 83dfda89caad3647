//! Temporal windowing for animated playback
//!
//! A time-ordered record stream is cut into discrete steps of `step_size`
//! timestamp units. For every step the index keeps the first record that
//! belongs to it (`start_offsets`) and the first record past the step's
//! window of `window_size` units (`end_offsets`). Playback then only moves
//! a step counter and looks offsets up, so advancing a frame is O(1) no
//! matter how large the dataset is.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zenith_core::{Error, Result, TimedPoint};

/// Precomputed step boundaries over one time-ordered dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindowIndex")]
pub struct WindowIndex {
    step_size: i64,
    window_size: i64,
    num_records: usize,
    start_offsets: Vec<usize>,
    end_offsets: Vec<usize>,
}

impl WindowIndex {
    /// Build the step boundaries for a non-decreasing timestamp sequence.
    ///
    /// Fails with [`Error::InvalidWindowConfig`] when either duration is not
    /// positive or there are no timestamps.
    pub fn new(timestamps: &[i64], step_size: i64, window_size: i64) -> Result<Self> {
        if step_size <= 0 {
            return Err(Error::InvalidWindowConfig(format!(
                "step size must be positive, got {step_size}"
            )));
        }
        if window_size <= 0 {
            return Err(Error::InvalidWindowConfig(format!(
                "window size must be positive, got {window_size}"
            )));
        }
        let (Some(&min_time), Some(&max_time)) = (timestamps.first(), timestamps.last()) else {
            return Err(Error::InvalidWindowConfig(
                "cannot window an empty record sequence".to_string(),
            ));
        };

        let span = (i128::from(max_time) - i128::from(min_time)).max(0);
        let num_steps = usize::try_from(span / i128::from(step_size)).map_err(|_| {
            Error::InvalidWindowConfig(format!(
                "time span {span} is too large for step size {step_size}"
            ))
        })?;

        let min_time = i128::from(min_time);
        let step = i128::from(step_size);
        let start_offsets = scan_offsets(timestamps, min_time, step, num_steps);
        let end_offsets = scan_offsets(
            timestamps,
            min_time + i128::from(window_size),
            step,
            num_steps,
        );

        debug!(
            records = timestamps.len(),
            num_steps, step_size, window_size, "built window index"
        );

        Ok(Self {
            step_size,
            window_size,
            num_records: timestamps.len(),
            start_offsets,
            end_offsets,
        })
    }

    /// Build the index from the timestamps of a record sequence
    pub fn from_points(points: &[TimedPoint], step_size: i64, window_size: i64) -> Result<Self> {
        let timestamps: Vec<i64> = points.iter().map(|p| p.timestamp).collect();
        Self::new(&timestamps, step_size, window_size)
    }

    pub fn step_size(&self) -> i64 {
        self.step_size
    }

    pub fn window_size(&self) -> i64 {
        self.window_size
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn num_steps(&self) -> usize {
        self.start_offsets.len()
    }

    /// First record index of every step
    pub fn start_offsets(&self) -> &[usize] {
        &self.start_offsets
    }

    /// First record index past every step's window
    pub fn end_offsets(&self) -> &[usize] {
        &self.end_offsets
    }
}

#[derive(Deserialize)]
struct RawWindowIndex {
    step_size: i64,
    window_size: i64,
    num_records: usize,
    start_offsets: Vec<usize>,
    end_offsets: Vec<usize>,
}

impl TryFrom<RawWindowIndex> for WindowIndex {
    type Error = Error;

    fn try_from(raw: RawWindowIndex) -> Result<Self> {
        if raw.step_size <= 0 || raw.window_size <= 0 {
            return Err(Error::InvalidWindowConfig(format!(
                "step size {} and window size {} must be positive",
                raw.step_size, raw.window_size
            )));
        }
        if raw.start_offsets.len() != raw.end_offsets.len() {
            return Err(Error::InvalidWindowConfig(format!(
                "{} start offsets but {} end offsets",
                raw.start_offsets.len(),
                raw.end_offsets.len()
            )));
        }
        let sorted = |offsets: &[usize]| offsets.windows(2).all(|w| w[0] <= w[1]);
        let bounded = raw
            .start_offsets
            .iter()
            .zip(&raw.end_offsets)
            .all(|(&start, &end)| start <= end && end <= raw.num_records);
        if !sorted(&raw.start_offsets) || !sorted(&raw.end_offsets) || !bounded {
            return Err(Error::InvalidWindowConfig(
                "offsets must be non-decreasing and within the record count".to_string(),
            ));
        }
        Ok(Self {
            step_size: raw.step_size,
            window_size: raw.window_size,
            num_records: raw.num_records,
            start_offsets: raw.start_offsets,
            end_offsets: raw.end_offsets,
        })
    }
}

/// For `num_steps` thresholds `first, first + step, ...` record the smallest
/// index whose timestamp reaches each threshold, in one pass over the
/// records. Thresholds past the last record map to the record count.
fn scan_offsets(timestamps: &[i64], first: i128, step: i128, num_steps: usize) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(num_steps);
    let mut threshold = first;

    for (idx, &timestamp) in timestamps.iter().enumerate() {
        if offsets.len() == num_steps {
            break;
        }
        let timestamp = i128::from(timestamp);
        // A gap in the timeline satisfies several thresholds at once
        while offsets.len() < num_steps && timestamp >= threshold {
            offsets.push(idx);
            threshold += step;
        }
    }

    offsets.resize(num_steps, timestamps.len());
    offsets
}

/// Playback position over a [`WindowIndex`]
///
/// `current_step` is the first visible step and `window_steps` how many
/// steps past it stay visible. Both are clamped on every mutation, so
/// continuous UI input can never push them out of range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTemporalWindow")]
pub struct TemporalWindow {
    index: WindowIndex,
    current_step: usize,
    window_steps: usize,
    visible_end_step: usize,
}

impl TemporalWindow {
    pub fn new(index: WindowIndex) -> Self {
        let mut window = Self {
            index,
            current_step: 0,
            window_steps: 1,
            visible_end_step: 0,
        };
        window.advance(0);
        window
    }

    pub fn index(&self) -> &WindowIndex {
        &self.index
    }

    pub fn num_steps(&self) -> usize {
        self.index.num_steps()
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn window_steps(&self) -> usize {
        self.window_steps
    }

    pub fn visible_end_step(&self) -> usize {
        self.visible_end_step
    }

    fn last_step(&self) -> usize {
        self.num_steps().saturating_sub(1)
    }

    /// Move playback forward by `steps` and recompute the visible bounds.
    ///
    /// Advancing from the last step loops back to step 0. `advance(0)` only
    /// refreshes the bounds after a scrub and never moves playback.
    pub fn advance(&mut self, steps: usize) {
        if self.num_steps() == 0 {
            return;
        }

        let last = self.last_step();
        if steps > 0 && self.current_step >= last {
            trace!(num_steps = self.num_steps(), "playback wrapped");
            self.current_step = 0;
        } else {
            self.current_step = self.current_step.saturating_add(steps).min(last);
        }
        self.visible_end_step = self
            .current_step
            .saturating_add(self.window_steps)
            .min(last);
    }

    /// Half-open range of record indices the renderer should draw
    pub fn visible_range(&self) -> Range<usize> {
        if self.num_steps() == 0 {
            return 0..0;
        }
        let start = self.index.start_offsets[self.current_step];
        let end = self.index.end_offsets[self.visible_end_step];
        start..end.max(start)
    }

    /// Scrub to a step, clamped into `[0, num_steps - 1]`
    pub fn set_current_step(&mut self, step: usize) {
        self.current_step = step.min(self.last_step());
    }

    /// Set the visible width in steps, clamped into `[1, max(1, num_steps - 1)]`
    pub fn set_window_steps(&mut self, steps: usize) {
        self.window_steps = steps.clamp(1, self.last_step().max(1));
    }
}

#[derive(Deserialize)]
struct RawTemporalWindow {
    index: WindowIndex,
    current_step: usize,
    window_steps: usize,
}

/// Restored windows go through the same clamping as live scrubbing
impl TryFrom<RawTemporalWindow> for TemporalWindow {
    type Error = Error;

    fn try_from(raw: RawTemporalWindow) -> Result<Self> {
        let mut window = TemporalWindow::new(raw.index);
        window.set_window_steps(raw.window_steps);
        window.set_current_step(raw.current_step);
        window.advance(0);
        Ok(window)
    }
}
