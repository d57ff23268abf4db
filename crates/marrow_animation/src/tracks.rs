use serde::{Deserialize, Serialize};

use marrow_core::{MarrowError, Result};

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// A single time-stamped value. `time` is in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    #[must_use]
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe span a track was sampled in.
///
/// Playback time usually moves by less than one keyframe per frame, so the
/// next lookup starts here and scans a few keys before falling back to a
/// binary search.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Time-ordered keyframes of one animated property.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T: Interpolatable> {
    keyframes: Vec<Keyframe<T>>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> Track<T> {
    /// Wraps `keyframes` without checking them. Keys are expected in
    /// non-decreasing time order; [`Track::validate`] checks that, and
    /// [`crate::AnimationClip::new`] runs it for every track it takes.
    /// Sampling an unchecked, unordered track never yields NaN, but the
    /// chosen span is unspecified.
    #[must_use]
    pub fn new(keyframes: Vec<Keyframe<T>>, interpolation: InterpolationMode) -> Self {
        Self {
            keyframes,
            interpolation,
        }
    }

    #[must_use]
    pub fn linear(keyframes: Vec<Keyframe<T>>) -> Self {
        Self::new(keyframes, InterpolationMode::Linear)
    }

    /// A track that holds `value` forever.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self::linear(vec![Keyframe::new(0.0, value)])
    }

    /// Zips parallel time/value arrays, the layout most importers produce.
    pub fn from_parts(
        times: &[f32],
        values: &[T],
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        if times.len() != values.len() {
            return Err(MarrowError::invalid_track(format!(
                "{} key times but {} values",
                times.len(),
                values.len()
            )));
        }
        let keyframes = times
            .iter()
            .zip(values)
            .map(|(&time, &value)| Keyframe::new(time, value))
            .collect();
        Ok(Self::new(keyframes, interpolation))
    }

    #[inline]
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe, or `0.0` for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Checks the sampling preconditions: at least one key, finite times,
    /// times non-decreasing.
    pub fn validate(&self) -> Result<()> {
        if self.keyframes.is_empty() {
            return Err(MarrowError::invalid_track("track is empty"));
        }
        if let Some(i) = self.keyframes.iter().position(|k| !k.time.is_finite()) {
            return Err(MarrowError::invalid_track(format!(
                "keyframe {i} has a non-finite time"
            )));
        }
        if let Some(i) = self
            .keyframes
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(MarrowError::invalid_track(format!(
                "keyframe {} at {}s precedes keyframe {i} at {}s",
                i + 1,
                self.keyframes[i + 1].time,
                self.keyframes[i].time
            )));
        }
        Ok(())
    }

    /// Returns a track with every value passed through `f`.
    #[must_use]
    pub fn map_values(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            keyframes: self
                .keyframes
                .iter()
                .map(|k| Keyframe::new(k.time, f(k.value)))
                .collect(),
            interpolation: self.interpolation,
        }
    }

    /// Samples the track at `time` (seconds).
    ///
    /// Clamps to the first value before the first key and to the last value
    /// after the last key. Only fails for an empty track.
    pub fn sample(&self, time: f32) -> Result<T> {
        match self.clamped(time)? {
            Some(value) => Ok(value),
            None => {
                // clamped() guarantees first.time < time < last.time here
                let index = self.bracket(time);
                Ok(self.blend(index, time))
            }
        }
    }

    /// Same result as [`Track::sample`], starting the keyframe search from
    /// the span `cursor` points at and updating it.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Result<T> {
        match self.clamped(time)? {
            Some(value) => Ok(value),
            None => {
                let index = self.locate(time, cursor);
                Ok(self.blend(index, time))
            }
        }
    }

    /// Handles the empty, single-key and out-of-range cases. Returns `None`
    /// when `time` lies strictly inside the keyed range.
    #[inline]
    fn clamped(&self, time: f32) -> Result<Option<T>> {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Err(MarrowError::invalid_track("cannot sample an empty track"));
        };

        if self.keyframes.len() == 1 || time <= first.time {
            return Ok(Some(first.value));
        }
        if time >= last.time {
            return Ok(Some(last.value));
        }
        // NaN compares false against everything and lands here otherwise
        if time.is_nan() {
            return Ok(Some(first.value));
        }
        Ok(None)
    }

    /// Finds `i` with `keys[i].time <= time < keys[i + 1].time`.
    fn locate(&self, time: f32, cursor: &mut KeyframeCursor) -> usize {
        let len = self.keyframes.len();
        let start = cursor.last_index.min(len - 2);

        let found = if self.keyframes[start].time <= time {
            // Forward: playback moving ahead
            let end = (start + MAX_SCAN_OFFSET + 1).min(len - 1);
            (start..end).find(|&i| time < self.keyframes[i + 1].time)
        } else {
            // Backward: reverse playback or a small rewind
            let begin = start.saturating_sub(MAX_SCAN_OFFSET);
            (begin..start).rev().find(|&i| self.keyframes[i].time <= time)
        };

        let index = found.unwrap_or_else(|| self.bracket(time));
        cursor.last_index = index;
        index
    }

    /// Binary search for the span containing `time`, kept in range even for
    /// unordered keys.
    #[inline]
    fn bracket(&self, time: f32) -> usize {
        let len = self.keyframes.len();
        self.keyframes
            .partition_point(|k| k.time <= time)
            .saturating_sub(1)
            .min(len - 2)
    }

    #[inline]
    fn blend(&self, index: usize, time: f32) -> T {
        let k0 = &self.keyframes[index];
        if time == k0.time || self.interpolation == InterpolationMode::Step {
            return k0.value;
        }

        let k1 = &self.keyframes[index + 1];
        // Strictly positive for ordered keys; unordered input lands here too
        let span = k1.time - k0.time;
        if !span.is_finite() || span <= 0.0 {
            return k0.value;
        }
        let t = ((time - k0.time) / span).clamp(0.0, 1.0);
        T::interpolate_linear(k0.value, k1.value, t)
    }
}
