//! Time-keyed animation curves
//!
//! A curve is a pure function of time. It knows nothing about slots or the
//! graph; the [`Animator`](crate::animator::Animator) binds curves to
//! inputs.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shape of an easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    #[default]
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

impl EasingFunction {
    /// The "in" form of the easing at progress `t` in `[0, 1]`
    fn ease_in(self, t: f64) -> f64 {
        match self {
            EasingFunction::Sine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::Quad => t.powi(2),
            EasingFunction::Cubic => t.powi(3),
            EasingFunction::Quart => t.powi(4),
            EasingFunction::Quint => t.powi(5),
            EasingFunction::Expo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * t - 10.0)
                }
            }
            EasingFunction::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EasingFunction::Back => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                c3 * t * t * t - c1 * t * t
            }
            EasingFunction::Elastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    -2.0_f64.powf(10.0 * t - 10.0) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            EasingFunction::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingDirection {
    In,
    Out,
    #[default]
    InOut,
}

/// Easing function plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Easing {
    pub function: EasingFunction,
    pub direction: EasingDirection,
}

impl Easing {
    pub fn new(function: EasingFunction, direction: EasingDirection) -> Self {
        Self {
            function,
            direction,
        }
    }

    /// Map linear progress to eased progress. `t` is clamped to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let f = self.function;
        match self.direction {
            EasingDirection::In => f.ease_in(t),
            EasingDirection::Out => 1.0 - f.ease_in(1.0 - t),
            EasingDirection::InOut => {
                if t < 0.5 {
                    f.ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - f.ease_in(2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }
}

/// How a key blends toward the next key
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interpolation {
    /// Hold the key's value until the next key
    Constant,
    #[default]
    Linear,
    Eased(Easing),
}

impl Interpolation {
    fn progress(&self, t: f64) -> f64 {
        match self {
            Interpolation::Constant => 0.0,
            Interpolation::Linear => t,
            Interpolation::Eased(easing) => easing.apply(t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Keyframe {
    pub fn new(time: f64, value: f64, interpolation: Interpolation) -> Self {
        Self {
            time,
            value,
            interpolation,
        }
    }

    pub fn linear(time: f64, value: f64) -> Self {
        Self::new(time, value, Interpolation::Linear)
    }

    pub fn constant(time: f64, value: f64) -> Self {
        Self::new(time, value, Interpolation::Constant)
    }
}

/// Keyframes ordered by time, at most one per timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut curve = Self::new();
        for key in keys {
            curve.add_key(key);
        }
        curve
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Insert a key, replacing any key at exactly the same time
    pub fn add_key(&mut self, key: Keyframe) {
        match self
            .keys
            .binary_search_by(|k| k.time.total_cmp(&key.time))
        {
            Ok(index) => self.keys[index] = key,
            Err(index) => self.keys.insert(index, key),
        }
    }

    /// Remove the key at `time`. Returns the removed key, if any.
    pub fn remove_key_at(&mut self, time: f64) -> Option<Keyframe> {
        let index = self
            .keys
            .binary_search_by(|k| k.time.total_cmp(&time))
            .ok()?;
        Some(self.keys.remove(index))
    }

    /// Last key at or before `time`
    pub fn previous_key(&self, time: f64) -> Option<&Keyframe> {
        let end = self.keys.partition_point(|k| k.time <= time);
        end.checked_sub(1).map(|i| &self.keys[i])
    }

    /// First key strictly after `time`
    pub fn next_key(&self, time: f64) -> Option<&Keyframe> {
        let start = self.keys.partition_point(|k| k.time <= time);
        self.keys.get(start)
    }

    /// Sample for a bound input.
    ///
    /// `None` means the input should show its non-animated value: a
    /// neighbouring key is missing or the previous key is constant.
    ///
    /// At exactly the last key's time the segment ending there applies, so
    /// the last key's value is reachable.
    pub fn sample_bound(&self, time: f64) -> Option<f64> {
        let prev = self.previous_key(time)?;
        let Some(next) = self.next_key(time) else {
            return self.sample_segment_end(prev, time);
        };
        if prev.interpolation == Interpolation::Constant {
            return None;
        }
        Some(blend(prev, next, time))
    }

    fn sample_segment_end(&self, last: &Keyframe, time: f64) -> Option<f64> {
        if last.time != time {
            return None;
        }
        let before = self.keys.partition_point(|k| k.time < time).checked_sub(1)?;
        if self.keys[before].interpolation == Interpolation::Constant {
            return None;
        }
        Some(last.value)
    }

    /// Sample the curve as a standalone function of time.
    ///
    /// Holds the first and last values outside the keyed range. Empty
    /// curves sample to zero.
    pub fn sample(&self, time: f64) -> f64 {
        match (self.previous_key(time), self.next_key(time)) {
            (Some(prev), Some(next)) => blend(prev, next, time),
            (Some(prev), None) => prev.value,
            (None, Some(next)) => next.value,
            (None, None) => 0.0,
        }
    }
}

fn blend(prev: &Keyframe, next: &Keyframe, time: f64) -> f64 {
    let span = next.time - prev.time;
    let linear = if span > 0.0 {
        ((time - prev.time) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let eased = prev.interpolation.progress(linear);
    prev.value + (next.value - prev.value) * eased
}
