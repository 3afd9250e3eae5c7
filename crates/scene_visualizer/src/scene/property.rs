//! Time-dependent property values
//!
//! A property answers "what is the value at time `t`?" and whether the answer
//! ever changes. Properties are shared between entities and the visualizer as
//! [`PropertyRef`] handles.

use crate::foundation::math::Lerp;
use crate::foundation::time::{SimTime, TimeInterval};
use std::fmt;
use std::rc::Rc;

/// Shared handle to a property
pub type PropertyRef<T> = Rc<dyn Property<T>>;

/// A value that may vary over simulation time
pub trait Property<T> {
    /// True when the value never depends on the query time
    fn is_constant(&self) -> bool;

    /// Value at `time`, or `None` when the property is undefined there
    fn value_at(&self, time: SimTime) -> Option<T>;

    /// Write the value at `time` into a caller-owned buffer.
    ///
    /// Returns `false` and leaves `result` untouched when the value is
    /// undefined. Implementations holding heap data override this to reuse
    /// the buffer's allocation.
    fn sample_into(&self, time: SimTime, result: &mut T) -> bool {
        match self.value_at(time) {
            Some(value) => {
                *result = value;
                true
            }
            None => false,
        }
    }
}

/// Create a shared constant property
pub fn constant<T: Clone + 'static>(value: T) -> PropertyRef<T> {
    Rc::new(ConstantProperty::new(value))
}

/// A property with the same value at every time
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantProperty<T> {
    value: T,
}

impl<T> ConstantProperty<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The wrapped value
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Clone> Property<T> for ConstantProperty<T> {
    fn is_constant(&self) -> bool {
        true
    }

    fn value_at(&self, _time: SimTime) -> Option<T> {
        Some(self.value.clone())
    }

    fn sample_into(&self, _time: SimTime, result: &mut T) -> bool {
        result.clone_from(&self.value);
        true
    }
}

/// Linearly interpolated samples.
///
/// Times before the first sample or after the last one are clamped to the
/// nearest sample. An empty property is undefined everywhere.
#[derive(Debug, Clone, Default)]
pub struct SampledProperty<T> {
    samples: Vec<(SimTime, T)>,
}

impl<T: Lerp + Clone> SampledProperty<T> {
    /// Create an empty sampled property
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    /// Add a sample, keeping samples sorted by time. A sample at an existing
    /// time replaces the old value.
    pub fn add_sample(&mut self, time: SimTime, value: T) {
        let index = self.samples.partition_point(|(t, _)| *t < time);
        match self.samples.get_mut(index) {
            Some(existing) if existing.0 == time => existing.1 = value,
            _ => self.samples.insert(index, (time, value)),
        }
    }

    /// Builder form of [`add_sample`](Self::add_sample)
    pub fn with_sample(mut self, time: SimTime, value: T) -> Self {
        self.add_sample(time, value);
        self
    }

    /// Number of samples
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl<T: Lerp + Clone> Property<T> for SampledProperty<T> {
    fn is_constant(&self) -> bool {
        false
    }

    fn value_at(&self, time: SimTime) -> Option<T> {
        let (first, last) = (self.samples.first()?, self.samples.last()?);
        if time <= first.0 {
            return Some(first.1.clone());
        }
        if time >= last.0 {
            return Some(last.1.clone());
        }

        let upper = self.samples.partition_point(|(t, _)| *t <= time);
        let (t0, v0) = &self.samples[upper - 1];
        let (t1, v1) = &self.samples[upper];
        let span = t1.seconds_since(*t0);
        if span <= 0.0 {
            return Some(v0.clone());
        }
        Some(v0.lerp(v1, time.seconds_since(*t0) / span))
    }
}

/// Piecewise-constant values over time intervals, undefined elsewhere
#[derive(Debug, Clone, Default)]
pub struct TimeIntervalProperty<T> {
    intervals: Vec<(TimeInterval, T)>,
}

impl<T: Clone> TimeIntervalProperty<T> {
    /// Create a property with no intervals
    pub fn new() -> Self {
        Self { intervals: Vec::new() }
    }

    /// Add a value for an interval; earlier intervals win where they overlap
    pub fn with_interval(mut self, interval: TimeInterval, value: T) -> Self {
        self.intervals.push((interval, value));
        self
    }

    fn find(&self, time: SimTime) -> Option<&T> {
        self.intervals
            .iter()
            .find(|(interval, _)| interval.contains(time))
            .map(|(_, value)| value)
    }
}

impl<T: Clone> Property<T> for TimeIntervalProperty<T> {
    fn is_constant(&self) -> bool {
        false
    }

    fn value_at(&self, time: SimTime) -> Option<T> {
        self.find(time).cloned()
    }

    fn sample_into(&self, time: SimTime, result: &mut T) -> bool {
        match self.find(time) {
            Some(value) => {
                result.clone_from(value);
                true
            }
            None => false,
        }
    }
}

/// A property computed by a closure
pub struct CallbackProperty<T> {
    callback: Box<dyn Fn(SimTime) -> Option<T>>,
    is_constant: bool,
}

impl<T> CallbackProperty<T> {
    /// Wrap a closure; `is_constant` tells classifiers whether the closure
    /// ignores its time argument
    pub fn new(callback: impl Fn(SimTime) -> Option<T> + 'static, is_constant: bool) -> Self {
        Self {
            callback: Box::new(callback),
            is_constant,
        }
    }
}

impl<T> Property<T> for CallbackProperty<T> {
    fn is_constant(&self) -> bool {
        self.is_constant
    }

    fn value_at(&self, time: SimTime) -> Option<T> {
        (self.callback)(time)
    }
}

impl<T> fmt::Debug for CallbackProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("is_constant", &self.is_constant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Point3};
    use approx::assert_relative_eq;

    fn t(seconds: f64) -> SimTime {
        SimTime::from_seconds(seconds)
    }

    #[test]
    fn test_constant_sample_reuses_buffer() {
        let property = ConstantProperty::new(vec![Point3::origin(); 4]);
        let mut scratch = Vec::with_capacity(16);
        assert!(property.sample_into(t(3.0), &mut scratch));
        assert_eq!(scratch.len(), 4);
        assert!(scratch.capacity() >= 16);
        assert!(property.is_constant());
    }

    #[test]
    fn test_sampled_interpolation_and_clamping() {
        let property = SampledProperty::new()
            .with_sample(t(10.0), 1.0_f64)
            .with_sample(t(0.0), 0.0);

        assert_eq!(property.sample_count(), 2);
        assert_relative_eq!(property.value_at(t(-5.0)).unwrap(), 0.0);
        assert_relative_eq!(property.value_at(t(2.5)).unwrap(), 0.25);
        assert_relative_eq!(property.value_at(t(20.0)).unwrap(), 1.0);
        assert!(!property.is_constant());
    }

    #[test]
    fn test_sampled_color_alpha() {
        let property = SampledProperty::new()
            .with_sample(t(0.0), Color::WHITE.with_alpha(0.5))
            .with_sample(t(10.0), Color::WHITE);
        let color = property.value_at(t(5.0)).unwrap();
        assert_relative_eq!(color.alpha, 0.75);
    }

    #[test]
    fn test_empty_sampled_is_undefined() {
        let property = SampledProperty::<f64>::new();
        let mut scratch = 7.0;
        assert!(!property.sample_into(t(0.0), &mut scratch));
        assert_relative_eq!(scratch, 7.0);
    }

    #[test]
    fn test_interval_property() {
        let property = TimeIntervalProperty::new()
            .with_interval(TimeInterval::half_open(t(0.0), t(1.0)), true)
            .with_interval(TimeInterval::half_open(t(1.0), t(2.0)), false);

        assert_eq!(property.value_at(t(0.5)), Some(true));
        assert_eq!(property.value_at(t(1.0)), Some(false));
        assert_eq!(property.value_at(t(2.0)), None);
    }

    #[test]
    fn test_callback_property() {
        let property = CallbackProperty::new(|time: SimTime| Some(time.seconds() * 2.0), false);
        assert_eq!(property.value_at(t(4.0)), Some(8.0));
        assert!(!property.is_constant());
    }
}
