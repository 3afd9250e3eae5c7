//! Simulation time and availability intervals

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the simulation clock, in seconds from an arbitrary epoch.
///
/// Unlike the frame timer of a game loop, simulation time can run backwards
/// or jump, so nothing here assumes monotonic progress.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    /// Time zero
    pub const EPOCH: Self = Self(0.0);

    /// Create a time from seconds since the epoch
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Seconds since the epoch
    pub const fn seconds(self) -> f64 {
        self.0
    }

    /// A time is usable only when it is finite
    pub fn is_valid(self) -> bool {
        self.0.is_finite()
    }

    /// Offset this time by a number of seconds
    pub fn add_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds)
    }

    /// Signed seconds from `earlier` to `self`
    pub fn seconds_since(self, earlier: Self) -> f64 {
        self.0 - earlier.0
    }
}

impl From<f64> for SimTime {
    fn from(seconds: f64) -> Self {
        Self(seconds)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// A span of simulation time with inclusive or exclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Start of the interval
    pub start: SimTime,
    /// End of the interval
    pub stop: SimTime,
    /// Whether `start` itself is part of the interval
    pub is_start_included: bool,
    /// Whether `stop` itself is part of the interval
    pub is_stop_included: bool,
}

impl TimeInterval {
    /// Closed interval `[start, stop]`
    pub fn closed(start: SimTime, stop: SimTime) -> Self {
        Self {
            start,
            stop,
            is_start_included: true,
            is_stop_included: true,
        }
    }

    /// Half-open interval `[start, stop)`
    pub fn half_open(start: SimTime, stop: SimTime) -> Self {
        Self {
            start,
            stop,
            is_start_included: true,
            is_stop_included: false,
        }
    }

    /// An interval covering all of time
    pub fn infinite() -> Self {
        Self::closed(
            SimTime::from_seconds(f64::NEG_INFINITY),
            SimTime::from_seconds(f64::INFINITY),
        )
    }

    /// True when no time satisfies the interval
    pub fn is_empty(&self) -> bool {
        if self.stop < self.start {
            return true;
        }
        self.start == self.stop && !(self.is_start_included && self.is_stop_included)
    }

    /// Check whether `time` lies within the interval
    pub fn contains(&self, time: SimTime) -> bool {
        if self.is_empty() {
            return false;
        }
        let after_start = if self.is_start_included {
            time >= self.start
        } else {
            time > self.start
        };
        let before_stop = if self.is_stop_included {
            time <= self.stop
        } else {
            time < self.stop
        };
        after_start && before_stop
    }
}

/// Time intervals ordered by start time. Overlapping intervals are kept as
/// given; lookups treat their union as the covered time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeIntervalCollection {
    intervals: Vec<TimeInterval>,
}

impl TimeIntervalCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection holding a single interval
    pub fn from_interval(interval: TimeInterval) -> Self {
        let mut collection = Self::new();
        collection.add(interval);
        collection
    }

    /// Add an interval, keeping the list sorted by start time.
    /// Empty intervals are ignored.
    pub fn add(&mut self, interval: TimeInterval) {
        if interval.is_empty() {
            return;
        }
        let index = self
            .intervals
            .partition_point(|existing| existing.start <= interval.start);
        self.intervals.insert(index, interval);
    }

    /// Find the interval containing `time`, if any
    pub fn find_interval(&self, time: SimTime) -> Option<&TimeInterval> {
        // Intervals are sorted by start, so only those starting at or before
        // `time` can contain it.
        let end = self.intervals.partition_point(|interval| interval.start <= time);
        self.intervals[..end]
            .iter()
            .rev()
            .find(|interval| interval.contains(time))
    }

    /// Check whether `time` is covered by any interval
    pub fn contains(&self, time: SimTime) -> bool {
        self.find_interval(time).is_some()
    }

    /// All intervals in start order
    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True when there are no intervals
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
