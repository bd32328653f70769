//! Closed time intervals used for windowed event queries

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A time interval `[start, end]`, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window; an inverted pair is swapped so `start <= end` always holds
    #[must_use]
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Window of the given length anchored at `start`
    #[must_use]
    pub fn starting_at(start: NaiveDateTime, length: Duration) -> Self {
        Self::new(start, start + length)
    }

    /// Window from `anchor - before` to `anchor + after`
    #[must_use]
    pub fn around(anchor: NaiveDateTime, before: Duration, after: Duration) -> Self {
        Self::new(anchor - before, anchor + after)
    }

    #[must_use]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time <= self.end
    }

    /// Whether the interval `[start, end]` shares at least one instant with the window
    #[must_use]
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start <= self.end && end >= self.start
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
