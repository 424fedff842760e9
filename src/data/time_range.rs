use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A wall-clock window to query profiles for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: SystemTime,
    pub end: SystemTime,
}

impl TimeRange {
    /// Create a range from explicit bounds. Bounds given in the wrong order
    /// are swapped.
    pub fn new(start: SystemTime, end: SystemTime) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// The window of the given length ending now.
    pub fn last(window: Duration) -> Self {
        let end = SystemTime::now();
        let start = end.checked_sub(window).unwrap_or(UNIX_EPOCH);
        Self { start, end }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start).unwrap_or_default()
    }

    /// Start and end as microseconds since the Unix epoch.
    pub fn to_micros(&self) -> (u64, u64) {
        (epoch_micros(self.start), epoch_micros(self.end))
    }
}

fn epoch_micros(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
