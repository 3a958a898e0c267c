use serde::{Deserialize, Serialize};

use super::travel_matrix::Duration;

/// Scheduling horizon used when no explicit window is given; large enough
/// to be "always open" yet far from overflowing additions.
pub const HORIZON: Duration = 100 * 366 * 24 * 3600;

/// Closed time window `[start, end]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Duration,
    pub end: Duration,
}

impl TimeWindow {
    pub const DEFAULT: TimeWindow = TimeWindow {
        start: 0,
        end: HORIZON,
    };

    pub fn new(start: Duration, end: Duration) -> Self {
        TimeWindow { start, end }
    }

    pub fn is_valid(&self) -> bool {
        0 <= self.start && self.start <= self.end
    }

    pub fn is_default(&self) -> bool {
        self.start == 0 && self.end == HORIZON
    }

    pub fn contains(&self, time: Duration) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Windows are ordered and non-overlapping once validated, so comparing
/// by start is enough.
impl Ord for TimeWindow {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl PartialOrd for TimeWindow {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// True when `windows` is sorted by start and pairwise disjoint.
pub fn windows_are_consistent(windows: &[TimeWindow]) -> bool {
    windows.iter().all(TimeWindow::is_valid)
        && windows
            .windows(2)
            .all(|pair| pair[0].end < pair[1].start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let tw = TimeWindow::new(10, 20);
        assert!(tw.contains(10));
        assert!(tw.contains(20));
        assert!(!tw.contains(21));
    }

    #[test]
    fn test_default_is_always_open() {
        let tw = TimeWindow::default();
        assert!(tw.is_default());
        assert!(tw.contains(0));
        assert!(tw.contains(HORIZON));
    }

    #[test]
    fn test_windows_consistency() {
        let good = vec![TimeWindow::new(0, 10), TimeWindow::new(11, 20)];
        let overlapping = vec![TimeWindow::new(0, 10), TimeWindow::new(10, 20)];
        let reversed = vec![TimeWindow::new(10, 5)];

        assert!(windows_are_consistent(&good));
        assert!(!windows_are_consistent(&overlapping));
        assert!(!windows_are_consistent(&reversed));
    }
}
