//! Wall-clock timestamps and monotonic elapsed time for instrumented calls.

use std::fmt::Write as _;
use std::time::Instant;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Pattern used for instrumentation timestamps unless configured otherwise.
pub const DEFAULT_TIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S:%3f";

/// A validated chrono strftime pattern for record timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePattern(String);

impl TimePattern {
    /// Validates `pattern`.
    pub fn new(pattern: impl Into<String>) -> TelemetryResult<Self> {
        let pattern = pattern.into();
        let valid = !pattern.trim().is_empty()
            && !StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error));
        if valid {
            Ok(Self(pattern))
        } else {
            Err(TelemetryError::InvalidPattern(pattern))
        }
    }

    /// Returns the pattern text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats `at`, falling back to RFC 3339 if chrono refuses the pattern.
    pub fn format(&self, at: &DateTime<Local>) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format_with_items(StrftimeItems::new(&self.0))).is_err() {
            return at.to_rfc3339();
        }
        out
    }
}

impl Default for TimePattern {
    fn default() -> Self {
        Self(DEFAULT_TIME_PATTERN.to_string())
    }
}

/// Timestamps of one completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Formatted start time.
    pub start_time: String,
    /// Formatted end time.
    pub end_time: String,
    /// Monotonic duration in milliseconds.
    pub elapsed_millis: u64,
}

/// Started before a call, finished after it.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: DateTime<Local>,
    instant: Instant,
}

impl Stopwatch {
    /// Reads the start time.
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            instant: Instant::now(),
        }
    }

    /// Reads the end time and formats both.
    pub fn finish(self, pattern: &TimePattern) -> Timing {
        let elapsed = self.instant.elapsed();
        let ended_at = Local::now();
        Timing {
            start_time: pattern.format(&self.started_at),
            end_time: pattern.format(&ended_at),
            elapsed_millis: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_pattern_formats_millis() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap();
        assert_eq!(TimePattern::default().format(&at), "2024-03-09 14:05:07:000");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TimePattern::new("%Q").is_err());
        assert!(TimePattern::new("").is_err());
        assert_eq!(TimePattern::new("%H:%M").unwrap().as_str(), "%H:%M");
    }

    #[test]
    fn test_elapsed_never_negative() {
        let watch = Stopwatch::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let timing = watch.finish(&TimePattern::default());
        assert!(timing.elapsed_millis >= 5);
        assert!(timing.start_time <= timing.end_time);
    }
}
