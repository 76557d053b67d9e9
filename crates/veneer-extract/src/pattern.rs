//! Date/time patterns for timestamps embedded in JSON parameters.
//!
//! A [`JsonParam`](crate::JsonParam) decodes its value while its pattern is
//! active on the current thread. Fields annotated with
//! `#[serde(with = "veneer_extract::pattern")]` parse and print through the
//! active pattern, or through [`DEFAULT_DATE_PATTERN`] outside a resolver.
//!
//! ```rust
//! use chrono::NaiveDateTime;
//! use serde::Deserialize;
//! use veneer_extract::pattern::{self, DatePattern};
//!
//! #[derive(Deserialize)]
//! struct Window {
//!     #[serde(with = "pattern")]
//!     since: NaiveDateTime,
//! }
//!
//! let day_first = DatePattern::parse("%d/%m/%Y %H:%M").unwrap();
//! let window: Window = pattern::with_pattern(&day_first, || {
//!     serde_json::from_str(r#"{"since":"31/12/2024 23:59"}"#)
//! })
//! .unwrap();
//! assert_eq!(window.since.to_string(), "2024-12-31 23:59:00");
//! ```

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serializer};

use crate::ExtractionError;

/// Pattern used when a parameter does not declare one.
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d %H:%M";

/// A validated chrono strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern(Cow<'static, str>);

impl DatePattern {
    /// Validates `pattern`.
    pub fn parse(pattern: impl Into<Cow<'static, str>>) -> Result<Self, ExtractionError> {
        let pattern = pattern.into();
        if !is_valid(&pattern) {
            return Err(ExtractionError::invalid_pattern(pattern.into_owned()));
        }
        Ok(Self(pattern))
    }

    /// Returns the pattern text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats a timestamp.
    pub fn format(&self, value: &NaiveDateTime) -> Result<String, fmt::Error> {
        let mut out = String::new();
        write!(out, "{}", value.format_with_items(StrftimeItems::new(&self.0)))?;
        Ok(out)
    }

    /// Parses a timestamp. Date-only patterns yield midnight.
    pub fn parse_datetime(&self, raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, &self.0).or_else(|err| {
            NaiveDate::parse_from_str(raw, &self.0)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .ok_or(err)
        })
    }
}

impl Default for DatePattern {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_DATE_PATTERN))
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `true` if `pattern` is a non-empty strftime pattern chrono accepts.
pub fn is_valid(pattern: &str) -> bool {
    !pattern.trim().is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

thread_local! {
    static ACTIVE: RefCell<Option<DatePattern>> = const { RefCell::new(None) };
}

struct Restore(Option<DatePattern>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

/// Runs `f` with `pattern` active on this thread, restoring the previous one.
pub fn with_pattern<R>(pattern: &DatePattern, f: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|active| active.borrow_mut().replace(pattern.clone()));
    let _restore = Restore(previous);
    f()
}

/// Returns the pattern active on this thread.
pub fn active() -> DatePattern {
    ACTIVE.with(|active| active.borrow().clone()).unwrap_or_default()
}

/// Serializes a timestamp with the active pattern.
pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let text = active()
        .format(value)
        .map_err(|_| serde::ser::Error::custom("timestamp does not fit the active pattern"))?;
    serializer.serialize_str(&text)
}

/// Deserializes a timestamp with the active pattern.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let pattern = active();
    pattern.parse_datetime(&raw).map_err(|err| {
        de::Error::custom(format_args!("'{raw}' does not match '{pattern}': {err}"))
    })
}

/// The same conversions for `Option<NaiveDateTime>` fields.
pub mod option {
    use super::{active, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serializes an optional timestamp with the active pattern.
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional timestamp with the active pattern.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| active().parse_datetime(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamp {
        #[serde(with = "super")]
        at: NaiveDateTime,
        #[serde(default, with = "super::option")]
        until: Option<NaiveDateTime>,
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn test_default_pattern() {
        let stamp: Stamp = serde_json::from_str(r#"{"at":"2024-05-01 08:30"}"#).unwrap();
        assert_eq!(stamp.at, at(2024, 5, 1, 8, 30));
        assert_eq!(stamp.until, None);
    }

    #[test]
    fn test_active_pattern_applies_and_restores() {
        let pattern = DatePattern::parse("%Y/%m/%d").unwrap();
        let stamp: Stamp = with_pattern(&pattern, || {
            serde_json::from_str(r#"{"at":"2024/05/01","until":"2024/05/02"}"#)
        })
        .unwrap();
        assert_eq!(stamp.at, at(2024, 5, 1, 0, 0));
        assert_eq!(stamp.until, Some(at(2024, 5, 2, 0, 0)));
        assert_eq!(active(), DatePattern::default());
    }

    #[test]
    fn test_nested_patterns_restore_outer() {
        let outer = DatePattern::parse("%d.%m.%Y").unwrap();
        let inner = DatePattern::parse("%Y").unwrap();
        with_pattern(&outer, || {
            with_pattern(&inner, || assert_eq!(active(), inner));
            assert_eq!(active(), outer);
        });
    }

    #[test]
    fn test_serialize_uses_default_pattern() {
        let stamp = Stamp {
            at: at(2024, 5, 1, 8, 30),
            until: None,
        };
        assert_eq!(
            serde_json::to_string(&stamp).unwrap(),
            r#"{"at":"2024-05-01 08:30","until":null}"#
        );
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        assert!(DatePattern::parse("%Q").is_err());
        assert!(DatePattern::parse("  ").is_err());
        assert!(DatePattern::parse("%Y-%m-%d %H:%M:%S:%3f").is_ok());
    }

    #[test]
    fn test_mismatch_is_an_error() {
        let result: Result<Stamp, _> = serde_json::from_str(r#"{"at":"yesterday"}"#);
        assert!(result.is_err());
    }
}
