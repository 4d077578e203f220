//! Lookback ranges for the author report.
//!
//! A range is chosen from a closed set of labels ("1 year ago", "all time", ...)
//! and resolves to an absolute cutoff instant relative to a caller-supplied `now`.
//! Anything outside the set, including an empty string, is treated as
//! [`RangeLabel::DEFAULT`] rather than rejected.
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

// ============================================================================
// RangeLabel
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeLabel {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    AllTime,
}

impl RangeLabel {
    /// Label used when nothing (or nothing recognizable) was stored or submitted.
    pub const DEFAULT: RangeLabel = RangeLabel::OneYear;

    /// Every label, in the order the selector shows them.
    pub const ALL: [RangeLabel; 6] = [
        RangeLabel::OneMonth,
        RangeLabel::ThreeMonths,
        RangeLabel::SixMonths,
        RangeLabel::OneYear,
        RangeLabel::TwoYears,
        RangeLabel::AllTime,
    ];

    /// The human-readable label, which is also the wire and storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            RangeLabel::OneMonth => "1 month ago",
            RangeLabel::ThreeMonths => "3 months ago",
            RangeLabel::SixMonths => "6 months ago",
            RangeLabel::OneYear => "1 year ago",
            RangeLabel::TwoYears => "2 years ago",
            RangeLabel::AllTime => "all time",
        }
    }

    /// Exact match against the canonical labels.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == label)
    }

    /// Like [`RangeLabel::parse`], but unrecognized labels become [`RangeLabel::DEFAULT`].
    pub fn parse_or_default(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|| {
            if !label.is_empty() {
                tracing::debug!(label = %label, "Unrecognized range label, using default");
            }
            Self::DEFAULT
        })
    }

    /// Months to step back from `now`. `None` for the open-ended range.
    fn months_back(self) -> Option<u32> {
        match self {
            RangeLabel::OneMonth => Some(1),
            RangeLabel::ThreeMonths => Some(3),
            RangeLabel::SixMonths => Some(6),
            RangeLabel::OneYear => Some(12),
            RangeLabel::TwoYears => Some(24),
            RangeLabel::AllTime => None,
        }
    }

    /// Absolute cutoff for this range.
    ///
    /// Calendar months are subtracted; when the target month is shorter the day
    /// is clamped (May 31 minus 3 months is Feb 28/29). "all time" resolves to
    /// [`earliest`], which no stored post date precedes.
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self.months_back() {
            Some(months) => now
                .checked_sub_months(Months::new(months))
                .unwrap_or_else(earliest),
            None => earliest(),
        }
    }
}

impl Default for RangeLabel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 0001-01-01 00:00:00, the floor of the four-digit `post_date` format.
///
/// Formatted with `POST_DATE_FORMAT` it sorts at or before every stored date,
/// including those before 1970.
pub fn earliest() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Resolve a free-form label to a cutoff, falling back to the default range.
pub fn resolve(label: &str, now: NaiveDateTime) -> NaiveDateTime {
    RangeLabel::parse_or_default(label).resolve(now)
}

// ============================================================================
// Tests
// ============================================================================
