//! Global date-format resolution.
//!
//! The enumeration utility prints driver dates in the machine's locale
//! convention without saying which one it used. Individual dates are
//! often ambiguous (`01/02/2020`), so the only usable signal is
//! consistency across the whole batch: a format is adopted only if it
//! parses every record's date.

use chrono::NaiveDate;

use crate::error::ParseError;

/// A candidate convention for the date portion of enumeration output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `31/12/2023` style
    DayFirst,
    /// `12/31/2023` style
    MonthFirst,
}

impl DateFormat {
    /// Candidates in preference order. The first candidate that parses
    /// every date in a batch wins.
    pub const CANDIDATES: [DateFormat; 2] = [DateFormat::DayFirst, DateFormat::MonthFirst];

    fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayFirst => "%d/%m/%Y",
            DateFormat::MonthFirst => "%m/%d/%Y",
        }
    }

    /// Parse one raw date string under this convention
    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), self.pattern()).ok()
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateFormat::DayFirst => write!(f, "day/month/year"),
            DateFormat::MonthFirst => write!(f, "month/day/year"),
        }
    }
}

/// Pick the one date convention that fits every raw date in the batch.
///
/// Candidates are tried in [`DateFormat::CANDIDATES`] order and adopted
/// all-or-nothing; a candidate that fails on even one sample is
/// discarded entirely so that a single run never mixes conventions.
/// An empty batch resolves to the preferred candidate.
pub fn resolve_date_format(samples: &[&str]) -> Result<DateFormat, ParseError> {
    for format in DateFormat::CANDIDATES {
        if samples.iter().all(|raw| format.parse(raw).is_some()) {
            return Ok(format);
        }
    }

    // Prefer showing a date no candidate could read; with cross-failures
    // (each candidate defeated by a different sample) fall back to the
    // first sample.
    let sample = samples
        .iter()
        .copied()
        .find(|raw| {
            DateFormat::CANDIDATES
                .iter()
                .all(|format| format.parse(raw).is_none())
        })
        .or_else(|| samples.first().copied())
        .unwrap_or_default()
        .to_string();

    Err(ParseError::AmbiguousDateFormat { sample })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_first_wins_when_month_first_cannot_parse_all() {
        // 13/02 is invalid as month/day (month 13), so only day-first fits
        let samples = vec!["01/02/2020", "13/02/2020"];
        assert_eq!(resolve_date_format(&samples).unwrap(), DateFormat::DayFirst);
    }

    #[test]
    fn month_first_adopted_when_day_first_fails() {
        // 03/25 is invalid as day/month (month 25)
        let samples = vec!["03/25/2023", "11/01/2022"];
        assert_eq!(
            resolve_date_format(&samples).unwrap(),
            DateFormat::MonthFirst
        );
    }

    #[test]
    fn fully_ambiguous_batch_takes_preferred_candidate() {
        // Both conventions parse both samples; preference order decides
        let samples = vec!["01/02/2020", "05/06/2021"];
        assert_eq!(resolve_date_format(&samples).unwrap(), DateFormat::DayFirst);
    }

    #[test]
    fn unparseable_sample_defeats_both_candidates() {
        let samples = vec!["01/02/2020", "2020-02-01"];
        let error = resolve_date_format(&samples).unwrap_err();
        match error {
            ParseError::AmbiguousDateFormat { sample } => assert_eq!(sample, "2020-02-01"),
            other => panic!("expected AmbiguousDateFormat, got {other:?}"),
        }
    }

    #[test]
    fn cross_failure_reports_first_sample() {
        // Day-first dies on 03/25, month-first dies on 25/03; neither
        // sample alone defeats both candidates
        let samples = vec!["03/25/2023", "25/03/2023"];
        let error = resolve_date_format(&samples).unwrap_err();
        match error {
            ParseError::AmbiguousDateFormat { sample } => assert_eq!(sample, "03/25/2023"),
            other => panic!("expected AmbiguousDateFormat, got {other:?}"),
        }
    }

    #[test]
    fn empty_batch_resolves_to_preferred() {
        assert_eq!(resolve_date_format(&[]).unwrap(), DateFormat::DayFirst);
    }

    #[test]
    fn parse_is_strict_about_trailing_text() {
        assert!(DateFormat::DayFirst.parse("01/02/2020").is_some());
        assert!(DateFormat::DayFirst.parse("01/02/2020 extra").is_none());
        assert!(DateFormat::MonthFirst.parse("garbage").is_none());
    }

    #[test]
    fn parse_accepts_unpadded_components() {
        assert_eq!(
            DateFormat::MonthFirst.parse("3/5/2023"),
            NaiveDate::from_ymd_opt(2023, 3, 5)
        );
    }
}
