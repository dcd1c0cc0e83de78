//! Free-form date and date-range normalization.
//!
//! Archival date fields hold whatever a cataloguer typed: `"ca. July 1896"`,
//! `"5/7/2012"`, `"1999 - 2004"`, `"2012-02-31"`. This module turns each
//! such string into an ISO 8601 value, or into nothing at all.
//!
//! A single date is resolved by trying, in order:
//!
//! 1. a permissive parse that skips words it does not understand and fills
//!    a missing month or day from a fixed anchor date (never "today"),
//! 2. a strict numeric parse that repairs out-of-range days by rolling
//!    forward (`2012-02-31` becomes `2012-03-02`),
//! 3. qualifier cleanup (`ca.`, `circa`, brackets) followed by a partial
//!    ISO 8601 read of the leading `YYYY[-MM[-DD]]`.
//!
//! Anything that survives none of these is dropped. Time of day is always
//! discarded.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

static TIME_OF_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:T|\b)\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?",
        r"(?:\s*[ap]\.?m\.?)?(?:Z|[+-]\d{2}:?\d{2})?",
    ))
    .expect("valid time-of-day regex")
});
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+|[A-Za-z]+").expect("valid token regex"));
static NUMERIC_YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})$").expect("valid y-m-d regex")
});
static NUMERIC_MDY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2})[-/.]([0-9]{1,2})[-/.]([0-9]{4})$").expect("valid m-d-y regex")
});
static QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:circa|ca|c)\.?\s*([0-9])").expect("valid qualifier regex")
});
static BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[\]()?]").expect("valid bracket regex"));
static PARTIAL_ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})(?:-([0-9]{2})(?:-([0-9]{2}))?)?(?:[^0-9]|$)")
        .expect("valid partial iso regex")
});
static RANGE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s+").expect("valid range regex"));

/// Anchor used to fill missing month and day components.
pub const DEFAULT_ANCHOR: (i32, u32, u32) = (2000, 1, 1);

/// How much of the input's precision survives normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Missing components are filled from the anchor: `"1928"` → `1928-01-01`.
    #[default]
    Anchored,
    /// Missing components stay missing: `"1928"` → `1928`.
    Preserve,
}

/// A normalized date, possibly coarser than a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    /// YYYY-MM-DD
    Date(NaiveDate),
    /// YYYY-MM
    YearMonth { year: i32, month: u32 },
    /// YYYY
    Year(i32),
}

impl DateValue {
    /// Format as ISO 8601, keeping the value's precision.
    pub fn to_iso8601(&self) -> String {
        match self {
            DateValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            DateValue::YearMonth { year, month } => format!("{year:04}-{month:02}"),
            DateValue::Year(year) => format!("{year:04}"),
        }
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// A start/end pair. A single date is a range whose ends coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn single(value: DateValue) -> Self {
        let iso = value.to_iso8601();
        Self {
            start: iso.clone(),
            end: iso,
        }
    }

    /// Whether start does not come after end.
    ///
    /// ISO 8601 strings compare correctly as text, including partial forms.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn to_json(&self) -> Value {
        json!({ "start": self.start, "end": self.end })
    }

    pub fn into_tuple(self) -> (String, String) {
        (self.start, self.end)
    }
}

/// Date components recovered from text before calendar validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fields {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
}

/// Date normalizer with a fixed anchor and precision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalNormalizer {
    anchor: NaiveDate,
    precision: Precision,
}

impl Default for TemporalNormalizer {
    fn default() -> Self {
        Self::new(default_anchor(), Precision::Anchored)
    }
}

fn default_anchor() -> NaiveDate {
    let (y, m, d) = DEFAULT_ANCHOR;
    NaiveDate::from_ymd_opt(y, m, d).expect("valid anchor date")
}

impl TemporalNormalizer {
    pub fn new(anchor: NaiveDate, precision: Precision) -> Self {
        Self { anchor, precision }
    }

    /// Normalizer that keeps bare years and year-months as they are.
    pub fn preserving_precision() -> Self {
        Self::new(default_anchor(), Precision::Preserve)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Resolve one date-like string.
    pub fn parse_date(&self, text: &str) -> Option<DateValue> {
        let stripped = TIME_OF_DAY_RE.replace_all(text, " ");
        let stripped = stripped.trim();
        if stripped.is_empty() {
            return None;
        }

        if let Some(value) = fuzzy_fields(stripped).and_then(|f| self.finish(f)) {
            return Some(value);
        }
        if let Some(date) = numeric_date(stripped) {
            return Some(DateValue::Date(date));
        }
        partial_iso_fields(stripped).and_then(|f| self.finish(f))
    }

    /// Resolve a date or a `start - end` range.
    ///
    /// The text is split at the first hyphen with whitespace on both sides.
    /// Both halves must resolve for a range to be returned.
    pub fn parse_date_or_range(&self, text: &str) -> Option<DateRange> {
        match RANGE_SPLIT_RE.find(text) {
            Some(m) => {
                let start = self.parse_date(&text[..m.start()])?;
                let end = self.parse_date(&text[m.end()..])?;
                Some(DateRange {
                    start: start.to_iso8601(),
                    end: end.to_iso8601(),
                })
            }
            None => self.parse_date(text).map(DateRange::single),
        }
    }

    /// Resolve every text, keeping only those that parse, in input order.
    pub fn parse_all<'a, I>(&self, texts: I) -> Vec<DateRange>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts
            .into_iter()
            .filter_map(|text| {
                let parsed = self.parse_date_or_range(text);
                match &parsed {
                    Some(range) if !range.is_ordered() => {
                        tracing::debug!("Date range ends before it starts: {:?}", text);
                    }
                    Some(_) => {}
                    None => tracing::debug!("Could not parse date: {:?}", text),
                }
                parsed
            })
            .collect()
    }

    fn finish(&self, fields: Fields) -> Option<DateValue> {
        let date = NaiveDate::from_ymd_opt(
            fields.year,
            fields.month.unwrap_or(self.anchor.month()),
            fields.day.unwrap_or(self.anchor.day()),
        )?;

        Some(match (self.precision, fields.month, fields.day) {
            (Precision::Preserve, None, _) => DateValue::Year(fields.year),
            (Precision::Preserve, Some(month), None) => DateValue::YearMonth {
                year: fields.year,
                month,
            },
            _ => DateValue::Date(date),
        })
    }
}

/// Resolve one date with the anchored normalizer, as ISO 8601 text.
pub fn parse_date(text: &str) -> Option<String> {
    TemporalNormalizer::default()
        .parse_date(text)
        .map(|d| d.to_iso8601())
}

/// Resolve a date or range with the anchored normalizer.
///
/// ```
/// use crosswalk::temporal::parse_date_or_range;
///
/// assert_eq!(
///     parse_date_or_range("1999 - 2004"),
///     Some(("1999-01-01".to_string(), "2004-01-01".to_string()))
/// );
/// assert_eq!(parse_date_or_range("BOGUS!"), None);
/// ```
pub fn parse_date_or_range(text: &str) -> Option<(String, String)> {
    TemporalNormalizer::default()
        .parse_date_or_range(text)
        .map(DateRange::into_tuple)
}

fn month_from_name(word: &str) -> Option<u32> {
    let month = match word.to_ascii_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn two_digit_year(yy: u32) -> i32 {
    if yy < 50 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

/// Step 1: pick numbers and month names out of arbitrary text.
///
/// Words that are not month names are skipped. Numbers are assigned by
/// shape: four digits make a year, all-numeric dates read month first
/// unless the first number cannot be a month.
fn fuzzy_fields(text: &str) -> Option<Fields> {
    let mut numbers: Vec<(u32, usize)> = Vec::new();
    let mut month_name = None;

    for token in TOKEN_RE.find_iter(text) {
        let token = token.as_str();
        if token.as_bytes()[0].is_ascii_digit() {
            numbers.push((token.parse().ok()?, token.len()));
        } else if let Some(month) = month_from_name(token) {
            if month_name.replace(month).is_some() {
                return None;
            }
        }
    }

    match month_name {
        Some(month) => fields_with_month_name(&numbers, month),
        None => fields_from_numbers(&numbers),
    }
}

fn fields_with_month_name(numbers: &[(u32, usize)], month: u32) -> Option<Fields> {
    let mut year = None;
    let mut day = None;

    for &(value, len) in numbers {
        let slot = if len >= 3 || value > 31 { &mut year } else { &mut day };
        if slot.replace(value).is_some() {
            return None;
        }
    }

    Some(Fields {
        year: i32::try_from(year?).ok()?,
        month: Some(month),
        day,
    })
}

fn fields_from_numbers(numbers: &[(u32, usize)]) -> Option<Fields> {
    let fields = match *numbers {
        [(year, 4)] => Fields {
            year: year as i32,
            month: None,
            day: None,
        },
        [(compact, 8)] => Fields {
            year: (compact / 10_000) as i32,
            month: Some(compact / 100 % 100),
            day: Some(compact % 100),
        },
        [(year, 4), (month, len)] | [(month, len), (year, 4)] if len <= 2 => {
            if !(1..=12).contains(&month) {
                return None;
            }
            Fields {
                year: year as i32,
                month: Some(month),
                day: None,
            }
        }
        [(year, 4), (month, lm), (day, ld)] if lm <= 2 && ld <= 2 => Fields {
            year: year as i32,
            month: Some(month),
            day: Some(day),
        },
        [(a, la), (b, lb), (y, ly)] if la <= 2 && lb <= 2 && (ly == 4 || ly == 2) => {
            let year = if ly == 2 { two_digit_year(y) } else { y as i32 };
            let (month, day) = if a > 12 && b <= 12 { (b, a) } else { (a, b) };
            Fields {
                year,
                month: Some(month),
                day: Some(day),
            }
        }
        _ => return None,
    };
    Some(fields)
}

/// Step 2: strict numeric layouts, repairing day overflow by date arithmetic.
fn numeric_date(text: &str) -> Option<NaiveDate> {
    let (year, month, day) = if let Some(caps) = NUMERIC_YMD_RE.captures(text) {
        (caps[1].parse::<i32>().ok()?, caps[2].parse::<u32>().ok()?, caps[3].parse::<u32>().ok()?)
    } else if let Some(caps) = NUMERIC_MDY_RE.captures(text) {
        (caps[3].parse::<i32>().ok()?, caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?)
    } else {
        return None;
    };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
}

/// Step 3: drop qualifiers and read a leading partial ISO 8601 date.
fn partial_iso_fields(text: &str) -> Option<Fields> {
    let cleaned = QUALIFIER_RE.replace_all(text, "$1");
    let cleaned = BRACKET_RE.replace_all(&cleaned, "");
    let caps = PARTIAL_ISO_RE.captures(cleaned.trim())?;

    Some(Fields {
        year: caps[1].parse().ok()?,
        month: caps.get(2).and_then(|m| m.as_str().parse().ok()),
        day: caps.get(3).and_then(|m| m.as_str().parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> Option<(String, String)> {
        Some((a.to_string(), b.to_string()))
    }

    #[test]
    fn test_fuzzy_dates() {
        assert_eq!(parse_date_or_range("ca. July 1896"), pair("1896-07-01", "1896-07-01"));
        assert_eq!(parse_date_or_range("May 20, 1928"), pair("1928-05-20", "1928-05-20"));
        assert_eq!(parse_date_or_range("20th of May 1928"), pair("1928-05-20", "1928-05-20"));
        assert_eq!(parse_date_or_range("Sept. 1901"), pair("1901-09-01", "1901-09-01"));
    }

    #[test]
    fn test_delimited_numeric_dates() {
        assert_eq!(parse_date_or_range("1999.11.01"), pair("1999-11-01", "1999-11-01"));
        assert_eq!(parse_date_or_range("12-19-2010"), pair("2010-12-19", "2010-12-19"));
        assert_eq!(parse_date_or_range("5/7/2012"), pair("2012-05-07", "2012-05-07"));
        assert_eq!(parse_date_or_range("05/20/1928"), pair("1928-05-20", "1928-05-20"));
        assert_eq!(parse_date_or_range("1928-05-20"), pair("1928-05-20", "1928-05-20"));
        assert_eq!(parse_date_or_range("19280520"), pair("1928-05-20", "1928-05-20"));
    }

    #[test]
    fn test_day_first_when_month_impossible() {
        assert_eq!(parse_date("25/12/1950"), Some("1950-12-25".to_string()));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_date("5/7/12"), Some("2012-05-07".to_string()));
        assert_eq!(parse_date("5/7/68"), Some("1968-05-07".to_string()));
    }

    #[test]
    fn test_invalid_day_rolls_forward() {
        assert_eq!(parse_date_or_range("2012-02-31"), pair("2012-03-02", "2012-03-02"));
        assert_eq!(parse_date("2011-02-29"), Some("2011-03-01".to_string()));
        assert_eq!(parse_date("04/31/1999"), Some("1999-05-01".to_string()));
    }

    #[test]
    fn test_impossible_month_is_rejected() {
        assert_eq!(parse_date("2012-13-01"), None);
    }

    #[test]
    fn test_year_ranges() {
        assert_eq!(parse_date_or_range("1999 - 2004"), pair("1999-01-01", "2004-01-01"));
        assert_eq!(
            parse_date_or_range(" 1999   -   2004  "),
            pair("1999-01-01", "2004-01-01")
        );
        assert_eq!(
            parse_date_or_range("1960-05-01 - 1960-05-15"),
            pair("1960-05-01", "1960-05-15")
        );
    }

    #[test]
    fn test_range_needs_both_ends() {
        assert_eq!(parse_date_or_range("1999 - unknown"), None);
        assert_eq!(parse_date_or_range("unknown - 1999"), None);
    }

    #[test]
    fn test_unpadded_hyphen_is_not_a_range() {
        // Read as a single date: the leading year survives the partial ISO step.
        assert_eq!(parse_date_or_range("1960-1970"), pair("1960-01-01", "1960-01-01"));
    }

    #[test]
    fn test_bogus_input() {
        assert_eq!(parse_date_or_range("BOGUS!"), None);
        assert_eq!(parse_date_or_range(""), None);
        assert_eq!(parse_date_or_range("   "), None);
        assert_eq!(parse_date_or_range("Kentucky"), None);
        assert_eq!(parse_date_or_range("Route 66"), None);
    }

    #[test]
    fn test_time_of_day_is_discarded() {
        assert_eq!(parse_date("1928-05-20T10:15:00Z"), Some("1928-05-20".to_string()));
        assert_eq!(parse_date("May 20, 1928 4:30 pm"), Some("1928-05-20".to_string()));
    }

    #[test]
    fn test_qualified_partial_iso() {
        // Too many numbers for the permissive parse; the leading date wins.
        assert_eq!(parse_date("[1928-05] box 3, folder 12"), Some("1928-05-01".to_string()));
    }

    #[test]
    fn test_preserving_precision() {
        let normalizer = TemporalNormalizer::preserving_precision();
        let iso = |s: &str| normalizer.parse_date(s).map(|d| d.to_iso8601());

        assert_eq!(iso("1928"), Some("1928".to_string()));
        assert_eq!(iso("ca. 1928\n"), Some("1928".to_string()));
        assert_eq!(iso("ca. July 1896"), Some("1896-07".to_string()));
        assert_eq!(iso("1928-05"), Some("1928-05".to_string()));
        assert_eq!(iso("5/7/2012"), Some("2012-05-07".to_string()));
        assert_eq!(iso("2012-02-31"), Some("2012-03-02".to_string()));
        assert_eq!(iso("[1928-05] box 3, folder 12"), Some("1928-05".to_string()));

        assert_eq!(
            normalizer.parse_date_or_range("1960 - 1970"),
            Some(DateRange { start: "1960".into(), end: "1970".into() })
        );
    }

    #[test]
    fn test_custom_anchor() {
        let anchor = NaiveDate::from_ymd_opt(1900, 6, 15).unwrap();
        let normalizer = TemporalNormalizer::new(anchor, Precision::Anchored);
        assert_eq!(
            normalizer.parse_date("1928").map(|d| d.to_iso8601()),
            Some("1928-06-15".to_string())
        );
    }

    #[test]
    fn test_parse_all_keeps_order_and_drops_failures() {
        let normalizer = TemporalNormalizer::preserving_precision();
        let ranges = normalizer.parse_all(["1928", "BOGUS!", "1406", "1960 - 1970"]);

        assert_eq!(
            ranges,
            vec![
                DateRange { start: "1928".into(), end: "1928".into() },
                DateRange { start: "1406".into(), end: "1406".into() },
                DateRange { start: "1960".into(), end: "1970".into() },
            ]
        );
    }

    #[test]
    fn test_range_order_is_reported_not_enforced() {
        let range = TemporalNormalizer::default()
            .parse_date_or_range("2004 - 1999")
            .unwrap();
        assert!(!range.is_ordered());
        assert_eq!(range.start, "2004-01-01");
    }
}
