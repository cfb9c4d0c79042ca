//! Date range utilities
//!
//! Day-granularity date handling for the planning board. Dates arrive from
//! the remote store and the local cache as free text, so parsing never
//! fails: anything unreadable becomes [`DateValue::Invalid`], which keeps the
//! raw text for round-tripping, never orders against anything, and renders
//! as a fallback label.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display label for an invalid date
pub const INVALID_DATE_LABEL: &str = "Invalid date";

/// Display label when neither end of a range is valid
pub const INVALID_RANGE_LABEL: &str = "Invalid date range";

const DISPLAY_FORMAT: &str = "%b %-d, %Y";

/// A calendar date that may be invalid or missing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateValue {
    Valid(NaiveDate),
    /// Unparseable input; holds the raw text (empty when missing)
    Invalid(String),
}

impl DateValue {
    /// Missing date (serialized as `null`)
    pub fn missing() -> Self {
        DateValue::Invalid(String::new())
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateValue::Valid(date) => Some(*date),
            DateValue::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DateValue::Valid(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DateValue::Invalid(raw) if raw.trim().is_empty())
    }

    /// Order of two valid dates; `None` when either side is invalid
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (DateValue::Valid(a), DateValue::Valid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text as it travels on the wire (`YYYY-MM-DD` or the raw input)
    pub fn to_wire(&self) -> String {
        match self {
            DateValue::Valid(date) => date.format(DATE_FORMAT).to_string(),
            DateValue::Invalid(raw) => raw.clone(),
        }
    }
}

impl Default for DateValue {
    fn default() -> Self {
        Self::missing()
    }
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        DateValue::Valid(date)
    }
}

impl From<&str> for DateValue {
    fn from(s: &str) -> Self {
        parse_date(s)
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Valid(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            DateValue::Invalid(_) => f.write_str(INVALID_DATE_LABEL),
        }
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateValue::Invalid(raw) if raw.is_empty() => serializer.serialize_none(),
            other => serializer.serialize_str(&other.to_wire()),
        }
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => parse_date(&s),
            None | Some(serde_json::Value::Null) => DateValue::missing(),
            Some(other) => DateValue::Invalid(other.to_string()),
        })
    }
}

/// Parse a date, never failing.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive ISO date-times (the
/// date part is kept). Anything else yields [`DateValue::Invalid`].
pub fn parse_date(s: &str) -> DateValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return DateValue::missing();
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return DateValue::Valid(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return DateValue::Valid(timestamp.date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return DateValue::Valid(naive.date());
    }

    DateValue::Invalid(trimmed.to_string())
}

/// Inclusive containment of `day` in `[start, end]`; false if either bound is invalid
pub fn is_within(day: NaiveDate, start: &DateValue, end: &DateValue) -> bool {
    match (start.as_date(), end.as_date()) {
        (Some(start), Some(end)) => start <= day && day <= end,
        _ => false,
    }
}

/// Signed day count `a - b`
pub fn diff_days(a: NaiveDate, b: NaiveDate) -> i64 {
    a.signed_duration_since(b).num_days()
}

/// Duration of a range in days, clamped to >= 0; 0 when either end is invalid
pub fn duration_days(start: &DateValue, end: &DateValue) -> i64 {
    match (start.as_date(), end.as_date()) {
        (Some(start), Some(end)) => diff_days(end, start).max(0),
        _ => 0,
    }
}

/// Shift a date by a signed number of days, saturating at the calendar limits
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    match date.checked_add_signed(Duration::days(days)) {
        Some(shifted) => shifted,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// The local calendar day
pub fn start_of_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Human label for a date range, degrading per invalid side
pub fn format_range(start: &DateValue, end: &DateValue) -> String {
    match (start.as_date(), end.as_date()) {
        (Some(start), Some(end)) => format!(
            "{} - {}",
            start.format(DISPLAY_FORMAT),
            end.format(DISPLAY_FORMAT)
        ),
        (Some(start), None) => format!("Starts: {}", start.format(DISPLAY_FORMAT)),
        (None, Some(end)) => format!("Ends: {}", end.format(DISPLAY_FORMAT)),
        (None, None) => INVALID_RANGE_LABEL.to_string(),
    }
}

/// Date range (start date to end date)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateValue,
    pub end: DateValue,
}

impl DateRange {
    pub fn new(start: impl Into<DateValue>, end: impl Into<DateValue>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        is_within(day, &self.start, &self.end)
    }

    pub fn duration_days(&self) -> i64 {
        duration_days(&self.start, &self.end)
    }

    /// Same duration, starting on `new_start`
    pub fn shifted_to(&self, new_start: NaiveDate) -> DateRange {
        let duration = self.duration_days();
        DateRange {
            start: DateValue::Valid(new_start),
            end: DateValue::Valid(add_days(new_start, duration)),
        }
    }

    pub fn label(&self) -> String {
        format_range(&self.start, &self.end)
    }
}

/// The calendar grid of a month: complete Monday-to-Sunday weeks covering
/// every day of the month containing the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    first_of_month: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthGrid {
    pub fn new(anchor: NaiveDate) -> Self {
        let first_of_month = anchor.with_day(1).unwrap_or(anchor);
        let last_of_month = last_day_of_month(first_of_month);

        let lead = i64::from(first_of_month.weekday().num_days_from_monday());
        let trail = 6 - i64::from(last_of_month.weekday().num_days_from_monday());

        Self {
            first_of_month,
            start: add_days(first_of_month, -lead),
            end: add_days(last_of_month, trail),
        }
    }

    pub fn first_of_month(&self) -> NaiveDate {
        self.first_of_month
    }

    /// Monday on or before the 1st
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Sunday on or after the last day of the month
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        (diff_days(self.end, self.start) + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn week_count(&self) -> usize {
        self.len() / 7
    }

    /// Whether `day` belongs to the anchored month (not a padding day)
    pub fn in_month(&self, day: NaiveDate) -> bool {
        day.year() == self.first_of_month.year() && day.month() == self.first_of_month.month()
    }

    pub fn previous(&self) -> MonthGrid {
        match self.first_of_month.checked_sub_months(Months::new(1)) {
            Some(first) => MonthGrid::new(first),
            None => *self,
        }
    }

    pub fn next(&self) -> MonthGrid {
        match self.first_of_month.checked_add_months(Months::new(1)) {
            Some(first) => MonthGrid::new(first),
            None => *self,
        }
    }

    pub fn days(&self) -> MonthGridDays {
        MonthGridDays {
            next: Some(self.start),
            end: self.end,
        }
    }

    pub fn weeks(&self) -> Vec<Vec<NaiveDate>> {
        let days: Vec<NaiveDate> = self.days().collect();
        days.chunks(7).map(<[NaiveDate]>::to_vec).collect()
    }
}

impl IntoIterator for MonthGrid {
    type Item = NaiveDate;
    type IntoIter = MonthGridDays;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

/// Iterator over the days of a [`MonthGrid`]
#[derive(Debug, Clone)]
pub struct MonthGridDays {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for MonthGridDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(current) => (diff_days(self.end, current) + 1).max(0) as usize,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

/// Calendar grid for the month containing `anchor`
pub fn month_grid(anchor: NaiveDate) -> MonthGrid {
    MonthGrid::new(anchor)
}

fn last_day_of_month(first_of_month: NaiveDate) -> NaiveDate {
    first_of_month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first_of_month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-01"), DateValue::Valid(d("2024-03-01")));
        assert_eq!(
            parse_date("2024-03-01T00:00:00.000Z"),
            DateValue::Valid(d("2024-03-01"))
        );
        assert_eq!(
            parse_date("2024-03-01T08:30:00"),
            DateValue::Valid(d("2024-03-01"))
        );
        assert_eq!(parse_date("  "), DateValue::missing());
        assert_eq!(parse_date("next tuesday"), DateValue::Invalid("next tuesday".into()));
        assert_eq!(parse_date("2024-02-30"), DateValue::Invalid("2024-02-30".into()));
    }

    #[test]
    fn test_invalid_never_orders() {
        let valid = parse_date("2024-03-01");
        let invalid = parse_date("garbage");

        assert_eq!(invalid.compare(&valid), None);
        assert_eq!(valid.compare(&invalid), None);
        assert_eq!(invalid.compare(&invalid.clone()), None);
        assert_eq!(invalid, invalid.clone());
        assert_eq!(valid.compare(&parse_date("2024-03-02")), Some(Ordering::Less));
        assert_eq!(invalid.to_string(), INVALID_DATE_LABEL);
        assert_eq!(valid.to_string(), "2024-03-01");
    }

    #[test]
    fn test_serde_round_trip_keeps_raw_text() {
        let json = serde_json::json!(["2024-03-01", "soon", null]);
        let values: Vec<DateValue> = serde_json::from_value(json.clone()).unwrap();
        assert!(values[0].is_valid());
        assert_eq!(values[1], DateValue::Invalid("soon".into()));
        assert!(values[2].is_missing());
        assert_eq!(serde_json::to_value(&values).unwrap(), json);

        let numeric: DateValue = serde_json::from_value(serde_json::json!(42)).unwrap();
        assert!(!numeric.is_valid());
    }

    #[test]
    fn test_is_within_inclusive() {
        let start = parse_date("2024-03-01");
        let end = parse_date("2024-03-03");

        assert!(is_within(d("2024-03-01"), &start, &end));
        assert!(is_within(d("2024-03-02"), &start, &end));
        assert!(is_within(d("2024-03-03"), &start, &end));
        assert!(!is_within(d("2024-02-29"), &start, &end));
        assert!(!is_within(d("2024-03-04"), &start, &end));
        assert!(!is_within(d("2024-03-02"), &parse_date("bad"), &end));
        assert!(!is_within(d("2024-03-02"), &start, &DateValue::missing()));
    }

    #[test]
    fn test_duration_clamps() {
        assert_eq!(diff_days(d("2024-03-03"), d("2024-03-01")), 2);
        assert_eq!(diff_days(d("2024-03-01"), d("2024-03-03")), -2);
        assert_eq!(duration_days(&parse_date("2024-03-01"), &parse_date("2024-03-03")), 2);
        assert_eq!(duration_days(&parse_date("2024-03-05"), &parse_date("2024-03-01")), 0);
        assert_eq!(duration_days(&parse_date("x"), &parse_date("2024-03-01")), 0);
    }

    #[test]
    fn test_month_grid_february_leap_year() {
        let grid = month_grid(d("2024-02-29"));
        assert_eq!(grid.start(), d("2024-01-29"));
        assert_eq!(grid.end(), d("2024-03-03"));
        assert_eq!(grid.len(), 35);
        assert_eq!(grid.week_count(), 5);
        assert!(grid.in_month(d("2024-02-29")));
        assert!(!grid.in_month(d("2024-03-01")));
    }

    #[test]
    fn test_month_grid_month_starting_on_monday() {
        let grid = month_grid(d("2021-02-28"));
        assert_eq!(grid.start(), d("2021-02-01"));
        assert_eq!(grid.end(), d("2021-02-28"));
        assert_eq!(grid.len(), 28);
    }

    #[test]
    fn test_month_grid_six_weeks() {
        let grid = month_grid(d("2024-09-15"));
        assert_eq!(grid.start(), d("2024-08-26"));
        assert_eq!(grid.end(), d("2024-10-06"));
        assert_eq!(grid.weeks().len(), 6);
    }

    #[test]
    fn test_month_grid_shape_for_every_month() {
        let mut grid = month_grid(d("2020-01-31"));
        for _ in 0..132 {
            let days: Vec<NaiveDate> = grid.days().collect();
            assert_eq!(days.len() % 7, 0);
            assert_eq!(days.len(), grid.len());
            assert_eq!(days.first().map(|d| d.weekday()), Some(Weekday::Mon));
            assert_eq!(days.last().map(|d| d.weekday()), Some(Weekday::Sun));
            assert!(days.contains(&grid.first_of_month()));
            assert!(days.contains(&last_day_of_month(grid.first_of_month())));
            grid = grid.next();
        }
    }

    #[test]
    fn test_month_grid_is_restartable() {
        let grid = month_grid(d("2024-03-10"));
        let first: Vec<NaiveDate> = grid.days().collect();
        let second: Vec<NaiveDate> = grid.into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(grid.previous().first_of_month(), d("2024-02-01"));
    }

    #[test]
    fn test_date_range_shift_and_label() {
        let range = DateRange::new("2024-03-01", "2024-03-03");
        let moved = range.shifted_to(d("2024-03-10"));
        assert_eq!(moved, DateRange::new("2024-03-10", "2024-03-12"));
        assert_eq!(range.label(), "Mar 1, 2024 - Mar 3, 2024");

        assert_eq!(
            DateRange::new("2024-03-01", "bad").label(),
            "Starts: Mar 1, 2024"
        );
        assert_eq!(DateRange::new("", "2024-03-03").label(), "Ends: Mar 3, 2024");
        assert_eq!(DateRange::new("", "").label(), INVALID_RANGE_LABEL);
    }
}
