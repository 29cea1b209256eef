//! Publication dates shown alongside results
//!
//! Dates appear either as a leading token of the snippet (`3 days ago · …`,
//! `2024-01-15 — …`, `Jan 5, 2024 · …`) or as a machine timestamp in the
//! result's extras line (`2026-02-10T01:24:00.0000000`).

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,6})\s+(second|minute|hour|day|week|month|year)s?\s+ago\b")
        .expect("valid relative date regex")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}(?:T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?)?)\b")
        .expect("valid ISO date regex")
});

static MONTH_NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b")
        .expect("valid month name date regex")
});

/// Separator between a leading date and the snippet text
static DATE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s·•|:\-–—]*").expect("valid separator regex"));

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Splits a leading date token off a snippet
///
/// Returns the parsed date and the snippet with the token and its trailing
/// separator removed. When the snippet does not start with a recognisable
/// date the snippet is returned unchanged.
///
/// # Arguments
///
/// * `snippet` - Collapsed snippet text
/// * `now` - Reference time for relative dates
pub fn split_leading_date(snippet: &str, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, String) {
    let parsed = leading_relative(snippet, now)
        .or_else(|| leading_iso(snippet))
        .or_else(|| leading_month_name(snippet));

    match parsed {
        Some((date, consumed)) => {
            let rest = &snippet[consumed..];
            let rest = DATE_SEPARATOR.replace(rest, "");
            (Some(date), rest.trim().to_string())
        }
        None => (None, snippet.to_string()),
    }
}

/// Parses a machine timestamp such as `2026-02-10T01:24:00.0000000`
///
/// Fractional seconds beyond microseconds are truncated. Timestamps without
/// an offset are taken as UTC; a bare date is midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let truncated = truncate_fraction(value);
    if let Ok(naive) = NaiveDateTime::parse_from_str(&truncated, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Keeps at most six fractional digits
fn truncate_fraction(value: &str) -> String {
    match value.split_once('.') {
        Some((base, fraction)) => {
            let digits: String = fraction.chars().take(6).collect();
            format!("{}.{}", base, digits)
        }
        None => value.to_string(),
    }
}

fn leading_relative(snippet: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, usize)> {
    let captures = RELATIVE_DATE.captures(snippet)?;
    let amount: i64 = captures[1].parse().ok()?;
    let unit = captures[2].to_ascii_lowercase();

    let date = match unit.as_str() {
        "month" => now.checked_sub_months(Months::new(u32::try_from(amount).ok()?))?,
        "year" => now.checked_sub_months(Months::new(u32::try_from(amount.checked_mul(12)?).ok()?))?,
        other => {
            let seconds_per_unit = match other {
                "second" => 1,
                "minute" => 60,
                "hour" => 3_600,
                "day" => 86_400,
                _ => 604_800,
            };
            let delta = Duration::try_seconds(amount.checked_mul(seconds_per_unit)?)?;
            now.checked_sub_signed(delta)?
        }
    };

    Some((date, captures.get(0)?.end()))
}

fn leading_iso(snippet: &str) -> Option<(DateTime<Utc>, usize)> {
    let token = ISO_DATE.captures(snippet)?.get(1)?;
    let date = parse_timestamp(token.as_str())?;
    Some((date, token.end()))
}

fn leading_month_name(snippet: &str) -> Option<(DateTime<Utc>, usize)> {
    let captures = MONTH_NAME_DATE.captures(snippet)?;
    let prefix = captures[1].to_ascii_lowercase();
    let month = MONTHS.iter().position(|m| *m == prefix)? as u32 + 1;
    let day: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some((Utc.from_utc_datetime(&naive), captures.get(0)?.end()))
}
