//! Relative time expressions such as "1 week" or "2 hours 30 minutes"

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::TaskError;

/// One `<amount> <unit>` pair at the start of the remaining input
static TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<amount>\d+)\s*(?P<unit>[a-zA-Z]+)\s*,?").expect("Invalid regex")
});

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

fn unit_seconds(unit: &str) -> Option<i64> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "y" | "yr" | "yrs" | "year" | "years" => 365 * DAY,
        "mo" | "month" | "months" => 30 * DAY,
        "w" | "wk" | "week" | "weeks" => 7 * DAY,
        "d" | "day" | "days" => DAY,
        "h" | "hr" | "hour" | "hours" => HOUR,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        _ => return None,
    };
    Some(seconds)
}

/// Parse a relative time expression into a duration
pub fn parse_relative_time(input: &str) -> Result<Duration, TaskError> {
    let invalid = || TaskError::InvalidRelativeTime(input.to_string());

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i64 = 0;
    while !rest.is_empty() {
        let captures = TERM_REGEX.captures(rest).ok_or_else(invalid)?;
        let amount: i64 = captures["amount"].parse().map_err(|_| invalid())?;
        let unit = unit_seconds(&captures["unit"]).ok_or_else(invalid)?;

        total = amount
            .checked_mul(unit)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(invalid)?;

        let consumed = captures.get(0).map_or(rest.len(), |m| m.end());
        rest = rest[consumed..].trim_start();
    }

    Duration::try_seconds(total).ok_or_else(invalid)
}

/// Resolve a relative time expression against a point in time
pub fn from_now(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TaskError> {
    let offset = parse_relative_time(input)?;
    now.checked_add_signed(offset)
        .ok_or_else(|| TaskError::InvalidRelativeTime(input.to_string()))
}
