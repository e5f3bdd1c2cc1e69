use crate::error::ValidationError;
use crate::types::{Operand, Operator};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Placeholder clients send for "no bound"
pub const MISSING_DATE: &str = "-";

static DATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn date_regex() -> &'static Regex {
    DATE_REGEX.get_or_init(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").unwrap())
}

/// Parse `YYYY-MM-DD` into a real calendar date that is not after `now`
pub fn parse_past_date(
    key: &str,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<NaiveDate, ValidationError> {
    let captures = date_regex().captures(raw.trim()).ok_or_else(|| {
        ValidationError::malformed(key, format!("'{}' is not a YYYY-MM-DD date", raw))
    })?;

    // Regex guarantees digits; only overflow can fail here
    let parse = |i: usize| captures[i].parse::<u32>().ok();
    let date = match (parse(1), parse(2), parse(3)) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d),
        _ => None,
    }
    .ok_or_else(|| ValidationError::malformed(key, format!("'{}' is not a calendar date", raw)))?;

    let midnight = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    match midnight {
        Some(start) if start <= now => Ok(date),
        _ => Err(ValidationError::out_of_range(
            key,
            format!("'{}' is in the future", raw),
        )),
    }
}

/// Read one bound of a range; `None` when absent, null or the `-` sentinel
pub fn read_bound(
    key: &str,
    raw: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<Option<NaiveDate>, ValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim() == MISSING_DATE || s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_past_date(key, s, now).map(Some),
        Some(other) => Err(ValidationError::malformed(
            key,
            format!("expected a date string, got {}", other),
        )),
    }
}

/// Turn a begin/end pair into a `between`, `after` or `before` clause body
pub fn validate_date_range(
    prefix: &str,
    begin: Option<&Value>,
    end: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<(Operator, Operand), ValidationError> {
    let begin_key = format!("{}_begin", prefix);
    let end_key = format!("{}_end", prefix);
    let low = read_bound(&begin_key, begin, now)?;
    let high = read_bound(&end_key, end, now)?;

    match (low, high) {
        (Some(low), Some(high)) if low < high => {
            Ok((Operator::Between, Operand::Range { low, high }))
        }
        (Some(low), Some(high)) => Err(ValidationError::out_of_range(
            begin_key,
            format!("begin {} is not before end {}", low, high),
        )),
        (Some(low), None) => Ok((Operator::After, Operand::Date(low))),
        (None, Some(high)) => Ok((Operator::Before, Operand::Date(high))),
        (None, None) => {
            let message = format!("neither {} nor {} holds a date", begin_key, end_key);
            Err(ValidationError::malformed(begin_key, message))
        }
    }
}
