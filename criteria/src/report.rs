//! Validation of ticket statistics report windows

use crate::dates::parse_past_date;
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportGroup {
    #[default]
    Dept,
    Topic,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEnd {
    Now,
    Date(NaiveDate),
}

/// `"now"` or the date itself
impl Serialize for ReportEnd {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReportEnd::Now => serializer.serialize_str("now"),
            ReportEnd::Date(date) => date.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: ReportEnd,
    pub group: ReportGroup,
}

impl ReportQuery {
    /// Read `from`, `to` and `group` from a request body
    pub fn from_body(body: &Value, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let from = match body.get("from") {
            Some(Value::String(s)) => parse_past_date("from", s, now)?,
            Some(other) => {
                return Err(ValidationError::malformed(
                    "from",
                    format!("{} is not a date", other),
                ))
            }
            None => return Err(ValidationError::malformed("from", "no \"from\" provided")),
        };

        let to = match body.get("to") {
            None | Some(Value::Null) => ReportEnd::Now,
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("now") => ReportEnd::Now,
            Some(Value::String(s)) => {
                let to = parse_past_date("to", s, now)?;
                if to <= from {
                    return Err(ValidationError::out_of_range(
                        "to",
                        "\"to\" date can not be before \"from\" date",
                    ));
                }
                ReportEnd::Date(to)
            }
            Some(other) => {
                return Err(ValidationError::malformed(
                    "to",
                    format!("{} is not a date", other),
                ))
            }
        };

        let group = match body.get("group") {
            None | Some(Value::Null) => ReportGroup::default(),
            Some(Value::String(s)) => s.parse::<ReportGroup>().map_err(|_| {
                ValidationError::malformed("group", format!("group '{}' is not valid", s))
            })?,
            Some(other) => {
                return Err(ValidationError::malformed(
                    "group",
                    format!("{} is not a group", other),
                ))
            }
        };

        Ok(Self { from, to, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults_to_now_and_dept() {
        let q = ReportQuery::from_body(&json!({"from": "2025-01-01"}), now()).unwrap();
        assert_eq!(q.to, ReportEnd::Now);
        assert_eq!(q.group, ReportGroup::Dept);
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"from": "2025-01-01", "to": "now", "group": "dept"})
        );
    }

    #[test]
    fn test_explicit_window() {
        let q = ReportQuery::from_body(
            &json!({"from": "2025-01-01", "to": "2025-02-01", "group": "staff"}),
            now(),
        )
        .unwrap();
        assert_eq!(q.to, ReportEnd::Date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
        assert_eq!(q.group, ReportGroup::Staff);
        assert_eq!(serde_json::to_value(q.to).unwrap(), json!("2025-02-01"));
        let q = ReportQuery::from_body(&json!({"from": "2025-01-01", "to": "now"}), now()).unwrap();
        assert_eq!(q.to, ReportEnd::Now);
    }

    #[test]
    fn test_rejections() {
        let err = ReportQuery::from_body(&json!({}), now()).unwrap_err();
        assert_eq!(err.key, "from");
        let err = ReportQuery::from_body(&json!({"from": "2025-13-01"}), now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedValue);
        let err = ReportQuery::from_body(&json!({"from": "2026-01-01"}), now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfRange);
        let err =
            ReportQuery::from_body(&json!({"from": "2025-02-01", "to": "2025-01-01"}), now())
                .unwrap_err();
        assert_eq!((err.key.as_str(), err.kind), ("to", ErrorKind::OutOfRange));
        let err = ReportQuery::from_body(&json!({"from": "2025-01-01", "group": "team"}), now())
            .unwrap_err();
        assert_eq!(err.key, "group");
    }
}
