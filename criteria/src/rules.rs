//! Allowlist of criteria keys and the shape checks applied to their raw values

use crate::error::ValidationError;
use crate::store::EntityKind;
use crate::types::{Operand, Operator};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Free text matched as a substring
    Contains { field: &'static str },
    /// Identifiers that must all resolve to records of `kind`
    IdList {
        kind: EntityKind,
        field: &'static str,
    },
    /// Boolean mapped to a set/unset predicate
    Flag { field: &'static str },
    ReopenCount,
    Source,
    /// One half of a `<prefix>_begin` / `<prefix>_end` pair
    DateBound {
        prefix: &'static str,
        field: &'static str,
    },
}

const RULES: &[(&str, Rule)] = &[
    ("subject", Rule::Contains { field: "cdata__subject" }),
    (
        "status_id",
        Rule::IdList {
            kind: EntityKind::TicketStatus,
            field: "status__state",
        },
    ),
    (
        "dept_id",
        Rule::IdList {
            kind: EntityKind::Department,
            field: "dept_id",
        },
    ),
    (
        "topic_id",
        Rule::IdList {
            kind: EntityKind::HelpTopic,
            field: "topic_id",
        },
    ),
    (
        "staff_id",
        Rule::IdList {
            kind: EntityKind::Staff,
            field: "staff_id",
        },
    ),
    (
        "sla_id",
        Rule::IdList {
            kind: EntityKind::Sla,
            field: "sla_id",
        },
    ),
    (
        "team_id",
        Rule::IdList {
            kind: EntityKind::Team,
            field: "team_id",
        },
    ),
    (
        "priority_id",
        Rule::IdList {
            kind: EntityKind::Priority,
            field: "cdata__priority",
        },
    ),
    ("assigned", Rule::Flag { field: "isassigned" }),
    ("answered", Rule::Flag { field: "isanswered" }),
    ("overdue", Rule::Flag { field: "isoverdue" }),
    ("merged", Rule::Flag { field: "merged" }),
    ("linked", Rule::Flag { field: "linked" }),
    ("reopen_count", Rule::ReopenCount),
    ("source", Rule::Source),
    date_rule("create_date_begin", "create_date", "created"),
    date_rule("create_date_end", "create_date", "created"),
    date_rule("close_date_begin", "close_date", "closed"),
    date_rule("close_date_end", "close_date", "closed"),
    date_rule("last_update_date_begin", "last_update_date", "lastupdate"),
    date_rule("last_update_date_end", "last_update_date", "lastupdate"),
    date_rule("sla_duedate_begin", "sla_duedate", "est_duedate"),
    date_rule("sla_duedate_end", "sla_duedate", "est_duedate"),
    date_rule("duedate_begin", "duedate", "duedate"),
    date_rule("duedate_end", "duedate", "duedate"),
];

const fn date_rule(
    key: &'static str,
    prefix: &'static str,
    field: &'static str,
) -> (&'static str, Rule) {
    (key, Rule::DateBound { prefix, field })
}

pub fn rule_for(key: &str) -> Option<Rule> {
    RULES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, rule)| *rule)
}

pub fn recognized_keys() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|(name, _)| *name)
}

pub fn parse_text(key: &str, raw: &Value) -> Result<String, ValidationError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        other => Err(ValidationError::malformed(
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

pub fn parse_flag(key: &str, raw: &Value) -> Result<bool, ValidationError> {
    raw.as_bool()
        .ok_or_else(|| ValidationError::malformed(key, format!("expected a boolean, got {}", raw)))
}

/// Non-empty list of integer ids; numeric strings are accepted
pub fn parse_id_list(key: &str, raw: &Value) -> Result<Vec<i64>, ValidationError> {
    let items = non_empty_list(key, raw)?;
    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .map(|id| id.ok_or_else(|| ValidationError::malformed(key, "ids must be integers")))
        .collect()
}

pub fn parse_source_list<'a>(key: &str, raw: &'a Value) -> Result<Vec<&'a str>, ValidationError> {
    non_empty_list(key, raw)?
        .iter()
        .map(|item| {
            item.as_str().ok_or_else(|| {
                ValidationError::malformed(key, format!("source {} is not a string", item))
            })
        })
        .collect()
}

fn non_empty_list<'a>(key: &str, raw: &'a Value) -> Result<&'a Vec<Value>, ValidationError> {
    match raw {
        Value::Array(items) if !items.is_empty() => Ok(items),
        Value::Array(_) => Err(ValidationError::malformed(key, "list must not be empty")),
        other => Err(ValidationError::malformed(
            key,
            format!("expected a list, got {}", other),
        )),
    }
}

static REOPEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn reopen_regex() -> &'static Regex {
    REOPEN_REGEX.get_or_init(|| Regex::new(r"^([<>]?)([0-9]+)$").unwrap())
}

/// Exact count (`3`, `"3"`) or a bound (`"<3"`, `">3"`)
pub fn parse_reopen_count(key: &str, raw: &Value) -> Result<(Operator, Operand), ValidationError> {
    match raw {
        Value::Number(n) => {
            let count = n.as_u64().ok_or_else(|| {
                ValidationError::malformed(key, format!("{} is not a non-negative integer", n))
            })?;
            let count = i64::try_from(count).map_err(|_| {
                ValidationError::out_of_range(key, format!("{} is out of range", n))
            })?;
            Ok((Operator::Equal, Operand::Integer(count)))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some(captures) = reopen_regex().captures(s) {
                let count = captures[2].parse::<i64>().map_err(|_| {
                    ValidationError::out_of_range(key, format!("'{}' is out of range", s))
                })?;
                let operator = match &captures[1] {
                    "<" => Operator::Less,
                    ">" => Operator::Greater,
                    _ => Operator::Equal,
                };
                return Ok((operator, Operand::Integer(count)));
            }
            let prefix: String = s
                .chars()
                .take_while(|c| c.is_ascii_punctuation())
                .collect();
            if !prefix.is_empty() && prefix != "<" && prefix != ">" {
                return Err(ValidationError::unsupported_operator(
                    key,
                    format!("'{}' is not a supported comparison, use '<' or '>'", prefix),
                ));
            }
            Err(ValidationError::malformed(
                key,
                format!("'{}' is not a count", s),
            ))
        }
        other => Err(ValidationError::malformed(
            key,
            format!("expected an integer or a '<n'/'>n' string, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_rule_lookup() {
        assert_eq!(
            rule_for("subject"),
            Some(Rule::Contains {
                field: "cdata__subject"
            })
        );
        assert_eq!(
            rule_for("create_date_end"),
            Some(Rule::DateBound {
                prefix: "create_date",
                field: "created"
            })
        );
        assert_eq!(rule_for("org_id"), None);
        assert_eq!(rule_for("Subject"), None);
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = recognized_keys().collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, 25);
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("k", &json!([1, "2", 3])).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            parse_id_list("k", &json!(1)).unwrap_err().kind,
            ErrorKind::MalformedValue
        );
        assert!(parse_id_list("k", &json!([])).is_err());
        assert!(parse_id_list("k", &json!([1.5])).is_err());
        assert!(parse_id_list("k", &json!(["one"])).is_err());
        assert!(parse_id_list("k", &json!([null])).is_err());
    }

    #[test]
    fn test_parse_flag_and_text() {
        assert!(parse_flag("assigned", &json!(true)).unwrap());
        assert!(!parse_flag("assigned", &json!(false)).unwrap());
        assert!(parse_flag("assigned", &json!("true")).is_err());
        assert!(parse_flag("assigned", &json!(1)).is_err());
        assert_eq!(parse_text("subject", &json!("printer")).unwrap(), "printer");
        assert!(parse_text("subject", &json!(["printer"])).is_err());
    }

    #[test]
    fn test_parse_source_list() {
        assert_eq!(
            parse_source_list("source", &json!(["Web", "Phone"])).unwrap(),
            vec!["Web", "Phone"]
        );
        assert!(parse_source_list("source", &json!("Web")).is_err());
        assert!(parse_source_list("source", &json!(["Web", 3])).is_err());
    }

    #[test]
    fn test_reopen_count_accepted_forms() {
        let cases = [
            (json!(0), Operator::Equal, 0),
            (json!(4), Operator::Equal, 4),
            (json!("4"), Operator::Equal, 4),
            (json!("<2"), Operator::Less, 2),
            (json!(">3"), Operator::Greater, 3),
            (json!(" >10 "), Operator::Greater, 10),
        ];
        for (raw, op, n) in cases {
            assert_eq!(
                parse_reopen_count("reopen_count", &raw).unwrap(),
                (op, Operand::Integer(n)),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_reopen_count_rejected_forms() {
        let unsupported = ["=3", "<=3", ">=5", "!3", "~1"];
        for raw in unsupported {
            let err = parse_reopen_count("reopen_count", &json!(raw)).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnsupportedOperator, "{}", raw);
        }
        let malformed = [
            json!("<"),
            json!(">x"),
            json!("3a"),
            json!(""),
            json!("abc"),
            json!(-1),
            json!(2.5),
            json!(true),
        ];
        for raw in malformed {
            let err = parse_reopen_count("reopen_count", &raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedValue, "{}", raw);
        }
    }

    #[test]
    fn test_reopen_count_ascii_digits_only() {
        for raw in ["\u{663}", ">\u{663}", "\u{FF13}"] {
            let err = parse_reopen_count("reopen_count", &json!(raw)).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedValue, "{}", raw);
            assert!(err.message.contains("not a count"), "{}", err.message);
        }
    }

    #[test]
    fn test_reopen_count_overflow_is_out_of_range() {
        for raw in [json!(">99999999999999999999"), json!("9223372036854775808"), json!(u64::MAX)] {
            let err = parse_reopen_count("reopen_count", &raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::OutOfRange, "{}", raw);
        }
        assert_eq!(
            parse_reopen_count("reopen_count", &json!("<9223372036854775807")).unwrap(),
            (Operator::Less, Operand::Integer(i64::MAX))
        );
    }
}
