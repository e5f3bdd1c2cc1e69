//! Compiled filter clause types handed to the query layer
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equal,
    Contains,
    Includes,
    Between,
    Before,
    After,
    Set,
    Unset,
    Less,
    Greater,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Null,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Range { low: NaiveDate, high: NaiveDate },
    // key -> display value, in input order
    Set(IndexMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub operator: Operator,
    pub operand: Operand,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }

    /// Presence predicate (`set` / `unset`) with no operand
    pub fn flag(field: impl Into<String>, present: bool) -> Self {
        let operator = if present {
            Operator::Set
        } else {
            Operator::Unset
        };
        Self::new(field, operator, Operand::Null)
    }
}

/// Serialized as `[field, operator, operand]`
impl Serialize for FilterClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.field)?;
        tuple.serialize_element(&self.operator)?;
        tuple.serialize_element(&self.operand)?;
        tuple.end()
    }
}

impl std::fmt::Display for FilterClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.operand {
            Operand::Null => write!(f, "{} {}", self.field, self.operator),
            Operand::Text(s) => write!(f, "{} {} {:?}", self.field, self.operator, s),
            Operand::Integer(i) => write!(f, "{} {} {}", self.field, self.operator, i),
            Operand::Date(d) => write!(f, "{} {} {}", self.field, self.operator, d),
            Operand::Range { low, high } => {
                write!(f, "{} {} [{} TO {}]", self.field, self.operator, low, high)
            }
            Operand::Set(values) => {
                let keys: Vec<&str> = values.keys().map(String::as_str).collect();
                write!(f, "{} {} ({})", self.field, self.operator, keys.join(" OR "))
            }
        }
    }
}
