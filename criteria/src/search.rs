//! Paginated ticket search requests and the preset searches built on them

use crate::compiler::{CriteriaCompiler, RawCriteria};
use crate::error::ValidationError;
use crate::store::EntityKind;
use crate::types::{FilterClause, Operand, Operator};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_PAGE_LIMIT: u32 = 25;
pub const MAX_PAGE_LIMIT: u32 = 100;

const ORG_NAME_FIELD: &str = "user__org__name";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub criteria: RawCriteria,
    pub page: u32,
    pub limit: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            criteria: RawCriteria::new(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// What the query executor receives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPlan {
    pub clauses: Vec<FilterClause>,
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

impl SearchRequest {
    /// Read `criteria`, `page` and `limit` from a request body
    pub fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let Value::Object(fields) = body else {
            return Err(ValidationError::malformed("", "request body must be a JSON object"));
        };

        let criteria = match fields.get("criteria") {
            None | Some(Value::Null) => RawCriteria::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(ValidationError::malformed(
                    "criteria",
                    format!("expected an object, got {}", other),
                ))
            }
        };

        let page = match fields.get("page") {
            None | Some(Value::Null) => 1,
            Some(raw) => positive_u32("page", raw)?,
        };

        let limit = match fields.get("limit") {
            None | Some(Value::Null) => DEFAULT_PAGE_LIMIT,
            Some(raw) => positive_u32("limit", raw)?,
        };
        if limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::out_of_range(
                "limit",
                format!("limit can not exceed {}", MAX_PAGE_LIMIT),
            ));
        }

        Ok(Self {
            criteria,
            page,
            limit,
        })
    }

    /// Page 0 is treated as the first page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub async fn plan(&self, compiler: &CriteriaCompiler) -> Result<SearchPlan, ValidationError> {
        let clauses = compiler.compile(&self.criteria).await?;
        Ok(self.plan_with(clauses))
    }

    /// Preset clause first, then whatever the caller's criteria add
    pub async fn plan_preset(
        &self,
        compiler: &CriteriaCompiler,
        preset: &SearchPreset,
    ) -> Result<SearchPlan, ValidationError> {
        let mut clauses = vec![preset.clause(compiler).await?];
        clauses.extend(compiler.compile(&self.criteria).await?);
        Ok(self.plan_with(clauses))
    }

    fn plan_with(&self, clauses: Vec<FilterClause>) -> SearchPlan {
        SearchPlan {
            clauses,
            page: self.page,
            limit: self.limit,
            offset: self.offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPreset {
    /// Tickets whose user belongs to any organization
    HasOrganization,
    /// Tickets of one organization, by id
    Organization(i64),
    /// Tickets routed to one department, by id
    Department(i64),
}

impl SearchPreset {
    pub fn organization_from_body(body: &Value) -> Result<Self, ValidationError> {
        required_id(body, "org_id").map(SearchPreset::Organization)
    }

    pub fn department_from_body(body: &Value) -> Result<Self, ValidationError> {
        required_id(body, "dept_id").map(SearchPreset::Department)
    }

    pub async fn clause(&self, compiler: &CriteriaCompiler) -> Result<FilterClause, ValidationError> {
        match self {
            SearchPreset::HasOrganization => Ok(FilterClause::flag(ORG_NAME_FIELD, true)),
            SearchPreset::Organization(id) => {
                let name = resolve_one(compiler, "org_id", EntityKind::Organization, *id).await?;
                Ok(FilterClause::new(
                    ORG_NAME_FIELD,
                    Operator::Equal,
                    Operand::Text(name),
                ))
            }
            SearchPreset::Department(id) => {
                resolve_one(compiler, "dept_id", EntityKind::Department, *id).await?;
                Ok(FilterClause::new(
                    "dept_id",
                    Operator::Equal,
                    Operand::Integer(*id),
                ))
            }
        }
    }
}

async fn resolve_one(
    compiler: &CriteriaCompiler,
    key: &str,
    kind: EntityKind,
    id: i64,
) -> Result<String, ValidationError> {
    let mut resolved = compiler
        .bounded(key, compiler.store().resolve(kind, &[id]))
        .await?;
    resolved.shift_remove(&id).ok_or_else(|| {
        ValidationError::unresolved(key, format!("no {} with id {}", kind, id))
    })
}

fn required_id(body: &Value, key: &str) -> Result<i64, ValidationError> {
    match body.get(key) {
        None | Some(Value::Null) => Err(ValidationError::malformed(
            key,
            format!("no {} provided", key),
        )),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ValidationError::malformed(key, format!("{} is not an id", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::malformed(key, format!("'{}' is not an id", s))),
        Some(other) => Err(ValidationError::malformed(
            key,
            format!("{} is not an id", other),
        )),
    }
}

fn positive_u32(key: &str, raw: &Value) -> Result<u32, ValidationError> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ValidationError::malformed(key, format!("{} is not an integer", raw)))?;

    u32::try_from(parsed)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| ValidationError::out_of_range(key, format!("{} must be at least 1", key)))
}
