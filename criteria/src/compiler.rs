use crate::dates::validate_date_range;
use crate::error::ValidationError;
use crate::rules::{
    parse_flag, parse_id_list, parse_reopen_count, parse_source_list, parse_text, rule_for, Rule,
};
use crate::store::{EntityKind, RecordStore};
use crate::types::{FilterClause, Operand, Operator};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Filter name -> raw request value, in the order the client sent them
pub type RawCriteria = serde_json::Map<String, Value>;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Translates raw search criteria into typed filter clauses.
///
/// Unknown keys are ignored and clauses come out in input order. A
/// `<prefix>_begin` / `<prefix>_end` pair yields one clause, placed where the
/// first half of the pair appears.
#[derive(Clone)]
pub struct CriteriaCompiler {
    store: Arc<dyn RecordStore>,
    lookup_timeout: Duration,
    fixed_now: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for CriteriaCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaCompiler")
            .field("store", &self.store.name())
            .field("lookup_timeout", &self.lookup_timeout)
            .field("fixed_now", &self.fixed_now)
            .finish()
    }
}

impl CriteriaCompiler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            fixed_now: None,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Pin "now" for date validation; the wall clock is used otherwise
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Fail-fast compilation: the first invalid key aborts with its error
    pub async fn compile(&self, raw: &RawCriteria) -> Result<Vec<FilterClause>, ValidationError> {
        let now = self.now();
        let mut ranges_done = Vec::new();
        let mut clauses = Vec::new();

        for (key, value) in raw {
            if let Some(clause) = self
                .compile_key(raw, key, value, now, &mut ranges_done)
                .await?
            {
                clauses.push(clause);
            }
        }

        tracing::debug!("Compiled {} criteria keys into {} clauses", raw.len(), clauses.len());
        Ok(clauses)
    }

    /// Validates every key and reports all failures, in input order
    pub async fn compile_all(
        &self,
        raw: &RawCriteria,
    ) -> Result<Vec<FilterClause>, Vec<ValidationError>> {
        let now = self.now();
        let mut ranges_done = Vec::new();
        let mut clauses = Vec::new();
        let mut errors = Vec::new();

        for (key, value) in raw {
            match self
                .compile_key(raw, key, value, now, &mut ranges_done)
                .await
            {
                Ok(Some(clause)) => clauses.push(clause),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(clauses)
        } else {
            tracing::debug!("Criteria rejected with {} errors", errors.len());
            Err(errors)
        }
    }

    async fn compile_key(
        &self,
        raw: &RawCriteria,
        key: &str,
        value: &Value,
        now: DateTime<Utc>,
        ranges_done: &mut Vec<&'static str>,
    ) -> Result<Option<FilterClause>, ValidationError> {
        let Some(rule) = rule_for(key) else {
            tracing::debug!("Ignoring unknown criteria key: {}", key);
            return Ok(None);
        };

        let clause = match rule {
            Rule::Contains { field } => {
                FilterClause::new(field, Operator::Contains, Operand::Text(parse_text(key, value)?))
            }
            Rule::IdList { kind, field } => {
                let values = self.resolve_ids(key, kind, value).await?;
                FilterClause::new(field, Operator::Includes, Operand::Set(values))
            }
            Rule::Flag { field } => FilterClause::flag(field, parse_flag(key, value)?),
            Rule::ReopenCount => {
                let (operator, operand) = parse_reopen_count(key, value)?;
                FilterClause::new("reopen_count", operator, operand)
            }
            Rule::Source => {
                let values = self.resolve_sources(key, value).await?;
                FilterClause::new("source", Operator::Includes, Operand::Set(values))
            }
            Rule::DateBound { prefix, field } => {
                if ranges_done.contains(&prefix) {
                    return Ok(None);
                }
                ranges_done.push(prefix);
                let begin = raw.get(&format!("{}_begin", prefix));
                let end = raw.get(&format!("{}_end", prefix));
                let (operator, operand) = validate_date_range(prefix, begin, end, now)?;
                FilterClause::new(field, operator, operand)
            }
        };
        Ok(Some(clause))
    }

    async fn resolve_ids(
        &self,
        key: &str,
        kind: EntityKind,
        value: &Value,
    ) -> Result<IndexMap<String, String>, ValidationError> {
        let ids = parse_id_list(key, value)?;
        let resolved = self.bounded(key, self.store.resolve(kind, &ids)).await?;

        if resolved.len() != ids.len() {
            let unknown: Vec<String> = ids
                .iter()
                .filter(|id| !resolved.contains_key(*id))
                .map(|id| id.to_string())
                .collect();
            let detail = if unknown.is_empty() {
                "duplicate ids".to_string()
            } else {
                format!("unknown ids {}", unknown.join(", "))
            };
            return Err(ValidationError::unresolved(
                key,
                format!("invalid {} id given in array ({})", kind, detail),
            ));
        }

        Ok(match kind {
            // Statuses are filtered by state, not by id
            EntityKind::TicketStatus => resolved
                .into_values()
                .map(|state| (state.to_lowercase(), state))
                .collect(),
            _ => resolved
                .into_iter()
                .map(|(id, name)| (id.to_string(), name))
                .collect(),
        })
    }

    async fn resolve_sources(
        &self,
        key: &str,
        value: &Value,
    ) -> Result<IndexMap<String, String>, ValidationError> {
        let wanted = parse_source_list(key, value)?;
        let catalog = self.bounded(key, self.store.ticket_sources()).await?;

        let mut values = IndexMap::new();
        for source in wanted {
            if !catalog.iter().any(|known| known == source) {
                return Err(ValidationError::unresolved(
                    key,
                    format!(
                        "invalid source '{}' given in array, expected one of: {}",
                        source,
                        catalog.join(", ")
                    ),
                ));
            }
            values.insert(source.to_lowercase(), source.to_string());
        }
        Ok(values)
    }

    /// Runs a store call under the lookup timeout
    pub(crate) async fn bounded<T>(
        &self,
        key: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, ValidationError> {
        match tokio::time::timeout(self.lookup_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!("Record store '{}' lookup for {} failed: {:#}", self.store.name(), key, e);
                Err(ValidationError::lookup_failed(
                    key,
                    format!("lookup failed: {}", e),
                ))
            }
            Err(_) => {
                tracing::warn!(
                    "Record store '{}' lookup for {} timed out after {:?}",
                    self.store.name(),
                    key,
                    self.lookup_timeout
                );
                Err(ValidationError::lookup_failed(
                    key,
                    format!("lookup failed: timed out after {:?}", self.lookup_timeout),
                ))
            }
        }
    }
}
