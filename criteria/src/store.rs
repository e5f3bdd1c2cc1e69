//! Record store abstraction used to resolve identifiers during compilation

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use strum_macros::{Display, EnumIter};

/// Ticket sources accepted when the store has no catalog of its own
pub const DEFAULT_TICKET_SOURCES: &[&str] = &["Web", "Email", "Phone", "API", "Other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    TicketStatus,
    Department,
    HelpTopic,
    Staff,
    Sla,
    Team,
    Priority,
    Organization,
}

/// Read-only lookups the compiler needs from persistence.
///
/// Implementations must be safe for concurrent reads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Resolve `ids` of `kind` to display names in one batched lookup.
    ///
    /// Unknown ids are left out of the result; duplicates collapse to one entry.
    /// The display name is the state name for `TicketStatus`, the priority tag
    /// for `Priority` and the record name for everything else.
    async fn resolve(&self, kind: EntityKind, ids: &[i64]) -> Result<IndexMap<i64, String>>;

    /// Currently valid ticket sources (case-sensitive)
    async fn ticket_sources(&self) -> Result<Vec<String>>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// In-memory store, loadable from a YAML or JSON fixture
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStore {
    #[serde(default = "default_sources")]
    sources: Vec<String>,
    #[serde(default)]
    records: IndexMap<EntityKind, IndexMap<i64, String>>,
}

fn default_sources() -> Vec<String> {
    DEFAULT_TICKET_SOURCES.iter().map(|s| s.to_string()).collect()
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            records: IndexMap::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(fixture: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(fixture)?)
    }

    pub fn from_json_str(fixture: &str) -> Result<Self> {
        Ok(serde_json::from_str(fixture)?)
    }

    pub fn with_record(mut self, kind: EntityKind, id: i64, display: &str) -> Self {
        self.records
            .entry(kind)
            .or_default()
            .insert(id, display.to_string());
        self
    }

    pub fn with_sources(mut self, sources: &[&str]) -> Self {
        self.sources = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn record_count(&self, kind: EntityKind) -> usize {
        self.records.get(&kind).map_or(0, |r| r.len())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn resolve(&self, kind: EntityKind, ids: &[i64]) -> Result<IndexMap<i64, String>> {
        let Some(records) = self.records.get(&kind) else {
            return Ok(IndexMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|name| (*id, name.clone())))
            .collect())
    }

    async fn ticket_sources(&self) -> Result<Vec<String>> {
        Ok(self.sources.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
