//! SQLite-backed record store for the criteria compiler

use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use ticket_criteria::{EntityKind, RecordStore, DEFAULT_TICKET_SOURCES};

const SCHEMA: &str = include_str!("../migrations/001_schema.sql");

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    sources: Option<Vec<String>>,
}

/// Table and display expression each entity kind resolves against
fn lookup_target(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::TicketStatus => ("ticket_status", "state"),
        EntityKind::Department => ("department", "name"),
        EntityKind::HelpTopic => ("help_topic", "topic"),
        EntityKind::Staff => (
            "staff",
            "COALESCE(NULLIF(TRIM(firstname || ' ' || lastname), ''), username)",
        ),
        EntityKind::Sla => ("sla", "name"),
        EntityKind::Team => ("team", "name"),
        EntityKind::Priority => ("ticket_priority", "priority"),
        EntityKind::Organization => ("organization", "name"),
    }
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Every connection to :memory: is a fresh database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;
        let db = Self {
            pool,
            sources: None,
        };
        db.migrate().await?;
        Ok(db)
    }

    /// Creates the lookup tables and seeds statuses, priorities and sources
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to apply schema")?;
        Ok(())
    }

    /// Replace the source catalog with a configured list
    pub fn with_sources(mut self, sources: Option<Vec<String>>) -> Self {
        self.sources = sources.filter(|s| !s.is_empty());
        self
    }

    /// Test helper method to access the underlying pool
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn resolve(&self, kind: EntityKind, ids: &[i64]) -> Result<IndexMap<i64, String>> {
        if ids.is_empty() {
            return Ok(IndexMap::new());
        }

        let (table, display) = lookup_target(kind);
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT id, {} FROM {} WHERE id IN ({})",
            display, table, placeholders
        );

        let mut query_builder = sqlx::query_as::<_, (i64, String)>(&query);
        for id in ids {
            query_builder = query_builder.bind(id);
        }
        let rows: IndexMap<i64, String> = query_builder
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to look up {} records", kind))?
            .into_iter()
            .collect();

        // Rows come back in table order; callers expect request order
        let mut resolved = IndexMap::with_capacity(rows.len());
        for id in ids {
            if let Some(display) = rows.get(id) {
                resolved.entry(*id).or_insert_with(|| display.clone());
            }
        }
        Ok(resolved)
    }

    async fn ticket_sources(&self) -> Result<Vec<String>> {
        if let Some(sources) = &self.sources {
            return Ok(sources.clone());
        }

        let sources = sqlx::query_scalar::<_, String>(
            "SELECT name FROM ticket_source ORDER BY sort, name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load ticket sources")?;
        if sources.is_empty() {
            return Ok(DEFAULT_TICKET_SOURCES.iter().map(|s| s.to_string()).collect());
        }
        Ok(sources)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
