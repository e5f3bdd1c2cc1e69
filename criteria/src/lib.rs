//! Compiles ticket search criteria from help-desk API requests into typed
//! filter clauses for the query layer.

pub mod compiler;
pub mod dates;
pub mod error;
pub mod report;
pub mod rules;
pub mod search;
pub mod store;
pub mod types;

pub use compiler::{CriteriaCompiler, RawCriteria, DEFAULT_LOOKUP_TIMEOUT};
pub use error::{ErrorKind, ValidationError};
pub use report::{ReportEnd, ReportGroup, ReportQuery};
pub use search::{SearchPlan, SearchPreset, SearchRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use store::{EntityKind, MemoryStore, RecordStore, DEFAULT_TICKET_SOURCES};
pub use types::{FilterClause, Operand, Operator};
