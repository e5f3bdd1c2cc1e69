pub mod commands;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use ticket_criteria::{MemoryStore, ValidationError};

pub use commands::PresetKind;

/// Error type for CLI failures
#[derive(Debug)]
pub enum CliError {
    StoreLoad(String, anyhow::Error),
    InputRead(String, anyhow::Error),
    InvalidJson(serde_json::Error),
    InvalidDate(String),
    Rejected(Vec<ValidationError>),
    Output(anyhow::Error),
}

impl CliError {
    /// Rejected criteria exit with 1, everything else with 2
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Rejected(_) => 1,
            _ => 2,
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Rejected(vec![e])
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::StoreLoad(path, e) => write!(
                f,
                "Failed to load record store from {}: {:#}\n\nThe fixture must be YAML (or JSON with a .json extension) with optional `sources` and `records` keys.",
                path, e
            ),
            CliError::InputRead(path, e) => write!(f, "Failed to read input {}: {:#}", path, e),
            CliError::InvalidJson(e) => write!(
                f,
                "Input is not valid JSON: {}\n\nPass inline JSON, a path to a .json file, or - to read stdin.",
                e
            ),
            CliError::InvalidDate(raw) => {
                write!(f, "Invalid --today value '{}', expected YYYY-MM-DD", raw)
            }
            CliError::Rejected(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "[{}] {}", e.code(), e)?;
                }
                Ok(())
            }
            CliError::Output(e) => write!(f, "Failed to render output: {:#}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::StoreLoad(_, e) | CliError::InputRead(_, e) | CliError::Output(e) => {
                Some(e.as_ref())
            }
            CliError::InvalidJson(e) => Some(e),
            CliError::InvalidDate(_) | CliError::Rejected(_) => None,
        }
    }
}

/// Empty store when no fixture is given
pub fn load_store(path: Option<&Path>) -> Result<MemoryStore, CliError> {
    let Some(path) = path else {
        log::debug!("No store fixture given, using an empty store");
        return Ok(MemoryStore::new());
    };

    let display = path.display().to_string();
    let fixture = fs_err::read_to_string(path)
        .map_err(|e| CliError::StoreLoad(display.clone(), anyhow::Error::new(e)))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let store = if is_json {
        MemoryStore::from_json_str(&fixture)
    } else {
        MemoryStore::from_yaml_str(&fixture)
    }
    .map_err(|e| CliError::StoreLoad(display.clone(), e))?;

    log::info!("Loaded record store fixture {}", display);
    Ok(store)
}

/// Inline JSON, `-` for stdin, or a file path
pub fn read_json_input(arg: &str) -> Result<Value, CliError> {
    let text = if arg.trim_start().starts_with(['{', '[']) {
        arg.to_string()
    } else if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::InputRead("stdin".to_string(), anyhow::Error::new(e)))?;
        buf
    } else {
        fs_err::read_to_string(arg)
            .map_err(|e| CliError::InputRead(arg.to_string(), anyhow::Error::new(e)))?
    };
    serde_json::from_str(&text).map_err(CliError::InvalidJson)
}

/// End of the given day, so the day itself still counts as the past
pub fn parse_today(raw: &str) -> Result<DateTime<Utc>, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CliError::InvalidDate(raw.to_string()))
}
