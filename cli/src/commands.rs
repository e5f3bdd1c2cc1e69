//! Subcommand bodies; each returns the JSON document `tcc` prints

use crate::CliError;
use serde_json::{json, Value};
use ticket_criteria::{
    rules::recognized_keys, CriteriaCompiler, RawCriteria, ReportQuery, SearchPreset,
    SearchRequest, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    HaveOrg,
    Organization,
    Department,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::Output(anyhow::Error::new(e)))
}

fn criteria_object(input: &Value) -> Result<&RawCriteria, CliError> {
    input.as_object().ok_or_else(|| {
        CliError::from(ValidationError::malformed(
            "",
            format!("criteria must be a JSON object, got {}", input),
        ))
    })
}

pub async fn compile(
    compiler: &CriteriaCompiler,
    input: &Value,
    all: bool,
) -> Result<Value, CliError> {
    let raw = criteria_object(input)?;
    let clauses = if all {
        compiler
            .compile_all(raw)
            .await
            .map_err(CliError::Rejected)?
    } else {
        compiler.compile(raw).await?
    };
    log::debug!("Compiled {} clauses", clauses.len());
    to_json(&clauses)
}

pub async fn search(
    compiler: &CriteriaCompiler,
    input: &Value,
    preset: Option<PresetKind>,
) -> Result<Value, CliError> {
    let request = SearchRequest::from_body(input)?;
    let plan = match preset {
        None => request.plan(compiler).await?,
        Some(kind) => {
            let preset = match kind {
                PresetKind::HaveOrg => SearchPreset::HasOrganization,
                PresetKind::Organization => SearchPreset::organization_from_body(input)?,
                PresetKind::Department => SearchPreset::department_from_body(input)?,
            };
            request.plan_preset(compiler, &preset).await?
        }
    };
    to_json(&plan)
}

pub fn report(compiler: &CriteriaCompiler, input: &Value) -> Result<Value, CliError> {
    let query = ReportQuery::from_body(input, compiler.now())?;
    to_json(&query)
}

pub fn keys() -> Value {
    json!(recognized_keys().collect::<Vec<_>>())
}
