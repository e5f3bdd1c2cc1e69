use poem::{
    get, handler,
    http::StatusCode,
    post,
    web::{Data, Json},
    Endpoint, EndpointExt, IntoResponse, Response, Route,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use ticket_criteria::{
    CriteriaCompiler, FilterClause, ReportQuery, SearchPreset, SearchRequest, ValidationError,
};

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorBody>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
            errors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: String,
    pub key: String,
    pub message: String,
    pub code: u16,
}

impl From<&ValidationError> for ErrorBody {
    fn from(e: &ValidationError) -> Self {
        Self {
            kind: e.kind.to_string(),
            key: e.key.clone(),
            message: e.message.clone(),
            code: e.code(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub clauses: Vec<FilterClause>,
}

fn status_of(e: &ValidationError) -> StatusCode {
    StatusCode::from_u16(e.code()).unwrap_or(StatusCode::BAD_REQUEST)
}

fn rejected(e: ValidationError) -> Response {
    tracing::info!("Rejected request: {}", e);
    let mut body = ApiResponse::<()>::error(e.message.clone());
    body.errors = Some(vec![ErrorBody::from(&e)]);
    Json(body).with_status(status_of(&e)).into_response()
}

fn ok<T: Serialize + Send>(data: T) -> Response {
    Json(ApiResponse::success(data)).into_response()
}

#[handler]
pub async fn health(compiler: Data<&Arc<CriteriaCompiler>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        store: compiler.store().name().to_string(),
    }))
}

#[handler]
pub async fn search_tickets(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    let request = match SearchRequest::from_body(&body) {
        Ok(r) => r,
        Err(e) => return rejected(e),
    };
    match request.plan(&compiler).await {
        Ok(plan) => ok(plan),
        Err(e) => rejected(e),
    }
}

/// Reports every invalid key instead of stopping at the first
#[handler]
pub async fn validate_criteria(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    let request = match SearchRequest::from_body(&body) {
        Ok(r) => r,
        Err(e) => return rejected(e),
    };
    match compiler.compile_all(&request.criteria).await {
        Ok(clauses) => ok(ValidateResponse {
            valid: true,
            clauses,
        }),
        Err(errors) => {
            // Any unavailable dependency outranks plain validation failures
            let status = errors
                .iter()
                .map(status_of)
                .max_by_key(|s| s.as_u16())
                .unwrap_or(StatusCode::BAD_REQUEST);
            let mut body =
                ApiResponse::<()>::error(format!("{} invalid criteria", errors.len()));
            body.errors = Some(errors.iter().map(ErrorBody::from).collect());
            Json(body).with_status(status).into_response()
        }
    }
}

async fn preset_search(
    compiler: &CriteriaCompiler,
    body: &Value,
    preset: Result<SearchPreset, ValidationError>,
) -> Response {
    let preset = match preset {
        Ok(p) => p,
        Err(e) => return rejected(e),
    };
    let request = match SearchRequest::from_body(body) {
        Ok(r) => r,
        Err(e) => return rejected(e),
    };
    match request.plan_preset(compiler, &preset).await {
        Ok(plan) => ok(plan),
        Err(e) => rejected(e),
    }
}

#[handler]
pub async fn search_have_org(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    preset_search(&compiler, &body, Ok(SearchPreset::HasOrganization)).await
}

#[handler]
pub async fn search_organization(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    preset_search(&compiler, &body, SearchPreset::organization_from_body(&body)).await
}

#[handler]
pub async fn search_department(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    preset_search(&compiler, &body, SearchPreset::department_from_body(&body)).await
}

#[handler]
pub async fn stats_report(
    compiler: Data<&Arc<CriteriaCompiler>>,
    Json(body): Json<Value>,
) -> Response {
    match ReportQuery::from_body(&body, compiler.now()) {
        Ok(query) => ok(query),
        Err(e) => rejected(e),
    }
}

pub fn routes(compiler: Arc<CriteriaCompiler>) -> impl Endpoint {
    Route::new()
        .at("/api/v1/health", get(health))
        .at("/api/v1/tickets/search", post(search_tickets))
        .at("/api/v1/tickets/search/validate", post(validate_criteria))
        .at("/api/v1/tickets/have-org", post(search_have_org))
        .at("/api/v1/tickets/organization", post(search_organization))
        .at("/api/v1/tickets/department", post(search_department))
        .at("/api/v1/stats/report", post(stats_report))
        .data(compiler)
}
