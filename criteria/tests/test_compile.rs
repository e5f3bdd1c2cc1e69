use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use ticket_criteria::{
    CriteriaCompiler, ErrorKind, MemoryStore, Operator, RawCriteria, SearchRequest,
};

const FIXTURE: &str = r#"
sources: [Phone, Email, Web]
records:
  ticket_status:
    1: open
    2: closed
  department:
    1: Support
  organization:
    12: Initech
"#;

fn compiler() -> CriteriaCompiler {
    let store = MemoryStore::from_yaml_str(FIXTURE).unwrap();
    CriteriaCompiler::new(Arc::new(store))
        .with_fixed_now(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

fn criteria(value: Value) -> RawCriteria {
    value.as_object().cloned().unwrap()
}

async fn compile_json(value: Value) -> Value {
    let clauses = compiler().compile(&criteria(value)).await.unwrap();
    serde_json::to_value(clauses).unwrap()
}

#[tokio::test]
async fn test_status_example() {
    assert_eq!(
        compile_json(json!({"status_id": [1, 2]})).await,
        json!([["status__state", "includes", {"open": "open", "closed": "closed"}]])
    );
}

#[tokio::test]
async fn test_assigned_example() {
    assert_eq!(
        compile_json(json!({"assigned": true})).await,
        json!([["isassigned", "set", null]])
    );
}

#[tokio::test]
async fn test_create_date_example() {
    assert_eq!(
        compile_json(json!({"create_date_begin": "2024-01-01", "create_date_end": "2024-06-01"}))
            .await,
        json!([["created", "between", {"low": "2024-01-01", "high": "2024-06-01"}]])
    );
}

#[tokio::test]
async fn test_bogus_source_example() {
    let err = compiler()
        .compile(&criteria(json!({"source": ["Phone", "Bogus"]})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 400);
    assert!(err.message.contains("Bogus"));
}

#[tokio::test]
async fn test_reopen_count_example() {
    assert_eq!(
        compile_json(json!({"reopen_count": ">3"})).await,
        json!([["reopen_count", "greater", 3]])
    );
}

#[tokio::test]
async fn test_future_duedate_example() {
    let err = compiler()
        .compile(&criteria(json!({"duedate_begin": "2099-01-01"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRange);
}

#[tokio::test]
async fn test_reopen_count_pattern_property() {
    let c = compiler();
    for raw in ["0", "7", "<1", ">250", "<0"] {
        let clauses = c
            .compile(&criteria(json!({ "reopen_count": raw })))
            .await
            .unwrap();
        assert_eq!(clauses.len(), 1, "{}", raw);
    }
    for raw in ["", "=1", "<<1", "1<", "> 1", "one", "-1"] {
        let err = c
            .compile(&criteria(json!({ "reopen_count": raw })))
            .await
            .unwrap_err();
        assert!(
            matches!(err.kind, ErrorKind::UnsupportedOperator | ErrorKind::MalformedValue),
            "{}",
            raw
        );
    }
}

#[tokio::test]
async fn test_date_pairs_property() {
    let c = compiler();
    let pairs = [
        ("2020-02-28", "2020-02-29"),
        ("2023-12-31", "2024-01-01"),
        ("2000-01-01", "2024-12-31"),
    ];
    for (begin, end) in pairs {
        let clauses = c
            .compile(&criteria(json!({"close_date_begin": begin, "close_date_end": end})))
            .await
            .unwrap();
        assert_eq!(clauses[0].operator, Operator::Between);
        assert_eq!(
            serde_json::to_value(&clauses[0].operand).unwrap(),
            json!({"low": begin, "high": end})
        );

        let err = c
            .compile(&criteria(json!({"close_date_begin": end, "close_date_end": begin})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfRange);
    }
}

#[tokio::test]
async fn test_search_request_end_to_end() {
    let body = json!({
        "criteria": {"dept_id": [1], "subject": "login"},
        "page": 4,
        "limit": 20
    });
    let plan = SearchRequest::from_body(&body)
        .unwrap()
        .plan(&compiler())
        .await
        .unwrap();
    assert_eq!(plan.offset, 60);
    assert_eq!(
        serde_json::to_value(&plan.clauses).unwrap(),
        json!([
            ["dept_id", "includes", {"1": "Support"}],
            ["cdata__subject", "contains", "login"],
        ])
    );
}
