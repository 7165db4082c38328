use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::ax_state::AppState;
use crate::core::compiler::{compile_parameterized, compile_spec};
use crate::core::executor::QueryInput;
use crate::core::sanitizer::{sanitize, sanitize_value};
use crate::models::query::QuerySpec;

/// 执行请求：`spec` (构建器) 优先，否则取 `sql` (手写)
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub spec: Option<QuerySpec>,
    #[serde(default)]
    pub sql: Option<Value>,
}

/// 仅编译不执行，前端用于预览 SQL
pub async fn compile_query(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<QuerySpec>,
) -> Result<impl IntoResponse, ApiError> {
    check_allowlist(&state, &spec).await?;

    let compiled = compile_spec(&spec);
    let types = state.executor.column_types(&spec.table).await?;
    let parameterized = compile_parameterized(&spec, &types);
    Ok(Json(json!({
        "table": compiled.table,
        "sql": sanitize(&compiled.sql),
        "parameterized": {
            "sql": parameterized.sql,
            "params": parameterized.params,
        }
    })))
}

pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = match payload.spec {
        Some(spec) => {
            check_allowlist(&state, &spec).await?;
            QueryInput::Spec(spec)
        }
        None => QueryInput::Sql(payload.sql.as_ref().map(sanitize_value).unwrap_or_default()),
    };

    let outcome = state.executor.execute(input).await?;
    info!("查询接口返回 {} 行", outcome.rows.len());

    Ok(Json(json!({
        "status": "success",
        "data": outcome.rows,
        "meta": {
            "sql": outcome.sql,
            "row_count": outcome.rows.len()
        }
    })))
}

/// 表名与列名白名单校验：标识符不做转义，只允许元数据中存在的名字
async fn check_allowlist(state: &AppState, spec: &QuerySpec) -> Result<(), ApiError> {
    if !state.enforce_allowlist {
        return Ok(());
    }
    let backend = state.executor.backend();

    let tables = backend.list_tables().await?;
    if !tables.iter().any(|t| t == &spec.table) {
        warn!("拒绝未知表: {}", spec.table);
        return Err(ApiError::NotAllowed(format!("Unknown table: {}", spec.table)));
    }

    let columns: HashSet<String> = backend
        .list_columns(&spec.table)
        .await?
        .into_iter()
        .map(|c| c.column_name)
        .collect();

    let referenced = spec
        .filters
        .iter()
        .filter_map(|f| f.column.as_deref())
        .filter(|c| !c.is_empty())
        .chain(spec.ordering().map(|(col, _)| col));

    for col in referenced {
        if !columns.contains(col) {
            warn!("拒绝未知列: {}.{}", spec.table, col);
            return Err(ApiError::NotAllowed(format!(
                "Unknown column for table {}: {}",
                spec.table, col
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::core::error::BackendError;
    use crate::core::executor::tests::StubBackend;
    use crate::infra::config::ExecutionMode;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn compile_returns_both_forms() {
        let (status, body) = send(
            app(Arc::new(StubBackend::default()), true, ExecutionMode::Rpc),
            post_json(
                "/api/query/compile",
                json!({
                    "table": "t",
                    "filters": [{"column": "name", "operator": "contains", "value": "o'brien"}],
                    "limit": 10,
                    "offset": 0,
                    "orderBy": "--none--",
                    "orderDirection": "asc"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["sql"],
            json!(r#"SELECT * FROM public."t" WHERE "name" ILIKE '%o''brien%' LIMIT 10 OFFSET 0"#)
        );
        assert_eq!(body["parameterized"]["params"], json!(["%o'brien%"]));
        assert_eq!(
            body["parameterized"]["sql"],
            json!(r#"SELECT * FROM public."t" WHERE "name" ILIKE $1 LIMIT 10 OFFSET 0"#)
        );
    }

    #[tokio::test]
    async fn execute_spec_returns_rows_and_meta() {
        let stub = Arc::new(StubBackend::with_rows(json!([
            {"id": 1, "name": "Bolt", "qty": 4},
            {"id": 2, "name": "Nut", "qty": 9}
        ])));
        let (status, body) = send(
            app(stub.clone(), true, ExecutionMode::Rpc),
            post_json(
                "/api/query/execute",
                json!({"spec": {"table": "inventory", "orderBy": "qty", "orderDirection": "desc"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("success"));
        assert_eq!(body["meta"]["row_count"], json!(2));
        assert_eq!(body["data"][1]["name"], json!("Nut"));
        assert_eq!(
            body["meta"]["sql"],
            json!(r#"SELECT * FROM public."inventory" ORDER BY "qty" DESC LIMIT 50 OFFSET 0"#)
        );
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn execute_null_sql_is_empty_query() {
        let stub = Arc::new(StubBackend::default());
        let (status, body) = send(
            app(stub.clone(), true, ExecutionMode::Rpc),
            post_json("/api/query/execute", json!({"sql": null})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], json!("Query is empty"));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_error_fields_surface_verbatim() {
        let stub = Arc::new(StubBackend::failing(
            BackendError::new("relation does not exist").with_code("42P01"),
        ));
        let (status, body) = send(
            app(stub, true, ExecutionMode::Rpc),
            post_json("/api/query/execute", json!({"sql": "SELECT * FROM nope;"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            json!({
                "message": "relation does not exist",
                "details": null,
                "hint": null,
                "code": "42P01"
            })
        );
    }

    #[tokio::test]
    async fn unknown_identifiers_rejected_when_allowlist_enforced() {
        let stub = Arc::new(StubBackend::default());
        let (status, body) = send(
            app(stub.clone(), true, ExecutionMode::Rpc),
            post_json(
                "/api/query/execute",
                json!({"spec": {"table": "inventory", "filters": [
                    {"column": "qty\" OR 1=1 --", "operator": "equals", "value": 1}
                ]}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Unknown column"));

        let (status, _) = send(
            app(stub.clone(), true, ExecutionMode::Rpc),
            post_json("/api/query/execute", json!({"spec": {"table": "secrets"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn allowlist_can_be_disabled() {
        let stub = Arc::new(StubBackend::with_rows(json!([])));
        let (status, _) = send(
            app(stub.clone(), false, ExecutionMode::Rpc),
            post_json("/api/query/execute", json!({"spec": {"table": "anything"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn parameterized_mode_without_backend_support_is_501() {
        let stub = Arc::new(StubBackend::default());
        let (status, body) = send(
            app(stub.clone(), true, ExecutionMode::Parameterized),
            post_json("/api/query/execute", json!({"spec": {"table": "inventory"}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"]["message"], json!("stub"));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn parameterized_mode_returns_placeholder_sql() {
        let stub = Arc::new(StubBackend {
            parameterized: true,
            rows: crate::infra::utils::rows_from_json(json!([{"id": "a1", "qty": 7}])),
            ..Default::default()
        });
        let (status, body) = send(
            app(stub.clone(), true, ExecutionMode::Parameterized),
            post_json(
                "/api/query/execute",
                json!({"spec": {"table": "inventory", "filters": [
                    {"column": "qty", "operator": "greater_than", "value": "5"}
                ]}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sql = body["meta"]["sql"].as_str().unwrap();
        assert!(sql.contains("$1"), "{}", sql);
        assert!(sql.contains(r#""qty" > $1::integer"#), "{}", sql);
        assert_eq!(body["meta"]["row_count"], json!(1));
        assert_eq!(stub.calls().len(), 1);
    }
}
