pub mod metadata;
pub mod query;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ax_state::AppState;
use crate::core::error::QueryError;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/query/compile", post(query::compile_query))
        .route("/api/query/execute", post(query::execute_query))
        .route("/api/metadata/tables", get(metadata::list_tables))
        .route(
            "/api/metadata/tables/{table}/columns",
            get(metadata::list_columns),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 接口层错误：统一转为 `{ "error": {...} }`
#[derive(Debug)]
pub enum ApiError {
    Query(QueryError),
    NotAllowed(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Query(QueryError::Backend(e)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))).into_response()
            }
            ApiError::Query(QueryError::EmptyQuery) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": "Query is empty" } })),
            )
                .into_response(),
            ApiError::Query(QueryError::Unsupported(msg)) => (
                StatusCode::NOT_IMPLEMENTED,
                Json(json!({ "error": { "message": msg } })),
            )
                .into_response(),
            ApiError::NotAllowed(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": msg } })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::ax_state::AppState;
    use crate::core::executor::tests::StubBackend;
    use crate::core::executor::QueryExecutor;
    use crate::infra::config::ExecutionMode;

    pub fn app(stub: Arc<StubBackend>, enforce_allowlist: bool, mode: ExecutionMode) -> Router {
        let state = Arc::new(AppState {
            executor: QueryExecutor::new(stub, mode),
            enforce_allowlist,
        });
        super::router(state)
    }

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use crate::core::executor::tests::StubBackend;
    use crate::infra::config::ExecutionMode;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_is_ok() {
        let app = app(Arc::new(StubBackend::default()), true, ExecutionMode::Rpc);
        let (status, body) = send(app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
