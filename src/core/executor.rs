use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::compiler::{compile_parameterized, compile_spec, ColumnTypes};
use crate::core::error::QueryError;
use crate::core::sanitizer::sanitize;
use crate::infra::backend::QueryBackend;
use crate::infra::config::ExecutionMode;
use crate::models::query::{QuerySpec, Row};

/// 执行输入：构建器表单 或 手写 SQL
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
    Spec(QuerySpec),
    Sql(String),
}

/// 一次执行的结果，附带实际提交的 SQL
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub sql: String,
    pub rows: Vec<Row>,
}

/// 客户端由外部显式注入；每次调用都是一次独立请求，无去重、无互斥、无重试
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn QueryBackend>,
    mode: ExecutionMode,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn QueryBackend>, mode: ExecutionMode) -> Self {
        Self { backend, mode }
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }

    #[instrument(skip(self, input), fields(mode = ?self.mode))]
    pub async fn execute(&self, input: QueryInput) -> Result<QueryOutcome, QueryError> {
        match input {
            QueryInput::Spec(spec) if self.mode == ExecutionMode::Parameterized => {
                self.execute_parameterized(&spec).await
            }
            QueryInput::Spec(spec) => {
                let compiled = compile_spec(&spec);
                info!("执行构建器查询: table={}", compiled.table);
                self.execute_text(&compiled.sql).await
            }
            QueryInput::Sql(raw) => self.execute_text(&raw).await,
        }
    }

    /// 清理后为空则直接失败，不发起任何网络请求
    async fn execute_text(&self, raw: &str) -> Result<QueryOutcome, QueryError> {
        let sql = sanitize(raw);
        if sql.is_empty() {
            warn!("拒绝空查询");
            return Err(QueryError::EmptyQuery);
        }
        debug!(sql = %sql, "提交远程执行");

        match self.backend.execute_sql(&sql).await {
            Ok(rows) => {
                info!("查询完成, row_count={}", rows.len());
                Ok(QueryOutcome { sql, rows })
            }
            Err(e) => {
                warn!("查询失败: {}", e);
                Err(e)
            }
        }
    }

    /// 目标表的列类型，用于占位符的显式类型转换
    pub async fn column_types(&self, table: &str) -> Result<ColumnTypes, QueryError> {
        Ok(self
            .backend
            .list_columns(table)
            .await?
            .into_iter()
            .map(|c| (c.column_name, c.data_type))
            .collect())
    }

    async fn execute_parameterized(&self, spec: &QuerySpec) -> Result<QueryOutcome, QueryError> {
        let types = self.column_types(&spec.table).await?;
        let query = compile_parameterized(spec, &types);
        info!(
            "执行参数化查询: table={}, params={}",
            query.table,
            query.params.len()
        );
        debug!(sql = %query.sql, "提交参数化执行");

        let rows = self.backend.execute_parameterized(&query).await.map_err(|e| {
            warn!("参数化查询失败: {}", e);
            e
        })?;
        Ok(QueryOutcome {
            sql: query.sql,
            rows,
        })
    }
}
