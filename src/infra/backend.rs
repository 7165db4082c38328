use async_trait::async_trait;
use sqlx::{PgPool, Row as _};
use tracing::debug;

use crate::core::compiler::SCHEMA;
use crate::core::error::QueryError;
use crate::infra::utils::{row_json_query, rows_from_json};
use crate::models::metadata::ColumnInfo;
use crate::models::query::{ParameterizedQuery, Row, SqlParam};

/// 远程数据服务的唯一边界：执行 SQL 文本 + 表/列元数据
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// 把整段 SQL 文本交给服务端过程执行
    async fn execute_sql(&self, sql: &str) -> Result<Vec<Row>, QueryError>;

    /// 占位符 + 绑定值。不支持直接绑定的执行面保持默认实现
    async fn execute_parameterized(
        &self,
        _query: &ParameterizedQuery,
    ) -> Result<Vec<Row>, QueryError> {
        Err(QueryError::Unsupported(
            "parameterized execution is not available on this backend".to_string(),
        ))
    }

    async fn list_tables(&self) -> Result<Vec<String>, QueryError>;

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError>;
}

pub struct PgBackend {
    pool: PgPool,
    rpc_function: String,
}

impl PgBackend {
    pub fn new(pool: PgPool, rpc_function: impl Into<String>) -> Self {
        Self {
            pool,
            rpc_function: rpc_function.into(),
        }
    }
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn execute_sql(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        // 过程名来自配置 (已校验)，SQL 文本本身作为参数传入
        let call = format!("SELECT {}($1)::jsonb AS result", self.rpc_function);
        let row = sqlx::query(&call).bind(sql).fetch_one(&self.pool).await?;
        let value: Option<serde_json::Value> = row.try_get("result")?;
        let rows = rows_from_json(value.unwrap_or_default());
        debug!("远程过程返回 {} 行", rows.len());
        Ok(rows)
    }

    async fn execute_parameterized(
        &self,
        query: &ParameterizedQuery,
    ) -> Result<Vec<Row>, QueryError> {
        // 行在服务端转为 jsonb，uuid/interval/数组/枚举等类型都保留原值
        let wrapped = row_json_query(&query.sql);
        let mut q = sqlx::query(&wrapped);
        for p in &query.params {
            q = match p {
                SqlParam::Text(s) => q.bind(s.clone()),
                SqlParam::Integer(i) => q.bind(*i),
                SqlParam::Float(f) => q.bind(*f),
            };
        }
        let rows = q
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| r.try_get::<serde_json::Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("参数化查询返回 {} 行", rows.len());
        Ok(rows_from_json(serde_json::Value::Array(rows)))
    }

    async fn list_tables(&self) -> Result<Vec<String>, QueryError> {
        let rows = sqlx::query(
            "SELECT tablename::text FROM pg_catalog.pg_tables WHERE schemaname = $1 ORDER BY tablename",
        )
        .bind(SCHEMA)
        .fetch_all(&self.pool)
        .await?;
        let tables = rows
            .iter()
            .map(|r| r.try_get::<String, _>(0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError> {
        let cols = sqlx::query_as::<_, ColumnInfo>(
            "SELECT column_name::text AS column_name, data_type::text AS data_type,
                    (is_nullable = 'YES') AS is_nullable, column_default::text AS column_default
             FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = $2
             ORDER BY ordinal_position",
        )
        .bind(SCHEMA)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(cols)
    }
}
