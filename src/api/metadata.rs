use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::ApiError;
use crate::ax_state::AppState;
use crate::models::metadata::ColumnInfo;

/// 可查询的表 (列选择器级联第一步)
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.executor.backend().list_tables().await?))
}

/// 指定表的列元数据 (级联第二步)
pub async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
) -> Result<Json<Vec<ColumnInfo>>, ApiError> {
    Ok(Json(state.executor.backend().list_columns(&table).await?))
}
