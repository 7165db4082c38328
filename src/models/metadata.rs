use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 列元数据 (用于前端列选择器)
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
}
