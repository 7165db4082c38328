use crate::models::query::Row;
use serde_json::{Map, Value};

/// 把一条 SELECT 包装成逐行 jsonb 输出，列类型转换交给服务端 (`to_jsonb`)
pub fn row_json_query(sql: &str) -> String {
    format!("SELECT to_jsonb(q) AS row FROM ({}) q", sql)
}

/// 远程过程返回的 JSON -> 行序列。
/// 数组取其中的对象，单个对象视为一行，null 视为无结果；其它标量包成 {"value": ..}
pub fn rows_from_json(value: Value) -> Vec<Row> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(into_row).collect(),
        other => vec![into_row(other)],
    }
}

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
