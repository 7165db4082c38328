use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 排序字段的"不排序"哨兵值 (前端下拉框的默认项)
pub const NO_ORDER: &str = "--none--";

/// 过滤算子。未知字符串不会导致反序列化失败，而是落入 `Unknown`，编译时静默跳过
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEquals,
    LessThanOrEquals,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterThanOrEquals => "greater_than_or_equals",
            Operator::LessThanOrEquals => "less_than_or_equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "greater_than_or_equals" => Operator::GreaterThanOrEquals,
            "less_than_or_equals" => Operator::LessThanOrEquals,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "is_null" => Operator::IsNull,
            "is_not_null" => Operator::IsNotNull,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<&str> for Operator {
    fn from(raw: &str) -> Self {
        Operator::from(raw.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

/// 过滤值：字符串或数字，null 由外层 Option 表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(serde_json::Number),
}

impl FilterValue {
    /// 字面文本 (数字原样输出)
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(n.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub operator: Option<Operator>,
    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl FilterSpec {
    pub fn new(column: &str, operator: impl Into<Operator>, value: Option<FilterValue>) -> Self {
        Self {
            column: Some(column.to_string()),
            operator: Some(operator.into()),
            value,
        }
    }

    /// 列与算子都已填写时才参与编译
    pub fn active(&self) -> Option<(&str, &Operator)> {
        let column = self.column.as_deref().filter(|c| !c.is_empty())?;
        Some((column, self.operator.as_ref()?))
    }
}

/// 排序方向。只有精确的 "desc" 才是降序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl From<String> for OrderDirection {
    fn from(raw: String) -> Self {
        OrderDirection::from(raw.as_str())
    }
}

impl From<&str> for OrderDirection {
    fn from(raw: &str) -> Self {
        if raw == "desc" {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        }
    }
}

impl From<OrderDirection> for String {
    fn from(dir: OrderDirection) -> Self {
        match dir {
            OrderDirection::Asc => "asc".to_string(),
            OrderDirection::Desc => "desc".to_string(),
        }
    }
}

fn default_limit() -> u32 {
    50
}

fn default_order_by() -> String {
    NO_ORDER.to_string()
}

/// 查询构建器表单的完整状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default)]
    pub order_direction: OrderDirection,
}

impl QuerySpec {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            limit: default_limit(),
            offset: 0,
            order_by: default_order_by(),
            order_direction: OrderDirection::Asc,
        }
    }

    /// 排序列与方向；哨兵值表示不排序
    pub fn ordering(&self) -> Option<(&str, OrderDirection)> {
        if self.order_by == NO_ORDER {
            None
        } else {
            Some((self.order_by.as_str(), self.order_direction))
        }
    }
}

/// 编译产物：只在一次执行中存活
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub table: String,
    pub sql: String,
}

/// 绑定参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<&FilterValue> for SqlParam {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => SqlParam::Text(s.clone()),
            FilterValue::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Integer(i),
                None => SqlParam::Float(n.as_f64().unwrap_or_default()),
            },
        }
    }
}

/// 占位符形式的编译产物 ($1, $2 ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedQuery {
    pub table: String,
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// 一行结果：列名 -> 标量或嵌套 JSON
pub type Row = Map<String, Value>;
