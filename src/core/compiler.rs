//! 过滤条件 -> SQL 编译器
//!
//! 两种产物：
//! - `compile`：拼接字符串，交给远程 `execute_sql` 过程执行 (与现有 RPC 兼容)
//! - `compile_parameterized`：占位符 + 绑定值，供可直接绑定参数的执行面使用
//!
//! 注意：表名/列名只包裹双引号，不做任何转义；字符串字面量只做单引号加倍。
//! 标识符的安全性依赖 API 层的白名单校验以及服务端权限边界。

use std::collections::HashMap;

use crate::models::query::{
    CompiledQuery, FilterSpec, FilterValue, Operator, OrderDirection, ParameterizedQuery, QuerySpec,
    SqlParam, NO_ORDER,
};

/// 固定的 schema 命名空间
pub const SCHEMA: &str = "public";

/// 列名 -> information_schema 中的 data_type
pub type ColumnTypes = HashMap<String, String>;

/// 编译为可直接提交的 SQL 文本。编译是全函数：缺列/缺算子/未知算子的过滤条件被跳过。
/// `order_by` 为 `NO_ORDER` 哨兵时不输出 ORDER BY
pub fn compile(
    table: &str,
    filters: &[FilterSpec],
    limit: u32,
    offset: u64,
    order_by: &str,
    order_direction: OrderDirection,
) -> String {
    let clauses: Vec<String> = filters.iter().filter_map(literal_clause).collect();
    assemble(table, &clauses, limit, offset, order_by, order_direction)
}

pub fn compile_spec(spec: &QuerySpec) -> CompiledQuery {
    CompiledQuery {
        table: spec.table.clone(),
        sql: compile(
            &spec.table,
            &spec.filters,
            spec.limit,
            spec.offset,
            &spec.order_by,
            spec.order_direction,
        ),
    }
}

/// 占位符形式：子句结构与 `compile` 一致，值改为 $n 绑定。
///
/// 已知列类型时，值一律按文本绑定并显式转换为列类型 (`$1::integer`)，
/// 与拼接形式中未定型字面量的行为一致；未知列按值本身的 JSON 类型绑定。
pub fn compile_parameterized(spec: &QuerySpec, types: &ColumnTypes) -> ParameterizedQuery {
    let mut params = Vec::new();
    let mut clauses = Vec::new();

    for f in &spec.filters {
        let Some((column, op)) = f.active() else {
            continue;
        };
        let col = quote_ident(column);
        let clause = match op {
            Operator::IsNull => format!("{} IS NULL", col),
            Operator::IsNotNull => format!("{} IS NOT NULL", col),
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                let text = f.value.as_ref().map(FilterValue::as_text).unwrap_or_default();
                params.push(SqlParam::Text(wrap_pattern(op, &text)));
                format!("{} ILIKE ${}", col, params.len())
            }
            Operator::Unknown(_) => continue,
            cmp => {
                let Some(sym) = comparison_symbol(cmp) else {
                    continue;
                };
                let Some(v) = &f.value else {
                    clauses.push(format!("{} {} NULL", col, sym));
                    continue;
                };
                match types.get(column).map(|t| ColumnCast::from_data_type(t)) {
                    Some(ColumnCast::To(ty)) => {
                        params.push(SqlParam::Text(v.as_text()));
                        format!("{} {} ${}::{}", col, sym, params.len(), ty)
                    }
                    Some(ColumnCast::ColumnAsText) => {
                        params.push(SqlParam::Text(v.as_text()));
                        format!("{}::text {} ${}", col, sym, params.len())
                    }
                    None => {
                        params.push(SqlParam::from(v));
                        format!("{} {} ${}", col, sym, params.len())
                    }
                }
            }
        };
        clauses.push(clause);
    }

    ParameterizedQuery {
        table: spec.table.clone(),
        sql: assemble(
            &spec.table,
            &clauses,
            spec.limit,
            spec.offset,
            &spec.order_by,
            spec.order_direction,
        ),
        params,
    }
}

/// 占位符的类型转换方式
#[derive(Debug, PartialEq)]
enum ColumnCast<'a> {
    /// 内建类型：`$n::<type>`
    To(&'a str),
    /// 枚举/数组等无法直接写出类型名的列：列侧转文本比较
    ColumnAsText,
}

impl<'a> ColumnCast<'a> {
    fn from_data_type(data_type: &'a str) -> Self {
        let nameable = !data_type.is_empty()
            && data_type != "USER-DEFINED"
            && data_type != "ARRAY"
            && data_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_');
        if nameable {
            ColumnCast::To(data_type)
        } else {
            ColumnCast::ColumnAsText
        }
    }
}

fn assemble(
    table: &str,
    clauses: &[String],
    limit: u32,
    offset: u64,
    order_by: &str,
    order_direction: OrderDirection,
) -> String {
    let mut sql = format!("SELECT * FROM {}.{}", SCHEMA, quote_ident(table));

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if order_by != NO_ORDER {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote_ident(order_by),
            order_direction.as_sql()
        ));
    }

    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
    sql
}

fn literal_clause(f: &FilterSpec) -> Option<String> {
    let (column, op) = f.active()?;
    let col = quote_ident(column);

    let clause = match op {
        Operator::IsNull => format!("{} IS NULL", col),
        Operator::IsNotNull => format!("{} IS NOT NULL", col),
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let text = f.value.as_ref().map(FilterValue::as_text).unwrap_or_default();
            format!("{} ILIKE {}", col, quote_literal(&wrap_pattern(op, &text)))
        }
        Operator::Unknown(_) => return None,
        cmp => {
            let sym = comparison_symbol(cmp)?;
            format!("{} {} {}", col, sym, render_value(f.value.as_ref()))
        }
    };
    Some(clause)
}

fn comparison_symbol(op: &Operator) -> Option<&'static str> {
    match op {
        Operator::Equals => Some("="),
        Operator::NotEquals => Some("!="),
        Operator::GreaterThan => Some(">"),
        Operator::LessThan => Some("<"),
        Operator::GreaterThanOrEquals => Some(">="),
        Operator::LessThanOrEquals => Some("<="),
        _ => None,
    }
}

fn wrap_pattern(op: &Operator, text: &str) -> String {
    match op {
        Operator::Contains => format!("%{}%", text),
        Operator::StartsWith => format!("{}%", text),
        Operator::EndsWith => format!("%{}", text),
        _ => text.to_string(),
    }
}

fn render_value(value: Option<&FilterValue>) -> String {
    match value {
        Some(FilterValue::Text(s)) => quote_literal(s),
        Some(FilterValue::Number(n)) => n.to_string(),
        None => "NULL".to_string(),
    }
}

/// 单引号加倍，只防止字面量被提前截断，不是通用的注入防护
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}
