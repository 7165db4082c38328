use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

// 两个及以上的分号 (中间可夹空白)
static SEMICOLON_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";(?:\s*;)+").expect("valid semicolon regex"));

/// 提交前的外观清理：合并连续分号、去掉一个结尾分号、去首尾空白。
/// 不做任何注入防护。
pub fn sanitize(raw: &str) -> String {
    let collapsed = SEMICOLON_RUN.replace_all(raw, ";");
    let trimmed = collapsed.trim();
    trimmed
        .strip_suffix(';')
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// 来自 JSON 的输入：null 或非字符串一律视为空
pub fn sanitize_value(raw: &Value) -> String {
    match raw {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}
