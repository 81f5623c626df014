pub mod time;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// # Summary
/// 将表格单元格的原始 JSON 值宽松地转换为数字。
///
/// # Invariants
/// - 永不报错：无法识别的值一律返回 `None`。
/// - 非有限值 (NaN / Inf) 视为无法转换。
///
/// # Logic
/// 1. JSON 数字直接取 `f64`。
/// 2. 字符串去掉首尾空白与千分位逗号后再解析，空串视为缺失。
/// 3. 其余类型 (null、布尔、数组、对象) 返回 `None`。
///
/// # Arguments
/// * `value`: 单元格原始值。
///
/// # Returns
/// 成功转换返回 `Some(f64)`。
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// # Summary
/// 将单元格值宽松地转换为布尔标记。
///
/// # Logic
/// 接受 JSON 布尔、数字 (非零为真) 以及表格常见写法 `TRUE/YES/Y/1`，其余视为 false。
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_uppercase().as_str(),
            "TRUE" | "YES" | "Y" | "1"
        ),
        _ => false,
    }
}

/// # Summary
/// 将单元格值转换为文本，数字按其 JSON 表示输出，null 为空串。
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// # Summary
/// serde 的宽松反序列化辅助函数集合，供 `#[serde(deserialize_with = ...)]` 使用。
///
/// # Invariants
/// - 只有结构性错误 (非法 JSON) 才会失败，单元格内容本身永远不会导致整表解析失败。
pub mod lenient {
    use super::{Deserialize, Deserializer, Value, coerce_flag, coerce_number, coerce_text};

    /// 可选数字字段。
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_number(&value))
    }

    /// 非负计数字段，无法解析时为 0。
    pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0),
            Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
            _ => 0,
        })
    }

    /// 行号字段，允许数字或数字字符串。
    pub fn index<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        })
    }

    /// 布尔标记字段。
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_flag(&value))
    }

    /// 文本字段，数字会被转成字符串 (例如数字形式的 id)。
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_text(&value))
    }

    /// # Summary
    /// 目标价序列。
    ///
    /// # Logic
    /// 1. JSON 数组：逐项宽松转换，丢弃无法解析的项。
    /// 2. 字符串：按 `/`、`,`、`|` 分隔后逐项解析 (表格里常见 "120/130/145")。
    /// 3. 单个数字：视为单元素序列。
    pub fn numbers<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => items.iter().filter_map(coerce_number).collect(),
            Value::String(s) => s
                .split(['/', ',', '|'])
                .filter_map(|part| part.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .collect(),
            Value::Number(_) => coerce_number(&value).into_iter().collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number_accepts_numeric_strings() {
        assert_eq!(coerce_number(&json!("123.0")), Some(123.0));
        assert_eq!(coerce_number(&json!(" 1,250.5 ")), Some(1250.5));
        assert_eq!(coerce_number(&json!(42)), Some(42.0));
    }

    #[test]
    fn test_coerce_number_rejects_garbage() {
        assert_eq!(coerce_number(&json!("N/A")), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_coerce_flag_sheet_spellings() {
        assert!(coerce_flag(&json!("TRUE")));
        assert!(coerce_flag(&json!("yes")));
        assert!(coerce_flag(&json!(1)));
        assert!(!coerce_flag(&json!("FALSE")));
        assert!(!coerce_flag(&json!(null)));
    }
}
