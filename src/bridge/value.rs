use crate::error::RuntimeError;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// 从 Python 端取回的值
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ForeignValue>),
    Map(BTreeMap<String, ForeignValue>),
}

/// 传给片段的具名变量
pub type Bindings = BTreeMap<String, ForeignValue>;

impl ForeignValue {
    pub fn from_json(value: Value) -> Result<Self, RuntimeError> {
        Ok(match value {
            Value::Null => ForeignValue::Null,
            Value::Bool(b) => ForeignValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ForeignValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    ForeignValue::Float(f)
                } else {
                    return Err(RuntimeError::MarshalFailure(format!(
                        "number out of range: {n}"
                    )));
                }
            }
            Value::String(s) => ForeignValue::Str(s),
            Value::Array(items) => ForeignValue::List(
                items
                    .into_iter()
                    .map(ForeignValue::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => ForeignValue::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, ForeignValue::from_json(v)?)))
                    .collect::<Result<_, RuntimeError>>()?,
            ),
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            ForeignValue::Null => Value::Null,
            ForeignValue::Bool(b) => Value::Bool(*b),
            ForeignValue::Int(i) => Value::Number((*i).into()),
            // NaN / inf 在 JSON 中无法表示，按 null 传递
            ForeignValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ForeignValue::Str(s) => Value::String(s.clone()),
            ForeignValue::List(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            ForeignValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ForeignValue::Int(i) => Some(*i as f64),
            ForeignValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ForeignValue> {
        match self {
            ForeignValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// 标量转为显示文本；列表以 ", " 连接
    pub fn to_display(&self) -> String {
        match self {
            ForeignValue::Null => String::new(),
            ForeignValue::Bool(b) => b.to_string(),
            ForeignValue::Int(i) => i.to_string(),
            ForeignValue::Float(f) => f.to_string(),
            ForeignValue::Str(s) => s.clone(),
            ForeignValue::List(items) => items
                .iter()
                .map(|v| v.to_display())
                .collect::<Vec<_>>()
                .join(", "),
            ForeignValue::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{k}={}", v.to_display()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// 将 `[[a, b], ...]` 或 `{a: b}` 转为字符串对序列
    pub fn into_pairs(self) -> Result<Vec<(String, String)>, RuntimeError> {
        match self {
            ForeignValue::List(items) => items
                .into_iter()
                .map(|item| match item {
                    ForeignValue::List(pair) if pair.len() == 2 => {
                        Ok((pair[0].to_display(), pair[1].to_display()))
                    }
                    other => Err(RuntimeError::MarshalFailure(format!(
                        "expected a pair, got {other:?}"
                    ))),
                })
                .collect(),
            ForeignValue::Map(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, v.to_display()))
                .collect()),
            other => Err(RuntimeError::MarshalFailure(format!(
                "expected a sequence of pairs, got {other:?}"
            ))),
        }
    }

    /// 取出数值列，例如 DataFrame 转换后的 `{"x": [...]}`
    pub fn numeric_column(&self, key: &str) -> Result<Vec<f64>, RuntimeError> {
        let column = self
            .get(key)
            .ok_or_else(|| RuntimeError::MarshalFailure(format!("missing column '{key}'")))?;
        match column {
            ForeignValue::List(items) => items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        RuntimeError::MarshalFailure(format!("non-numeric value in '{key}'"))
                    })
                })
                .collect(),
            _ => Err(RuntimeError::MarshalFailure(format!(
                "column '{key}' is not a list"
            ))),
        }
    }
}

impl From<&str> for ForeignValue {
    fn from(s: &str) -> Self {
        ForeignValue::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_integer_precision() {
        let v = ForeignValue::from_json(json!([1, 2.5, "a", null, true])).unwrap();
        assert_eq!(
            v,
            ForeignValue::List(vec![
                ForeignValue::Int(1),
                ForeignValue::Float(2.5),
                ForeignValue::Str("a".to_string()),
                ForeignValue::Null,
                ForeignValue::Bool(true),
            ])
        );
    }

    #[test]
    fn nan_binding_is_sent_as_null() {
        assert_eq!(ForeignValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(ForeignValue::Int(7).to_json(), json!(7));
    }

    #[test]
    fn pairs_from_nested_lists() {
        let v = ForeignValue::from_json(json!([["numpy", "1.26.4"], ["pandas", "2.2.1"]])).unwrap();
        assert_eq!(
            v.into_pairs().unwrap(),
            vec![
                ("numpy".to_string(), "1.26.4".to_string()),
                ("pandas".to_string(), "2.2.1".to_string()),
            ]
        );
    }

    #[test]
    fn pairs_reject_ragged_entries() {
        let v = ForeignValue::from_json(json!([["numpy"]])).unwrap();
        assert!(matches!(v.into_pairs(), Err(RuntimeError::MarshalFailure(_))));
        assert!(ForeignValue::Int(3).into_pairs().is_err());
    }

    #[test]
    fn numeric_column_accepts_ints_and_floats() {
        let v = ForeignValue::from_json(json!({"x": [1, 2.5], "y": ["a"]})).unwrap();
        assert_eq!(v.numeric_column("x").unwrap(), vec![1.0, 2.5]);
        assert!(v.numeric_column("y").is_err());
        assert!(v.numeric_column("z").is_err());
    }

    #[test]
    fn display_joins_lists() {
        let v = ForeignValue::from_json(json!(["numpy>=1.22", "tzdata"])).unwrap();
        assert_eq!(v.to_display(), "numpy>=1.22, tzdata");
        assert_eq!(ForeignValue::Null.to_display(), "");
    }
}
