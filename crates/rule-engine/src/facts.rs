//! 事实存储
//!
//! 事实名称到任意 JSON 值的映射，支持 `$.a.b` 形式的嵌套路径访问。

use crate::error::{Result, RuleError};
use serde_json::{Map, Value};

/// 事实存储
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facts {
    facts: Map<String, Value>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建，非对象值会被拒绝
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(facts) => Ok(Self { facts }),
            other => Err(RuleError::TypeMismatch {
                operator: "facts".to_string(),
                expected: "object".to_string(),
                actual: type_name(&other).to_string(),
            }),
        }
    }

    /// 添加或覆盖事实
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.facts.insert(name.into(), value.into());
    }

    /// 获取事实值
    ///
    /// 顶层事实不存在（或为 null）时返回 `Ok(None)`；
    /// 嵌套路径中任何一段不存在则返回 [`RuleError::PathNotFound`]。
    pub fn get(&self, name: &str, path: Option<&str>) -> Result<Option<&Value>> {
        let current = match self.facts.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let Some(path) = path else {
            return Ok(Some(current));
        };

        let trimmed = path.trim_start_matches(['$', '.']);
        if trimmed.is_empty() {
            return Ok(Some(current));
        }

        let not_found = || RuleError::PathNotFound {
            fact: name.to_string(),
            path: path.to_string(),
        };

        let mut current = current;
        for key in trimmed.split('.') {
            current = match current {
                Value::Object(map) => map.get(key).ok_or_else(not_found)?,
                Value::Array(arr) => {
                    // 支持数组索引访问，如 "$.items.0.name"
                    let index: usize = key.parse().map_err(|_| not_found())?;
                    arr.get(index).ok_or_else(not_found)?
                }
                _ => return Err(not_found()),
            };
        }

        Ok(Some(current))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// 所有事实的完整快照
    pub fn snapshot(&self) -> Value {
        Value::Object(self.facts.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.facts.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Facts {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// 获取值的类型名称
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
