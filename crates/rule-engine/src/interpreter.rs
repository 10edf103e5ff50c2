//! 规则解释器
//!
//! 将条件树渲染为可读的布尔表达式文本，与事实无关。

use crate::condition::{Clause, Condition, Leaf};
use crate::error::Result;
use serde_json::Value;

/// 规则解释器
pub struct RuleInterpreter;

impl RuleInterpreter {
    /// 渲染条件树
    ///
    /// `All` / `Any` 渲染为带括号的 `AND` / `OR` 连接，`Not` 渲染为 `NOT (...)`，
    /// 规则引用渲染为规则名，叶子条件渲染为 `<名称> <操作符短语> <值>`。
    pub fn interpret(condition: &Condition) -> Result<String> {
        match condition {
            Condition::All(children) => Self::interpret_group(children, " AND "),
            Condition::Any(children) => Self::interpret_group(children, " OR "),
            Condition::Not(child) => Ok(format!("NOT ({})", Self::interpret(child)?)),
            Condition::RuleRef(name) => Ok(name.clone()),
            Condition::Leaf(leaf) => Self::interpret_leaf(leaf),
        }
    }

    fn interpret_group(children: &[Clause], separator: &str) -> Result<String> {
        let clauses = children
            .iter()
            .map(|child| Self::interpret(&child.condition))
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("({})", clauses.join(separator)))
    }

    fn interpret_leaf(leaf: &Leaf) -> Result<String> {
        let operator = leaf.operator()?;
        Ok(format!(
            "{} {} {}",
            leaf.display_name(),
            operator.phrase(),
            Self::render_value(&leaf.value)
        ))
    }

    /// 标量按字面形式渲染，数组和对象渲染为紧凑 JSON
    fn render_value(value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => value.to_string(),
        }
    }
}
