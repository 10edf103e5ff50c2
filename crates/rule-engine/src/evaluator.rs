//! 条件评估器
//!
//! 实现叶子条件各操作符的严格比较语义，不做隐式类型转换。

use crate::error::{Result, RuleError};
use crate::facts::type_name;
use crate::operators::Operator;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `fact_value` - 从事实存储中解析出的值，事实不存在时为 `None`（按 null 处理）
    /// * `operator` - 操作符
    /// * `expected_value` - 规则中定义的期望值
    pub fn evaluate(
        fact_value: Option<&Value>,
        operator: Operator,
        expected_value: &Value,
    ) -> Result<bool> {
        let fact_value = fact_value.unwrap_or(&Value::Null);

        match operator {
            Operator::Equal => Ok(fact_value == expected_value),
            Operator::LessThan => Self::compare(operator, fact_value, expected_value, Ordering::is_lt),
            Operator::LessThanInclusive => {
                Self::compare(operator, fact_value, expected_value, Ordering::is_le)
            }
            Operator::GreaterThan => {
                Self::compare(operator, fact_value, expected_value, Ordering::is_gt)
            }
            Operator::GreaterThanInclusive => {
                Self::compare(operator, fact_value, expected_value, Ordering::is_ge)
            }
            Operator::In => Self::in_list(operator, fact_value, expected_value),
            Operator::NotIn => Self::in_list(operator, fact_value, expected_value).map(|r| !r),
            Operator::Contains => Ok(Self::contains(fact_value, expected_value)),
        }
    }

    /// 有序比较，两侧必须同为数值、字符串或布尔值
    fn compare<F>(operator: Operator, fact: &Value, expected: &Value, cmp: F) -> Result<bool>
    where
        F: Fn(Ordering) -> bool,
    {
        let ordering = match (fact, expected) {
            (Value::Number(a), Value::Number(b)) => Self::compare_numbers(a, b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        };

        let ordering = ordering.ok_or_else(|| RuleError::TypeMismatch {
            operator: operator.to_string(),
            expected: format!("与 {} 可比较的值", type_name(expected)),
            actual: type_name(fact).to_string(),
        })?;

        Ok(cmp(ordering))
    }

    /// 数值比较，整数之间精确比较，其余按浮点数
    fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
            return Some(a.cmp(&b));
        }
        a.as_f64()?.partial_cmp(&b.as_f64()?)
    }

    /// 列表成员检查 (in)，按严格相等
    fn in_list(operator: Operator, fact: &Value, expected: &Value) -> Result<bool> {
        let arr = expected.as_array().ok_or_else(|| RuleError::TypeMismatch {
            operator: operator.to_string(),
            expected: "array".to_string(),
            actual: type_name(expected).to_string(),
        })?;

        Ok(arr.contains(fact))
    }

    /// 事实本身是数组且包含期望值；事实不是数组时为 false
    fn contains(fact: &Value, expected: &Value) -> bool {
        match fact {
            Value::Array(arr) => arr.contains(expected),
            _ => false,
        }
    }
}
