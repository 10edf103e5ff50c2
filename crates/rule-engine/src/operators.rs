//! 规则操作符定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 叶子条件操作符
///
/// 操作符集合是封闭的，任何其他名称都会得到 [`RuleError::UnknownOperator`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    // 相等
    Equal,

    // 有序比较
    LessThan,
    LessThanInclusive,
    GreaterThan,
    GreaterThanInclusive,

    // 成员检查
    In,
    NotIn,
    Contains,
}

impl Operator {
    /// 线上格式中的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::LessThan => "lessThan",
            Self::LessThanInclusive => "lessThanInclusive",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanInclusive => "greaterThanInclusive",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
        }
    }

    /// 规则解释中使用的可读短语
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Equal => "is equal to",
            Self::GreaterThanInclusive => "is >=",
            Self::LessThanInclusive => "is <=",
            Self::LessThan => "is less than",
            Self::GreaterThan => "is greater than",
            Self::In => "is in",
            Self::NotIn => "is not in",
            Self::Contains => "contains",
        }
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "lessThan" => Ok(Self::LessThan),
            "lessThanInclusive" => Ok(Self::LessThanInclusive),
            "greaterThan" => Ok(Self::GreaterThan),
            "greaterThanInclusive" => Ok(Self::GreaterThanInclusive),
            "in" => Ok(Self::In),
            "notIn" => Ok(Self::NotIn),
            "contains" => Ok(Self::Contains),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
