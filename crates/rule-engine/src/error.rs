//! 规则引擎错误类型

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("无效的规则定义: {0}")]
    InvalidRuleDefinition(String),

    #[error("无效的条件: {0}")]
    InvalidCondition(String),

    #[error("未知的操作符: {0}")]
    UnknownOperator(String),

    #[error("路径 '{path}' 在事实 '{fact}' 中不存在")]
    PathNotFound { fact: String, path: String },

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("依赖规则未找到: {0}")]
    UnknownRule(String),

    #[error("规则名称重复: {0}")]
    DuplicateRule(String),

    #[error("类型不匹配: {operator} 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        operator: String,
        expected: String,
        actual: String,
    },

    #[error("检测到循环引用: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),

    #[error("规则引用深度超限: 当前 {depth}, 最大 {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("未设置目标规则")]
    NoTargetRule,

    #[error("读取文件失败 '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    /// 稳定的错误类别名称，供宿主程序展示 "message + kind"
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRuleDefinition(_) => "InvalidRuleDefinition",
            Self::InvalidCondition(_) => "InvalidCondition",
            Self::UnknownOperator(_) => "UnknownOperator",
            Self::PathNotFound { .. } => "PathNotFound",
            Self::RuleNotFound(_) => "RuleNotFound",
            Self::UnknownRule(_) => "UnknownRule",
            Self::DuplicateRule(_) => "DuplicateRule",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::CircularReference(_) => "CircularReference",
            Self::DepthExceeded { .. } => "DepthExceeded",
            Self::NoTargetRule => "NoTargetRule",
            Self::Io { .. } => "Io",
            Self::JsonError(_) => "JsonError",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
