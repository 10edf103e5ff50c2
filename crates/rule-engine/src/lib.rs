//! 声明式规则引擎
//!
//! 以结构化数据描述业务规则并在运行时针对事实求值，支持：
//! - `all` / `any` / `not` / 叶子条件 / 规则引用 组成的条件树
//! - 事实的嵌套路径访问
//! - 短路求值与失败条件追踪
//! - 规则到可读布尔表达式的解释

pub mod condition;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod facts;
pub mod interpreter;
pub mod loader;
pub mod operators;
pub mod registry;
pub mod rule;

pub use condition::{Clause, Condition, ConditionSpec, Leaf};
pub use engine::{Engine, EngineOptions, RuleOutcome};
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use executor::{DEFAULT_MAX_DEPTH, RuleEvaluation, RuleExecutor};
pub use facts::Facts;
pub use interpreter::RuleInterpreter;
pub use loader::{RuleLoader, load_facts};
pub use operators::Operator;
pub use registry::{RuleId, RuleRegistry};
pub use rule::{Decision, Event, Rule, RuleDefinition};
