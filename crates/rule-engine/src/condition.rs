//! 条件树模型
//!
//! 条件节点是一个封闭的和类型：`All` / `Any` / `Not` / `RuleRef` / `Leaf`。
//! 线上（JSON）格式由 [`ConditionSpec`] 表示，两者通过 serde 的
//! `try_from` / `into` 相互转换，构造时即完成结构校验。

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use crate::rule::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 条件节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionSpec", into = "ConditionSpec")]
pub enum Condition {
    /// 合取，从左到右短路求值
    All(Vec<Clause>),
    /// 析取，从左到右短路求值
    Any(Vec<Clause>),
    /// 取反，子节点只能是叶子条件或规则引用
    Not(Box<Condition>),
    /// 引用另一条已注册的规则
    RuleRef(String),
    Leaf(Leaf),
}

impl Condition {
    pub fn all(children: Vec<Condition>) -> Self {
        Self::All(children.into_iter().map(Clause::from).collect())
    }

    pub fn any(children: Vec<Condition>) -> Self {
        Self::Any(children.into_iter().map(Clause::from).collect())
    }

    /// 构造取反节点
    ///
    /// 子节点为 `All` / `Any` / `Not` 时返回 [`RuleError::InvalidCondition`]。
    pub fn not(child: Condition) -> Result<Self> {
        match child {
            Self::Leaf(_) | Self::RuleRef(_) => Ok(Self::Not(Box::new(child))),
            _ => Err(RuleError::InvalidCondition(
                "not 的子节点必须是叶子条件或规则引用".to_string(),
            )),
        }
    }

    pub fn rule_ref(name: impl Into<String>) -> Self {
        Self::RuleRef(name.into())
    }

    /// 条件树中直接引用的所有规则名称（按出现顺序，可能重复）
    pub fn rule_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_rule_refs(&mut refs);
        refs
    }

    fn collect_rule_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.condition.collect_rule_refs(refs);
                }
            }
            Self::Not(child) => child.collect_rule_refs(refs),
            Self::RuleRef(name) => refs.push(name),
            Self::Leaf(_) => {}
        }
    }
}

impl From<Leaf> for Condition {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

/// `All` / `Any` 的子节点
///
/// 除条件本身外还可携带名称和成功事件覆盖（决策列表改写后每个决策即一个 Clause）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionSpec", into = "ConditionSpec")]
pub struct Clause {
    pub name: Option<String>,
    pub event: Option<Event>,
    pub condition: Condition,
}

impl Clause {
    pub fn new(condition: Condition) -> Self {
        Self {
            name: None,
            event: None,
            condition,
        }
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<Condition> for Clause {
    fn from(condition: Condition) -> Self {
        Self::new(condition)
    }
}

/// 叶子比较条件
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub fact: String,
    pub path: Option<String>,
    /// 原始操作符名称，求值或解释时才解析，未知操作符在那时报错
    pub operator: String,
    pub value: Value,
}

impl Leaf {
    pub fn new(
        fact: impl Into<String>,
        operator: impl fmt::Display,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let fact = fact.into();
        let operator = operator.to_string();

        if fact.is_empty() || operator.is_empty() {
            return Err(RuleError::InvalidCondition(
                "叶子条件必须包含 fact 和 operator".to_string(),
            ));
        }

        Ok(Self {
            fact,
            path: None,
            operator,
            value: value.into(),
        })
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 解析操作符
    pub fn operator(&self) -> Result<Operator> {
        self.operator.parse()
    }

    /// 解释时显示的名称：路径的最后一段，没有路径时为事实名
    pub fn display_name(&self) -> &str {
        match &self.path {
            Some(path) => path.rsplit('.').next().unwrap_or(path),
            None => &self.fact,
        }
    }
}

/// 条件节点的线上格式
///
/// ```json
/// { "all": [...] } | { "any": [...] } | { "not": {...} }
/// | { "condition": "ruleName" }
/// | { "fact": "...", "operator": "...", "value": ..., "path": "$.a.b" }
/// ```
///
/// `All` / `Any` 的子节点可额外携带 `name` 和 `event`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<ConditionSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<ConditionSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<ConditionSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

impl ConditionSpec {
    fn is_leaf(&self) -> bool {
        self.fact.is_some() || self.operator.is_some() || self.path.is_some() || self.value.is_some()
    }

    /// 不含任何结构键的空节点 `{}`
    pub(crate) fn is_empty(&self) -> bool {
        self.shape_count() == 0
    }

    /// 节点包含的结构键数量，合法节点恰好为 1
    fn shape_count(&self) -> usize {
        [
            self.all.is_some(),
            self.any.is_some(),
            self.not.is_some(),
            self.condition.is_some(),
            self.is_leaf(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

impl TryFrom<ConditionSpec> for Condition {
    type Error = RuleError;

    fn try_from(spec: ConditionSpec) -> Result<Self> {
        match spec.shape_count() {
            0 => {
                return Err(RuleError::InvalidCondition(
                    "条件节点缺少 all / any / not / condition / fact".to_string(),
                ));
            }
            1 => {}
            _ => {
                return Err(RuleError::InvalidCondition(
                    "条件节点只能包含 all / any / not / condition / 叶子条件中的一种".to_string(),
                ));
            }
        }

        if let Some(children) = spec.all {
            return Ok(Self::All(clauses_from_specs(children)?));
        }
        if let Some(children) = spec.any {
            return Ok(Self::Any(clauses_from_specs(children)?));
        }
        if let Some(child) = spec.not {
            return Self::not(Self::try_from(*child)?);
        }
        if let Some(name) = spec.condition {
            if name.is_empty() {
                return Err(RuleError::InvalidCondition(
                    "condition 引用的规则名称不能为空".to_string(),
                ));
            }
            return Ok(Self::RuleRef(name));
        }

        let (Some(fact), Some(operator)) = (spec.fact, spec.operator) else {
            return Err(RuleError::InvalidCondition(
                "叶子条件必须包含 fact 和 operator".to_string(),
            ));
        };

        let mut leaf = Leaf::new(fact, operator, spec.value.unwrap_or(Value::Null))?;
        leaf.path = spec.path;
        Ok(Self::Leaf(leaf))
    }
}

fn clauses_from_specs(specs: Vec<ConditionSpec>) -> Result<Vec<Clause>> {
    specs.into_iter().map(Clause::try_from).collect()
}

impl TryFrom<ConditionSpec> for Clause {
    type Error = RuleError;

    fn try_from(mut spec: ConditionSpec) -> Result<Self> {
        let name = spec.name.take();
        let event = spec.event.take();
        Ok(Self {
            name,
            event,
            condition: Condition::try_from(spec)?,
        })
    }
}

impl From<Condition> for ConditionSpec {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::All(children) => Self {
                all: Some(children.into_iter().map(Self::from).collect()),
                ..Default::default()
            },
            Condition::Any(children) => Self {
                any: Some(children.into_iter().map(Self::from).collect()),
                ..Default::default()
            },
            Condition::Not(child) => Self {
                not: Some(Box::new(Self::from(*child))),
                ..Default::default()
            },
            Condition::RuleRef(name) => Self {
                condition: Some(name),
                ..Default::default()
            },
            Condition::Leaf(leaf) => Self {
                fact: Some(leaf.fact),
                path: leaf.path,
                operator: Some(leaf.operator),
                value: Some(leaf.value),
                ..Default::default()
            },
        }
    }
}

impl From<Clause> for ConditionSpec {
    fn from(clause: Clause) -> Self {
        Self {
            name: clause.name,
            event: clause.event,
            ..Self::from(clause.condition)
        }
    }
}
