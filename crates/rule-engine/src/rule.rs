//! 规则定义
//!
//! [`RuleDefinition`] 是规则的线上格式，[`Rule`] 是校验并改写后的内存模型。

use crate::condition::{Clause, Condition, ConditionSpec};
use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 规则触发的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 缺省为空串，由 [`Rule::new`] 统一报告缺少成功事件
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// 决策列表中的一项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub name: String,
    pub event: Event,
    pub conditions: ConditionSpec,
}

/// 规则的线上格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub failure_event: Option<Event>,
    #[serde(default)]
    pub conditions: Option<ConditionSpec>,
    #[serde(default)]
    pub decisions: Option<Vec<Decision>>,
}

/// 规则
///
/// 条件树构造后不可变；每次求值的失败轨迹由执行器作为返回值产生。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    name: String,
    conditions: Condition,
    event: Event,
    failure_event: Event,
}

impl Rule {
    /// 创建规则，成功事件类型不能为空
    pub fn new(name: impl Into<String>, conditions: Condition, event: Event) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RuleError::InvalidRuleDefinition(
                "规则名称不能为空".to_string(),
            ));
        }
        if event.event_type.is_empty() {
            return Err(RuleError::InvalidRuleDefinition(format!(
                "规则 '{}' 缺少成功事件",
                name
            )));
        }

        let failure_event = Event::new(name.clone());
        Ok(Self {
            name,
            conditions,
            event,
            failure_event,
        })
    }

    pub fn with_failure_event(mut self, failure_event: Event) -> Self {
        self.failure_event = failure_event;
        self
    }

    /// 从 JSON 字符串解析规则
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: RuleDefinition = serde_json::from_str(json)?;
        Self::try_from(definition)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 根条件节点（决策列表已改写为 `Any`）
    pub fn conditions(&self) -> &Condition {
        &self.conditions
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn failure_event(&self) -> &Event {
        &self.failure_event
    }

    /// 将决策列表改写为 `Any`，每个决策成为带自身事件的子句
    fn decisions_to_any(decisions: Vec<Decision>) -> Result<Condition> {
        let clauses = decisions
            .into_iter()
            .map(|decision| {
                Ok(Clause::new(Condition::try_from(decision.conditions)?)
                    .with_name(decision.name)
                    .with_event(decision.event))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Condition::Any(clauses))
    }
}

impl TryFrom<RuleDefinition> for Rule {
    type Error = RuleError;

    fn try_from(definition: RuleDefinition) -> Result<Self> {
        let name = definition.name.unwrap_or_default();

        let conditions = match (definition.conditions, definition.decisions) {
            (Some(conditions), None) if conditions.is_empty() => {
                return Err(RuleError::InvalidRuleDefinition(format!(
                    "规则 '{}' 的 conditions 为空",
                    name
                )));
            }
            (Some(conditions), None) => Condition::try_from(conditions)?,
            (None, Some(decisions)) if !decisions.is_empty() => Self::decisions_to_any(decisions)?,
            (None, _) => {
                return Err(RuleError::InvalidRuleDefinition(format!(
                    "规则 '{}' 必须包含 conditions 或 decisions",
                    name
                )));
            }
            (Some(_), Some(_)) => {
                return Err(RuleError::InvalidRuleDefinition(format!(
                    "规则 '{}' 不能同时包含 conditions 和 decisions",
                    name
                )));
            }
        };

        let event = definition.event.ok_or_else(|| {
            RuleError::InvalidRuleDefinition(format!("规则 '{}' 缺少成功事件", name))
        })?;

        let rule = Self::new(name, conditions, event)?;
        Ok(match definition.failure_event {
            Some(failure_event) => rule.with_failure_event(failure_event),
            None => rule,
        })
    }
}
