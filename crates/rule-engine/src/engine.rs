//! 规则引擎编排
//!
//! 持有规则注册表与事实存储，选择目标规则，调用执行器与解释器，
//! 并把结果组装为对外的事件载荷。

use crate::condition::Clause;
use crate::error::{Result, RuleError};
use crate::executor::{DEFAULT_MAX_DEPTH, RuleEvaluation, RuleExecutor};
use crate::facts::Facts;
use crate::interpreter::RuleInterpreter;
use crate::registry::RuleRegistry;
use crate::rule::Rule;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

/// 输出选项
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 目标规则结果中附带规则解释
    pub include_interpretation: bool,
    /// 目标规则失败时附带失败条件
    pub include_failed_conditions: bool,
    /// 事件载荷中附带完整的事实快照
    pub include_facts: bool,
    /// 规则引用的最大深度
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            include_interpretation: true,
            include_failed_conditions: true,
            include_facts: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// 单条规则的对外结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    #[serde(rename = "type")]
    pub event_type: String,
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_conditions: Option<Vec<Clause>>,
    #[serde(skip)]
    pub rule: String,
    #[serde(skip)]
    pub matched: bool,
    #[serde(skip)]
    pub evaluation_time_ms: i64,
}

/// 规则引擎
#[derive(Debug, Clone, Default)]
pub struct Engine {
    registry: RuleRegistry,
    facts: Facts,
    target_rule: Option<String>,
    options: EngineOptions,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EngineOptions {
        &mut self.options
    }

    /// 注册规则
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        self.registry.register(rule).map(|_| ())
    }

    /// 添加或覆盖事实
    pub fn add_fact(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.facts.add(name, value);
    }

    /// 批量替换事实
    pub fn set_facts(&mut self, facts: Facts) {
        self.facts = facts;
    }

    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// 设置目标规则，规则不存在时返回 [`RuleError::RuleNotFound`]
    pub fn set_target_rule(&mut self, name: &str) -> Result<()> {
        self.registry.get(name)?;
        self.target_rule = Some(name.to_string());
        Ok(())
    }

    pub fn target_rule(&self) -> Option<&str> {
        self.target_rule.as_deref()
    }

    /// 按注册顺序评估所有规则，只返回事件载荷
    #[instrument(skip(self), fields(rules = self.registry.len()))]
    pub fn run(&self) -> Result<Vec<RuleOutcome>> {
        let executor = self.executor();

        let outcomes = self
            .registry
            .iter()
            .map(|rule| {
                let evaluation = executor.execute(rule)?;
                Ok(self.outcome(evaluation))
            })
            .collect::<Result<Vec<_>>>()?;

        let matched = outcomes.iter().filter(|o| o.matched).count();
        info!(matched, total = outcomes.len(), "规则批量评估完成");
        Ok(outcomes)
    }

    /// 评估目标规则，按选项附带解释和失败条件
    #[instrument(skip(self), fields(target = ?self.target_rule))]
    pub fn evaluate(&self) -> Result<RuleOutcome> {
        let name = self.target_rule.as_deref().ok_or(RuleError::NoTargetRule)?;
        let rule = self.registry.get(name)?;

        let evaluation = self.executor().execute(rule)?;
        let include_failures = self.options.include_failed_conditions && !evaluation.verdict;
        let failed_conditions = evaluation.failed_conditions.clone();

        let mut outcome = self.outcome(evaluation);

        if self.options.include_interpretation {
            outcome.interpretation = Some(RuleInterpreter::interpret(rule.conditions())?);
        }
        if include_failures {
            outcome.failed_conditions = Some(failed_conditions);
        }

        info!(
            rule = %name,
            matched = outcome.matched,
            elapsed_ms = outcome.evaluation_time_ms,
            "目标规则评估完成"
        );
        Ok(outcome)
    }

    /// 评估目标规则并返回完整的评估结果（含失败轨迹与依赖）
    pub fn evaluate_detailed(&self) -> Result<RuleEvaluation> {
        let name = self.target_rule.as_deref().ok_or(RuleError::NoTargetRule)?;
        self.executor().execute_by_name(name)
    }

    /// 目标规则的解释文本
    pub fn interpret(&self) -> Result<String> {
        let name = self.target_rule.as_deref().ok_or(RuleError::NoTargetRule)?;
        RuleInterpreter::interpret(self.registry.get(name)?.conditions())
    }

    fn executor(&self) -> RuleExecutor<'_> {
        RuleExecutor::new(&self.registry, &self.facts).with_max_depth(self.options.max_depth)
    }

    fn outcome(&self, evaluation: RuleEvaluation) -> RuleOutcome {
        RuleOutcome {
            event_type: evaluation.event.event_type,
            params: evaluation.event.params,
            facts: self.options.include_facts.then(|| self.facts.snapshot()),
            interpretation: None,
            failed_conditions: None,
            rule: evaluation.rule,
            matched: evaluation.verdict,
            evaluation_time_ms: evaluation.evaluation_time_ms,
        }
    }
}
