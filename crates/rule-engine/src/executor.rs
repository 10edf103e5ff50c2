//! 规则执行器
//!
//! 递归遍历条件树，实现从左到右的短路求值。每次执行都返回一份新的
//! [`RuleEvaluation`]，失败轨迹不保存在规则上，同一规则可被并发评估。

use crate::condition::{Clause, Condition, Leaf};
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::facts::Facts;
use crate::registry::RuleRegistry;
use crate::rule::{Event, Rule};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// 默认的规则引用最大深度
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// 单条规则的评估结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub rule: String,
    pub verdict: bool,
    /// 触发的事件模板：成功时为命中分支的覆盖事件或规则默认事件，失败时为失败事件
    pub event: Event,
    /// 导致失败的子条件，按记录顺序
    pub failed_conditions: Vec<Clause>,
    /// 本规则直接引用并评估过的规则
    pub dependencies: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_ms: i64,
}

/// 规则执行器
pub struct RuleExecutor<'a> {
    registry: &'a RuleRegistry,
    facts: &'a Facts,
    max_depth: usize,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl<'a> RuleExecutor<'a> {
    pub fn new(registry: &'a RuleRegistry, facts: &'a Facts) -> Self {
        Self {
            registry,
            facts,
            max_depth: DEFAULT_MAX_DEPTH,
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 执行规则评估
    pub fn execute(&self, rule: &Rule) -> Result<RuleEvaluation> {
        let start = Instant::now();
        let mut context = ExecutionContext::default();

        let mut evaluation = self.evaluate_rule(rule, &mut context)?;

        evaluation.evaluation_trace = context.trace;
        evaluation.evaluation_time_ms = start.elapsed().as_millis() as i64;

        debug!(
            rule = %rule.name(),
            verdict = evaluation.verdict,
            failed = evaluation.failed_conditions.len(),
            "规则评估完成"
        );

        Ok(evaluation)
    }

    /// 按名称执行规则评估
    pub fn execute_by_name(&self, name: &str) -> Result<RuleEvaluation> {
        self.execute(self.registry.get(name)?)
    }

    /// 评估一条规则（目标规则或被引用的依赖规则），各自持有独立的失败轨迹
    fn evaluate_rule(&self, rule: &Rule, context: &mut ExecutionContext) -> Result<RuleEvaluation> {
        context.enter(rule.name(), self.max_depth)?;

        let mut scratch = Scratch::default();
        let verdict = self.evaluate_node(rule.conditions(), context, &mut scratch, rule.name());

        context.leave();
        let verdict = verdict?;

        let event = if verdict {
            scratch
                .event_override
                .unwrap_or_else(|| rule.event().clone())
        } else {
            rule.failure_event().clone()
        };

        Ok(RuleEvaluation {
            rule: rule.name().to_string(),
            verdict,
            event,
            failed_conditions: scratch.failed,
            dependencies: scratch.dependencies,
            evaluation_trace: Vec::new(),
            evaluation_time_ms: 0,
        })
    }

    /// 递归评估条件节点
    fn evaluate_node(
        &self,
        node: &Condition,
        context: &mut ExecutionContext,
        scratch: &mut Scratch,
        path: &str,
    ) -> Result<bool> {
        match node {
            Condition::All(children) => self.evaluate_all(children, context, scratch, path),
            Condition::Any(children) => self.evaluate_any(children, context, scratch, path),
            Condition::Not(child) => {
                let child_path = format!("{}.not", path);
                let matched = !self.evaluate_node(child, context, scratch, &child_path)?;
                if self.trace_enabled {
                    context.trace.push(format!("{}: NOT => {}", path, outcome(matched)));
                }
                Ok(matched)
            }
            Condition::RuleRef(name) => self.evaluate_rule_ref(name, context, scratch, path),
            Condition::Leaf(leaf) => self.evaluate_leaf(leaf, context, path),
        }
    }

    /// 合取：遇到 false 立即返回，并记录该子节点
    fn evaluate_all(
        &self,
        children: &[Clause],
        context: &mut ExecutionContext,
        scratch: &mut Scratch,
        path: &str,
    ) -> Result<bool> {
        for (i, child) in children.iter().enumerate() {
            let child_path = format!("{}.all[{}]", path, i);
            if !self.evaluate_node(&child.condition, context, scratch, &child_path)? {
                if self.trace_enabled {
                    context
                        .trace
                        .push(format!("{}: ALL 短路 - 子节点 {} 不匹配", path, i));
                }
                scratch.failed.push(child.clone());
                return Ok(false);
            }
        }

        // 全部满足时，最后一个子节点携带的事件成为成功事件
        if let Some(event) = children.last().and_then(|c| c.event.as_ref()) {
            scratch.event_override = Some(event.clone());
        }

        if self.trace_enabled {
            context.trace.push(format!("{}: ALL 组全部匹配", path));
        }
        Ok(true)
    }

    /// 析取：遇到 true 立即返回；之前每个为 false 的子节点都被记录
    fn evaluate_any(
        &self,
        children: &[Clause],
        context: &mut ExecutionContext,
        scratch: &mut Scratch,
        path: &str,
    ) -> Result<bool> {
        for (i, child) in children.iter().enumerate() {
            let child_path = format!("{}.any[{}]", path, i);
            if self.evaluate_node(&child.condition, context, scratch, &child_path)? {
                if let Some(event) = &child.event {
                    scratch.event_override = Some(event.clone());
                }
                if self.trace_enabled {
                    context
                        .trace
                        .push(format!("{}: ANY 短路 - 子节点 {} 匹配", path, i));
                }
                return Ok(true);
            }
            scratch.failed.push(child.clone());
        }

        if self.trace_enabled {
            context.trace.push(format!("{}: ANY 组无匹配", path));
        }
        Ok(false)
    }

    fn evaluate_rule_ref(
        &self,
        name: &str,
        context: &mut ExecutionContext,
        scratch: &mut Scratch,
        path: &str,
    ) -> Result<bool> {
        let dependency = self
            .registry
            .get(name)
            .map_err(|_| RuleError::UnknownRule(name.to_string()))?;

        if !scratch.dependencies.iter().any(|d| d == name) {
            scratch.dependencies.push(name.to_string());
        }

        let matched = self.evaluate_rule(dependency, context)?.verdict;

        if self.trace_enabled {
            context
                .trace
                .push(format!("{}: 规则 {} => {}", path, name, outcome(matched)));
        }
        Ok(matched)
    }

    fn evaluate_leaf(&self, leaf: &Leaf, context: &mut ExecutionContext, path: &str) -> Result<bool> {
        let operator = leaf.operator()?;
        let fact_value = self.facts.get(&leaf.fact, leaf.path.as_deref())?;

        let matched = ConditionEvaluator::evaluate(fact_value, operator, &leaf.value)?;

        if self.trace_enabled {
            context.trace.push(format!(
                "{}: {}{} {} {} => {}",
                path,
                leaf.fact,
                leaf.path.as_deref().map(|p| format!("[{}]", p)).unwrap_or_default(),
                operator,
                leaf.value,
                outcome(matched)
            ));
        }

        Ok(matched)
    }
}

fn outcome(matched: bool) -> &'static str {
    if matched { "MATCHED" } else { "NOT_MATCHED" }
}

/// 单条规则评估期间的临时状态
#[derive(Default)]
struct Scratch {
    failed: Vec<Clause>,
    event_override: Option<Event>,
    dependencies: Vec<String>,
}

/// 一次执行的上下文：规则引用栈（循环检测、深度限制）和追踪
#[derive(Default)]
struct ExecutionContext {
    stack: Vec<String>,
    trace: Vec<String>,
}

impl ExecutionContext {
    /// 进入一条规则
    fn enter(&mut self, name: &str, max_depth: usize) -> Result<()> {
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(name.to_string());
            return Err(RuleError::CircularReference(chain));
        }

        if self.stack.len() >= max_depth {
            return Err(RuleError::DepthExceeded {
                depth: self.stack.len() + 1,
                max: max_depth,
            });
        }

        self.stack.push(name.to_string());
        Ok(())
    }

    /// 离开当前规则
    fn leave(&mut self) {
        self.stack.pop();
    }
}
