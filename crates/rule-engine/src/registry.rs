//! 规则注册表
//!
//! 规则按值存放在一个数组中，名称到下标的索引用于规则引用查找。
//! 规则之间只通过名称相互引用，不持有彼此。

use crate::error::{Result, RuleError};
use crate::rule::Rule;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 注册表中规则的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册规则，名称重复时返回 [`RuleError::DuplicateRule`]
    pub fn register(&mut self, rule: Rule) -> Result<RuleId> {
        if self.index.contains_key(rule.name()) {
            warn!(rule = %rule.name(), "规则名称重复");
            return Err(RuleError::DuplicateRule(rule.name().to_string()));
        }

        let id = RuleId(self.rules.len());
        self.index.insert(rule.name().to_string(), id);
        debug!(rule = %rule.name(), index = id.0, "规则已注册");
        self.rules.push(rule);
        Ok(id)
    }

    /// 按名称获取规则
    pub fn get(&self, name: &str) -> Result<&Rule> {
        self.id_of(name)
            .map(|id| &self.rules[id.0])
            .ok_or_else(|| RuleError::RuleNotFound(name.to_string()))
    }

    pub fn get_by_id(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 校验规则引用图
    ///
    /// 所有 `condition` 引用都必须能解析（否则 [`RuleError::UnknownRule`]），
    /// 且引用图无环（否则 [`RuleError::CircularReference`]，携带环路上的规则名）。
    pub fn validate_references(&self) -> Result<()> {
        let mut states = vec![VisitState::Unvisited; self.rules.len()];
        let mut path = Vec::new();

        for index in 0..self.rules.len() {
            self.visit(RuleId(index), &mut states, &mut path)?;
        }

        Ok(())
    }

    fn visit(
        &self,
        id: RuleId,
        states: &mut [VisitState],
        path: &mut Vec<RuleId>,
    ) -> Result<()> {
        match states[id.0] {
            VisitState::Done => return Ok(()),
            VisitState::InProgress => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let mut chain: Vec<String> = path[start..]
                    .iter()
                    .map(|p| self.rules[p.0].name().to_string())
                    .collect();
                chain.push(self.rules[id.0].name().to_string());
                return Err(RuleError::CircularReference(chain));
            }
            VisitState::Unvisited => {}
        }

        states[id.0] = VisitState::InProgress;
        path.push(id);

        for name in self.rules[id.0].conditions().rule_refs() {
            let dependency = self
                .id_of(name)
                .ok_or_else(|| RuleError::UnknownRule(name.to_string()))?;
            self.visit(dependency, states, path)?;
        }

        path.pop();
        states[id.0] = VisitState::Done;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}
