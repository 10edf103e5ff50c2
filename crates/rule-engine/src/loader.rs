//! 规则加载器
//!
//! 从 JSON 文件或目录加载规则定义与事实。

use crate::error::{Result, RuleError};
use crate::facts::Facts;
use crate::rule::{Rule, RuleDefinition};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 规则加载器
pub struct RuleLoader;

impl RuleLoader {
    /// 从文件或目录加载规则
    ///
    /// 目录下的所有 `*.json` 文件按文件名排序依次加载。
    #[instrument]
    pub fn load_path(path: &Path) -> Result<Vec<Rule>> {
        let metadata = fs::metadata(path).map_err(|source| io_error(path, source))?;

        let rules = if metadata.is_dir() {
            let mut rules = Vec::new();
            for file in Self::json_files(path)? {
                rules.extend(Self::load_file(&file)?);
            }
            rules
        } else {
            Self::load_file(path)?
        };

        info!(count = rules.len(), "规则加载完成");
        Ok(rules)
    }

    /// 从单个 JSON 文件加载规则
    pub fn load_file(path: &Path) -> Result<Vec<Rule>> {
        let content = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        let rules = Self::parse(&content)?;
        debug!(path = %path.display(), count = rules.len(), "规则文件已解析");
        Ok(rules)
    }

    /// 解析 JSON 文本（单条规则或规则数组）
    ///
    /// 按首个非空白字符选择形态直接反序列化，保留 serde 的字段级错误信息。
    pub fn parse(json: &str) -> Result<Vec<Rule>> {
        let definitions = if json.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<RuleDefinition>>(json)?
        } else {
            vec![serde_json::from_str::<RuleDefinition>(json)?]
        };

        definitions.into_iter().map(Rule::try_from).collect()
    }

    fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|source| io_error(dir, source))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| io_error(dir, source))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// 从 JSON 文件加载事实，文件内容必须是对象
#[instrument]
pub fn load_facts(path: &Path) -> Result<Facts> {
    let content = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let facts = Facts::from_value(serde_json::from_str(&content)?)?;
    debug!(count = facts.len(), "事实加载完成");
    Ok(facts)
}

fn io_error(path: &Path, source: std::io::Error) -> RuleError {
    RuleError::Io {
        path: path.to_path_buf(),
        source,
    }
}
