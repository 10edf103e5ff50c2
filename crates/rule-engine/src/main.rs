//! 规则引擎命令行宿主
//!
//! 从配置加载规则和事实，评估目标规则（未配置时评估所有规则），
//! 以 JSON 输出结果。目标规则不成立时以状态码 1 退出。

use anyhow::{Context, Result};
use engine_shared::config::AppConfig;
use engine_shared::observability;
use rule_engine::{Engine, EngineOptions, RuleLoader, load_facts};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %format!("{:#}", e), "规则评估失败");
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    // 统一加载配置：从 config/{service_name}.toml 加载，包含可观测性配置
    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    observability::init(&config.observability)?;

    let engine_config = &config.engine;
    let mut engine = Engine::with_options(EngineOptions {
        include_interpretation: engine_config.include_interpretation,
        include_failed_conditions: engine_config.include_failed_conditions,
        include_facts: engine_config.include_facts,
        max_depth: engine_config.max_depth,
    });

    let rules = RuleLoader::load_path(&engine_config.rules_path).with_context(|| {
        format!(
            "failed to load rules from {}",
            engine_config.rules_path.display()
        )
    })?;
    for rule in rules {
        engine.add_rule(rule)?;
    }
    engine.registry().validate_references()?;

    if let Some(facts_path) = &engine_config.facts_path {
        engine.set_facts(load_facts(facts_path)?);
    }

    info!(
        rules = engine.registry().len(),
        facts = engine.facts().len(),
        "Rule engine initialized"
    );

    match &engine_config.target_rule {
        Some(target) => {
            engine.set_target_rule(target)?;
            let outcome = engine.evaluate()?;
            println!("{}", serde_json::to_string_pretty(&[&outcome])?);
            Ok(outcome.matched)
        }
        None => {
            let outcomes = engine.run()?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            Ok(true)
        }
    }
}
