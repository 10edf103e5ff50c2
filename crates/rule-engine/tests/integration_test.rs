//! 规则引擎集成测试
//!
//! 测试完整的规则加载、注册、评估、解释工作流。

use pretty_assertions::assert_eq;
use rule_engine::{
    Clause, Condition, Engine, EngineOptions, Event, Facts, Leaf, Operator, Rule, RuleError,
    RuleExecutor, RuleInterpreter, RuleLoader, RuleRegistry, load_facts,
};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

fn data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn load_rule(name: &str) -> Rule {
    let mut rules = RuleLoader::load_file(&data_path(name)).unwrap();
    assert_eq!(rules.len(), 1);
    rules.remove(0)
}

fn profile_rules() -> Vec<Rule> {
    RuleLoader::parse(
        r#"[
        {
            "name": "profile.isActive",
            "conditions": {
                "all": [
                    {"not": {"fact": "profile", "path": "$.isDeleted", "value": true, "operator": "equal"}},
                    {"not": {"fact": "profile", "path": "$.isDeactivated", "value": true, "operator": "equal"}},
                    {"not": {"fact": "profile", "path": "$.isSuspended", "value": true, "operator": "equal"}}
                ]
            },
            "event": {
                "type": "profile.isActive",
                "params": {"isActive": true, "message": "Profile is in active state"}
            },
            "failureEvent": {
                "type": "profile.isActive",
                "params": {"isActive": false, "message": "Profile is not in active state"}
            }
        },
        {
            "name": "profile.isSearchable",
            "conditions": {
                "any": [
                    {"condition": "profile.isActive"},
                    {
                        "not": {"fact": "profile", "path": "$.isHidden", "value": true, "operator": "equal"},
                        "event": {"type": "profile.visible", "params": {"isSearchable": true}}
                    }
                ]
            },
            "event": {
                "type": "profile.isSearchable",
                "params": {"isSearchable": true, "message": "Profile is searchable"}
            },
            "failureEvent": {
                "type": "profile.isSearchable",
                "params": {"isSearchable": false, "message": "Profile is not searchable"}
            }
        }
    ]"#,
    )
    .unwrap()
}

// ==================== 原始场景 ====================

#[test]
fn test_player_is_fouled_out() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.player.isFouledOut.json"))
        .unwrap();
    engine.add_fact("personalFoulCount", 6);
    engine.add_fact("gameDuration", 40);
    engine.set_target_rule("rule.player.isFouledOut").unwrap();

    let outcome = engine.evaluate().unwrap();

    assert!(outcome.matched);
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "type": "fouledOut",
            "params": {"message": "Player has fouled out!"},
            "facts": {"personalFoulCount": 6, "gameDuration": 40},
            "interpretation": "((gameDuration is equal to 40 AND personalFoulCount is >= 5) OR (gameDuration is equal to 48 AND NOT (personalFoulCount is less than 6)))"
        })
    );
}

#[test]
fn test_profile_is_completed() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.profile.isCompleted.json"))
        .unwrap();
    engine.add_fact(
        "profile",
        json!({
            "attributes": {
                "username": null,
                "birthdayYear": 1990,
                "profilePic": "https://example.com/profile.jpg",
                "primaryLocation": "New York"
            }
        }),
    );
    engine.set_target_rule("rule.profile.isCompleted").unwrap();

    let outcome = engine.evaluate().unwrap();

    assert!(!outcome.matched);
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "type": "rule.profile.isCompleted",
            "params": {"value": false, "message": "Profile is not completed"},
            "facts": {
                "profile": {
                    "attributes": {
                        "username": null,
                        "birthdayYear": 1990,
                        "profilePic": "https://example.com/profile.jpg",
                        "primaryLocation": "New York"
                    }
                }
            },
            "interpretation": "(NOT (username is equal to NULL) AND NOT (birthdayYear is equal to NULL) AND NOT (profilePic is equal to NULL) AND NOT (primaryLocation is equal to NULL))",
            "failedConditions": [
                {
                    "not": {
                        "fact": "profile",
                        "path": "$.attributes.username",
                        "value": null,
                        "operator": "equal"
                    }
                }
            ]
        })
    );
}

#[test]
fn test_profile_is_searchable() {
    let mut engine = Engine::new();
    for rule in profile_rules() {
        engine.add_rule(rule).unwrap();
    }
    engine.add_fact(
        "profile",
        json!({
            "isDeleted": false,
            "isDeactivated": false,
            "isSuspended": false,
            "isHidden": false
        }),
    );
    engine.registry().validate_references().unwrap();
    engine.set_target_rule("profile.isSearchable").unwrap();

    let outcome = engine.evaluate().unwrap();

    // 第一个分支即命中，第二个分支的覆盖事件不会生效。
    // 布尔值按字面渲染为 true/false，而不是 1/空串
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "type": "profile.isSearchable",
            "params": {"isSearchable": true, "message": "Profile is searchable"},
            "facts": {
                "profile": {
                    "isDeleted": false,
                    "isDeactivated": false,
                    "isSuspended": false,
                    "isHidden": false
                }
            },
            "interpretation": "(profile.isActive OR NOT (isHidden is equal to true))"
        })
    );

    let detailed = engine.evaluate_detailed().unwrap();
    assert_eq!(detailed.dependencies, vec!["profile.isActive".to_string()]);
    assert!(detailed.failed_conditions.is_empty());
}

#[test]
fn test_profile_searchable_via_second_branch_override() {
    let mut engine = Engine::new();
    for rule in profile_rules() {
        engine.add_rule(rule).unwrap();
    }
    engine.add_fact(
        "profile",
        json!({
            "isDeleted": true,
            "isDeactivated": false,
            "isSuspended": false,
            "isHidden": false
        }),
    );
    engine.set_target_rule("profile.isSearchable").unwrap();

    let detailed = engine.evaluate_detailed().unwrap();
    assert!(detailed.verdict);
    assert_eq!(detailed.event.event_type, "profile.visible");
    assert_eq!(
        detailed.failed_conditions,
        vec![Clause::new(Condition::rule_ref("profile.isActive"))]
    );

    let outcome = engine.evaluate().unwrap();
    assert_eq!(outcome.event_type, "profile.visible");
    assert!(outcome.failed_conditions.is_none());
}

#[test]
fn test_decision_list_fires_matching_decision_event() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.player.fouls.decisions.json"))
        .unwrap();
    engine.add_fact("personalFoulCount", 6);
    engine.add_fact("gameDuration", 48);
    engine.set_target_rule("rule.player.fouls").unwrap();

    let outcome = engine.evaluate().unwrap();

    assert!(outcome.matched);
    assert_eq!(outcome.event_type, "fouledOut");
    assert_eq!(outcome.params.get("gameDuration"), Some(&json!(48)));
    assert_eq!(
        outcome.facts,
        Some(json!({"personalFoulCount": 6, "gameDuration": 48}))
    );
    assert_eq!(
        outcome.interpretation.as_deref(),
        Some(
            "((gameDuration is equal to 40 AND personalFoulCount is >= 5) OR \
             (gameDuration is equal to 48 AND personalFoulCount is >= 6))"
        )
    );
}

#[test]
fn test_decision_list_no_match() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.player.fouls.decisions.json"))
        .unwrap();
    engine.add_fact("personalFoulCount", 2);
    engine.add_fact("gameDuration", 48);
    engine.set_target_rule("rule.player.fouls").unwrap();

    let outcome = engine.evaluate().unwrap();
    assert!(!outcome.matched);
    assert_eq!(
        outcome.params.get("message"),
        Some(&json!("No foul decision matched"))
    );

    // 两个决策依次失败，失败条件携带决策名称和事件
    let failed = serde_json::to_value(outcome.failed_conditions.unwrap()).unwrap();
    let names: Vec<&Value> = failed
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c.get("name"))
        .collect();
    assert_eq!(names, vec![&json!("fouledOut40"), &json!("fouledOut48")]);
}

// ==================== 边界与错误 ====================

#[test]
fn test_interpretation_is_fact_independent() {
    let rule = load_rule("rule.player.isFouledOut.json");
    let registry = RuleRegistry::new();

    let facts_a = Facts::from_iter([("gameDuration", json!(40)), ("personalFoulCount", json!(6))]);
    let facts_b = Facts::from_iter([("gameDuration", json!(48)), ("personalFoulCount", json!(1))]);

    let verdict_a = RuleExecutor::new(&registry, &facts_a).execute(&rule).unwrap();
    let verdict_b = RuleExecutor::new(&registry, &facts_b).execute(&rule).unwrap();
    assert!(verdict_a.verdict);
    assert!(!verdict_b.verdict);

    let first = RuleInterpreter::interpret(rule.conditions()).unwrap();
    let second = RuleInterpreter::interpret(rule.conditions()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_not_of_false_leaf() {
    let condition = Condition::not(
        Leaf::new("personalFoulCount", Operator::LessThan, 6)
            .unwrap()
            .into(),
    )
    .unwrap();
    let rule = Rule::new("notLess", condition, Event::new("notLess")).unwrap();
    let registry = RuleRegistry::new();
    let facts = Facts::from_iter([("personalFoulCount", json!(6))]);

    assert!(RuleExecutor::new(&registry, &facts).execute(&rule).unwrap().verdict);
    assert_eq!(
        RuleInterpreter::interpret(rule.conditions()).unwrap(),
        "NOT (personalFoulCount is less than 6)"
    );
}

#[test]
fn test_rule_reference_cycle_is_reported() {
    let rules = RuleLoader::parse(
        r#"[
            {"name": "a", "event": {"type": "a"}, "conditions": {"all": [{"condition": "b"}]}},
            {"name": "b", "event": {"type": "b"}, "conditions": {"any": [{"condition": "a"}]}}
        ]"#,
    )
    .unwrap();

    let mut engine = Engine::new();
    for rule in rules {
        engine.add_rule(rule).unwrap();
    }

    assert!(matches!(
        engine.registry().validate_references(),
        Err(RuleError::CircularReference(_))
    ));

    engine.set_target_rule("a").unwrap();
    let err = engine.evaluate().unwrap_err();
    assert_eq!(err.kind(), "CircularReference");
}

#[test]
fn test_depth_option_applies_to_engine() {
    let rules = RuleLoader::parse(
        r#"[
            {"name": "a", "event": {"type": "a"}, "conditions": {"all": [{"condition": "b"}]}},
            {"name": "b", "event": {"type": "b"}, "conditions": {"all": [{"condition": "c"}]}},
            {"name": "c", "event": {"type": "c"}, "conditions": {"all": []}}
        ]"#,
    )
    .unwrap();

    let mut engine = Engine::with_options(EngineOptions {
        max_depth: 2,
        ..EngineOptions::default()
    });
    for rule in rules {
        engine.add_rule(rule).unwrap();
    }
    engine.set_target_rule("a").unwrap();

    assert!(matches!(
        engine.evaluate(),
        Err(RuleError::DepthExceeded { depth: 3, max: 2 })
    ));

    engine.options_mut().max_depth = 3;
    assert!(engine.evaluate().unwrap().matched);
}

#[test]
fn test_unknown_rule_reference_at_evaluation() {
    let rules = RuleLoader::parse(
        r#"{"name": "a", "event": {"type": "a"}, "conditions": {"any": [{"condition": "ghost"}]}}"#,
    )
    .unwrap();

    let mut engine = Engine::new();
    engine.add_rule(rules.into_iter().next().unwrap()).unwrap();
    engine.set_target_rule("a").unwrap();

    assert!(matches!(
        engine.evaluate(),
        Err(RuleError::UnknownRule(ref name)) if name == "ghost"
    ));
}

#[test]
fn test_malformed_path_aborts_evaluation() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.profile.isCompleted.json"))
        .unwrap();
    engine.add_fact("profile", json!({"attributes": {"birthdayYear": 1990}}));
    engine.set_target_rule("rule.profile.isCompleted").unwrap();

    let err = engine.evaluate().unwrap_err();
    assert_eq!(err.kind(), "PathNotFound");
}

#[test]
fn test_missing_top_level_fact_defaults_to_null() {
    let mut engine = Engine::new();
    engine
        .add_rule(load_rule("rule.profile.isCompleted.json"))
        .unwrap();
    engine.set_target_rule("rule.profile.isCompleted").unwrap();

    // profile 不存在 → 每个路径都解析为 null → 第一个 not 失败
    let outcome = engine.evaluate().unwrap();
    assert!(!outcome.matched);
    assert_eq!(outcome.failed_conditions.map(|f| f.len()), Some(1));
}

// ==================== 加载器 ====================

#[test]
fn test_load_rules_directory() {
    let rules = RuleLoader::load_path(&data_path("")).unwrap();
    let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        vec![
            "rule.player.fouls",
            "rule.player.isFouledOut",
            "rule.profile.isCompleted"
        ]
    );
}

#[test]
fn test_load_facts_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("facts.json");
    fs::write(&path, r#"{"personalFoulCount": 6, "gameDuration": 40}"#).unwrap();

    let facts = load_facts(&path).unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts.get("gameDuration", None).unwrap(), Some(&json!(40)));

    fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(load_facts(&path).is_err());
}

#[test]
fn test_load_skips_non_json_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"name": "b", "event": {"type": "b"}, "conditions": {"all": []}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"[{"name": "a", "event": {"type": "a"}, "conditions": {"any": []}}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a rule").unwrap();

    let rules = RuleLoader::load_path(dir.path()).unwrap();
    assert_eq!(
        rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
}

#[test]
fn test_run_over_loaded_rules() {
    let mut engine = Engine::new();
    for rule in RuleLoader::load_path(&data_path("")).unwrap() {
        engine.add_rule(rule).unwrap();
    }
    engine.add_fact("personalFoulCount", 6);
    engine.add_fact("gameDuration", 40);
    engine.add_fact(
        "profile",
        json!({"attributes": {"username": "kenny", "birthdayYear": 1990, "profilePic": "p.jpg", "primaryLocation": "NY"}}),
    );

    let outcomes = engine.run().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.matched));
    assert_eq!(outcomes[0].event_type, "fouledOut");
    assert_eq!(outcomes[2].params.get("message"), Some(&json!("Profile is completed")));
}
