mod helpers;

use helpers::{parse, write_config};
use safe_cli::analysis::CommandAnalyzer;
use safe_cli::audit::AuditLogger;
use safe_cli::config::{Config, ConfigError};
use safe_cli::exec::CommandExecutor;
use safe_cli::rules::{DangerLevel, RegistryError};
use safe_cli::ui::render_json;
use std::fs;
use tempfile::TempDir;

/// Test that disabled rules in the config file stop matching
#[test]
fn test_config_disables_rules_for_analysis() {
    let (_temp, path) = write_config("[rules]\ndisabled = [\"kill_command\", \"sudo_command\"]\n");

    let config = Config::load_or_default(Some(&path)).unwrap();
    let analyzer = CommandAnalyzer::with_registry(config.build_registry().unwrap());

    let result = analyzer.analyze(&parse("kill -9 1")).unwrap();
    assert_eq!(result.danger_level, DangerLevel::Safe);

    let result = analyzer.analyze(&parse("rm -rf /")).unwrap();
    assert_eq!(result.danger_level, DangerLevel::Critical);
}

/// Test that a typo in the disabled list is reported, not ignored
#[test]
fn test_config_unknown_rule_is_an_error() {
    let (_temp, path) = write_config("[rules]\ndisabled = [\"kill_comand\"]\n");

    let config = Config::load_or_default(Some(&path)).unwrap();
    assert!(matches!(
        config.build_registry(),
        Err(RegistryError::UnknownRule(name)) if name == "kill_comand"
    ));
}

/// Test that invalid files surface as config errors
#[test]
fn test_invalid_config_file() {
    let (_temp, path) = write_config("[execution]\nshell = \"\"\n");
    assert!(matches!(
        Config::load_or_default(Some(&path)),
        Err(ConfigError::InvalidValue(_))
    ));
}

/// Test the full run path: analyze, execute with the configured shell, audit
#[tokio::test]
async fn test_analyze_execute_and_audit() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("scratch.txt");
    fs::write(&target, "data").unwrap();

    let result = CommandAnalyzer::new().analyze(&parse("rm -f scratch.txt")).unwrap();
    assert_eq!(result.danger_level, DangerLevel::Medium);

    let line = format!("rm -f '{}'", target.display());

    let config = Config::default_config();
    let executor = CommandExecutor::new(config.execution.shell.clone()).with_timeout(config.timeout());
    let outcome = executor.execute(&line).await;
    assert!(outcome.success);
    assert!(!target.exists());

    let log_path = temp.path().join("logs").join("history.log");
    let audit = AuditLogger::with_path(&log_path).unwrap();
    audit
        .log_command(&line, result.danger_level, temp.path(), outcome.exit_code)
        .unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("[danger:MEDIUM] [exit:0] rm -f"));
}

/// Test that dry runs leave the filesystem alone
#[test]
fn test_dry_run_does_not_touch_files() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("keep.txt");
    fs::write(&target, "data").unwrap();

    let line = format!("rm -rf {}", temp.path().display());
    let outcome = CommandExecutor::default().dry_run(&line);

    assert!(outcome.stdout.starts_with("[DRY RUN] Would execute: rm -rf"));
    assert!(target.exists());
}

/// Test the JSON report over a compound command
#[test]
fn test_json_report_uses_worst_segment() {
    let analyzer = CommandAnalyzer::new();
    let segments = vec![parse("ls"), parse("git push --force origin main")];
    let results = analyzer.analyze_batch(&segments).unwrap();

    let json = render_json("ls; git push --force origin main", &results).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["danger_level"], "CRITICAL");
    assert_eq!(value["requires_confirmation"], true);
    assert_eq!(value["segments"].as_array().unwrap().len(), 2);
    assert_eq!(value["segments"][0]["danger_level"], "SAFE");
}
