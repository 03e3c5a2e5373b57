mod helpers;

use helpers::parse;
use safe_cli::analysis::CommandAnalyzer;
use safe_cli::command::ParsedCommand;
use safe_cli::rules::filesystem::{ChmodRule, RmRule};
use safe_cli::rules::{
    CompositeRule, DangerLevel, RegistryError, Rule, RuleMatch, RuleMatchError, RuleRegistry,
};
use std::sync::Arc;

/// Flags `curl ... | sh` style installs by the presence of a URL
struct CurlRule;

impl Rule for CurlRule {
    fn name(&self) -> &str {
        "curl_download"
    }

    fn description(&self) -> &str {
        "Detects downloads from plain HTTP URLs"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "curl"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let insecure = command.args().iter().any(|arg| arg.starts_with("http://"));
        let level = if insecure { DangerLevel::High } else { DangerLevel::Low };
        Ok(RuleMatch::new(self.name(), level, "Downloads content from the network.")?
            .with_suggestion("Prefer https URLs.".to_string()))
    }
}

/// A rule that breaks the verdict contract
struct BrokenRule;

impl Rule for BrokenRule {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always produces an empty message"
    }

    fn matches(&self, _command: &ParsedCommand) -> bool {
        true
    }

    fn analyze(&self, _command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        RuleMatch::new(self.name(), DangerLevel::Low, "")
    }
}

#[test]
fn test_default_registry_contents() {
    let registry = RuleRegistry::with_default_rules();

    assert_eq!(registry.len(), 18);
    assert_eq!(registry.names()[0], "rm_command");
    assert!(registry.contains("git_push_force"));
    assert!(registry.contains("mkfs_command"));
}

#[test]
fn test_custom_rule_extends_analysis() {
    let mut registry = RuleRegistry::with_default_rules();
    registry.register(CurlRule).unwrap();

    let analyzer = CommandAnalyzer::with_registry(registry);
    let result = analyzer.analyze(&parse("curl http://example.com/install.sh")).unwrap();

    assert_eq!(result.danger_level, DangerLevel::High);
    assert_eq!(result.suggestions, vec!["Prefer https URLs.".to_string()]);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = RuleRegistry::with_default_rules();

    assert_eq!(
        registry.register(RmRule),
        Err(RegistryError::DuplicateRule("rm_command".to_string()))
    );
    assert_eq!(registry.len(), 18);
}

#[test]
fn test_rules_can_be_shared_between_registries() {
    let defaults = RuleRegistry::with_default_rules();
    let mut filesystem_only = RuleRegistry::new();

    for rule in defaults.list().into_iter().take(5) {
        filesystem_only.register_shared(rule).unwrap();
    }

    assert_eq!(
        filesystem_only.names(),
        vec!["rm_command", "mv_command", "cp_command", "chmod_command", "chown_command"]
    );
    let matching = filesystem_only.find_matching(&parse("git reset --hard"));
    assert!(matching.is_empty());
}

#[test]
fn test_broken_rule_error_propagates() {
    let mut registry = RuleRegistry::new();
    registry.register(BrokenRule).unwrap();

    let analyzer = CommandAnalyzer::with_registry(registry);
    assert_eq!(
        analyzer.analyze(&parse("ls")).unwrap_err(),
        RuleMatchError::EmptyMessage
    );
}

#[test]
fn test_composite_rule_in_registry() {
    let permissions = CompositeRule::new(
        "permissions",
        vec![Box::new(RmRule) as Box<dyn Rule>, Box::new(ChmodRule)],
    )
    .with_description("Filesystem permission and deletion checks");

    let mut registry = RuleRegistry::new();
    registry.register_shared(Arc::new(permissions)).unwrap();

    let matches = registry.analyze(&parse("chmod -R 777 /etc")).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].danger_level(), DangerLevel::Critical);
    assert_eq!(registry.get("permissions").unwrap().description(), "Filesystem permission and deletion checks");

    assert!(registry.find_matching(&parse("ls")).is_empty());
}

#[test]
fn test_empty_registry_reports_everything_safe() {
    let analyzer = CommandAnalyzer::with_registry(RuleRegistry::new());
    let result = analyzer.analyze(&parse("rm -rf /")).unwrap();

    assert_eq!(result.danger_level, DangerLevel::Safe);
    assert!(result.matches.is_empty());
}
