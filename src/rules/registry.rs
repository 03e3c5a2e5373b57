use crate::command::ParsedCommand;
use crate::rules::base::{Rule, RuleMatch, RuleMatchError};
use crate::rules::docker::{DockerRmRule, DockerRmiRule, DockerSystemPruneRule, DockerVolumePruneRule};
use crate::rules::filesystem::{ChmodRule, ChownRule, CpRule, MvRule, RmRule};
use crate::rules::git::{GitBranchDeleteRule, GitCleanRule, GitPushForceRule, GitResetRule};
use crate::rules::level::DangerLevel;
use crate::rules::system::{DdRule, KillRule, MkfsRule, ShutdownRule, SudoRule};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Rule '{0}' is already registered")]
    DuplicateRule(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// Ordered collection of uniquely named rules
///
/// Registration order is preserved everywhere and decides ties when several
/// rules report the same danger level. Mutate during setup only; analysis
/// borrows the registry immutably.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding one instance of every built-in rule
    pub fn with_default_rules() -> Self {
        let rules: Vec<Arc<dyn Rule>> = vec![
            Arc::new(RmRule),
            Arc::new(MvRule),
            Arc::new(CpRule),
            Arc::new(ChmodRule),
            Arc::new(ChownRule),
            Arc::new(GitResetRule),
            Arc::new(GitPushForceRule),
            Arc::new(GitCleanRule),
            Arc::new(GitBranchDeleteRule),
            Arc::new(DockerSystemPruneRule),
            Arc::new(DockerRmRule),
            Arc::new(DockerRmiRule),
            Arc::new(DockerVolumePruneRule),
            Arc::new(SudoRule),
            Arc::new(DdRule),
            Arc::new(KillRule),
            Arc::new(ShutdownRule),
            Arc::new(MkfsRule),
        ];

        Self { rules }
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(rule))
    }

    /// Register a rule that is already shared, e.g. one taken from another registry
    pub fn register_shared(&mut self, rule: Arc<dyn Rule>) -> Result<(), RegistryError> {
        let name = rule.name();

        if name.trim().is_empty() {
            return Err(RegistryError::InvalidRule(
                "rule name cannot be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Err(RegistryError::DuplicateRule(name.to_string()));
        }

        self.rules.push(rule);
        Ok(())
    }

    /// Remove a rule by name, returning whether anything was removed
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        self.rules.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .map(|rule| rule.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Snapshot of all rules in registration order
    pub fn list(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.clone()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Rules whose `matches` accepts the command, in registration order
    pub fn find_matching(&self, command: &ParsedCommand) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .map(|rule| rule.as_ref())
            .filter(|rule| rule.matches(command))
            .collect()
    }

    /// Run every matching rule, in registration order
    pub fn analyze(&self, command: &ParsedCommand) -> Result<Vec<RuleMatch>, RuleMatchError> {
        self.find_matching(command)
            .into_iter()
            .map(|rule| rule.analyze(command))
            .collect()
    }

    pub fn highest_danger(&self, command: &ParsedCommand) -> Result<DangerLevel, RuleMatchError> {
        let highest = self
            .analyze(command)?
            .iter()
            .map(RuleMatch::danger_level)
            .max()
            .unwrap_or(DangerLevel::Safe);
        Ok(highest)
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
