use crate::command::ParsedCommand;
use crate::rules::level::DangerLevel;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleMatchError {
    #[error("rule_name cannot be empty")]
    EmptyRuleName,

    #[error("message cannot be empty")]
    EmptyMessage,
}

/// One rule's verdict on one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    rule_name: String,
    danger_level: DangerLevel,
    message: String,
    suggestion: Option<String>,
    safe_alternative: Option<String>,
}

impl RuleMatch {
    pub fn new(
        rule_name: impl Into<String>,
        danger_level: DangerLevel,
        message: impl Into<String>,
    ) -> Result<Self, RuleMatchError> {
        let rule_name = rule_name.into();
        let message = message.into();

        if rule_name.is_empty() {
            return Err(RuleMatchError::EmptyRuleName);
        }
        if message.is_empty() {
            return Err(RuleMatchError::EmptyMessage);
        }

        Ok(Self {
            rule_name,
            danger_level,
            message,
            suggestion: None,
            safe_alternative: None,
        })
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<Option<String>>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_safe_alternative(mut self, alternative: impl Into<Option<String>>) -> Self {
        self.safe_alternative = alternative.into();
        self
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn danger_level(&self) -> DangerLevel {
        self.danger_level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn safe_alternative(&self) -> Option<&str> {
        self.safe_alternative.as_deref()
    }
}

/// A unit of risk detection for one command family
///
/// `analyze` is only called when `matches` returned true for the same command.
pub trait Rule: Send + Sync {
    /// Unique name within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Cheap, side-effect free check of the command name, args and flags
    fn matches(&self, command: &ParsedCommand) -> bool;

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError>;
}

/// A rule that combines several sub-rules and reports the worst verdict
///
/// Ties go to the sub-rule listed first.
pub struct CompositeRule {
    name: String,
    description: String,
    rules: Vec<Box<dyn Rule>>,
}

impl CompositeRule {
    pub fn new(name: impl Into<String>, rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            name: name.into(),
            description: "Composite rule".to_string(),
            rules,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }
}

impl Rule for CompositeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        self.rules.iter().any(|rule| rule.matches(command))
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let mut worst: Option<RuleMatch> = None;

        for rule in self.rules.iter().filter(|rule| rule.matches(command)) {
            let verdict = rule.analyze(command)?;
            let is_worse = worst
                .as_ref()
                .is_none_or(|current| verdict.danger_level() > current.danger_level());
            if is_worse {
                worst = Some(verdict);
            }
        }

        match worst {
            Some(verdict) => Ok(verdict),
            None => RuleMatch::new(&self.name, DangerLevel::Safe, "No risks detected"),
        }
    }
}

impl std::fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Rule: {}>", self.name())
    }
}
