use crate::analysis::suggestion::AlternativeGenerator;
use crate::command::ParsedCommand;
use crate::rules::{DangerLevel, RuleMatch, RuleMatchError, RuleRegistry};
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

/// Primary warning reported when no rule matched
pub const NO_CONCERNS: &str = "No safety concerns detected.";

/// Aggregated verdict of every matching rule for one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub command: ParsedCommand,
    pub danger_level: DangerLevel,
    pub matches: Vec<RuleMatch>,
    pub primary_warning: String,
    pub all_warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub safe_alternatives: Vec<String>,
}

impl AnalysisResult {
    fn safe(command: ParsedCommand) -> Self {
        Self {
            command,
            danger_level: DangerLevel::Safe,
            matches: Vec::new(),
            primary_warning: NO_CONCERNS.to_string(),
            all_warnings: Vec::new(),
            suggestions: Vec::new(),
            safe_alternatives: Vec::new(),
        }
    }

    /// SAFE and LOW commands run without any prompt
    pub fn is_safe(&self) -> bool {
        matches!(self.danger_level, DangerLevel::Safe | DangerLevel::Low)
    }

    pub fn requires_confirmation(&self) -> bool {
        self.danger_level.requires_confirmation()
    }

    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }

    pub fn has_safe_alternatives(&self) -> bool {
        !self.safe_alternatives.is_empty()
    }

    /// Rule alternatives first, then the generator's rewrite, at most `max`
    pub fn merged_alternatives(&self, max: usize) -> Vec<String> {
        let generated = AlternativeGenerator::new().generate(&self.command);
        let mut alternatives = stable_dedup(self.safe_alternatives.iter().cloned().chain(generated));
        alternatives.truncate(max);
        alternatives
    }

    /// Every warning except the primary one, in rule order
    pub fn additional_warnings(&self) -> Vec<&str> {
        self.all_warnings
            .iter()
            .map(String::as_str)
            .filter(|warning| *warning != self.primary_warning)
            .collect()
    }

    /// Plain-text report, used when output is not a terminal
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Command: {}", self.command.raw()),
            format!(
                "Danger Level: {} {}",
                self.danger_level.name(),
                self.danger_level.emoji()
            ),
            String::new(),
            format!("Primary Warning: {}", self.primary_warning),
        ];

        let sections = [
            ("Additional Warnings:", self.additional_warnings()),
            ("Suggestions:", self.suggestions.iter().map(String::as_str).collect()),
            ("Safe Alternatives:", self.safe_alternatives.iter().map(String::as_str).collect()),
        ];

        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(title.to_string());
            lines.extend(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("  {}. {}", i + 1, item)),
            );
        }

        lines.join("\n")
    }
}

/// Keep the first occurrence of every item, preserving order
pub fn stable_dedup<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// The first result with the highest danger level
pub fn riskiest(results: &[AnalysisResult]) -> Option<&AnalysisResult> {
    riskiest_index(results).map(|index| &results[index])
}

/// Position of [`riskiest`] within `results`
pub fn riskiest_index(results: &[AnalysisResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .fold(None, |worst: Option<(usize, DangerLevel)>, (index, result)| match worst {
            Some((_, level)) if level >= result.danger_level => worst,
            _ => Some((index, result.danger_level)),
        })
        .map(|(index, _)| index)
}

/// Runs a rule registry over commands and merges the verdicts
#[derive(Debug)]
pub struct CommandAnalyzer {
    registry: RuleRegistry,
}

impl CommandAnalyzer {
    /// Analyzer over the built-in rule set
    pub fn new() -> Self {
        Self::with_registry(RuleRegistry::with_default_rules())
    }

    pub fn with_registry(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn analyze(&self, command: &ParsedCommand) -> Result<AnalysisResult, RuleMatchError> {
        let matches = self.registry.analyze(command)?;

        let Some(primary) = first_most_dangerous(&matches) else {
            return Ok(AnalysisResult::safe(command.clone()));
        };

        let danger_level = primary.danger_level();
        let primary_warning = primary.message().to_string();

        let all_warnings = stable_dedup(matches.iter().map(|m| m.message().to_string()));
        let suggestions = stable_dedup(
            matches
                .iter()
                .filter_map(|m| m.suggestion())
                .map(str::to_string),
        );
        let safe_alternatives = stable_dedup(
            matches
                .iter()
                .filter_map(|m| m.safe_alternative())
                .map(str::to_string),
        );

        Ok(AnalysisResult {
            command: command.clone(),
            danger_level,
            matches,
            primary_warning,
            all_warnings,
            suggestions,
            safe_alternatives,
        })
    }

    /// Analyze each command independently
    pub fn analyze_batch(
        &self,
        commands: &[ParsedCommand],
    ) -> Result<Vec<AnalysisResult>, RuleMatchError> {
        commands.iter().map(|command| self.analyze(command)).collect()
    }
}

impl Default for CommandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// `Iterator::max_by_key` returns the last maximum; ties must go to the earliest rule
fn first_most_dangerous(matches: &[RuleMatch]) -> Option<&RuleMatch> {
    matches.iter().fold(None, |best, candidate| match best {
        Some(current) if current.danger_level() >= candidate.danger_level() => Some(current),
        _ => Some(candidate),
    })
}
