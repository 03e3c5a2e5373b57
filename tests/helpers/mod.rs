#![allow(dead_code)]

use safe_cli::analysis::{AnalysisResult, CommandAnalyzer};
use safe_cli::command::ParsedCommand;
use safe_cli::rules::DangerLevel;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Parse a command line that is known to be well-formed
pub fn parse(cmd: &str) -> ParsedCommand {
    ParsedCommand::parse(cmd).expect("Failed to parse command")
}

/// Analyze with the default rule set
pub fn analyze(cmd: &str) -> AnalysisResult {
    CommandAnalyzer::new()
        .analyze(&parse(cmd))
        .expect("Failed to analyze command")
}

pub fn level(cmd: &str) -> DangerLevel {
    analyze(cmd).danger_level
}

/// Helper to create a config file in a fresh directory
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, contents).expect("Failed to write config");
    (temp_dir, path)
}
