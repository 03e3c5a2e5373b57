pub mod analysis;
pub mod audit;
pub mod command;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod rules;
pub mod ui;

// Re-export commonly used types for convenience
pub use analysis::{AlternativeGenerator, AnalysisResult, CommandAnalyzer};
pub use command::{CommandParser, ParseError, ParsedCommand};
pub use error::{AppError, AppResult};
pub use rules::{DangerLevel, Rule, RuleMatch, RuleRegistry};
