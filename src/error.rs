use std::io;
use thiserror::Error;

use crate::command::ParseError;
use crate::config::ConfigError;
use crate::rules::{RegistryError, RuleMatchError};

/// Top-level application error that wraps all module-specific errors
///
/// Every module error converts into AppError via `From`, so application code
/// can use `?` while keeping the module's own message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleMatchError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the user cancelled (Ctrl-C) rather than something failing
    pub fn is_interrupted(&self) -> bool {
        matches!(self, AppError::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
