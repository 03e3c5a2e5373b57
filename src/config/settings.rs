use crate::rules::{RegistryError, RuleRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub behavior: BehaviorConfig,
    pub execution: ExecutionConfig,
    pub display: DisplayConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// `false` behaves like passing `--yes`
    pub confirm_dangerous_ops: bool,
    pub log_commands: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionConfig {
    pub shell: String,
    /// 0 disables the timeout
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_suggestions: bool,
    pub max_alternatives: usize,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule names removed from the default registry
    pub disabled: Vec<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            confirm_dangerous_ops: true,
            log_commands: true,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            timeout_seconds: 0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_suggestions: true,
            max_alternatives: 3,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("safe-cli"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load and validate configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults when
    /// the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) => path,
                Err(ConfigError::DirectoryNotFound) => return Ok(Self::default_config()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default_config());
        }

        Self::load_from(&path)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path` with owner-only permissions
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.shell.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "execution.shell cannot be empty".to_string(),
            ));
        }

        if self.display.max_alternatives == 0 {
            return Err(ConfigError::InvalidValue(
                "max_alternatives must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.rules.disabled.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ConfigError::InvalidValue(format!(
                "rule '{}' is disabled more than once",
                duplicate
            )));
        }

        Ok(())
    }

    /// Execution timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.execution.timeout_seconds > 0).then(|| Duration::from_secs(self.execution.timeout_seconds))
    }

    /// The default rule set without the disabled rules
    pub fn build_registry(&self) -> Result<RuleRegistry, RegistryError> {
        let mut registry = RuleRegistry::with_default_rules();

        for name in &self.rules.disabled {
            if !registry.unregister(name) {
                return Err(RegistryError::UnknownRule(name.clone()));
            }
            debug!(rule = %name, "rule disabled by config");
        }

        Ok(registry)
    }
}
