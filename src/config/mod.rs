pub mod settings;

pub use settings::{BehaviorConfig, Config, ConfigError, DisplayConfig, ExecutionConfig, RulesConfig};
