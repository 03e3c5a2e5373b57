pub mod base;
pub mod docker;
pub mod filesystem;
pub mod flags;
pub mod git;
pub mod level;
pub mod registry;
pub mod system;

pub use base::{CompositeRule, Rule, RuleMatch, RuleMatchError};
pub use level::DangerLevel;
pub use registry::{RegistryError, RuleRegistry};
