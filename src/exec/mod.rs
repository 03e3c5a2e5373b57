pub mod executor;

pub use executor::{CommandExecutor, ExecutionResult, NO_EXIT_CODE};
