pub mod parser;

pub use parser::{join_tokens, CommandParser, ParseError, ParsedCommand};
