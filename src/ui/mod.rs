pub mod display;
pub mod prompts;

pub use display::{
    level_color, render_json, AlternativeComparison, AnalysisReport, ConsoleDisplay, ExecutionReport,
};
pub use prompts::{
    AlternativeChoice, LinePrompter, PromptResponse, Prompter, SelectAction, SelectState,
    TerminalPrompter, UserPrompt,
};
