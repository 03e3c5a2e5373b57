use clap::{CommandFactory, Parser};
use safe_cli::analysis::{riskiest, riskiest_index, AlternativeGenerator, AnalysisResult, CommandAnalyzer};
use safe_cli::audit::AuditLogger;
use safe_cli::command::{join_tokens, CommandParser, ParsedCommand};
use safe_cli::config::Config;
use safe_cli::exec::{CommandExecutor, ExecutionResult, NO_EXIT_CODE};
use safe_cli::logging::init_logging;
use safe_cli::rules::DangerLevel;
use safe_cli::ui::{
    render_json, AlternativeChoice, ConsoleDisplay, LinePrompter, PromptResponse, Prompter,
    TerminalPrompter, UserPrompt,
};
use safe_cli::AppResult;
use std::io::{self, IsTerminal};
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, warn};

const EXIT_ERROR: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

/// Know before you run: a safety wrapper for dangerous shell commands
#[derive(Debug, Parser)]
#[command(name = "safe", version, about)]
#[command(after_help = "Examples:\n  safe rm -rf /tmp/test\n  safe --dry-run git reset --hard\n  safe --yes mv file.txt backup/")]
struct Cli {
    /// Show the analysis without executing
    #[arg(short, long)]
    dry_run: bool,

    /// Skip confirmation prompts (use with caution)
    #[arg(short, long)]
    yes: bool,

    /// Print the analysis as JSON and exit
    #[arg(long)]
    json: bool,

    /// Config file (default: ~/.config/safe-cli/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command to analyze and run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    /// One argument is taken verbatim so `safe "a | b"` keeps its operators
    fn command_line(&self) -> Option<String> {
        match self.command.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(join_tokens(many.iter().map(String::as_str))),
        }
    }
}

/// What the user settled on after the prompts
enum Decision {
    Run(String),
    Abort,
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let display = ConsoleDisplay::new(true, usize::MAX);

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) if e.is_interrupted() => {
            eprintln!("\n⚠️  Interrupted by user");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            display.show_error(&e.to_string());
            EXIT_ERROR
        }
    };

    std::process::exit(code);
}

async fn run(cli: &Cli) -> AppResult<i32> {
    let Some(line) = cli.command_line() else {
        eprintln!("No command provided.\n");
        Cli::command().print_help()?;
        return Ok(EXIT_ERROR);
    };

    let config = Config::load_or_default(cli.config.as_deref())?;
    let analyzer = CommandAnalyzer::with_registry(config.build_registry()?);
    let display = ConsoleDisplay::new(config.display.show_suggestions, config.display.max_alternatives);

    let spans = segment_spans(&line);
    let segments = parse_segments(&line, &spans)?;
    let results = analyzer.analyze_batch(&segments)?;

    if cli.json {
        println!("{}", render_json(&line, &results)?);
        return Ok(0);
    }

    let Some(index) = riskiest_index(&results) else {
        return Ok(0);
    };
    let (result, span) = (&results[index], spans[index].clone());
    debug!(command = %line, level = %result.danger_level, segments = results.len(), "analysis complete");

    if cli.dry_run {
        display.show_dry_run_banner();
    }
    if results.len() > 1 {
        display.show_info(&format!(
            "Compound command with {} parts; showing the riskiest.",
            results.len()
        ));
    }
    display.show_analysis(result)?;

    let executor = CommandExecutor::new(config.execution.shell.clone()).with_timeout(config.timeout());

    if cli.dry_run {
        display.show_execution(&executor.dry_run(&line))?;
        display.show_info("Dry run complete - no command was executed.");
        return Ok(0);
    }

    let skip_prompt = cli.yes || !config.behavior.confirm_dangerous_ops;
    let offer = Offer {
        line: &line,
        span,
        alternatives: result.merged_alternatives(config.display.max_alternatives),
    };

    let decision = if io::stdin().is_terminal() {
        decide(&mut UserPrompt::new(TerminalPrompter::new()), &display, result, &offer, skip_prompt)?
    } else {
        let prompter = LinePrompter::new(io::stdin().lock(), io::stdout());
        decide(&mut UserPrompt::new(prompter), &display, result, &offer, skip_prompt)?
    };

    let audit = if config.behavior.log_commands {
        open_audit_log()
    } else {
        None
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let chosen = match decision {
        Decision::Abort => {
            display.show_aborted();
            if let Some(audit) = &audit {
                record(audit.log_aborted(&line, result.danger_level, &cwd));
            }
            return Ok(0);
        }
        Decision::Run(chosen) => chosen,
    };

    display.show_execution_start(&chosen);
    let outcome = executor.execute_streaming(&chosen).await;
    finish(&display, &outcome);

    if let Some(audit) = &audit {
        let danger = level_of(&chosen, &analyzer).unwrap_or(result.danger_level);
        record(audit.log_command(&chosen, danger, &cwd, outcome.exit_code));
    }

    Ok(exit_code(&outcome))
}

/// Byte range of every part of `line` that is analyzed on its own
fn segment_spans(line: &str) -> Vec<Range<usize>> {
    let parser = CommandParser::new();
    let spans = if parser.is_compound_command(line) {
        parser.split_compound_spans(line)
    } else {
        Vec::new()
    };

    if spans.is_empty() {
        vec![0..line.len()]
    } else {
        spans
    }
}

fn parse_segments(line: &str, spans: &[Range<usize>]) -> AppResult<Vec<ParsedCommand>> {
    let parser = CommandParser::new();
    let segments = spans
        .iter()
        .map(|span| parser.parse(&line[span.clone()]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments)
}

/// Rewrites for the riskiest part of a command line
struct Offer<'a> {
    line: &'a str,
    span: Range<usize>,
    alternatives: Vec<String>,
}

impl Offer<'_> {
    /// The whole line with the riskiest part replaced by `alternative`
    fn splice(&self, alternative: &str) -> String {
        format!(
            "{}{}{}",
            &self.line[..self.span.start],
            alternative,
            &self.line[self.span.end..]
        )
    }
}

fn decide<P: Prompter>(
    prompt: &mut UserPrompt<P>,
    display: &ConsoleDisplay,
    result: &AnalysisResult,
    offer: &Offer<'_>,
    skip_prompt: bool,
) -> AppResult<Decision> {
    let line = offer.line;

    match prompt.confirm_execution(result, &offer.alternatives, skip_prompt)? {
        PromptResponse::Abort => Ok(Decision::Abort),
        PromptResponse::Continue => Ok(Decision::Run(line.to_string())),
        PromptResponse::ViewAlternative if offer.alternatives.is_empty() => {
            Ok(Decision::Run(line.to_string()))
        }
        PromptResponse::ViewAlternative => {
            let tips = AlternativeGenerator::new().generate_multiple(&result.command, usize::MAX);
            for tip in tips.iter().filter(|tip| tip.starts_with('#')) {
                display.show_info(tip.trim_start_matches('#').trim());
            }

            match prompt.choose_alternative(&offer.alternatives)? {
                AlternativeChoice::Use(alternative) => {
                    let chosen = offer.splice(&alternative);
                    display.show_comparison(line, &chosen)?;
                    Ok(Decision::Run(chosen))
                }
                AlternativeChoice::Original => Ok(Decision::Run(line.to_string())),
                AlternativeChoice::Abort => Ok(Decision::Abort),
            }
        }
    }
}

fn finish(display: &ConsoleDisplay, outcome: &ExecutionResult) {
    if let Some(error) = &outcome.error {
        display.show_error(error);
    }
    display.show_execution_complete(outcome);
}

/// Danger level of the line actually run, which may be an alternative
fn level_of(line: &str, analyzer: &CommandAnalyzer) -> Option<DangerLevel> {
    let segments = parse_segments(line, &segment_spans(line)).ok()?;
    let results = analyzer.analyze_batch(&segments).ok()?;
    riskiest(&results).map(|r| r.danger_level)
}

fn exit_code(outcome: &ExecutionResult) -> i32 {
    if outcome.exit_code == NO_EXIT_CODE {
        EXIT_ERROR
    } else {
        outcome.exit_code
    }
}

fn open_audit_log() -> Option<AuditLogger> {
    match AuditLogger::new() {
        Ok(logger) => Some(logger),
        Err(e) => {
            warn!(error = %e, "audit log unavailable");
            None
        }
    }
}

/// Audit failures never change the outcome of the command
fn record(result: io::Result<()>) {
    if let Err(e) = result {
        warn!(error = %e, "failed to write audit entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_cli::AppError;
    use std::io::Cursor;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("safe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_flags_and_trailing_command() {
        let parsed = cli(&["-d", "--yes", "rm", "-rf", "/tmp/test"]);
        assert!(parsed.dry_run);
        assert!(parsed.yes);
        assert!(!parsed.json);
        assert_eq!(parsed.command, vec!["rm", "-rf", "/tmp/test"]);
    }

    #[test]
    fn test_command_line_single_argument_is_verbatim() {
        let parsed = cli(&["ls -la | grep foo"]);
        assert_eq!(parsed.command_line().as_deref(), Some("ls -la | grep foo"));
    }

    #[test]
    fn test_command_line_rejoins_with_quoting() {
        let parsed = cli(&["git", "commit", "-m", "two words"]);
        assert_eq!(parsed.command_line().as_deref(), Some("git commit -m 'two words'"));
        assert_eq!(cli(&[]).command_line(), None);
    }

    #[test]
    fn test_parse_segments() {
        let parse = |line: &str| parse_segments(line, &segment_spans(line));
        assert_eq!(parse("rm -rf /tmp/x").unwrap().len(), 1);

        let segments = parse("ls; rm -rf / && echo done").unwrap();
        let commands: Vec<&str> = segments.iter().map(|s| s.command()).collect();
        assert_eq!(commands, vec!["ls", "rm", "echo"]);

        assert!(matches!(parse("echo 'open"), Err(AppError::Parse(_))));
        assert_eq!(segment_spans("echo hi > out.txt"), vec![0..17]);
    }

    /// Run `decide` on the riskiest part of `line`, answering from `answers`
    fn decide_line(line: &str, answers: &str) -> Decision {
        let spans = segment_spans(line);
        let segments = parse_segments(line, &spans).unwrap();
        let results = CommandAnalyzer::new().analyze_batch(&segments).unwrap();
        let index = riskiest_index(&results).unwrap();
        let result = &results[index];

        let offer = Offer {
            line,
            span: spans[index].clone(),
            alternatives: result.merged_alternatives(usize::MAX),
        };
        let prompter = LinePrompter::new(Cursor::new(answers.to_string()), Vec::new());
        let display = ConsoleDisplay::new(true, usize::MAX);

        decide(&mut UserPrompt::new(prompter), &display, result, &offer, false).unwrap()
    }

    #[test]
    fn test_alternative_keeps_the_rest_of_a_compound_line() {
        match decide_line("cd build && rm -rf *", "2\n1\n") {
            Decision::Run(chosen) => assert_eq!(chosen, "cd build && rm -i -rf *"),
            Decision::Abort => panic!("expected the alternative to run"),
        }

        // HIGH lists the alternative third
        match decide_line("rm -rf /tmp/x; echo done", "3\n1\n") {
            Decision::Run(chosen) => assert_eq!(chosen, "rm -i -rf /tmp/x; echo done"),
            Decision::Abort => panic!("expected the alternative to run"),
        }
    }

    #[test]
    fn test_original_and_abort_choices() {
        match decide_line("cd build && rm -rf *", "2\n2\n") {
            Decision::Run(chosen) => assert_eq!(chosen, "cd build && rm -rf *"),
            Decision::Abort => panic!("expected the original to run"),
        }
        assert!(matches!(decide_line("cd build && rm -rf *", "1\n"), Decision::Abort));
    }

    #[test]
    fn test_generated_alternative_is_offered() {
        // cp has no rule alternative; the rewrite comes from the generator
        match decide_line("cp -rf a b", "2\n1\n") {
            Decision::Run(chosen) => assert_eq!(chosen, "cp -i -r a b"),
            Decision::Abort => panic!("expected the alternative to run"),
        }
    }

    #[test]
    fn test_exit_code_for_failed_spawn() {
        let mut outcome = CommandExecutor::default().dry_run("true");
        assert_eq!(exit_code(&outcome), 0);

        outcome.exit_code = NO_EXIT_CODE;
        assert_eq!(exit_code(&outcome), EXIT_ERROR);
    }
}
