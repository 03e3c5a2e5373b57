use crate::analysis::AnalysisResult;
use crate::exec::ExecutionResult;
use crate::rules::DangerLevel;
use crossterm::style::Stylize;
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Terminal, TerminalOptions, Viewport,
};
use serde::Serialize;
use std::io::{self, IsTerminal};

const FALLBACK_WIDTH: u16 = 80;

pub fn level_color(level: DangerLevel) -> Color {
    match level {
        DangerLevel::Safe => Color::Green,
        DangerLevel::Low | DangerLevel::Medium => Color::Yellow,
        DangerLevel::High | DangerLevel::Critical => Color::Red,
    }
}

/// Rows a set of lines needs inside a bordered block of the given outer width
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let inner = usize::from(width.saturating_sub(2)).max(1);
    let rows: usize = lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
            textwrap::wrap(&text, inner).len().max(1)
        })
        .sum();
    u16::try_from(rows + 2).unwrap_or(u16::MAX)
}

fn heading(text: &str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Bordered report of one analysis
pub struct AnalysisReport<'a> {
    result: &'a AnalysisResult,
    show_suggestions: bool,
    max_alternatives: usize,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        Self {
            result,
            show_suggestions: true,
            max_alternatives: usize::MAX,
        }
    }

    pub fn show_suggestions(mut self, show: bool) -> Self {
        self.show_suggestions = show;
        self
    }

    pub fn max_alternatives(mut self, max: usize) -> Self {
        self.max_alternatives = max;
        self
    }

    pub fn lines(&self) -> Vec<Line<'a>> {
        let result = self.result;
        let level = result.danger_level;
        let color = level_color(level);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Command: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(result.command.raw()),
            ]),
            Line::from(vec![
                Span::styled("Danger Level: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("{} {}", level.name(), level.emoji()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
        ];

        if level == DangerLevel::Safe {
            lines.push(Line::from(Span::styled(
                format!("✅ {}", result.primary_warning),
                Style::default().fg(Color::Green),
            )));
            return lines;
        }

        let warning_style = if result.requires_confirmation() {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        lines.push(Line::from(Span::styled(
            format!("⚠️  {}", result.primary_warning),
            warning_style,
        )));

        let additional = result.additional_warnings();
        if !additional.is_empty() {
            lines.push(Line::from(""));
            lines.push(heading("Additional Concerns:", color));
            lines.extend(additional.iter().map(|w| Line::from(format!("  • {}", w))));
        }

        if self.show_suggestions && result.has_suggestions() {
            lines.push(Line::from(""));
            lines.push(heading("💡 Suggestions:", Color::Cyan));
            lines.extend(result.suggestions.iter().map(|s| Line::from(format!("  • {}", s))));
        }

        if result.has_safe_alternatives() {
            lines.push(Line::from(""));
            lines.push(heading("✅ Safe Alternatives:", Color::Green));
            lines.extend(
                result
                    .safe_alternatives
                    .iter()
                    .take(self.max_alternatives)
                    .map(|alt| {
                        Line::from(vec![
                            Span::raw("  → "),
                            Span::styled(alt.as_str(), Style::default().fg(Color::Green)),
                        ])
                    }),
            );
        }

        lines
    }

    pub fn height(&self, width: u16) -> u16 {
        wrapped_height(&self.lines(), width)
    }
}

impl Widget for &AnalysisReport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let level = self.result.danger_level;
        let border = if level.requires_confirmation() {
            Style::default().fg(level_color(level)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(level_color(level))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title("Safety Analysis");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Captured output of an executed command
pub struct ExecutionReport<'a> {
    result: &'a ExecutionResult,
}

impl<'a> ExecutionReport<'a> {
    pub fn new(result: &'a ExecutionResult) -> Self {
        Self { result }
    }

    pub fn lines(&self) -> Vec<Line<'a>> {
        let result = self.result;
        let (status, status_color) = if result.success {
            ("✓ Success".to_string(), Color::Green)
        } else {
            (format!("✗ Failed (exit code: {})", result.exit_code), Color::Red)
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Command: ", Style::default().fg(Color::Cyan)),
                Span::styled(result.command.as_str(), Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    status,
                    Style::default().fg(status_color).add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        if let Some(error) = &result.error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )));
        }

        if !result.stdout.is_empty() {
            lines.push(Line::from(""));
            lines.push(heading("Output:", Color::Green));
            lines.extend(result.stdout.lines().map(Line::from));
        }

        if !result.stderr.is_empty() {
            lines.push(Line::from(""));
            lines.push(heading("Errors:", Color::Red));
            lines.extend(
                result
                    .stderr
                    .lines()
                    .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Red)))),
            );
        }

        lines
    }

    pub fn height(&self, width: u16) -> u16 {
        wrapped_height(&self.lines(), width)
    }
}

impl Widget for &ExecutionReport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = if self.result.success { Color::Green } else { Color::Red };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title("Command Output");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Original command next to its safer rewrite
pub struct AlternativeComparison<'a> {
    original: &'a str,
    alternative: &'a str,
}

impl<'a> AlternativeComparison<'a> {
    pub fn new(original: &'a str, alternative: &'a str) -> Self {
        Self {
            original,
            alternative,
        }
    }

    pub fn height(&self, width: u16) -> u16 {
        let half = width / 2;
        wrapped_height(&[Line::from(self.original)], half)
            .max(wrapped_height(&[Line::from(self.alternative)], half))
    }
}

impl Widget for &AlternativeComparison<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

        let pane = |title: &'static str, text: &str, color: Color| {
            Paragraph::new(Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(color),
            )))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(title),
            )
            .wrap(Wrap { trim: false })
        };

        pane("Original", self.original, Color::Red).render(left, buf);
        pane("Safe Alternative", self.alternative, Color::Green).render(right, buf);
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    command: &'a str,
    danger_level: DangerLevel,
    requires_confirmation: bool,
    segments: &'a [AnalysisResult],
}

/// Machine-readable report for `--json`
///
/// `danger_level` is the worst level over all segments of a compound command.
pub fn render_json(command: &str, segments: &[AnalysisResult]) -> serde_json::Result<String> {
    let danger_level = segments
        .iter()
        .map(|segment| segment.danger_level)
        .max()
        .unwrap_or_default();

    serde_json::to_string_pretty(&JsonReport {
        command,
        danger_level,
        requires_confirmation: danger_level.requires_confirmation(),
        segments,
    })
}

/// Writes reports to the terminal
///
/// Widgets are inserted above the cursor when stdout is a terminal; otherwise
/// plain text is printed so output can be piped or captured.
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    interactive: bool,
    show_suggestions: bool,
    max_alternatives: usize,
}

impl ConsoleDisplay {
    pub fn new(show_suggestions: bool, max_alternatives: usize) -> Self {
        Self {
            interactive: io::stdout().is_terminal(),
            show_suggestions,
            max_alternatives,
        }
    }

    /// Force plain-text output
    pub fn plain(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn width() -> u16 {
        crossterm::terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(FALLBACK_WIDTH)
    }

    fn print_widget<W>(widget: W, height: u16) -> io::Result<()>
    where
        W: Widget,
    {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(0),
            },
        )?;
        terminal.insert_before(height, |buf| widget.render(buf.area, buf))
    }

    pub fn show_dry_run_banner(&self) {
        if self.interactive {
            println!("\n{}\n", "🔍 Dry Run Mode - Analysis Only".cyan().bold());
        } else {
            println!("Dry Run Mode - Analysis Only\n");
        }
    }

    pub fn show_analysis(&self, result: &AnalysisResult) -> io::Result<()> {
        if !self.interactive {
            println!("{}\n", result.summary());
            return Ok(());
        }

        let report = AnalysisReport::new(result)
            .show_suggestions(self.show_suggestions)
            .max_alternatives(self.max_alternatives);
        let height = report.height(Self::width());
        Self::print_widget(&report, height)
    }

    pub fn show_comparison(&self, original: &str, alternative: &str) -> io::Result<()> {
        if !self.interactive {
            println!("Original:         {}\nSafe Alternative: {}\n", original, alternative);
            return Ok(());
        }

        let comparison = AlternativeComparison::new(original, alternative);
        let height = comparison.height(Self::width());
        Self::print_widget(&comparison, height)
    }

    /// Report of a captured execution; streamed runs have nothing to show
    pub fn show_execution(&self, result: &ExecutionResult) -> io::Result<()> {
        if !self.interactive {
            let output = result.output();
            if !output.is_empty() {
                println!("{}", output);
            }
            if let Some(error) = &result.error {
                eprintln!("Error: {}", error);
            }
            return Ok(());
        }

        let report = ExecutionReport::new(result);
        let height = report.height(Self::width());
        Self::print_widget(&report, height)
    }

    pub fn show_execution_start(&self, command: &str) {
        if self.interactive {
            println!("\n{} {}", "▶️  Executing:".cyan(), command);
        } else {
            println!("Executing: {}", command);
        }
    }

    pub fn show_execution_complete(&self, result: &ExecutionResult) {
        match (result.success, self.interactive) {
            (true, true) => println!("{}\n", "✅ Command completed successfully.".green()),
            (true, false) => println!("Command completed successfully."),
            (false, true) => println!(
                "{}\n",
                format!("❌ Command failed (exit code {}).", result.exit_code).red()
            ),
            (false, false) => println!("Command failed (exit code {}).", result.exit_code),
        }
    }

    pub fn show_aborted(&self) {
        if self.interactive {
            println!("{}\n", "🛑 Execution aborted by user.".yellow());
        } else {
            println!("Execution aborted by user.");
        }
    }

    pub fn show_error(&self, message: &str) {
        if io::stderr().is_terminal() {
            eprintln!("{} {}", "❌ Error:".red(), message);
        } else {
            eprintln!("Error: {}", message);
        }
    }

    pub fn show_info(&self, message: &str) {
        if self.interactive {
            println!("{}", format!("ℹ️  {}", message).cyan());
        } else {
            println!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CommandAnalyzer;
    use crate::command::ParsedCommand;
    use crate::exec::CommandExecutor;

    fn analyze(cmd: &str) -> AnalysisResult {
        CommandAnalyzer::new()
            .analyze(&ParsedCommand::parse(cmd).unwrap())
            .unwrap()
    }

    fn buffer_text(buf: &Buffer) -> String {
        let width = usize::from(buf.area.width);
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render<W: Widget>(widget: W, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(level_color(DangerLevel::Safe), Color::Green);
        assert_eq!(level_color(DangerLevel::Medium), Color::Yellow);
        assert_eq!(level_color(DangerLevel::Critical), Color::Red);
    }

    #[test]
    fn test_analysis_report_lines() {
        let result = analyze("rm -rf /tmp/test");
        let report = AnalysisReport::new(&result);
        let text: Vec<String> = report.lines().iter().map(|l| l.to_string()).collect();

        assert_eq!(text[0], "Command: rm -rf /tmp/test");
        assert!(text[1].starts_with("Danger Level: HIGH"));
        assert!(text.iter().any(|l| l.contains("Suggestions:")));
        assert!(text.iter().any(|l| l.contains("→ rm -i -rf /tmp/test")));
    }

    #[test]
    fn test_analysis_report_lists_each_concern_once() {
        let mut result = analyze("rm -rf /tmp/test");
        let primary = result.primary_warning.clone();
        result.all_warnings = vec!["Minor concern.".to_string(), primary.clone()];

        let report = AnalysisReport::new(&result);
        let text: Vec<String> = report.lines().iter().map(|l| l.to_string()).collect();

        assert!(text.iter().any(|l| l == "  • Minor concern."));
        assert_eq!(text.iter().filter(|l| l.contains(primary.as_str())).count(), 1);
    }

    #[test]
    fn test_analysis_report_hides_suggestions() {
        let result = analyze("rm -rf /tmp/test");
        let report = AnalysisReport::new(&result).show_suggestions(false).max_alternatives(0);
        let text: Vec<String> = report.lines().iter().map(|l| l.to_string()).collect();

        assert!(!text.iter().any(|l| l.contains("Suggestions:")));
        assert!(!text.iter().any(|l| l.contains("→")));
    }

    #[test]
    fn test_analysis_report_safe_command() {
        let result = analyze("echo hello");
        let report = AnalysisReport::new(&result);
        let lines = report.lines();

        assert_eq!(lines.len(), 4);
        assert!(lines[3].to_string().contains("No safety concerns detected."));
    }

    #[test]
    fn test_analysis_report_renders_in_height() {
        let result = analyze("sudo rm -rf /etc");
        let report = AnalysisReport::new(&result);
        let height = report.height(60);
        let text = render(&report, 60, height);

        assert!(text.contains("Safety Analysis"));
        assert!(text.contains("CRITICAL"));
        assert!(height >= report.lines().len() as u16 + 2);
    }

    #[test]
    fn test_execution_report() {
        let executor = CommandExecutor::default();
        let mut result = executor.dry_run("ls");
        result.stderr = "warning".to_string();

        let report = ExecutionReport::new(&result);
        let text = render(&report, 70, report.height(70));
        assert!(text.contains("Command Output"));
        assert!(text.contains("✓ Success"));
        assert!(text.contains("[DRY RUN] Would execute: ls"));
        assert!(text.contains("Errors:"));
    }

    #[test]
    fn test_execution_report_failure() {
        let mut result = CommandExecutor::default().dry_run("false");
        result.success = false;
        result.exit_code = 1;
        result.stdout.clear();

        let report = ExecutionReport::new(&result);
        let text = render(&report, 60, report.height(60));
        assert!(text.contains("Failed (exit code: 1)"));
    }

    #[test]
    fn test_comparison_renders_both_sides() {
        let comparison = AlternativeComparison::new("rm -rf build", "rm -i -rf build");
        let text = render(&comparison, 80, comparison.height(80));

        assert!(text.contains("Original"));
        assert!(text.contains("Safe Alternative"));
        assert!(text.contains("rm -rf build"));
        assert!(text.contains("rm -i -rf build"));
    }

    #[test]
    fn test_wrapped_height_accounts_for_wrapping() {
        let long = "x".repeat(50);
        let lines = vec![Line::from(long.as_str()), Line::from("")];
        // 50 chars in 18 columns -> 3 rows, plus the empty line and borders
        assert_eq!(wrapped_height(&lines, 20), 6);
    }

    #[test]
    fn test_render_json() {
        let results = vec![analyze("ls"), analyze("git push --force origin main")];
        let json = render_json("ls; git push --force origin main", &results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["danger_level"], "CRITICAL");
        assert_eq!(value["requires_confirmation"], true);
        assert_eq!(value["segments"].as_array().unwrap().len(), 2);
        assert_eq!(value["segments"][1]["matches"][0]["rule_name"], "git_push_force");
    }

    #[test]
    fn test_render_json_empty() {
        let json = render_json("", &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["danger_level"], "SAFE");
    }
}
