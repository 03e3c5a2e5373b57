use crate::analysis::AnalysisResult;
use crate::rules::DangerLevel;
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Stylize,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, BufRead, Write};

const ABORT: &str = "Abort";
const CONTINUE: &str = "Continue";
const CONTINUE_ANYWAY: &str = "Continue anyway";
const VIEW_ALTERNATIVE: &str = "View safe alternative";
const USE_ORIGINAL: &str = "Use original command";

/// User's answer to the safety prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Abort,
    Continue,
    ViewAlternative,
}

/// User's pick from the list of safe alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlternativeChoice {
    Use(String),
    Original,
    Abort,
}

/// Low-level questions asked of the user
///
/// Implementations return `io::ErrorKind::Interrupted` when the user cancels
/// with Ctrl-C.
pub trait Prompter {
    /// Index of the chosen entry in `choices`
    fn select(&mut self, question: &str, choices: &[&str], default: usize) -> io::Result<usize>;

    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool>;

    /// A banner shown before the question
    fn notice(&mut self, message: &str, level: DangerLevel) -> io::Result<()>;
}

fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "Interrupted by user")
}

/// What a key press does to a selection list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    Redraw,
    Submit,
    Cancel,
    Ignore,
}

/// Cursor over a fixed list of choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectState {
    selected: usize,
    len: usize,
}

impl SelectState {
    pub fn new(len: usize, default: usize) -> Self {
        Self {
            selected: default.min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Arrow keys and j/k move (wrapping), digits jump, Enter submits,
    /// Esc and Ctrl-C cancel
    pub fn handle_key(&mut self, key: KeyEvent) -> SelectAction {
        if self.len == 0 {
            return SelectAction::Cancel;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => SelectAction::Cancel,
            KeyCode::Esc => SelectAction::Cancel,
            KeyCode::Enter => SelectAction::Submit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = (self.selected + self.len - 1) % self.len;
                SelectAction::Redraw
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.len;
                SelectAction::Redraw
            }
            KeyCode::Char(c) => match c.to_digit(10).map(|d| d as usize) {
                Some(n) if (1..=self.len).contains(&n) => {
                    self.selected = n - 1;
                    SelectAction::Redraw
                }
                _ => SelectAction::Ignore,
            },
            _ => SelectAction::Ignore,
        }
    }
}

/// Disables raw mode when dropped, including on early return
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Arrow-key prompts on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_key() -> io::Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key);
                }
            }
        }
    }

    fn draw_choices(out: &mut impl Write, choices: &[&str], selected: usize) -> io::Result<()> {
        for (i, choice) in choices.iter().enumerate() {
            if i == selected {
                write!(out, "  {} {}\r\n", "❯".cyan(), choice.cyan().bold())?;
            } else {
                write!(out, "    {}\r\n", choice)?;
            }
        }
        out.flush()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, question: &str, choices: &[&str], default: usize) -> io::Result<usize> {
        let mut state = SelectState::new(choices.len(), default);
        let mut out = io::stdout();

        let _guard = RawModeGuard::enable()?;
        write!(out, "{} {}\r\n", "?".green().bold(), question.bold())?;
        Self::draw_choices(&mut out, choices, state.selected())?;

        loop {
            match state.handle_key(Self::read_key()?) {
                SelectAction::Redraw => {
                    let rows = u16::try_from(choices.len()).unwrap_or(u16::MAX);
                    queue!(out, MoveUp(rows), MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
                    Self::draw_choices(&mut out, choices, state.selected())?;
                }
                SelectAction::Submit => return Ok(state.selected()),
                SelectAction::Cancel => return Err(interrupted()),
                SelectAction::Ignore => {}
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let mut out = io::stdout();

        let _guard = RawModeGuard::enable()?;
        write!(out, "{} {} ", question.yellow(), hint)?;
        out.flush()?;

        let answer = loop {
            let key = Self::read_key()?;
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    write!(out, "\r\n")?;
                    return Err(interrupted());
                }
                KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => break false,
                KeyCode::Enter => break default,
                _ => {}
            }
        };

        write!(out, "{}\r\n", if answer { "yes" } else { "no" })?;
        out.flush()?;
        Ok(answer)
    }

    fn notice(&mut self, message: &str, level: DangerLevel) -> io::Result<()> {
        let styled = match level {
            DangerLevel::High | DangerLevel::Critical => message.red().bold(),
            _ => message.yellow().bold(),
        };
        println!("\n{}", styled);
        Ok(())
    }
}

/// Numbered prompts over any line-oriented reader, for non-terminal input
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` at end of input
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, question: &str, choices: &[&str], default: usize) -> io::Result<usize> {
        let default = default.min(choices.len().saturating_sub(1));

        writeln!(self.output, "{}", question)?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, choice)?;
        }

        loop {
            write!(self.output, "Choose [1-{}] (default {}): ", choices.len(), default + 1)?;
            self.output.flush()?;

            let Some(answer) = self.read_answer()? else {
                return Err(interrupted());
            };
            if answer.is_empty() {
                return Ok(default);
            }

            let by_number = answer
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=choices.len()).contains(n))
                .map(|n| n - 1);
            let by_name = choices.iter().position(|c| c.eq_ignore_ascii_case(&answer));

            match by_number.or(by_name) {
                Some(index) => return Ok(index),
                None => writeln!(self.output, "Invalid choice: {}", answer)?,
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        loop {
            write!(self.output, "{} {} ", question, hint)?;
            self.output.flush()?;

            let Some(answer) = self.read_answer()? else {
                return Err(interrupted());
            };

            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn notice(&mut self, message: &str, _level: DangerLevel) -> io::Result<()> {
        writeln!(self.output, "\n{}", message)
    }
}

/// Safety dialogue: how strongly to ask depends on the danger level
#[derive(Debug)]
pub struct UserPrompt<P> {
    prompter: P,
}

impl<P: Prompter> UserPrompt<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }

    pub fn into_inner(self) -> P {
        self.prompter
    }

    /// Ask whether to run an analyzed command
    ///
    /// `skip_prompt` (from `--yes`) and SAFE/LOW commands continue without asking.
    /// "View safe alternative" is offered only when `alternatives` is not empty.
    pub fn confirm_execution(
        &mut self,
        result: &AnalysisResult,
        alternatives: &[String],
        skip_prompt: bool,
    ) -> io::Result<PromptResponse> {
        if skip_prompt || result.is_safe() {
            return Ok(PromptResponse::Continue);
        }

        let offer = !alternatives.is_empty();
        match result.danger_level {
            DangerLevel::Critical => self.critical_prompt(offer),
            DangerLevel::High => self.high_prompt(offer),
            DangerLevel::Medium => self.medium_prompt(offer),
            DangerLevel::Safe | DangerLevel::Low => Ok(PromptResponse::Continue),
        }
    }

    fn choose(&mut self, question: &str, choices: &[&str]) -> io::Result<&'static str> {
        let index = self.prompter.select(question, choices, 0)?;
        Ok(match choices.get(index).copied() {
            Some(CONTINUE) => CONTINUE,
            Some(CONTINUE_ANYWAY) => CONTINUE_ANYWAY,
            Some(VIEW_ALTERNATIVE) => VIEW_ALTERNATIVE,
            _ => ABORT,
        })
    }

    fn critical_prompt(&mut self, offer_alternative: bool) -> io::Result<PromptResponse> {
        self.prompter.notice(
            "⚠️  CRITICAL DANGER - This action could cause severe damage!",
            DangerLevel::Critical,
        )?;

        let choices: &[&str] = if offer_alternative {
            self.prompter.notice(
                "Consider using a safe alternative instead.",
                DangerLevel::Medium,
            )?;
            &[ABORT, VIEW_ALTERNATIVE, CONTINUE_ANYWAY]
        } else {
            &[ABORT, CONTINUE_ANYWAY]
        };

        Ok(match self.choose("How would you like to proceed?", choices)? {
            VIEW_ALTERNATIVE => PromptResponse::ViewAlternative,
            CONTINUE_ANYWAY => PromptResponse::Continue,
            _ => PromptResponse::Abort,
        })
    }

    fn high_prompt(&mut self, offer_alternative: bool) -> io::Result<PromptResponse> {
        self.prompter
            .notice("⚠️  HIGH RISK - Proceed with caution!", DangerLevel::High)?;

        if !offer_alternative {
            return Ok(if self.prompter.confirm("Continue anyway?", false)? {
                PromptResponse::Continue
            } else {
                PromptResponse::Abort
            });
        }

        match self.choose(
            "How would you like to proceed?",
            &[ABORT, CONTINUE_ANYWAY, VIEW_ALTERNATIVE],
        )? {
            VIEW_ALTERNATIVE => Ok(PromptResponse::ViewAlternative),
            CONTINUE_ANYWAY => {
                if self.prompter.confirm("Are you sure you want to continue?", false)? {
                    Ok(PromptResponse::Continue)
                } else {
                    Ok(PromptResponse::Abort)
                }
            }
            _ => Ok(PromptResponse::Abort),
        }
    }

    fn medium_prompt(&mut self, offer_alternative: bool) -> io::Result<PromptResponse> {
        if !offer_alternative {
            return Ok(if self.prompter.confirm("Continue with execution?", true)? {
                PromptResponse::Continue
            } else {
                PromptResponse::Abort
            });
        }

        Ok(match self.choose(
            "⚠️  How would you like to proceed?",
            &[CONTINUE, VIEW_ALTERNATIVE, ABORT],
        )? {
            CONTINUE => PromptResponse::Continue,
            VIEW_ALTERNATIVE => PromptResponse::ViewAlternative,
            _ => PromptResponse::Abort,
        })
    }

    /// Offer each alternative, then "use original" and "abort"
    pub fn choose_alternative(&mut self, alternatives: &[String]) -> io::Result<AlternativeChoice> {
        let mut choices: Vec<&str> = alternatives.iter().map(String::as_str).collect();
        choices.extend([USE_ORIGINAL, ABORT]);

        let index = self
            .prompter
            .select("Available Safe Alternatives:", &choices, 0)?;

        Ok(match alternatives.get(index) {
            Some(alternative) => AlternativeChoice::Use(alternative.clone()),
            None if index == alternatives.len() => AlternativeChoice::Original,
            None => AlternativeChoice::Abort,
        })
    }
}
