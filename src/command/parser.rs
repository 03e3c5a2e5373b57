use serde::Serialize;
use std::borrow::Cow;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Command cannot be empty")]
    Empty,

    #[error("Invalid command syntax: {0}")]
    InvalidSyntax(String),

    #[error("Command produced no tokens")]
    NoTokens,
}

/// Operators that make a command line more than a single simple command
const COMPOUND_OPERATORS: &[&str] = &["|", "&&", "||", ";", ">", ">>", "<"];

/// A tokenized shell command
///
/// `tokens[0]` is the command name; the remaining tokens are partitioned into
/// `flags` (tokens starting with `-`) and `args` (everything else), each in
/// its original relative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    raw: String,
    tokens: Vec<String>,
    command: String,
    args: Vec<String>,
    flags: Vec<String>,
    /// How each token was written in `raw`, quotes included; empty when unknown
    #[serde(skip)]
    spellings: Vec<String>,
}

impl ParsedCommand {
    /// Tokenize a raw command line
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let tokens = shlex::split(raw)
            .ok_or_else(|| ParseError::InvalidSyntax("unbalanced quotes or trailing escape".to_string()))?;

        Self::from_tokens(raw, tokens)
    }

    /// Build a command from already tokenized input
    pub fn from_tokens(raw: &str, tokens: Vec<String>) -> Result<Self, ParseError> {
        let (command, rest) = tokens.split_first().ok_or(ParseError::NoTokens)?;

        let (flags, args): (Vec<String>, Vec<String>) =
            rest.iter().cloned().partition(|token| token.starts_with('-'));

        let spellings = raw_spellings(raw, &tokens);

        Ok(Self {
            raw: raw.to_string(),
            command: command.clone(),
            tokens,
            args,
            flags,
            spellings,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Whether `arg` appears verbatim among the positional arguments
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Check if the command carries a flag
    ///
    /// Matches verbatim, by prefix (`--output=x` satisfies `--output`), and for
    /// single-character short flags also inside combined clusters (`-rf`
    /// satisfies both `-r` and `-f`).
    pub fn has_flag(&self, flag: &str) -> bool {
        if self.flags.iter().any(|f| f.starts_with(flag)) {
            return true;
        }

        if let Some(short) = short_flag_char(flag) {
            return self.flags.iter().any(|f| {
                !f.starts_with("--") && f.len() > 1 && f[1..].contains(short)
            });
        }

        false
    }

    pub fn has_any_flag(&self, flags: &[&str]) -> bool {
        flags.iter().any(|flag| self.has_flag(flag))
    }

    /// Get the value of a flag given as `--flag=value` or `--flag value`
    ///
    /// The second form looks up the flag's index within `flags` and reads the
    /// argument after that index in `args`. Because flags and args live in
    /// separate lists, this only lines up when no other flag precedes the
    /// requested one.
    pub fn get_flag_value(&self, flag: &str) -> Option<&str> {
        let prefix = format!("{}=", flag);
        if let Some(value) = self.flags.iter().find_map(|f| f.strip_prefix(prefix.as_str())) {
            return Some(value);
        }

        let idx = self.flags.iter().position(|f| f == flag)?;
        self.args.get(idx + 1).map(String::as_str)
    }

    /// Render the command with every token equal to `from` replaced by `to`
    pub fn replace_token(&self, from: &str, to: &str) -> String {
        let tokens = self
            .tokens
            .iter()
            .map(|t| if t == from { to } else { t.as_str() });
        self.join(tokens)
    }

    /// Render the command with all tokens in `remove` dropped
    pub fn without_tokens(&self, remove: &[&str]) -> String {
        let tokens = self
            .tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !remove.contains(t));
        self.join(tokens)
    }

    /// Render the command with `token` inserted right after the first `anchor`
    ///
    /// Falls back to appending when the anchor is absent.
    pub fn insert_after(&self, anchor: &str, token: &str) -> String {
        let mut tokens: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        match tokens.iter().position(|t| *t == anchor) {
            Some(idx) => tokens.insert(idx + 1, token),
            None => tokens.push(token),
        }
        self.join(tokens)
    }

    /// Join tokens into a command line, reusing how this command spelled them
    ///
    /// A token taken from this command keeps its original quoting, so `'~'`
    /// stays quoted and a bare `/tmp/*` stays a glob. Any other token is
    /// quoted whenever the shell would treat it specially.
    pub fn join<'a, I>(&self, tokens: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .map(|token| self.spelling_of(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Original spelling of `token`, or a quoted form when it is new or was
    /// written more than one way
    fn spelling_of<'a>(&'a self, token: &'a str) -> Cow<'a, str> {
        let mut spellings = self
            .tokens
            .iter()
            .zip(&self.spellings)
            .filter(|(t, _)| t.as_str() == token)
            .map(|(_, spelling)| spelling.as_str());

        match spellings.next() {
            Some(first) if spellings.all(|other| other == first) => Cow::Borrowed(first),
            _ => quote_token(token),
        }
    }
}

impl FromStr for ParsedCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `-x` -> `Some('x')`; anything else -> `None`
fn short_flag_char(flag: &str) -> Option<char> {
    let mut chars = flag.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('-'), Some(c), None) if c != '-' => Some(c),
        _ => None,
    }
}

/// Join tokens back into a command line, quoting anything the shell would
/// expand or split
///
/// Glob and tilde characters are quoted too, so a literal `*` or `~` never
/// turns into an expansion. Use [`ParsedCommand::join`] to keep the user's
/// own spelling.
pub fn join_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .map(quote_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_token(token: &str) -> Cow<'_, str> {
    let bare = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,^".contains(c));

    if bare {
        return Cow::Borrowed(token);
    }

    shlex::try_quote(token).unwrap_or(Cow::Borrowed(token))
}

/// Split `raw` into words as written, one per token
///
/// Every word must lex back to exactly its token; otherwise (comments, odd
/// escapes) nothing is returned and rewrites fall back to quoting.
fn raw_spellings(raw: &str, tokens: &[String]) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for (c, quoted) in scan_quotes(raw) {
        if !quoted && c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let faithful = words.len() == tokens.len()
        && words
            .iter()
            .zip(tokens)
            .all(|(word, token)| shlex::split(word).is_some_and(|lexed| lexed == [token.as_str()]));

    if faithful { words } else { Vec::new() }
}

/// Parser for shell command lines
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, command: &str) -> Result<ParsedCommand, ParseError> {
        ParsedCommand::parse(command)
    }

    /// Check for pipes, redirects, or command separators outside of quotes
    pub fn is_compound_command(&self, command: &str) -> bool {
        let unquoted = unquoted_text(command);
        COMPOUND_OPERATORS.iter().any(|op| unquoted.contains(op))
    }

    /// Split a compound command line on `|`, `;` and `&` outside of quotes
    pub fn split_compound_command(&self, command: &str) -> Vec<String> {
        self.split_compound_spans(command)
            .into_iter()
            .map(|span| command[span].to_string())
            .collect()
    }

    /// Byte ranges of each part of a compound line, surrounding whitespace excluded
    pub fn split_compound_spans(&self, command: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut start = 0;

        for ((idx, c), (_, quoted)) in command.char_indices().zip(scan_quotes(command)) {
            if !quoted && matches!(c, '|' | ';' | '&') {
                spans.push(start..idx);
                start = idx + c.len_utf8();
            }
        }
        spans.push(start..command.len());

        spans
            .into_iter()
            .filter_map(|span| trim_span(command, span))
            .collect()
    }
}

fn trim_span(text: &str, span: Range<usize>) -> Option<Range<usize>> {
    let part = &text[span.clone()];
    let start = span.start + (part.len() - part.trim_start().len());
    let end = start + part.trim().len();
    (start < end).then_some(start..end)
}

/// Characters of `command` that sit outside any quoting, quoted ones blanked
fn unquoted_text(command: &str) -> String {
    scan_quotes(command)
        .map(|(c, quoted)| if quoted { ' ' } else { c })
        .collect()
}

/// Pair every character with whether it is quoted or escaped
fn scan_quotes(command: &str) -> impl Iterator<Item = (char, bool)> + '_ {
    let mut single = false;
    let mut double = false;
    let mut escaped = false;

    command.chars().map(move |c| {
        if escaped {
            escaped = false;
            return (c, true);
        }
        match c {
            '\\' if !single => {
                escaped = true;
                (c, true)
            }
            '\'' if !double => {
                single = !single;
                (c, true)
            }
            '"' if !single => {
                double = !double;
                (c, true)
            }
            _ => (c, single || double),
        }
    })
}
