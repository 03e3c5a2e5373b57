use crate::command::ParsedCommand;
use crate::rules::flags::{strip_flag, FORCE_FLAGS, INTERACTIVE_FLAGS};

/// Derives a safer command line from flag heuristics alone
///
/// Independent of the rule registry: rules explain the risk, the generator
/// only proposes a rewrite for the handful of commands it understands.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlternativeGenerator;

impl AlternativeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// The primary safer rewrite, if there is one
    pub fn generate(&self, command: &ParsedCommand) -> Option<String> {
        match command.command() {
            "rm" => Self::safe_rm(command),
            "mv" => Self::safe_mv(command),
            "cp" => Self::safe_cp(command),
            "chmod" => Self::safe_chmod(command),
            // ownership intent can't be guessed; rule suggestions cover it
            "chown" => None,
            _ => None,
        }
    }

    /// The primary rewrite followed by command-specific tips, at most `count` entries
    pub fn generate_multiple(&self, command: &ParsedCommand, count: usize) -> Vec<String> {
        let mut alternatives: Vec<String> = self.generate(command).into_iter().collect();

        match command.command() {
            "rm" => alternatives.push(format!(
                "# Move to trash instead: mv {} ~/.Trash/",
                command.join(command.args().iter().map(String::as_str))
            )),
            "chmod" => alternatives.push(
                "# Use more specific permissions: 644 for files, 755 for executables".to_string(),
            ),
            _ => {}
        }

        alternatives.truncate(count);
        alternatives
    }

    fn safe_rm(command: &ParsedCommand) -> Option<String> {
        if command.has_any_flag(INTERACTIVE_FLAGS) {
            return None;
        }
        let flags: Vec<String> = command.flags().to_vec();
        Some(Self::interactive(command, &flags))
    }

    fn safe_mv(command: &ParsedCommand) -> Option<String> {
        if command.has_any_flag(INTERACTIVE_FLAGS) {
            return None;
        }
        Some(Self::interactive(command, &Self::without_force(command)))
    }

    fn safe_cp(command: &ParsedCommand) -> Option<String> {
        if command.has_any_flag(INTERACTIVE_FLAGS) || !command.has_any_flag(FORCE_FLAGS) {
            return None;
        }
        Some(Self::interactive(command, &Self::without_force(command)))
    }

    fn safe_chmod(command: &ParsedCommand) -> Option<String> {
        let mut changed = false;
        let args: Vec<&str> = command
            .args()
            .iter()
            .map(|arg| match arg.as_str() {
                "777" | "a+rwx" | "ugo+rwx" => {
                    changed = true;
                    "755"
                }
                "666" => {
                    changed = true;
                    "644"
                }
                other => other,
            })
            .collect();

        if !changed {
            return None;
        }

        let tokens = std::iter::once(command.command())
            .chain(command.flags().iter().map(String::as_str))
            .chain(args);
        Some(command.join(tokens))
    }

    /// Flags with every force option removed, clusters included
    fn without_force(command: &ParsedCommand) -> Vec<String> {
        command
            .flags()
            .iter()
            .filter_map(|flag| strip_flag(flag, &['f', 'F'], &["--force"]))
            .collect()
    }

    /// `<command> -i <flags...> <args...>`
    fn interactive(command: &ParsedCommand, flags: &[String]) -> String {
        let tokens = [command.command(), "-i"]
            .into_iter()
            .chain(flags.iter().map(String::as_str))
            .chain(command.args().iter().map(String::as_str));
        command.join(tokens)
    }
}
