use crate::command::ParsedCommand;
use crate::rules::base::{Rule, RuleMatch, RuleMatchError};
use crate::rules::flags::{
    path_is_dangerous, DANGEROUS_PERMISSIONS, FORCE_FLAGS, INTERACTIVE_FLAGS, RECURSIVE_FLAGS,
};
use crate::rules::level::DangerLevel;

/// `<command> -i <flags...> <args...>`
fn with_interactive_flag(command: &ParsedCommand) -> String {
    let tokens = std::iter::once(command.command())
        .chain(std::iter::once("-i"))
        .chain(command.flags().iter().map(String::as_str))
        .chain(command.args().iter().map(String::as_str));
    command.join(tokens)
}

fn any_dangerous_path<'a>(mut targets: impl Iterator<Item = &'a String>) -> bool {
    targets.any(|path| path_is_dangerous(path))
}

#[derive(Debug, Default)]
pub struct RmRule;

impl RmRule {
    fn danger_level(&self, command: &ParsedCommand) -> DangerLevel {
        let recursive = command.has_any_flag(RECURSIVE_FLAGS);
        let force = command.has_any_flag(FORCE_FLAGS);
        let interactive = command.has_any_flag(INTERACTIVE_FLAGS);
        let dangerous_path = any_dangerous_path(command.args().iter());
        let wildcard = command.args().iter().any(|path| path.contains('*'));

        if recursive && force && (dangerous_path || wildcard) {
            DangerLevel::Critical
        } else if (recursive && force) || (dangerous_path && !interactive) {
            DangerLevel::High
        } else if recursive || force {
            DangerLevel::Medium
        } else {
            DangerLevel::Low
        }
    }

    fn message(&self, command: &ParsedCommand) -> &'static str {
        let recursive = command.has_any_flag(RECURSIVE_FLAGS);
        let force = command.has_any_flag(FORCE_FLAGS);

        match (recursive, force) {
            (true, true) => {
                "This will permanently delete files recursively without prompting. \
                 This operation cannot be undone!"
            }
            (true, false) => "This will delete directories and all their contents recursively.",
            (false, true) => "This will force delete files without prompting for confirmation.",
            (false, false) if any_dangerous_path(command.args().iter()) => {
                "This targets system-critical directories. Deletion could break your system!"
            }
            (false, false) => "This will permanently delete files.",
        }
    }
}

impl Rule for RmRule {
    fn name(&self) -> &str {
        "rm_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous rm operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "rm"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let interactive = command.has_any_flag(INTERACTIVE_FLAGS);

        let (suggestion, alternative) = if interactive {
            (None, None)
        } else {
            (
                Some("Consider using -i or --interactive flag to confirm each deletion.".to_string()),
                Some(with_interactive_flag(command)),
            )
        };

        Ok(RuleMatch::new(self.name(), self.danger_level(command), self.message(command))?
            .with_suggestion(suggestion)
            .with_safe_alternative(alternative))
    }
}

#[derive(Debug, Default)]
pub struct MvRule;

impl Rule for MvRule {
    fn name(&self) -> &str {
        "mv_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous mv operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "mv"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let force = command.has_any_flag(FORCE_FLAGS);
        let interactive = command.has_any_flag(INTERACTIVE_FLAGS);
        let dangerous_path = any_dangerous_path(command.args().iter());

        let (level, message) = match (force, dangerous_path) {
            (true, true) => (
                DangerLevel::High,
                "Moving system-critical files with force flag could break your system!",
            ),
            (true, false) => (
                DangerLevel::Medium,
                "This will overwrite existing files without prompting.",
            ),
            (false, true) => (
                DangerLevel::Medium,
                "Moving system-critical files could cause issues.",
            ),
            (false, false) => (DangerLevel::Low, "This will move or rename files."),
        };

        let verdict = RuleMatch::new(self.name(), level, message)?;

        if (force || dangerous_path) && !interactive {
            return Ok(verdict
                .with_suggestion("Consider using -i flag to confirm overwrites.".to_string())
                .with_safe_alternative(with_interactive_flag(command)));
        }

        Ok(verdict)
    }
}

#[derive(Debug, Default)]
pub struct CpRule;

impl Rule for CpRule {
    fn name(&self) -> &str {
        "cp_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous cp operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "cp"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let recursive = command.has_any_flag(RECURSIVE_FLAGS);
        let force = command.has_any_flag(FORCE_FLAGS);

        let (level, message) = match (recursive, force) {
            (true, true) => (
                DangerLevel::Medium,
                "This will recursively copy and overwrite files without prompting.",
            ),
            (false, true) => (
                DangerLevel::Low,
                "This will overwrite existing files without prompting.",
            ),
            (true, false) => (DangerLevel::Low, "This will recursively copy directories."),
            (false, false) => (DangerLevel::Safe, "Standard file copy operation."),
        };

        let suggestion =
            force.then(|| "Consider using -i flag to confirm overwrites.".to_string());

        Ok(RuleMatch::new(self.name(), level, message)?.with_suggestion(suggestion))
    }
}

#[derive(Debug, Default)]
pub struct ChmodRule;

impl Rule for ChmodRule {
    fn name(&self) -> &str {
        "chmod_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous chmod operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "chmod"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let recursive = command.has_any_flag(RECURSIVE_FLAGS);
        let dangerous_perm = command
            .args()
            .iter()
            .any(|arg| DANGEROUS_PERMISSIONS.contains(&arg.as_str()));
        let dangerous_path = any_dangerous_path(
            command
                .args()
                .iter()
                .filter(|arg| !DANGEROUS_PERMISSIONS.contains(&arg.as_str())),
        );

        let (level, message) = match (dangerous_perm, recursive, dangerous_path) {
            (true, true, true) => (
                DangerLevel::Critical,
                "Setting world-writable permissions recursively on system paths is extremely dangerous!",
            ),
            (true, true, false) => (
                DangerLevel::High,
                "Setting world-writable permissions recursively can create security vulnerabilities.",
            ),
            (true, false, _) => (
                DangerLevel::Medium,
                "Setting world-writable permissions can create security vulnerabilities.",
            ),
            (false, true, true) => (
                DangerLevel::High,
                "Recursively changing permissions on system paths could break your system.",
            ),
            _ => (DangerLevel::Low, "This will change file permissions."),
        };

        let suggestion = dangerous_perm.then(|| {
            "Avoid 777 or 666 permissions. Use minimal necessary permissions (e.g., 755, 644)."
                .to_string()
        });

        Ok(RuleMatch::new(self.name(), level, message)?.with_suggestion(suggestion))
    }
}

/// Ownership changes carry no rewrite: the intended owner cannot be guessed.
#[derive(Debug, Default)]
pub struct ChownRule;

impl Rule for ChownRule {
    fn name(&self) -> &str {
        "chown_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous chown operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "chown"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let recursive = command.has_any_flag(RECURSIVE_FLAGS);
        let dangerous_path = any_dangerous_path(command.args().iter());

        let (level, message) = match (recursive, dangerous_path) {
            (true, true) => (
                DangerLevel::Critical,
                "Recursively changing ownership on system paths can break your system!",
            ),
            (false, true) => (
                DangerLevel::High,
                "Changing ownership of system files can cause serious issues.",
            ),
            (true, false) => (
                DangerLevel::Medium,
                "Recursively changing ownership affects all files in the directory tree.",
            ),
            (false, false) => (DangerLevel::Low, "This will change file ownership."),
        };

        RuleMatch::new(self.name(), level, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(rule: &dyn Rule, cmd: &str) -> RuleMatch {
        let parsed = ParsedCommand::parse(cmd).unwrap();
        assert!(rule.matches(&parsed), "{} should match {}", rule.name(), cmd);
        rule.analyze(&parsed).unwrap()
    }

    fn level(rule: &dyn Rule, cmd: &str) -> DangerLevel {
        analyze(rule, cmd).danger_level()
    }

    #[test]
    fn test_rm_matches_only_rm() {
        let rule = RmRule;
        assert!(rule.matches(&ParsedCommand::parse("rm file").unwrap()));
        assert!(!rule.matches(&ParsedCommand::parse("rmdir dir").unwrap()));
        assert!(!rule.matches(&ParsedCommand::parse("ls -la").unwrap()));
    }

    #[test]
    fn test_rm_levels() {
        let rule = RmRule;
        assert_eq!(level(&rule, "rm file.txt"), DangerLevel::Low);
        assert_eq!(level(&rule, "rm -f file.txt"), DangerLevel::Medium);
        assert_eq!(level(&rule, "rm -r /tmp/test"), DangerLevel::Medium);
        assert_eq!(level(&rule, "rm -rf /tmp/test"), DangerLevel::High);
        assert_eq!(level(&rule, "rm -rf /"), DangerLevel::Critical);
        assert_eq!(level(&rule, "rm -rf /usr/lib"), DangerLevel::Critical);
        assert_eq!(level(&rule, "rm -r -f build/*"), DangerLevel::Critical);
        assert_eq!(level(&rule, "rm --recursive --force /etc"), DangerLevel::Critical);
    }

    #[test]
    fn test_rm_dangerous_path_without_flags() {
        let rule = RmRule;
        let verdict = analyze(&rule, "rm /etc/hosts");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert!(verdict.message().contains("system-critical"));

        assert_eq!(level(&rule, "rm -i /etc/hosts"), DangerLevel::Low);
    }

    #[test]
    fn test_rm_alternative_inserts_interactive() {
        let verdict = analyze(&RmRule, "rm -rf /tmp/test");
        assert_eq!(verdict.safe_alternative(), Some("rm -i -rf /tmp/test"));
        assert!(verdict.suggestion().unwrap().contains("--interactive"));

        let verdict = analyze(&RmRule, "rm file.txt");
        assert_eq!(verdict.safe_alternative(), Some("rm -i file.txt"));
    }

    #[test]
    fn test_rm_alternative_keeps_quoted_home_literal() {
        let verdict = analyze(&RmRule, "rm -rf '~'");
        assert_eq!(verdict.safe_alternative(), Some("rm -i -rf '~'"));

        let verdict = analyze(&RmRule, "rm -rf ~/cache");
        assert_eq!(verdict.safe_alternative(), Some("rm -i -rf ~/cache"));
    }

    #[test]
    fn test_rm_interactive_has_no_alternative() {
        let verdict = analyze(&RmRule, "rm -ri old/");
        assert_eq!(verdict.suggestion(), None);
        assert_eq!(verdict.safe_alternative(), None);
    }

    #[test]
    fn test_rm_messages() {
        assert!(analyze(&RmRule, "rm -rf x").message().contains("cannot be undone"));
        assert!(analyze(&RmRule, "rm -r x").message().contains("recursively"));
        assert!(analyze(&RmRule, "rm -f x").message().contains("force delete"));
        assert_eq!(analyze(&RmRule, "rm x").message(), "This will permanently delete files.");
    }

    #[test]
    fn test_mv_levels_and_alternative() {
        let rule = MvRule;
        assert_eq!(level(&rule, "mv a b"), DangerLevel::Low);
        assert_eq!(level(&rule, "mv -f a b"), DangerLevel::Medium);
        assert_eq!(level(&rule, "mv /etc/hosts /tmp/hosts"), DangerLevel::Medium);
        assert_eq!(level(&rule, "mv -f /etc/hosts /tmp/hosts"), DangerLevel::High);

        let plain = analyze(&rule, "mv a b");
        assert_eq!(plain.suggestion(), None);
        assert_eq!(plain.safe_alternative(), None);

        let forced = analyze(&rule, "mv -f a b");
        assert_eq!(forced.safe_alternative(), Some("mv -i -f a b"));

        let interactive = analyze(&rule, "mv -i -f a b");
        assert_eq!(interactive.safe_alternative(), None);
    }

    #[test]
    fn test_cp_levels() {
        let rule = CpRule;
        assert_eq!(level(&rule, "cp a b"), DangerLevel::Safe);
        assert_eq!(level(&rule, "cp -r dir/ backup/"), DangerLevel::Low);
        assert_eq!(level(&rule, "cp -f a b"), DangerLevel::Low);
        assert_eq!(level(&rule, "cp -rf dir/ backup/"), DangerLevel::Medium);

        let verdict = analyze(&rule, "cp -rf dir/ backup/");
        assert!(verdict.suggestion().is_some());
        assert_eq!(verdict.safe_alternative(), None);
        assert_eq!(analyze(&rule, "cp -r dir/ backup/").suggestion(), None);
    }

    #[test]
    fn test_chmod_levels() {
        let rule = ChmodRule;
        assert_eq!(level(&rule, "chmod 644 file"), DangerLevel::Low);
        assert_eq!(level(&rule, "chmod 777 file.sh"), DangerLevel::Medium);
        assert_eq!(level(&rule, "chmod a+rwx file.sh"), DangerLevel::Medium);
        assert_eq!(level(&rule, "chmod -R 777 ./project"), DangerLevel::High);
        assert_eq!(level(&rule, "chmod -R 755 /usr/local"), DangerLevel::High);
        assert_eq!(level(&rule, "chmod -R 777 /etc"), DangerLevel::Critical);
        assert_eq!(level(&rule, "chmod 777 /etc"), DangerLevel::Medium);
    }

    #[test]
    fn test_chmod_suggestion_only_for_dangerous_permissions() {
        let risky = analyze(&ChmodRule, "chmod 666 notes.txt");
        assert!(risky.suggestion().unwrap().contains("minimal"));

        let fine = analyze(&ChmodRule, "chmod 600 notes.txt");
        assert_eq!(fine.suggestion(), None);
    }

    #[test]
    fn test_chown_levels() {
        let rule = ChownRule;
        assert_eq!(level(&rule, "chown user file"), DangerLevel::Low);
        assert_eq!(level(&rule, "chown -R user ./project"), DangerLevel::Medium);
        assert_eq!(level(&rule, "chown user /etc/passwd"), DangerLevel::High);
        assert_eq!(level(&rule, "chown -R user /usr"), DangerLevel::Critical);

        let verdict = analyze(&rule, "chown -R user /usr");
        assert_eq!(verdict.suggestion(), None);
        assert_eq!(verdict.safe_alternative(), None);
    }
}
