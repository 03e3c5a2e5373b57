use crate::command::ParsedCommand;
use crate::rules::base::{Rule, RuleMatch, RuleMatchError};
use crate::rules::level::DangerLevel;

const PROTECTED_BRANCHES: &[&str] = &["main", "master", "origin/main", "origin/master"];

fn is_git_subcommand(command: &ParsedCommand, subcommand: &str) -> bool {
    command.command() == "git" && command.has_arg(subcommand)
}

fn has_exact_flag(command: &ParsedCommand, flag: &str) -> bool {
    command.flags().iter().any(|f| f == flag)
}

#[derive(Debug, Default)]
pub struct GitResetRule;

impl Rule for GitResetRule {
    fn name(&self) -> &str {
        "git_reset"
    }

    fn description(&self) -> &str {
        "Detects dangerous git reset operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_git_subcommand(command, "reset")
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let hard = has_exact_flag(command, "--hard");
        let soft = has_exact_flag(command, "--soft");
        let explicit_mixed = has_exact_flag(command, "--mixed");
        let mixed = explicit_mixed || (!hard && !soft);

        let moves_head = command
            .args()
            .iter()
            .any(|arg| arg.contains("HEAD~") || arg.contains("HEAD^"));

        if hard {
            let (level, message) = if moves_head {
                (
                    DangerLevel::Critical,
                    "This will permanently discard all uncommitted changes \
                     and reset to a previous commit. All work will be lost!",
                )
            } else {
                (
                    DangerLevel::High,
                    "This will permanently discard all uncommitted changes. \
                     Staged and unstaged changes will be lost!",
                )
            };

            return Ok(RuleMatch::new(self.name(), level, message)?
                .with_suggestion(
                    "Use 'git stash' to save your changes first, or 'git reset --soft' to keep changes."
                        .to_string(),
                )
                .with_safe_alternative(command.replace_token("--hard", "--soft")));
        }

        if mixed {
            let alternative = if explicit_mixed {
                command.replace_token("--mixed", "--soft")
            } else {
                command.insert_after("reset", "--soft")
            };

            return Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "This will unstage changes but keep them in your working directory.",
            )?
            .with_suggestion("Use 'git reset --soft' if you want to keep changes staged.".to_string())
            .with_safe_alternative(alternative));
        }

        RuleMatch::new(
            self.name(),
            DangerLevel::Low,
            "This will move HEAD but keep all changes staged.",
        )
    }
}

#[derive(Debug, Default)]
pub struct GitPushForceRule;

impl GitPushForceRule {
    fn with_lease(command: &ParsedCommand) -> String {
        command.join(command.tokens().iter().map(|token| match token.as_str() {
            "--force" | "-f" => "--force-with-lease",
            other => other,
        }))
    }
}

impl Rule for GitPushForceRule {
    fn name(&self) -> &str {
        "git_push_force"
    }

    fn description(&self) -> &str {
        "Detects dangerous force push operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_git_subcommand(command, "push")
            && command.has_any_flag(&["--force", "-f", "--force-with-lease"])
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let lease = command.has_flag("--force-with-lease");
        let protected = command
            .args()
            .iter()
            .any(|arg| PROTECTED_BRANCHES.contains(&arg.as_str()));

        if lease {
            return Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "Force pushing will rewrite history. --force-with-lease provides \
                 some safety by checking remote hasn't changed.",
            )?
            .with_suggestion("Make sure no one else is working on this branch.".to_string()));
        }

        let verdict = if protected {
            RuleMatch::new(
                self.name(),
                DangerLevel::Critical,
                "Force pushing to main/master branch will rewrite history \
                 and could break the repository for all team members!",
            )?
            .with_suggestion(
                "Use --force-with-lease instead of --force for safer forced pushes. \
                 Or better yet, avoid force pushing to main branches."
                    .to_string(),
            )
        } else {
            RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "Force pushing will rewrite remote history and could lose commits \
                 from other team members.",
            )?
            .with_suggestion("Use --force-with-lease instead for safer forced pushes.".to_string())
        };

        Ok(verdict.with_safe_alternative(Self::with_lease(command)))
    }
}

#[derive(Debug, Default)]
pub struct GitCleanRule;

impl GitCleanRule {
    /// (force, directories, ignored), with combined short flags unioned
    fn options(command: &ParsedCommand) -> (bool, bool, bool) {
        let short: String = command
            .flags()
            .iter()
            .filter(|f| !f.starts_with("--"))
            .flat_map(|f| f.chars().skip(1))
            .collect();

        let force = short.contains('f') || has_exact_flag(command, "--force");
        let dirs = short.contains('d');
        let ignored = short.contains('x') || short.contains('X');

        (force, dirs, ignored)
    }
}

impl Rule for GitCleanRule {
    fn name(&self) -> &str {
        "git_clean"
    }

    fn description(&self) -> &str {
        "Detects dangerous git clean operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_git_subcommand(command, "clean")
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let (level, message, preview) = match Self::options(command) {
            (true, true, true) => (
                DangerLevel::Critical,
                "This will permanently delete ALL untracked files and directories, \
                 including ignored files. This cannot be undone!",
                "git clean -fdxn",
            ),
            (true, true, false) => (
                DangerLevel::High,
                "This will permanently delete all untracked files and directories. \
                 This cannot be undone!",
                "git clean -fdn",
            ),
            (true, false, _) => (
                DangerLevel::Medium,
                "This will permanently delete untracked files.",
                "git clean -fn",
            ),
            (false, _, _) => {
                return RuleMatch::new(
                    self.name(),
                    DangerLevel::Low,
                    "Use -f flag to actually delete files (dry run mode).",
                );
            }
        };

        Ok(RuleMatch::new(self.name(), level, message)?
            .with_suggestion(format!("Run '{}' first to see what would be deleted.", preview))
            .with_safe_alternative(preview.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct GitBranchDeleteRule;

impl Rule for GitBranchDeleteRule {
    fn name(&self) -> &str {
        "git_branch_delete"
    }

    fn description(&self) -> &str {
        "Detects force deletion of git branches"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_git_subcommand(command, "branch") && has_exact_flag(command, "-D")
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        Ok(RuleMatch::new(
            self.name(),
            DangerLevel::High,
            "Force deleting a branch will remove it even if it contains unmerged changes. \
             This could result in lost commits!",
        )?
        .with_suggestion(
            "Use 'git branch -d' (lowercase) to safely delete only merged branches.".to_string(),
        )
        .with_safe_alternative(command.replace_token("-D", "-d")))
    }
}
