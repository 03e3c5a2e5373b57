use crate::command::ParsedCommand;
use crate::rules::base::{Rule, RuleMatch, RuleMatchError};
use crate::rules::flags::without_options;
use crate::rules::level::DangerLevel;

const VOLUME_LISTING: &str = "docker volume ls";

/// Management groups that prefix a subcommand, as in `docker container rm`
const GROUP_WORDS: &[&str] = &["container", "image"];

fn is_docker(command: &ParsedCommand, subcommands: &[&str]) -> bool {
    command.command() == "docker" && subcommands.iter().all(|sub| command.has_arg(sub))
}

fn has_exact_flag(command: &ParsedCommand, flags: &[&str]) -> bool {
    command.flags().iter().any(|f| flags.contains(&f.as_str()))
}

/// Positional arguments other than the docker subcommand and its group
fn targets<'a>(command: &'a ParsedCommand, subcommand: &str) -> Vec<&'a str> {
    command
        .args()
        .iter()
        .map(String::as_str)
        .filter(|arg| *arg != subcommand && !GROUP_WORDS.contains(arg))
        .collect()
}

fn is_multiple(targets: &[&str]) -> bool {
    targets.len() > 1 || targets.iter().any(|t| t.contains('*'))
}

#[derive(Debug, Default)]
pub struct DockerSystemPruneRule;

impl Rule for DockerSystemPruneRule {
    fn name(&self) -> &str {
        "docker_system_prune"
    }

    fn description(&self) -> &str {
        "Detects dangerous docker system prune operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_docker(command, &["system", "prune"])
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let all = command.has_any_flag(&["-a", "--all"]);
        let volumes = has_exact_flag(command, &["--volumes"]);
        let force = command.has_any_flag(&["-f", "--force"]);

        let (level, message, suggestion, alternative) = match (all, volumes) {
            (true, true) => (
                DangerLevel::Critical,
                "This will remove ALL unused containers, networks, images (both dangling and unused), \
                 AND volumes. This includes data volumes which could contain important data!",
                "Run without --volumes first, then manually clean volumes if needed.",
                Some(without_options(command, &[], &["--volumes", "--force"])),
            ),
            (true, false) => (
                DangerLevel::High,
                "This will remove ALL unused containers, networks, and images \
                 (including non-dangling images). You may lose important images!",
                "Run without --all to only remove dangling images.",
                Some(without_options(command, &['a'], &["--all", "--force"])),
            ),
            (false, true) => (
                DangerLevel::High,
                "This will remove unused volumes which may contain important data. \
                 Volume data cannot be recovered!",
                "List volumes first with 'docker volume ls' and remove specific ones.",
                Some(VOLUME_LISTING.to_string()),
            ),
            (false, false) => (
                DangerLevel::Medium,
                "This will remove unused containers, networks, and dangling images. \
                 Active resources won't be affected.",
                "Review what will be removed with 'docker system df' first.",
                None,
            ),
        };

        if !force {
            return Ok(RuleMatch::new(self.name(), level, message)?
                .with_suggestion(suggestion.to_string())
                .with_safe_alternative(alternative));
        }

        let message = format!(
            "{} The --force flag skips the confirmation prompt, making accidental data loss more likely.",
            message
        );

        Ok(RuleMatch::new(self.name(), level.escalate(), message)?
            .with_suggestion("Remove --force to review what will be deleted before proceeding.".to_string())
            .with_safe_alternative(without_options(command, &['f'], &["--force"])))
    }
}

#[derive(Debug, Default)]
pub struct DockerRmRule;

impl Rule for DockerRmRule {
    fn name(&self) -> &str {
        "docker_rm"
    }

    fn description(&self) -> &str {
        "Detects dangerous docker rm operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_docker(command, &["rm"])
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let force = command.has_any_flag(&["-f", "--force"]);
        let volumes = command.has_any_flag(&["-v", "--volumes"]);
        let containers = targets(command, "rm");
        let multiple = is_multiple(&containers);

        let stop = || {
            command.join(["docker", "stop"].into_iter().chain(containers.iter().copied()))
        };

        if force && volumes && multiple {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Critical,
                "This will force remove multiple containers AND their associated volumes. \
                 Data in volumes will be permanently lost!",
            )?
            .with_suggestion(
                "Remove force and volumes flags, stop containers first with 'docker stop'.".to_string(),
            )
            .with_safe_alternative(stop()))
        } else if force && multiple {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "Force removing multiple containers will stop and remove them immediately. \
                 Running containers will be killed!",
            )?
            .with_suggestion("Stop containers gracefully first with 'docker stop'.".to_string())
            .with_safe_alternative(stop()))
        } else if volumes {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "This will remove the container and its associated volumes. \
                 Data in volumes will be permanently lost!",
            )?
            .with_suggestion("Remove the -v/--volumes flag to preserve volume data.".to_string())
            .with_safe_alternative(without_options(command, &['v'], &["--volumes"])))
        } else if force {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "Force removing will stop and remove the container immediately.",
            )?
            .with_suggestion(
                "Stop the container first with 'docker stop' for graceful shutdown.".to_string(),
            )
            .with_safe_alternative(stop()))
        } else {
            RuleMatch::new(
                self.name(),
                DangerLevel::Low,
                "This will remove stopped container(s).",
            )
        }
    }
}

#[derive(Debug, Default)]
pub struct DockerRmiRule;

impl Rule for DockerRmiRule {
    fn name(&self) -> &str {
        "docker_rmi"
    }

    fn description(&self) -> &str {
        "Detects dangerous docker rmi operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_docker(command, &["rmi"])
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let force = has_exact_flag(command, &["-f", "--force"]);
        let multiple = is_multiple(&targets(command, "rmi"));

        match (force, multiple) {
            (true, true) => Ok(RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "Force removing multiple images will delete them even if containers are using them. \
                 This could break running applications!",
            )?
            .with_suggestion("Remove the -f/--force flag and handle used images manually.".to_string())
            .with_safe_alternative(command.without_tokens(&["-f", "--force"]))),
            (true, false) => Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "Force removing will delete the image even if containers are using it. \
                 This could break running containers!",
            )?
            .with_suggestion("Remove the -f flag to see if image is in use.".to_string())
            .with_safe_alternative(command.without_tokens(&["-f", "--force"]))),
            (false, true) => Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "This will remove multiple Docker images. Make sure they're not needed.",
            )?
            .with_suggestion("Use 'docker images' to review images before removing.".to_string())),
            (false, false) => {
                RuleMatch::new(self.name(), DangerLevel::Low, "This will remove a Docker image.")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DockerVolumePruneRule;

impl Rule for DockerVolumePruneRule {
    fn name(&self) -> &str {
        "docker_volume_prune"
    }

    fn description(&self) -> &str {
        "Detects dangerous docker volume prune operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        is_docker(command, &["volume", "prune"])
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        const BASE: &str = "This will permanently delete ALL unused Docker volumes and their data. \
                            Volume data cannot be recovered! This includes volumes that might be needed later.";

        let verdict = if has_exact_flag(command, &["-f", "--force"]) {
            RuleMatch::new(
                self.name(),
                DangerLevel::Critical,
                format!(
                    "{} The --force flag skips the confirmation prompt, increasing the risk of accidental data loss.",
                    BASE
                ),
            )?
            .with_suggestion("Remove --force so you can review what will be deleted first.".to_string())
        } else {
            RuleMatch::new(self.name(), DangerLevel::High, BASE)?.with_suggestion(
                "List volumes first with 'docker volume ls' and remove specific ones. \
                 Or back up important data before pruning."
                    .to_string(),
            )
        };

        Ok(verdict.with_safe_alternative(VOLUME_LISTING.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: &str) -> ParsedCommand {
        ParsedCommand::parse(cmd).unwrap()
    }

    fn analyze(rule: &dyn Rule, cmd: &str) -> RuleMatch {
        let parsed = parse(cmd);
        assert!(rule.matches(&parsed), "{} should match {}", rule.name(), cmd);
        rule.analyze(&parsed).unwrap()
    }

    #[test]
    fn test_system_prune_matches() {
        assert!(DockerSystemPruneRule.matches(&parse("docker system prune")));
        assert!(!DockerSystemPruneRule.matches(&parse("docker system df")));
        assert!(!DockerSystemPruneRule.matches(&parse("docker image prune")));
    }

    #[test]
    fn test_system_prune_levels() {
        let verdict = analyze(&DockerSystemPruneRule, "docker system prune");
        assert_eq!(verdict.danger_level(), DangerLevel::Medium);
        assert_eq!(verdict.safe_alternative(), None);

        let verdict = analyze(&DockerSystemPruneRule, "docker system prune -a");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert_eq!(verdict.safe_alternative(), Some("docker system prune"));

        let verdict = analyze(&DockerSystemPruneRule, "docker system prune --volumes");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert_eq!(verdict.safe_alternative(), Some("docker volume ls"));

        let verdict = analyze(&DockerSystemPruneRule, "docker system prune -a --volumes");
        assert_eq!(verdict.danger_level(), DangerLevel::Critical);
        assert!(verdict.message().contains("AND volumes"));
        assert_eq!(verdict.safe_alternative(), Some("docker system prune -a"));
    }

    #[test]
    fn test_system_prune_force_escalates() {
        let verdict = analyze(&DockerSystemPruneRule, "docker system prune --force");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert!(verdict.message().contains("--force flag skips"));
        assert_eq!(verdict.safe_alternative(), Some("docker system prune"));

        let verdict = analyze(&DockerSystemPruneRule, "docker system prune -a -f");
        assert_eq!(verdict.danger_level(), DangerLevel::Critical);
        assert_eq!(verdict.safe_alternative(), Some("docker system prune -a"));
    }

    #[test]
    fn test_system_prune_force_never_lowers_critical() {
        let verdict = analyze(&DockerSystemPruneRule, "docker system prune -a --volumes --force");
        assert_eq!(verdict.danger_level(), DangerLevel::Critical);
        assert_eq!(
            verdict.safe_alternative(),
            Some("docker system prune -a --volumes")
        );
    }

    #[test]
    fn test_rm_levels() {
        assert_eq!(analyze(&DockerRmRule, "docker rm web").danger_level(), DangerLevel::Low);

        let verdict = analyze(&DockerRmRule, "docker rm -f web");
        assert_eq!(verdict.danger_level(), DangerLevel::Medium);
        assert_eq!(verdict.safe_alternative(), Some("docker stop web"));

        let verdict = analyze(&DockerRmRule, "docker rm -f web db");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert_eq!(verdict.safe_alternative(), Some("docker stop web db"));

        let verdict = analyze(&DockerRmRule, "docker rm -v web");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert_eq!(verdict.safe_alternative(), Some("docker rm web"));

        let verdict = analyze(&DockerRmRule, "docker rm -fv web db");
        assert_eq!(verdict.danger_level(), DangerLevel::Critical);
        assert_eq!(verdict.safe_alternative(), Some("docker stop web db"));
    }

    #[test]
    fn test_rm_under_container_group() {
        let verdict = analyze(&DockerRmRule, "docker container rm -f web");
        assert_eq!(verdict.danger_level(), DangerLevel::Medium);
        assert_eq!(verdict.safe_alternative(), Some("docker stop web"));

        let verdict = analyze(&DockerRmRule, "docker container rm -fv web");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
    }

    #[test]
    fn test_rm_wildcard_counts_as_multiple() {
        let verdict = analyze(&DockerRmRule, "docker rm --force app*");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
    }

    #[test]
    fn test_rmi_levels() {
        assert_eq!(analyze(&DockerRmiRule, "docker rmi nginx").danger_level(), DangerLevel::Low);

        let verdict = analyze(&DockerRmiRule, "docker rmi nginx redis");
        assert_eq!(verdict.danger_level(), DangerLevel::Medium);
        assert_eq!(verdict.safe_alternative(), None);

        let verdict = analyze(&DockerRmiRule, "docker rmi -f nginx");
        assert_eq!(verdict.danger_level(), DangerLevel::Medium);
        assert_eq!(verdict.safe_alternative(), Some("docker rmi nginx"));

        let verdict = analyze(&DockerRmiRule, "docker rmi --force nginx redis");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert_eq!(verdict.safe_alternative(), Some("docker rmi nginx redis"));
    }

    #[test]
    fn test_volume_prune() {
        let verdict = analyze(&DockerVolumePruneRule, "docker volume prune");
        assert_eq!(verdict.danger_level(), DangerLevel::High);
        assert!(verdict.message().contains("permanently"));
        assert_eq!(verdict.safe_alternative(), Some("docker volume ls"));

        let verdict = analyze(&DockerVolumePruneRule, "docker volume prune -f");
        assert_eq!(verdict.danger_level(), DangerLevel::Critical);
        assert_eq!(verdict.safe_alternative(), Some("docker volume ls"));

        assert!(!DockerVolumePruneRule.matches(&parse("docker volume ls")));
    }
}
