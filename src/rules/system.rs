use crate::command::ParsedCommand;
use crate::rules::base::{Rule, RuleMatch, RuleMatchError};
use crate::rules::flags::path_is_dangerous;
use crate::rules::level::DangerLevel;

/// Commands that can wreck a system when run as root
const DESTRUCTIVE_COMMANDS: &[&str] = &["rm", "dd", "mkfs", "fdisk", "parted", "chmod", "chown"];

/// Device files that are only ever read from
const SAFE_DEVICES: &[&str] = &["/dev/zero", "/dev/null", "/dev/random", "/dev/urandom"];

const DISK_DEVICES: &[&str] = &["/dev/sda", "/dev/sdb", "/dev/nvme", "/dev/disk"];

const SIGKILL_FLAGS: &[&str] = &["-9", "-KILL", "-SIGKILL"];

const CRITICAL_PROCESSES: &[&str] = &["init", "systemd", "launchd", "ssh", "sshd"];

const POWER_COMMANDS: &[&str] = &["shutdown", "reboot", "halt", "poweroff"];

#[derive(Debug, Default)]
pub struct SudoRule;

impl SudoRule {
    /// Whether an argument points into a system directory
    ///
    /// `key=value` arguments (as used by `dd`) are judged by their value.
    fn touches_system_path(arg: &str) -> bool {
        let path = arg.split_once('=').map_or(arg, |(_, value)| value);
        let safe = SAFE_DEVICES
            .iter()
            .any(|dev| path == *dev || path.starts_with(&format!("{}/", dev)));
        !safe && path_is_dangerous(path)
    }
}

impl Rule for SudoRule {
    fn name(&self) -> &str {
        "sudo_command"
    }

    fn description(&self) -> &str {
        "Detects sudo usage with potentially dangerous commands"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "sudo"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let wrapped = command.args().first().map(String::as_str).unwrap_or_default();
        let destructive = DESTRUCTIVE_COMMANDS.contains(&wrapped);
        let system_path = command
            .args()
            .iter()
            .any(|arg| Self::touches_system_path(arg));

        let verdict = match (destructive, system_path) {
            (true, true) => RuleMatch::new(
                self.name(),
                DangerLevel::Critical,
                format!(
                    "Running '{}' with sudo on system paths can destroy your system! \
                     Root privileges allow unrestricted access to critical files.",
                    wrapped
                ),
            )?
            .with_suggestion(
                "Double-check the command and paths. Consider if sudo is really necessary.".to_string(),
            ),
            (true, false) => RuleMatch::new(
                self.name(),
                DangerLevel::High,
                format!(
                    "Running '{}' with sudo is dangerous. Root privileges can cause irreversible damage.",
                    wrapped
                ),
            )?
            .with_suggestion("Verify the command is correct and necessary.".to_string()),
            (false, true) => RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "Using sudo to modify system paths can break your system. \
                 Be very careful with root access.",
            )?
            .with_suggestion("Make sure you know what you're doing.".to_string()),
            (false, false) => RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "Running commands with sudo gives them root privileges. Only use sudo when necessary.",
            )?
            .with_suggestion("Check if the command really needs root access.".to_string()),
        };

        Ok(verdict)
    }
}

#[derive(Debug, Default)]
pub struct DdRule;

impl Rule for DdRule {
    fn name(&self) -> &str {
        "dd_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous dd operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command() == "dd"
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let output = command
            .args()
            .iter()
            .find_map(|arg| arg.strip_prefix("of="))
            .filter(|target| !target.is_empty());

        match output {
            Some(target) if DISK_DEVICES.iter().any(|dev| target.starts_with(dev)) => {
                Ok(RuleMatch::new(
                    self.name(),
                    DangerLevel::Critical,
                    "Writing to a disk device with dd will DESTROY all data on that disk! \
                     This is one of the most dangerous commands in Linux.",
                )?
                .with_suggestion(
                    "Triple-check the device name. Use 'lsblk' to verify. \
                     Make sure you have backups of any important data."
                        .to_string(),
                )
                .with_safe_alternative("lsblk".to_string()))
            }
            Some(_) => Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "dd will overwrite the specified file or device.",
            )?
            .with_suggestion("Make sure the output path is correct.".to_string())),
            None => RuleMatch::new(
                self.name(),
                DangerLevel::Low,
                "dd command detected. Make sure input/output parameters are correct.",
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct KillRule;

impl Rule for KillRule {
    fn name(&self) -> &str {
        "kill_command"
    }

    fn description(&self) -> &str {
        "Detects dangerous process kill operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        matches!(command.command(), "kill" | "killall")
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let sigkill = command
            .flags()
            .iter()
            .any(|f| SIGKILL_FLAGS.contains(&f.as_str()));
        let killall = command.command() == "killall";
        let critical_target = killall
            && command
                .args()
                .iter()
                .any(|arg| CRITICAL_PROCESSES.contains(&arg.as_str()));

        let graceful = || command.without_tokens(SIGKILL_FLAGS);

        if sigkill && critical_target {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Critical,
                format!(
                    "Force killing critical system processes like {} can crash your system! \
                     This will immediately terminate the process without cleanup.",
                    command.args().join(", ")
                ),
            )?
            .with_suggestion(
                "Don't kill critical system processes. If you must, try without -9 first.".to_string(),
            )
            .with_safe_alternative(graceful()))
        } else if sigkill && killall {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::High,
                "killall -9 will force kill ALL processes with that name immediately. \
                 They won't have a chance to clean up or save state.",
            )?
            .with_suggestion("Try without -9 first to allow graceful termination.".to_string())
            .with_safe_alternative(graceful()))
        } else if sigkill {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "kill -9 sends SIGKILL which cannot be caught or ignored. \
                 The process will be terminated immediately without cleanup.",
            )?
            .with_suggestion("Try regular kill first (SIGTERM) to allow graceful shutdown.".to_string())
            .with_safe_alternative(graceful()))
        } else if killall {
            Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "killall will terminate ALL processes with the specified name.",
            )?
            .with_suggestion("Use 'kill' with specific PIDs for more control.".to_string()))
        } else {
            RuleMatch::new(
                self.name(),
                DangerLevel::Low,
                "This will send SIGTERM to the process, allowing graceful shutdown.",
            )
        }
    }
}

#[derive(Debug, Default)]
pub struct ShutdownRule;

impl Rule for ShutdownRule {
    fn name(&self) -> &str {
        "shutdown_command"
    }

    fn description(&self) -> &str {
        "Detects system shutdown/reboot operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        POWER_COMMANDS.contains(&command.command())
    }

    fn analyze(&self, command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        let is_shutdown = command.command() == "shutdown";
        let immediate = !is_shutdown
            || command.has_arg("now")
            || command.flags().iter().any(|f| f == "-h");

        if !immediate {
            return Ok(RuleMatch::new(
                self.name(),
                DangerLevel::Medium,
                "This will schedule a system shutdown/reboot.",
            )?
            .with_suggestion("Notify other users if this is a shared system.".to_string()));
        }

        Ok(RuleMatch::new(
            self.name(),
            DangerLevel::High,
            "This will immediately shutdown/reboot the system. \
             All running processes will be terminated, work may be lost.",
        )?
        .with_suggestion(
            "Make sure all work is saved and other users are notified. \
             Consider scheduling shutdown with a delay (e.g., 'shutdown +5')."
                .to_string(),
        )
        .with_safe_alternative(is_shutdown.then(|| "shutdown +5".to_string())))
    }
}

#[derive(Debug, Default)]
pub struct MkfsRule;

impl Rule for MkfsRule {
    fn name(&self) -> &str {
        "mkfs_command"
    }

    fn description(&self) -> &str {
        "Detects filesystem formatting operations"
    }

    fn matches(&self, command: &ParsedCommand) -> bool {
        command.command().starts_with("mkfs")
    }

    fn analyze(&self, _command: &ParsedCommand) -> Result<RuleMatch, RuleMatchError> {
        Ok(RuleMatch::new(
            self.name(),
            DangerLevel::Critical,
            "This will FORMAT the specified device, DESTROYING ALL DATA on it! \
             Formatting cannot be undone and all files will be permanently lost.",
        )?
        .with_suggestion(
            "Triple-check you have the correct device. Use 'lsblk' or 'fdisk -l' to verify. \
             Make absolutely sure you have backups of any important data."
                .to_string(),
        )
        .with_safe_alternative("lsblk".to_string()))
    }
}
