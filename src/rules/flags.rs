//! Flag and path tables shared by the rule families.

use crate::command::ParsedCommand;

pub const RECURSIVE_FLAGS: &[&str] = &["-r", "-R", "--recursive"];
pub const FORCE_FLAGS: &[&str] = &["-f", "-F", "--force"];
pub const INTERACTIVE_FLAGS: &[&str] = &["-i", "-I", "--interactive"];

/// Root-level directories whose contents keep the system running
pub const DANGEROUS_PATHS: &[&str] = &[
    "/", "/bin", "/boot", "/dev", "/etc", "/lib", "/proc", "/root", "/sbin", "/sys", "/usr", "/var",
];

/// Permission modes that make files world-writable
pub const DANGEROUS_PERMISSIONS: &[&str] = &["777", "666", "a+rwx", "ugo+rwx"];

/// Whether `path` is a system-critical directory or lives beneath one
///
/// `/` only matches itself and `/*`, so ordinary absolute paths such as
/// `/tmp/build` are not treated as system paths.
pub fn path_is_dangerous(path: &str) -> bool {
    DANGEROUS_PATHS.iter().any(|&dangerous| {
        if dangerous == "/" {
            return path == "/" || path.starts_with("/*");
        }

        path == dangerous
            || path
                .strip_prefix(dangerous)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Remove the short options in `chars` from a flag
///
/// Long flags are kept unless they are listed in `long`. Returns `None` when
/// nothing of the flag is left, e.g. `-f` with `chars = ['f']`.
pub fn strip_flag(flag: &str, chars: &[char], long: &[&str]) -> Option<String> {
    if flag.starts_with("--") {
        return (!long.contains(&flag)).then(|| flag.to_string());
    }

    let kept: String = flag
        .chars()
        .skip(1)
        .filter(|c| !chars.contains(c))
        .collect();

    (!kept.is_empty()).then(|| format!("-{}", kept))
}

/// Render `command` with the given options removed from every flag token
///
/// Flags left empty are dropped, so `cp -rf a b` without `f` becomes `cp -r a b`.
pub fn without_options(command: &ParsedCommand, chars: &[char], long: &[&str]) -> String {
    let kept: Vec<String> = command
        .tokens()
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| {
            if idx > 0 && token.starts_with('-') {
                strip_flag(token, chars, long)
            } else {
                Some(token.clone())
            }
        })
        .collect();

    command.join(kept.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangerous_paths_exact_and_nested() {
        assert!(path_is_dangerous("/"));
        assert!(path_is_dangerous("/*"));
        assert!(path_is_dangerous("/etc"));
        assert!(path_is_dangerous("/etc/passwd"));
        assert!(path_is_dangerous("/usr/local/bin"));
    }

    #[test]
    fn test_ordinary_paths_are_not_dangerous() {
        assert!(!path_is_dangerous("/tmp"));
        assert!(!path_is_dangerous("/tmp/test"));
        assert!(!path_is_dangerous("/etcetera"));
        assert!(!path_is_dangerous("/home/user/etc"));
        assert!(!path_is_dangerous("relative/path"));
    }

    #[test]
    fn test_strip_flag() {
        assert_eq!(strip_flag("-f", &['f', 'F'], &["--force"]), None);
        assert_eq!(strip_flag("-rf", &['f', 'F'], &["--force"]), Some("-r".to_string()));
        assert_eq!(strip_flag("--force", &['f', 'F'], &["--force"]), None);
        assert_eq!(strip_flag("--verbose", &['f', 'F'], &["--force"]), Some("--verbose".to_string()));
        assert_eq!(strip_flag("-v", &['f'], &[]), Some("-v".to_string()));
    }

    #[test]
    fn test_without_options_keeps_token_order() {
        let cmd = ParsedCommand::parse("docker rm -fv web db").unwrap();
        assert_eq!(without_options(&cmd, &['v'], &["--volumes"]), "docker rm -f web db");

        let cmd = ParsedCommand::parse("docker system prune --all --force").unwrap();
        assert_eq!(without_options(&cmd, &['f'], &["--force"]), "docker system prune --all");
    }
}
