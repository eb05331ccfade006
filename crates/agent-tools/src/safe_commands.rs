//! Read-only command detection.
//!
//! Commands that only inspect state may skip the permission prompt. This is
//! a convenience, not a sandbox: matching is by prefix on the raw command
//! text, so a safe prefix followed by `;`, `&&` or `|` still matches. Use
//! [`has_shell_operators`] to spot those, and [`escapes_read_only`] for
//! safe prefixes whose arguments run or change something.

/// Read-only command prefixes, compared against the lower-cased command.
const SAFE_COMMANDS: &[&str] = &[
    // Core utilities
    "cal",
    "cat",
    "date",
    "df",
    "du",
    "echo",
    "env",
    "file",
    "free",
    "groups",
    "head",
    "hostname",
    "id",
    "less",
    "ls",
    "printenv",
    "ps",
    "pwd",
    "stat",
    "tail",
    "tree",
    "type",
    "uname",
    "uptime",
    "wc",
    "whatis",
    "whereis",
    "which",
    "whoami",
    // Git
    "git blame",
    "git branch",
    "git config --get",
    "git config --list",
    "git describe",
    "git diff",
    "git grep",
    "git log",
    "git ls-files",
    "git ls-remote",
    "git remote",
    "git rev-parse",
    "git shortlog",
    "git show",
    "git status",
    "git tag",
    // Toolchains
    "cargo --version",
    "cargo metadata",
    "cargo tree",
    "go doc",
    "go env",
    "go list",
    "go version",
    "rustc --version",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSafety {
    /// Matches a read-only prefix; no authorization round-trip needed.
    ReadOnly,
    RequiresAuthorization,
}

/// Classify `command` by its read-only prefix.
pub fn classify(command: &str) -> CommandSafety {
    if matched_prefix(command).is_some() {
        CommandSafety::ReadOnly
    } else {
        CommandSafety::RequiresAuthorization
    }
}

/// The safe prefix `command` starts with, if any.
///
/// The prefix must end the command or be followed by a space or a hyphen,
/// so `catalog` does not match `cat`.
pub fn matched_prefix(command: &str) -> Option<&'static str> {
    let lower = command.to_lowercase();
    SAFE_COMMANDS.iter().copied().find(|safe| {
        lower.starts_with(safe)
            && matches!(lower.as_bytes().get(safe.len()), None | Some(b' ') | Some(b'-'))
    })
}

/// Whether the command chains, pipes, redirects or substitutes anything.
pub fn has_shell_operators(command: &str) -> bool {
    if command
        .chars()
        .any(|c| matches!(c, ';' | '|' | '&' | '`' | '>' | '<' | '\n'))
    {
        return true;
    }
    command.contains("$(")
}

/// `git branch` flags that create, delete, rename or retarget branches.
const BRANCH_MUTATING_FLAGS: &[&str] = &[
    "-d",
    "--delete",
    "-m",
    "--move",
    "-c",
    "--copy",
    "-f",
    "--force",
    "-t",
    "--track",
    "--no-track",
    "-u",
    "--set-upstream-to",
    "--unset-upstream",
    "--edit-description",
    "--create-reflog",
];

/// `git tag` flags that create, sign or delete tags.
const TAG_MUTATING_FLAGS: &[&str] = &[
    "-d",
    "--delete",
    "-a",
    "--annotate",
    "-s",
    "--sign",
    "-u",
    "--local-user",
    "-f",
    "--force",
    "-m",
    "--message",
    "-e",
    "--edit",
];

/// Filter flags that take the following word as their value.
const REF_FILTER_VALUE_FLAGS: &[&str] = &[
    "--contains",
    "--no-contains",
    "--merged",
    "--no-merged",
    "--points-at",
    "--sort",
    "--format",
];

/// `git remote` subcommands that only read.
const REMOTE_READ_SUBCOMMANDS: &[&str] = &["show", "get-url"];

/// Whether a command with a read-only prefix runs or changes something anyway.
///
/// `env` followed by a command word executes it; `git branch`, `git tag`
/// and `git remote` create, delete or rewrite refs and remotes given the
/// right arguments. Commands without a safe prefix return `false`.
pub fn escapes_read_only(command: &str) -> bool {
    let lower = command.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let args = |skip: usize| words.get(skip..).unwrap_or(&[]);

    match matched_prefix(command) {
        Some("env") => env_runs_command(args(1)),
        Some("git branch") => git_ref_mutation(args(2), BRANCH_MUTATING_FLAGS),
        Some("git tag") => git_ref_mutation(args(2), TAG_MUTATING_FLAGS),
        Some("git remote") => args(2)
            .iter()
            .find(|arg| !arg.starts_with('-'))
            .is_some_and(|sub| !REMOTE_READ_SUBCOMMANDS.contains(sub)),
        _ => false,
    }
}

fn env_runs_command(args: &[&str]) -> bool {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "-s" | "--split-string" => return true,
            _ if arg.starts_with("--split-string=") => return true,
            "-u" | "--unset" | "-c" | "--chdir" => {
                iter.next();
            }
            _ if arg.starts_with('-') || arg.contains('=') => {}
            _ => return true,
        }
    }
    false
}

/// A mutating flag, or a bare name without `--list`, changes refs.
fn git_ref_mutation(args: &[&str], mutating: &[&str]) -> bool {
    let mut listing = false;
    let mut named = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let flag = arg.split('=').next().unwrap_or(*arg);
        if mutating.contains(&flag) {
            return true;
        }
        if flag == "-l" || flag == "--list" {
            listing = true;
        } else if REF_FILTER_VALUE_FLAGS.contains(&flag) {
            if !arg.contains('=') {
                iter.next();
            }
        } else if !arg.starts_with('-') {
            named = true;
        }
    }
    named && !listing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_prefixes() {
        for cmd in [
            "ls",
            "ls -la",
            "LS -la",
            "pwd",
            "git status",
            "git log --oneline -5",
            "git diff-tree HEAD",
            "cat-file",
            "git config --get user.name",
        ] {
            assert_eq!(classify(cmd), CommandSafety::ReadOnly, "{cmd}");
        }
    }

    #[test]
    fn test_boundary_is_required() {
        for cmd in [
            "catalog",
            "lsblk",
            "datestamp.sh",
            "git statusx",
            "git commit -m wip",
            "git config user.name me",
            "rm -rf build",
            "",
        ] {
            assert_eq!(classify(cmd), CommandSafety::RequiresAuthorization, "{cmd}");
        }
    }

    #[test]
    fn test_matched_prefix() {
        assert_eq!(matched_prefix("git log -p"), Some("git log"));
        assert_eq!(matched_prefix("cat README.md"), Some("cat"));
        assert_eq!(matched_prefix("make"), None);
    }

    #[test]
    fn test_compound_commands_still_match() {
        assert_eq!(classify("echo hi; rm -rf /"), CommandSafety::ReadOnly);
        assert!(has_shell_operators("echo hi; rm -rf /"));
    }

    #[test]
    fn test_has_shell_operators() {
        assert!(has_shell_operators("ls | grep foo"));
        assert!(has_shell_operators("cat a && rm b"));
        assert!(has_shell_operators("echo $(whoami)"));
        assert!(has_shell_operators("echo hi > out.txt"));
        assert!(!has_shell_operators("ls -la /tmp"));
        assert!(!has_shell_operators("git log --oneline"));
    }

    #[test]
    fn test_env_running_a_command_escapes() {
        assert!(escapes_read_only("env rm -rf /tmp/x"));
        assert!(escapes_read_only("env FOO=1 make install"));
        assert!(escapes_read_only("env -i sh"));
        assert!(escapes_read_only("env -C /tmp touch x"));
        assert!(escapes_read_only("env -S 'rm -rf x'"));
        assert!(!escapes_read_only("env"));
        assert!(!escapes_read_only("env -u HOME"));
        assert!(!escapes_read_only("env FOO=1"));
        assert!(!escapes_read_only("printenv PATH"));
    }

    #[test]
    fn test_git_branch_mutations_escape() {
        for cmd in [
            "git branch -D main",
            "git branch -d old",
            "git branch -m old new",
            "git branch --set-upstream-to=origin/main",
            "git branch feature",
        ] {
            assert!(escapes_read_only(cmd), "{cmd}");
        }
        for cmd in [
            "git branch",
            "git branch -a",
            "git branch -vv",
            "git branch --show-current",
            "git branch --list 'feat*'",
            "git branch --contains HEAD",
        ] {
            assert!(!escapes_read_only(cmd), "{cmd}");
        }
    }

    #[test]
    fn test_git_tag_mutations_escape() {
        for cmd in ["git tag -d v1", "git tag v1.2", "git tag -a v1 -m release"] {
            assert!(escapes_read_only(cmd), "{cmd}");
        }
        for cmd in ["git tag", "git tag -l 'v1.*'", "git tag --points-at HEAD", "git tag -n"] {
            assert!(!escapes_read_only(cmd), "{cmd}");
        }
    }

    #[test]
    fn test_git_remote_mutations_escape() {
        for cmd in [
            "git remote add origin https://example.com/repo.git",
            "git remote remove origin",
            "git remote set-url origin x",
            "git remote prune origin",
        ] {
            assert!(escapes_read_only(cmd), "{cmd}");
        }
        for cmd in ["git remote", "git remote -v", "git remote show origin", "git remote get-url origin"] {
            assert!(!escapes_read_only(cmd), "{cmd}");
        }
    }

    #[test]
    fn test_unsafe_commands_do_not_escape() {
        assert!(!escapes_read_only("rm -rf build"));
        assert!(!escapes_read_only("ls -la"));
    }
}
