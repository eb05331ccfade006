//! Shell detection.
//!
//! Finds a POSIX-compatible shell that accepts `-c <script>`. Bash is
//! preferred because persistent sessions rely on `pwd -P` and `$?`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Information about an available shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellInfo {
    /// Short identifier (e.g., "bash", "zsh", "sh").
    pub id: String,
    /// Display name (e.g., "Bash", "Git Bash").
    pub name: String,
    /// Full path to the shell executable.
    pub path: PathBuf,
}

impl ShellInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build a `ShellInfo` from an explicit executable path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("sh")
            .to_string();
        let name = capitalize(&id);
        Self { id, name, path }
    }
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Detect shells on the current platform, best candidate first.
pub fn detect_available_shells() -> Vec<ShellInfo> {
    let mut shells = Vec::new();

    #[cfg(windows)]
    {
        let git_bash_paths = [
            PathBuf::from(r"C:\Program Files\Git\bin\bash.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Git\bin\bash.exe"),
        ];
        for path in git_bash_paths {
            if path.exists() {
                shells.push(ShellInfo::new("git-bash", "Git Bash", path));
                break;
            }
        }
    }

    #[cfg(unix)]
    {
        let unix_shells = [
            ("bash", "Bash", "/bin/bash"),
            ("bash", "Bash", "/usr/bin/bash"),
            ("bash-homebrew", "Bash (Homebrew)", "/usr/local/bin/bash"),
            ("zsh", "Zsh", "/bin/zsh"),
            ("sh", "Shell", "/bin/sh"),
        ];

        for (id, name, path) in unix_shells {
            let path = PathBuf::from(path);
            if path.exists() && !shells.iter().any(|s: &ShellInfo| same_file(&s.path, &path)) {
                shells.push(ShellInfo::new(id, name, path));
            }
        }
    }

    shells
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// The shell persistent sessions use when none is configured.
///
/// `$SHELL` is honoured only when it points at bash.
pub fn default_shell() -> Option<ShellInfo> {
    #[cfg(unix)]
    {
        if let Ok(shell_path) = std::env::var("SHELL") {
            let path = PathBuf::from(&shell_path);
            if path.exists() && path.file_name().and_then(|n| n.to_str()) == Some("bash") {
                return Some(ShellInfo::from_path(path));
            }
        }
    }

    detect_available_shells().into_iter().next()
}
