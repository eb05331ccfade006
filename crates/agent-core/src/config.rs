use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub shell: ShellConfig,
    pub permissions: PermissionsConfig,
    pub attribution: AttributionConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/agent-bash/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| AgentError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Write current configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| AgentError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agent-bash")
            .join("config.toml")
    }

    /// Data directory for REPL history and similar state.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agent-bash")
    }
}

/// Persistent shell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Directory the first session starts in (None = process cwd).
    pub working_dir: Option<PathBuf>,
    /// Shell executable (None = detect bash).
    pub shell_path: Option<PathBuf>,
    /// Command names the shell refuses to run.
    pub blocked_commands: Vec<String>,
    /// Require authorization for read-only commands that chain further
    /// commands with shell operators, or whose arguments run or change
    /// something (`env make`, `git branch -D`).
    pub strict_safe_commands: bool,
}

impl ShellConfig {
    /// The configured working directory, or the process cwd.
    pub fn resolve_working_dir(&self) -> std::io::Result<PathBuf> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Permission configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Approve every request without asking.
    pub skip_requests: bool,
    /// Pre-approved tools, as `tool` or `tool:action`.
    pub allowed_tools: Vec<String>,
}

/// Commit and PR attribution the bash tool tells the model to add.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub generated_with: bool,
    pub co_authored_by: bool,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            generated_with: true,
            co_authored_by: true,
        }
    }
}
