mod prompt;
mod repl;

use agent_core::config::AppConfig;
use agent_core::context::RequestContext;
use agent_core::permission::{PermissionGate, PermissionService};
use agent_core::tool_registry::ToolRegistry;
use agent_core::types::ToolCall;
use agent_session::{SessionRegistry, ShellInfo};
use agent_tools::bash::BASH_TOOL_NAME;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "agent-bash",
    about = "Permission-gated shell execution for AI agents",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/agent-bash/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory for the shell session
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    /// Approve every permission request without asking
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell session (default)
    Repl,

    /// Run a single command through the bash tool
    Run {
        /// Timeout in milliseconds (max 600000)
        #[arg(short, long)]
        timeout: Option<i64>,

        /// The command line to execute
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "agent_bash=info,warn".into()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Config commands work on the file as written, without CLI overrides.
    if let Some(Commands::Config { action }) = &cli.command {
        return handle_config_command(action.as_ref(), cli.config.as_deref());
    }

    // Load config.
    let mut config = load_config(cli.config.as_deref())?;

    // Apply CLI overrides.
    if let Some(dir) = &cli.dir {
        config.shell.working_dir = Some(dir.clone());
    }
    if cli.yes {
        config.permissions.skip_requests = true;
    }

    let sessions = match &config.shell.shell_path {
        Some(path) => SessionRegistry::new(ShellInfo::from_path(path)),
        None => SessionRegistry::with_default_shell()?,
    };
    let permissions: Arc<dyn PermissionGate> = Arc::new(PermissionService::new(
        &config.permissions,
        Arc::new(prompt::TerminalPrompter),
    ));

    let mut registry = ToolRegistry::new();
    agent_tools::register_all(&mut registry, &config, &sessions, permissions)?;

    tracing::info!(
        "Loaded {} tools, shell: {}",
        registry.len(),
        sessions.shell().path.display(),
    );

    match cli.command {
        Some(Commands::Run { timeout, command }) => {
            let ok = run_once(&registry, command.join(" "), timeout).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Some(Commands::Repl) | None => {
            let working_dir = config.shell.resolve_working_dir()?;
            repl::run(&config, &registry, &sessions, &working_dir).await?;
        }
        Some(Commands::Config { .. }) => unreachable!("handled above"),
    }

    Ok(())
}

/// Build the JSON arguments the bash tool expects.
pub(crate) fn bash_call(command: &str, timeout: Option<i64>) -> ToolCall {
    let mut input = serde_json::json!({ "command": command });
    if let Some(timeout) = timeout {
        input["timeout"] = timeout.into();
    }
    ToolCall::new(Uuid::new_v4().to_string(), BASH_TOOL_NAME, input.to_string())
}

/// Cancel `token` when Ctrl-C is pressed. Abort the handle once the command returns.
pub(crate) fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling command");
            token.cancel();
        }
    })
}

async fn run_once(registry: &ToolRegistry, command: String, timeout: Option<i64>) -> Result<bool> {
    let token = CancellationToken::new();
    let ctx = RequestContext::new(Uuid::new_v4().to_string(), Uuid::new_v4().to_string())
        .with_cancellation(token.clone());
    let watcher = cancel_on_ctrl_c(token);

    let result = registry.execute(&ctx, &bash_call(&command, timeout)).await;
    watcher.abort();

    let output = result?;
    if output.is_error {
        eprintln!("{}", output.content);
    } else {
        println!("{}", output.content);
    }
    Ok(!output.is_error)
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    })
}

fn handle_config_command(action: Option<&ConfigAction>, config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);

    match action {
        Some(ConfigAction::Show) | None => {
            let config = load_config(config_path)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                AppConfig::default().save_to(&path)?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_action(cli: &Cli) -> Option<&ConfigAction> {
        match &cli.command {
            Some(Commands::Config { action }) => action.as_ref(),
            _ => None,
        }
    }

    #[test]
    fn test_config_init_writes_defaults_to_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_arg = path.to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "agent-bash",
            "--yes",
            "--dir",
            "/srv/elsewhere",
            "--config",
            path_arg.as_str(),
            "config",
            "init",
        ])
        .unwrap();
        handle_config_command(config_action(&cli), cli.config.as_deref()).unwrap();

        let written = AppConfig::load_from(&path).unwrap();
        assert!(!written.permissions.skip_requests);
        assert_eq!(written.shell.working_dir, None);
    }

    #[test]
    fn test_config_init_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[shell]\nstrict_safe_commands = true\n").unwrap();

        handle_config_command(Some(&ConfigAction::Init), Some(&path)).unwrap();
        assert!(AppConfig::load_from(&path).unwrap().shell.strict_safe_commands);
    }

    #[test]
    fn test_bash_call_arguments() {
        let call = bash_call("ls -la", Some(500));
        assert_eq!(call.name, BASH_TOOL_NAME);
        let input: serde_json::Value = serde_json::from_str(&call.input).unwrap();
        assert_eq!(input, serde_json::json!({ "command": "ls -la", "timeout": 500 }));
    }
}
