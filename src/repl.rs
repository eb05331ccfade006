use agent_core::config::AppConfig;
use agent_core::context::RequestContext;
use agent_core::tool_registry::ToolRegistry;
use agent_session::{SessionRegistry, ShellSession};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{Config as RlConfig, DefaultEditor};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const BANNER: &str = r#"
  ╔═══════════════════════════════════════════╗
  ║          agent-bash v0.1.0                ║
  ║   Permission-gated persistent shell       ║
  ╚═══════════════════════════════════════════╝

  Type a command and press Enter to run it through the bash tool.
  Read-only commands run directly; anything else asks first.
  Commands:
    /cwd           Show the session's working directory
    /tools         List available tools
    /config        Show current config
    /help          Show this help
    /exit          Quit
"#;

/// Run the interactive REPL.
pub async fn run(
    config: &AppConfig,
    tool_registry: &ToolRegistry,
    sessions: &SessionRegistry,
    working_dir: &Path,
) -> Result<()> {
    println!("{}", BANNER);
    println!(
        "  Shell: {}  |  Directory: {}",
        sessions.shell().path.display(),
        working_dir.display()
    );
    if config.permissions.skip_requests {
        println!("\x1b[1;33m  ⚠  WARNING: permission requests are skipped, every command runs unprompted!\x1b[0m");
    }
    println!();

    // One conversation per REPL run; every line is a new message.
    let session_id = Uuid::new_v4().to_string();

    // Set up rustyline.
    let rl_config = RlConfig::builder().auto_add_history(true).build();
    let history_path = AppConfig::data_dir().join("repl_history.txt");
    let mut rl = DefaultEditor::with_config(rl_config)?;
    let _ = rl.load_history(&history_path);

    loop {
        let cwd = current_dir(sessions, working_dir);
        let prompt = format!("\x1b[1;36m{}\x1b[0m \x1b[1;32m$\x1b[0m ", cwd.display());

        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                // Handle slash commands.
                if input.starts_with('/') {
                    let handled =
                        handle_command(input, tool_registry, sessions, working_dir, config)?;
                    if !handled {
                        break; // /exit
                    }
                    continue;
                }

                let token = CancellationToken::new();
                let ctx = RequestContext::new(session_id.clone(), Uuid::new_v4().to_string())
                    .with_cancellation(token.clone());
                let watcher = crate::cancel_on_ctrl_c(token);

                let result = tool_registry
                    .execute(&ctx, &crate::bash_call(input, None))
                    .await;
                watcher.abort();

                match result {
                    Ok(output) if output.is_error => {
                        println!("\x1b[0;31m✗ {}\x1b[0m", output.content);
                    }
                    Ok(output) => {
                        println!("{}", strip_cwd_marker(&output.content));
                    }
                    Err(e) => {
                        eprintln!("\x1b[0;31mError: {}\x1b[0m", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    // Save history.
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

fn current_dir(sessions: &SessionRegistry, working_dir: &Path) -> PathBuf {
    sessions
        .get(working_dir)
        .map(|session| session.working_directory())
        .unwrap_or_else(|| working_dir.to_path_buf())
}

/// The prompt already shows the directory, so drop the trailing `<cwd>` tag.
fn strip_cwd_marker(content: &str) -> &str {
    match content.rfind("\n\n<cwd>") {
        Some(idx) if content.ends_with("</cwd>") => &content[..idx],
        _ => content,
    }
}

/// Handle a slash command. Returns false if the REPL should exit.
fn handle_command(
    input: &str,
    tool_registry: &ToolRegistry,
    sessions: &SessionRegistry,
    working_dir: &Path,
    config: &AppConfig,
) -> Result<bool> {
    let cmd = input.split_whitespace().next().unwrap_or("");

    match cmd {
        "/exit" | "/quit" | "/q" => {
            println!("Goodbye!");
            return Ok(false);
        }
        "/cwd" => {
            println!("  {}", current_dir(sessions, working_dir).display());
        }
        "/tools" => {
            println!("  Available tools:");
            for schema in tool_registry.schemas() {
                let summary = schema.description.lines().next().unwrap_or("");
                println!("    \x1b[1m{}\x1b[0m — {}", schema.name, summary);
            }
        }
        "/config" => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        "/help" => {
            println!("{}", BANNER);
        }
        _ => {
            println!("  Unknown command: {}. Type /help for available commands.", cmd);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_cwd_marker() {
        assert_eq!(strip_cwd_marker("a\nb\n\n<cwd>/tmp</cwd>"), "a\nb");
        assert_eq!(strip_cwd_marker("no output"), "no output");
        assert_eq!(strip_cwd_marker("x\n\n<cwd>unterminated"), "x\n\n<cwd>unterminated");
    }
}
