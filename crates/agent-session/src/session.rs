//! Persistent shell sessions.
//!
//! A `PersistentShell` runs every command through `<shell> -c` in the
//! session's tracked working directory and records the directory the
//! command left behind, so `cd` carries over to the next call. Commands
//! against one session run one at a time.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capture::BoundedCapture;
use crate::context::{ExecContext, Interrupt};
use crate::process::{configure_process_group, terminate_tree};
use crate::shell::{default_shell, ShellInfo};

/// How long a signalled process tree gets before it is killed outright.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// How long output readers may keep draining after the shell has exited.
/// Background jobs that inherited the pipes would otherwise hold them open.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Errors raised while setting up or spawning a session command.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No usable shell found")]
    NoShell,

    #[error("Failed to spawn shell: {0}")]
    Spawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a command execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    /// The command ran to completion with this exit code.
    Exited(i32),
    /// The execution context was cancelled or timed out first.
    Interrupted(Interrupt),
    /// The session could not run the command at all.
    Fault(String),
}

/// Newlines in output dropped while capturing, per stream. `None` means
/// the stream was captured whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedLines {
    pub stdout: Option<usize>,
    pub stderr: Option<usize>,
}

/// Everything one execution produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExecStatus,
    pub dropped: DroppedLines,
}

impl ExecOutput {
    pub fn exited(stdout: impl Into<String>, stderr: impl Into<String>, code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            status: ExecStatus::Exited(code),
            dropped: DroppedLines::default(),
        }
    }

    pub fn interrupted(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        reason: Interrupt,
    ) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            status: ExecStatus::Interrupted(reason),
            dropped: DroppedLines::default(),
        }
    }

    pub fn fault(cause: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: ExecStatus::Fault(cause.into()),
            dropped: DroppedLines::default(),
        }
    }

    pub fn with_dropped(mut self, dropped: DroppedLines) -> Self {
        self.dropped = dropped;
        self
    }
}

/// A long-lived shell environment the bash tool executes commands in.
#[async_trait]
pub trait ShellSession: Send + Sync {
    /// Run `command`, terminating it when `ctx` is cancelled or expires.
    async fn exec(&self, ctx: &ExecContext, command: &str) -> ExecOutput;

    /// The session's current working directory.
    fn working_directory(&self) -> PathBuf;

    /// Replace the list of command names this session refuses to run.
    fn set_blocked_commands(&self, commands: Vec<String>);
}

pub struct PersistentShell {
    shell: ShellInfo,
    cwd: StdMutex<PathBuf>,
    blocked: StdMutex<Vec<String>>,
    turn: Mutex<()>,
}

impl PersistentShell {
    pub fn new(shell: ShellInfo, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell,
            cwd: StdMutex::new(working_dir.into()),
            blocked: StdMutex::new(Vec::new()),
            turn: Mutex::new(()),
        }
    }

    /// Create a session using the detected default shell.
    pub fn with_default_shell(working_dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let shell = default_shell().ok_or(SessionError::NoShell)?;
        Ok(Self::new(shell, working_dir))
    }

    pub fn shell(&self) -> &ShellInfo {
        &self.shell
    }

    /// Returns the first blocked command name `command` would invoke.
    fn blocked_command(&self, command: &str) -> Option<String> {
        let blocked = self.blocked.lock().unwrap();
        if blocked.is_empty() {
            return None;
        }
        command_heads(command)
            .into_iter()
            .find(|head| blocked.iter().any(|b| b == head))
    }

    async fn run(&self, ctx: &ExecContext, command: &str) -> Result<ExecOutput, SessionError> {
        let cwd = self.working_directory();
        let cwd_file = tempfile::Builder::new()
            .prefix("agent-bash-cwd-")
            .tempfile()?;

        debug!(shell = %self.shell.id, cwd = %cwd.display(), "Executing command");

        let mut cmd = Command::new(&self.shell.path);
        cmd.arg("-c")
            .arg(wrap_command(command, cwd_file.path()))
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        configure_process_group(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| SessionError::Spawn(e.to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Spawn("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SessionError::Spawn("stderr was not captured".into()))?;

        let stdout_buf = Arc::new(StdMutex::new(BoundedCapture::new()));
        let stderr_buf = Arc::new(StdMutex::new(BoundedCapture::new()));
        let mut readers = [
            tokio::spawn(drain(stdout, stdout_buf.clone())),
            tokio::spawn(drain(stderr, stderr_buf.clone())),
        ];

        let outcome = tokio::select! {
            status = child.wait() => Ok(status?),
            reason = ctx.done() => Err(reason),
        };

        match outcome {
            Ok(status) => {
                finish_readers(&mut readers, DRAIN_GRACE).await;
                let code = exit_code(&status);
                self.record_working_directory(cwd_file.path()).await;
                debug!(code, "Command exited");
                let (stdout, stderr, dropped) = take_output(&stdout_buf, &stderr_buf);
                Ok(ExecOutput::exited(stdout, stderr, code).with_dropped(dropped))
            }
            Err(reason) => {
                warn!(%reason, "Command interrupted, terminating process tree");
                terminate_tree(&mut child, TERMINATE_GRACE).await;
                finish_readers(&mut readers, DRAIN_GRACE).await;
                let (stdout, stderr, dropped) = take_output(&stdout_buf, &stderr_buf);
                Ok(ExecOutput::interrupted(stdout, stderr, reason).with_dropped(dropped))
            }
        }
    }

    async fn record_working_directory(&self, cwd_file: &Path) {
        let Ok(contents) = tokio::fs::read_to_string(cwd_file).await else {
            return;
        };
        let dir = PathBuf::from(contents.trim_end_matches(['\n', '\r']));
        if dir.as_os_str().is_empty() || !dir.is_dir() {
            return;
        }
        let mut cwd = self.cwd.lock().unwrap();
        if *cwd != dir {
            debug!(from = %cwd.display(), to = %dir.display(), "Working directory changed");
            *cwd = dir;
        }
    }
}

#[async_trait]
impl ShellSession for PersistentShell {
    async fn exec(&self, ctx: &ExecContext, command: &str) -> ExecOutput {
        let _turn = self.turn.lock().await;

        if let Some(reason) = ctx.err() {
            return ExecOutput::interrupted("", "", reason);
        }
        if let Some(name) = self.blocked_command(command) {
            warn!(command = %name, "Refusing blocked command");
            return ExecOutput::exited(
                "",
                format!("command is not allowed for security reasons: {}", name),
                1,
            );
        }

        match self.run(ctx, command).await {
            Ok(output) => output,
            Err(e) => ExecOutput::fault(e.to_string()),
        }
    }

    fn working_directory(&self) -> PathBuf {
        self.cwd.lock().unwrap().clone()
    }

    fn set_blocked_commands(&self, commands: Vec<String>) {
        *self.blocked.lock().unwrap() = commands;
    }
}

impl std::fmt::Debug for PersistentShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentShell")
            .field("shell", &self.shell.id)
            .field("cwd", &self.working_directory())
            .finish()
    }
}

/// Record the final directory from an EXIT trap, so it is written even when
/// the command calls `exit`, and the shell keeps the command's exit status.
fn wrap_command(command: &str, cwd_file: &Path) -> String {
    format!(
        "__agent_bash_record_cwd() {{ pwd -P > {} 2>/dev/null; }}\ntrap __agent_bash_record_cwd EXIT\n{}\n",
        shell_quote(&cwd_file.to_string_lossy()),
        command,
    )
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// First word of every list or pipeline segment, without any leading path
/// and skipping `VAR=value` prefixes.
fn command_heads(command: &str) -> Vec<String> {
    command
        .split(|c| matches!(c, ';' | '|' | '&' | '\n' | '(' | ')' | '`'))
        .filter_map(|segment| segment.split_whitespace().find(|w| !w.contains('=')))
        .map(|word| word.rsplit('/').next().unwrap_or(word).to_string())
        .collect()
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R, buf: Arc<StdMutex<BoundedCapture>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.lock().unwrap().push(&chunk[..n]),
        }
    }
}

async fn finish_readers(readers: &mut [JoinHandle<()>; 2], grace: Duration) {
    let _ = tokio::time::timeout(grace, async {
        for reader in readers.iter_mut() {
            let _ = reader.await;
        }
    })
    .await;
    for reader in readers.iter() {
        reader.abort();
    }
}

fn take_output(
    stdout: &StdMutex<BoundedCapture>,
    stderr: &StdMutex<BoundedCapture>,
) -> (String, String, DroppedLines) {
    let (stdout, stdout_dropped) = std::mem::take(&mut *stdout.lock().unwrap()).into_text();
    let (stderr, stderr_dropped) = std::mem::take(&mut *stderr.lock().unwrap()).into_text();
    (
        stdout,
        stderr,
        DroppedLines {
            stdout: stdout_dropped,
            stderr: stderr_dropped,
        },
    )
}

fn exit_code(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
