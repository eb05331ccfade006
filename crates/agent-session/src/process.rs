//! Process-group setup and termination for shell commands.

use std::time::Duration;

/// Run the command in its own process group so the whole tree can be
/// signalled on interruption.
#[cfg(unix)]
pub fn configure_process_group(command: &mut tokio::process::Command) {
    // SAFETY: pre_exec runs in the child after fork and before exec; setpgid
    // is async-signal-safe.
    unsafe {
        command.pre_exec(|| {
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
pub fn configure_process_group(command: &mut tokio::process::Command) {
    let _ = command;
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: i32) -> bool {
    if pid == 0 {
        return false;
    }
    let raw_pid = pid as libc::pid_t;
    // Negative pid addresses the group; fall back to the leader alone.
    if unsafe { libc::kill(-raw_pid, signal) } == 0 {
        return true;
    }
    unsafe { libc::kill(raw_pid, signal) == 0 }
}

/// Terminate the process tree rooted at `child`: TERM, then KILL after `grace`.
pub async fn terminate_tree(child: &mut tokio::process::Child, grace: Duration) {
    let pid = child.id().unwrap_or(0);

    #[cfg(unix)]
    {
        if !signal_group(pid, libc::SIGTERM) {
            let _ = child.start_kill();
        }
        if tokio::time::timeout(grace, child.wait()).await.is_err() {
            if !signal_group(pid, libc::SIGKILL) {
                let _ = child.start_kill();
            }
            let _ = tokio::time::timeout(Duration::from_secs(1), child.wait()).await;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        let _ = child.start_kill();
        let _ = tokio::time::timeout(grace, child.wait()).await;
    }

    tracing::debug!(pid, "terminated shell process tree");
}
