//! Turning a shell execution into the text the model sees.

use crate::truncate::truncate_captured;
use agent_core::error::AgentError;
use agent_session::{ExecOutput, ExecStatus};

/// Appended when a command was cancelled or ran out of time.
pub const ABORTED_MESSAGE: &str = "Command was aborted before completion";

/// A finished command, with output already bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub stdout: String,
    pub stderr: String,
    /// Stderr (or the failure cause when stderr is empty) followed by the
    /// interruption or exit-code annotation.
    pub error_message: String,
    pub interrupted: bool,
    /// `None` when the command was interrupted.
    pub exit_code: Option<i32>,
}

/// Classify an execution and bound its output.
///
/// A session fault is a hard error. Non-zero exits and interruptions are
/// ordinary results described in `error_message`.
pub fn interpret(output: ExecOutput) -> Result<Interpretation, AgentError> {
    let (interrupted, exit_code, cause) = match output.status {
        ExecStatus::Fault(cause) => {
            return Err(AgentError::Shell(format!(
                "error executing command: {}",
                cause
            )))
        }
        ExecStatus::Interrupted(reason) => (true, None, Some(reason.to_string())),
        ExecStatus::Exited(0) => (false, Some(0), None),
        ExecStatus::Exited(code) => (false, Some(code), Some(format!("exit status {}", code))),
    };

    let stdout = truncate_captured(&output.stdout, output.dropped.stdout);
    let stderr = truncate_captured(&output.stderr, output.dropped.stderr);

    // Without stderr, the cause itself explains the failure.
    let mut error_message = if stderr.is_empty() {
        cause.unwrap_or_default()
    } else {
        stderr.clone()
    };
    let annotation = if interrupted {
        Some(ABORTED_MESSAGE.to_string())
    } else {
        exit_code
            .filter(|code| *code != 0)
            .map(|code| format!("Exit code {}", code))
    };
    if let Some(annotation) = annotation {
        if !error_message.is_empty() {
            error_message.push('\n');
        }
        error_message.push_str(&annotation);
    }

    Ok(Interpretation {
        stdout,
        stderr,
        error_message,
        interrupted,
        exit_code,
    })
}

impl Interpretation {
    /// Stdout, then stderr and any annotation on the following line.
    pub fn render(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stdout.is_empty() && !self.stderr.is_empty() {
            text.push('\n');
        }
        if !self.error_message.is_empty() {
            text.push('\n');
            text.push_str(&self.error_message);
        }
        text
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_session::{DroppedLines, Interrupt};

    #[test]
    fn test_clean_exit_has_no_annotation() {
        let result = interpret(ExecOutput::exited("hi\n", "", 0)).unwrap();
        assert!(result.succeeded());
        assert!(result.error_message.is_empty());
        assert_eq!(result.render(), "hi\n");
    }

    #[test]
    fn test_empty_clean_exit_renders_empty() {
        let result = interpret(ExecOutput::exited("", "", 0)).unwrap();
        assert_eq!(result.render(), "");
    }

    #[test]
    fn test_nonzero_exit_follows_stderr() {
        let result = interpret(ExecOutput::exited("", "boom", 1)).unwrap();
        assert_eq!(result.error_message, "boom\nExit code 1");
        assert_eq!(result.render(), "\nboom\nExit code 1");
        assert!(!result.succeeded());
    }

    #[test]
    fn test_nonzero_exit_without_stderr() {
        let result = interpret(ExecOutput::exited("partial", "", 2)).unwrap();
        assert_eq!(result.error_message, "exit status 2\nExit code 2");
        assert_eq!(result.render(), "partial\nexit status 2\nExit code 2");
    }

    #[test]
    fn test_both_streams_are_separated() {
        let result = interpret(ExecOutput::exited("out", "warn", 0)).unwrap();
        assert_eq!(result.render(), "out\n\nwarn");
    }

    #[test]
    fn test_interruption_annotation() {
        for reason in [Interrupt::Cancelled, Interrupt::DeadlineExceeded] {
            let result = interpret(ExecOutput::interrupted("started\n", "", reason)).unwrap();
            assert!(result.interrupted);
            assert_eq!(result.exit_code, None);
            assert_eq!(
                result.error_message,
                format!("{}\n{}", reason, ABORTED_MESSAGE)
            );
            assert!(result.render().ends_with(ABORTED_MESSAGE));
        }
    }

    #[test]
    fn test_timeout_without_stderr_names_the_deadline() {
        let result =
            interpret(ExecOutput::interrupted("", "", Interrupt::DeadlineExceeded)).unwrap();
        assert_eq!(
            result.render(),
            "\ncontext deadline exceeded\nCommand was aborted before completion"
        );
    }

    #[test]
    fn test_stderr_takes_precedence_over_cause() {
        let result =
            interpret(ExecOutput::interrupted("", "killed", Interrupt::Cancelled)).unwrap();
        assert_eq!(result.error_message, format!("killed\n{}", ABORTED_MESSAGE));
    }

    #[test]
    fn test_capture_drops_are_reported() {
        let output = ExecOutput::exited("first\nlast\n", "", 0).with_dropped(DroppedLines {
            stdout: Some(41),
            stderr: None,
        });
        let result = interpret(output).unwrap();
        assert_eq!(
            result.stdout,
            "first\nlast\n\n\n... [42 lines truncated] ...\n\n"
        );
        assert!(result.error_message.is_empty());
    }

    #[test]
    fn test_fault_is_hard_error() {
        let err = interpret(ExecOutput::fault("Failed to spawn shell: ENOENT")).unwrap_err();
        assert!(matches!(err, AgentError::Shell(_)));
        assert_eq!(
            err.to_string(),
            "error executing command: Failed to spawn shell: ENOENT"
        );
    }

    #[test]
    fn test_streams_are_truncated_before_annotation() {
        let huge = "e".repeat(crate::truncate::MAX_OUTPUT_LENGTH * 2);
        let result = interpret(ExecOutput::exited("", huge, 1)).unwrap();
        assert!(result.stderr.contains("lines truncated"));
        assert!(result.error_message.ends_with("\nExit code 1"));
    }
}
