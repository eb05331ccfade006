//! Persistent shell sessions for agent-bash.
//!
//! Provides the `ShellSession` abstraction the bash tool executes through,
//! a working-directory keyed registry of persistent shells, the cancellable
//! execution context, bounded output capture, and shell detection.

pub mod capture;
pub mod context;
pub mod process;
pub mod registry;
pub mod session;
pub mod shell;

pub use capture::BoundedCapture;
pub use context::{ExecContext, Interrupt};
pub use registry::SessionRegistry;
pub use session::{
    DroppedLines, ExecOutput, ExecStatus, PersistentShell, SessionError, ShellSession,
};
pub use shell::{default_shell, detect_available_shells, ShellInfo};
