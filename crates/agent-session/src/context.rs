//! Cancellable, deadline-bounded execution context.
//!
//! An `ExecContext` pairs a `CancellationToken` with an optional deadline.
//! Children derived with [`ExecContext::with_timeout`] are cancelled when
//! their parent is, and hand back a `DropGuard` that cancels the child on
//! every exit path of the scope that owns it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why an execution context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interrupt {
    /// The token (or an ancestor) was cancelled.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl std::fmt::Display for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interrupt::Cancelled => write!(f, "context canceled"),
            Interrupt::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// Wrap an existing token with no deadline.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled unless a child is derived from it.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Derive a child context that expires after `timeout`.
    ///
    /// The child never outlives the parent's deadline. Dropping the returned
    /// guard cancels the child token (but not the parent).
    pub fn with_timeout(&self, timeout: Duration) -> (Self, DropGuard) {
        let token = self.token.child_token();
        let mut deadline = Instant::now() + timeout;
        if let Some(parent) = self.deadline {
            deadline = deadline.min(parent);
        }
        let guard = token.clone().drop_guard();
        (
            Self {
                token,
                deadline: Some(deadline),
            },
            guard,
        )
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason if the context has already finished.
    pub fn err(&self) -> Option<Interrupt> {
        if self.token.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Interrupt {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => Interrupt::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Interrupt::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Interrupt::Cancelled
            }
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::background()
    }
}
