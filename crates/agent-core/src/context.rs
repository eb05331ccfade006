//! Per-call request context.
//!
//! Carries the identifiers of the conversation turn a tool call belongs to
//! and the cancellation token for that turn. Passed explicitly to
//! [`Tool::run`](crate::tool_registry::Tool::run).

use agent_session::ExecContext;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session_id: Option<String>,
    pub message_id: Option<String>,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(session_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            message_id: Some(message_id.into()),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` as the turn's cancellation signal.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Both identifiers, if both are present and non-empty.
    pub fn ids(&self) -> Option<(&str, &str)> {
        let session = self.session_id.as_deref().filter(|s| !s.is_empty())?;
        let message = self.message_id.as_deref().filter(|s| !s.is_empty())?;
        Some((session, message))
    }

    /// An execution context that is cancelled together with this request.
    pub fn exec_context(&self) -> ExecContext {
        ExecContext::new(self.cancel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_require_both() {
        assert_eq!(
            RequestContext::new("s", "m").ids(),
            Some(("s", "m"))
        );
        assert!(RequestContext::default().ids().is_none());

        let mut ctx = RequestContext::new("s", "m");
        ctx.message_id = None;
        assert!(ctx.ids().is_none());

        assert!(RequestContext::new("", "m").ids().is_none());
    }

    #[test]
    fn test_exec_context_follows_request_cancellation() {
        let ctx = RequestContext::new("s", "m");
        let exec = ctx.exec_context();
        assert!(exec.err().is_none());
        ctx.cancellation().cancel();
        assert!(exec.err().is_some());
    }
}
