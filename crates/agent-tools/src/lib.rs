pub mod bash;
pub mod description;
pub mod outcome;
pub mod safe_commands;
pub mod truncate;

use agent_core::config::AppConfig;
use agent_core::error::AgentError;
use agent_core::permission::PermissionGate;
use agent_core::tool_registry::ToolRegistry;
use agent_session::SessionRegistry;
use std::sync::Arc;

/// Register all built-in tools into the registry.
///
/// The bash tool gets the persistent shell for the configured working
/// directory from `sessions`.
pub fn register_all(
    registry: &mut ToolRegistry,
    config: &AppConfig,
    sessions: &SessionRegistry,
    permissions: Arc<dyn PermissionGate>,
) -> Result<(), AgentError> {
    let working_dir = config.shell.resolve_working_dir()?;
    let session = sessions.get_or_create(&working_dir);

    registry.register(Arc::new(bash::BashTool::new(permissions, session, config)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::context::RequestContext;
    use agent_core::permission::{DenyAll, PermissionService};
    use agent_core::types::ToolCall;
    use agent_session::ShellInfo;

    fn setup(dir: &std::path::Path, config: &mut AppConfig) -> Option<ToolRegistry> {
        let shell = agent_session::default_shell()?;
        config.shell.working_dir = Some(dir.to_path_buf());
        let sessions = SessionRegistry::new(shell);
        let permissions = Arc::new(PermissionService::new(&config.permissions, Arc::new(DenyAll)));
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, config, &sessions, permissions).unwrap();
        Some(registry)
    }

    #[test]
    fn test_register_all() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionRegistry::new(ShellInfo::new("sh", "Shell", "/bin/sh"));
        let mut config = AppConfig::default();
        config.shell.working_dir = Some(dir.path().to_path_buf());

        let mut registry = ToolRegistry::new();
        register_all(
            &mut registry,
            &config,
            &sessions,
            Arc::new(PermissionService::new(&config.permissions, Arc::new(DenyAll))),
        )
        .unwrap();

        assert_eq!(registry.list_names(), vec![bash::BASH_TOOL_NAME]);
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_read_only_command() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let mut config = AppConfig::default();
        let Some(registry) = setup(dir.path(), &mut config) else {
            return;
        };

        let ctx = RequestContext::new("s", "m");
        let out = registry
            .execute(&ctx, &ToolCall::new("1", "bash", r#"{"command":"ls"}"#))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(out.content.starts_with("notes.txt\n"));
        assert!(out.content.contains("<cwd>"));
    }

    #[tokio::test]
    async fn test_end_to_end_denied_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        let Some(registry) = setup(dir.path(), &mut config) else {
            return;
        };

        let ctx = RequestContext::new("s", "m");
        let out = registry
            .execute(
                &ctx,
                &ToolCall::new("1", "bash", r#"{"command":"touch created.txt"}"#),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.content, "permission denied");
        assert!(!dir.path().join("created.txt").exists());
    }

    #[tokio::test]
    async fn test_end_to_end_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.permissions.allowed_tools = vec!["bash".into()];
        let Some(registry) = setup(dir.path(), &mut config) else {
            return;
        };

        let ctx = RequestContext::new("s", "m");
        let out = registry
            .execute(
                &ctx,
                &ToolCall::new("1", "bash", r#"{"command":"sleep 10","timeout":200}"#),
            )
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(out.content.contains("Command was aborted before completion"));
    }
}
