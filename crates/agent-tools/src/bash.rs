//! The `bash` tool: run a shell command for the model.
//!
//! A call goes through parameter checks, the read-only fast path or the
//! permission gate, a time-bounded execution in the persistent shell, and
//! outcome interpretation, and comes back as text plus metadata.

use crate::description::bash_description;
use crate::outcome::interpret;
use crate::safe_commands::{self, CommandSafety};
use agent_core::config::AppConfig;
use agent_core::context::RequestContext;
use agent_core::error::AgentError;
use agent_core::permission::{PermissionGate, PermissionRequest};
use agent_core::tool_registry::Tool;
use agent_core::types::{ToolCall, ToolResponse};
use agent_session::ShellSession;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const BASH_TOOL_NAME: &str = "bash";

/// Timeout used when the call gives none, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: i64 = 60 * 1000;
/// Upper bound for caller-supplied timeouts, in milliseconds.
pub const MAX_TIMEOUT_MS: i64 = 10 * 60 * 1000;

/// Shown instead of an empty result.
pub const BASH_NO_OUTPUT: &str = "no output";

/// Raw arguments as the model sends them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BashParams {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub command: String,
    #[serde(default, alias = "timeout_ms")]
    pub timeout: Option<i64>,
}

/// `null` decodes like an absent field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A validated command with its effective timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: String,
    pub timeout: Duration,
}

impl CommandRequest {
    /// Clamp the timeout and reject an empty command.
    pub fn normalize(params: BashParams) -> Result<Self, &'static str> {
        let timeout_ms = effective_timeout_ms(params.timeout);
        if params.command.is_empty() {
            return Err("missing command");
        }
        Ok(Self {
            command: params.command,
            timeout: Duration::from_millis(timeout_ms as u64),
        })
    }
}

/// Non-positive or missing → default; above the maximum → maximum.
pub fn effective_timeout_ms(requested: Option<i64>) -> i64 {
    match requested {
        Some(ms) if ms > MAX_TIMEOUT_MS => MAX_TIMEOUT_MS,
        Some(ms) if ms > 0 => ms,
        _ => DEFAULT_TIMEOUT_MS,
    }
}

/// Parameters attached to the permission request.
#[derive(Debug, Clone, Serialize)]
struct BashPermissionsParams<'a> {
    command: &'a str,
}

/// Structured metadata attached to every bash response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BashResponseMetadata {
    /// Unix milliseconds, captured before authorization.
    pub start_time: i64,
    /// Unix milliseconds, captured after the outcome was interpreted.
    pub end_time: i64,
    /// The rendered output, without the trailing working-directory tag.
    pub output: String,
    /// Working directory after the command ran.
    pub working_directory: String,
}

/// Executes shell commands in a persistent session, gated by permissions.
pub struct BashTool {
    permissions: Arc<dyn PermissionGate>,
    session: Arc<dyn ShellSession>,
    description: String,
    strict_safe_commands: bool,
}

impl BashTool {
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        session: Arc<dyn ShellSession>,
        config: &AppConfig,
    ) -> Self {
        session.set_blocked_commands(config.shell.blocked_commands.clone());
        Self {
            permissions,
            session,
            description: bash_description(&config.attribution),
            strict_safe_commands: config.shell.strict_safe_commands,
        }
    }

    fn needs_authorization(&self, command: &str) -> bool {
        if safe_commands::classify(command) == CommandSafety::RequiresAuthorization {
            return true;
        }
        if !safe_commands::has_shell_operators(command)
            && !safe_commands::escapes_read_only(command)
        {
            return false;
        }
        if self.strict_safe_commands {
            return true;
        }
        warn!(
            command = %command,
            "Read-only prefix on a command that can change state; skipping authorization"
        );
        false
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        BASH_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to execute"
                },
                "timeout": {
                    "type": "number",
                    "description": format!("Optional timeout in milliseconds (max {})", MAX_TIMEOUT_MS)
                }
            },
            "required": ["command"]
        })
    }

    async fn run(&self, ctx: &RequestContext, call: &ToolCall) -> Result<ToolResponse, AgentError> {
        let params: BashParams = match serde_json::from_str(&call.input) {
            Ok(params) => params,
            Err(e) => {
                debug!(error = %e, "Invalid bash parameters");
                return Ok(ToolResponse::error("invalid parameters"));
            }
        };
        let request = match CommandRequest::normalize(params) {
            Ok(request) => request,
            Err(message) => return Ok(ToolResponse::error(message)),
        };

        let (session_id, message_id) = ctx
            .ids()
            .ok_or_else(|| AgentError::MissingContext("shell command".into()))?;

        let start_time = Utc::now().timestamp_millis();

        if self.needs_authorization(&request.command) {
            let allowed = self
                .permissions
                .request(PermissionRequest {
                    session_id: session_id.to_string(),
                    tool_call_id: call.id.clone(),
                    tool_name: BASH_TOOL_NAME.to_string(),
                    action: "execute".to_string(),
                    description: format!("Execute command: {}", request.command),
                    path: self.session.working_directory(),
                    params: serde_json::to_value(BashPermissionsParams {
                        command: &request.command,
                    })?,
                })
                .await;
            if !allowed {
                info!(session = %session_id, "Bash command denied");
                return Err(AgentError::PermissionDenied);
            }
        }

        debug!(
            session = %session_id,
            message = %message_id,
            timeout_ms = request.timeout.as_millis() as u64,
            "Running bash command"
        );

        // The guard cancels the execution context however this call returns.
        let (exec_ctx, _release) = ctx.exec_context().with_timeout(request.timeout);
        let output = self.session.exec(&exec_ctx, &request.command).await;
        let working_directory = self.session.working_directory().display().to_string();

        let result = interpret(output)?;
        if !result.succeeded() {
            debug!(
                interrupted = result.interrupted,
                exit_code = ?result.exit_code,
                "Bash command did not succeed"
            );
        }
        let text = result.render();

        let metadata = BashResponseMetadata {
            start_time,
            end_time: Utc::now().timestamp_millis(),
            output: text.clone(),
            working_directory: working_directory.clone(),
        };

        if text.is_empty() {
            return Ok(ToolResponse::text(BASH_NO_OUTPUT).with_metadata(&metadata)?);
        }
        let display = format!("{}\n\n<cwd>{}</cwd>", text, working_directory);
        Ok(ToolResponse::text(display).with_metadata(&metadata)?)
    }
}
