use crate::context::RequestContext;
use crate::error::AgentError;
use crate::types::{ToolCall, ToolOutput, ToolResponse, ToolSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (used in function calling).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run one call.
    ///
    /// Problems the model can fix are returned as `Ok` error responses;
    /// `Err` is reserved for denials and faults outside the model's control.
    async fn run(&self, ctx: &RequestContext, call: &ToolCall) -> Result<ToolResponse, AgentError>;
}

/// Central registry for all available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::debug!("Registered tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Unregister a tool by name.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// List all registered tool names.
    pub fn list_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get the tool schemas for all registered tools, suitable for sending to the model.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Execute a tool call.
    ///
    /// Unknown tools and permission denials come back as error outputs the
    /// model can read; every other tool error is returned to the caller.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        call: &ToolCall,
    ) -> Result<ToolOutput, AgentError> {
        let Some(tool) = self.tools.get(&call.name) else {
            return Ok(ToolOutput::from_response(
                &call.id,
                ToolResponse::error(AgentError::ToolNotFound(call.name.clone()).to_string()),
            ));
        };

        match tool.run(ctx, call).await {
            Ok(response) => Ok(ToolOutput::from_response(&call.id, response)),
            Err(AgentError::PermissionDenied) => Ok(ToolOutput::from_response(
                &call.id,
                ToolResponse::error(AgentError::PermissionDenied.to_string()),
            )),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool failed");
                Err(e)
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
