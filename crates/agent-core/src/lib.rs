pub mod config;
pub mod context;
pub mod error;
pub mod permission;
pub mod tool_registry;
pub mod types;

pub use config::AppConfig;
pub use context::RequestContext;
pub use error::AgentError;
pub use permission::{PermissionGate, PermissionRequest, PermissionService};
pub use tool_registry::ToolRegistry;
