use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The user (or policy) refused a permission request. Surfaced verbatim.
    #[error("permission denied")]
    PermissionDenied,

    /// The caller did not supply the session or message identifiers.
    #[error("session ID and message ID are required for executing {0}")]
    MissingContext(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The shell session failed independently of the command it was given.
    #[error("{0}")]
    Shell(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
