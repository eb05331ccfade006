use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub input: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input: input.into(),
        }
    }
}

/// Schema definition for a tool's parameters, sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The response envelope a tool hands back for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Human-readable text shown to the model.
    pub content: String,
    /// Structured, tool-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
            is_error: true,
        }
    }

    /// Attach serializable metadata to the response.
    pub fn with_metadata<T: Serialize>(mut self, metadata: &T) -> Result<Self, serde_json::Error> {
        self.metadata = Some(serde_json::to_value(metadata)?);
        Ok(self)
    }

    /// Decode the metadata back into a typed value.
    pub fn metadata_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.metadata
            .as_ref()
            .and_then(|m| serde_json::from_value(m.clone()).ok())
    }
}

/// Output from a tool execution, as recorded by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn from_response(tool_call_id: impl Into<String>, response: ToolResponse) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: response.content,
            metadata: response.metadata,
            is_error: response.is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Meta {
        output: String,
    }

    #[test]
    fn test_response_constructors() {
        assert!(!ToolResponse::text("ok").is_error);
        let err = ToolResponse::error("missing command");
        assert!(err.is_error);
        assert_eq!(err.content, "missing command");
        assert!(err.metadata.is_none());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let meta = Meta {
            output: "hi".into(),
        };
        let response = ToolResponse::text("hi").with_metadata(&meta).unwrap();
        assert_eq!(response.metadata_as::<Meta>(), Some(meta));
    }

    #[test]
    fn test_output_from_response() {
        let output = ToolOutput::from_response("call-1", ToolResponse::error("nope"));
        assert_eq!(output.tool_call_id, "call-1");
        assert!(output.is_error);
        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("metadata"));
    }
}
