//! Catalog types returned by `tools/list`, `resources/list`, and `prompts/list`.

use serde::{Deserialize, Serialize};

/// A resource advertised by the connected server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// URI identifying the resource, e.g. `res://vegan_pasta`.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Optional short description, surfaced in the indexer's framing.
    pub description: Option<String>,
    /// MIME type of the resource content.
    pub mime_type: Option<String>,
}

/// A prompt template advertised by the connected server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDescriptor {
    /// The prompt name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Arguments the prompt accepts.
    pub arguments: Vec<PromptArgument>,
}

/// An argument for a [`PromptDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether this argument is required.
    pub required: Option<bool>,
}

/// A message returned from `prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// The role (`"user"` or `"assistant"`).
    pub role: String,
    /// The message text.
    pub content: String,
}

/// Result of a `prompts/get` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResult {
    /// Optional description of the resolved prompt.
    pub description: Option<String>,
    /// The resolved prompt messages.
    pub messages: Vec<PromptMessage>,
}

/// Outcome of [`crate::bridge::McpBridge::execute_tool`], normalized so the
/// ReAct Controller never has to special-case transport vs. tool-runtime
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    /// `true` iff the tool ran without error.
    pub ok: bool,
    /// The unwrapped result value, present iff `ok`.
    pub result: Option<serde_json::Value>,
    /// The error message, present iff `!ok`.
    pub error: Option<String>,
}
