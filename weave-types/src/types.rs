//! Core data model: chat messages, tools, ReAct steps, and retrieval records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role a [`ChatMessage`] was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System preamble, constructed fresh each turn.
    System,
    /// The end user.
    User,
    /// The LLM.
    Assistant,
    /// A tool observation fed back to the model.
    Tool,
}

/// One entry in the conversation history.
///
/// Content is always a flat string: the core speaks a line-oriented ReAct
/// protocol with the model, never native tool-call content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored this message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Set when this message carries a tool observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// The tool name associated with a tool-role message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    /// Build a user-authored message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Build an assistant-authored message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Build a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Build an observation message fed back to the model after a tool call.
    #[must_use]
    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
        }
    }
}

/// A named, typed callable exposed by the MCP tool runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Unique within a booted server; regenerated on server switch.
    pub name: String,
    /// Human-readable description, surfaced in the system preamble.
    pub description: String,
    /// JSON Schema describing the tool's arguments.
    pub parameters: serde_json::Value,
}

/// One attempted tool call, recorded in call order regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    /// Unique identifier for this execution, used to derive `tool://` URIs.
    pub id: String,
    /// The tool name invoked.
    pub name: String,
    /// The arguments passed, after JSON parsing.
    pub arguments: serde_json::Value,
    /// The raw result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error message on failure; mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix epoch milliseconds when the execution was recorded.
    pub timestamp: i64,
}

impl ToolExecution {
    /// Whether the call succeeded (no `error` set).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A single action requested by the model within a [`ReActStep`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// The tool name, as written in `Action: <toolName>`.
    pub tool: String,
    /// The parsed `Action Input` JSON.
    pub args: serde_json::Value,
}

/// One iteration of the Thought -> Action -> Observation -> Final Answer loop.
///
/// `thought` is always present. Exactly one of `(action, observation)` or
/// `final_answer` is populated, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActStep {
    /// The model's stated reasoning for this step.
    pub thought: String,
    /// The action taken, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// The observation fed back after the action, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    /// The terminal answer, if this step concluded the loop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
}

impl ReActStep {
    /// True if this step carries a final answer rather than an action.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.final_answer.is_some()
    }
}

/// What an [`IndexedItem`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexedKind {
    /// An MCP resource (`res://<id>`).
    Resource,
    /// An auto-indexed tool result (`tool://<toolName>/<executionId>`).
    ToolResult,
}

/// Metadata stored alongside a vector store row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedMetadata {
    /// First 10,000 chars of the framed text, kept for retrieval without a
    /// second round trip.
    pub text_preview: String,
    /// Length of the full framed text before truncation to `text_preview`.
    pub full_text_length: usize,
    /// Unix epoch milliseconds when this row was (re-)indexed.
    pub indexed_at: i64,
    /// Dimension of `embedding` at index time.
    pub embedding_dim: usize,
    /// Resource vs. tool-result provenance.
    pub kind: IndexedKind,
}

/// A single row in the vector store, keyed by `uri`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Primary key. `res://<id>` for resources, `tool://<toolName>/<executionId>`
    /// for tool results.
    pub uri: String,
    /// L2-normalized embedding vector.
    pub embedding: Vec<f32>,
    /// Indexing metadata.
    pub metadata: IndexedMetadata,
}

/// A scored search hit returned from the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched row's URI.
    pub uri: String,
    /// Dot-product similarity score.
    pub score: f32,
    /// The stored text preview.
    pub text: String,
    /// The stored metadata.
    pub metadata: IndexedMetadata,
}

/// Aggregate statistics for the vector store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VectorStoreStats {
    /// Number of rows currently stored.
    pub count: usize,
    /// Approximate size of stored embeddings in bytes.
    pub total_bytes: usize,
}

/// Retrieved context plus the tool catalog, assembled once per turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Tools available to the ReAct Controller this turn.
    pub tools: Vec<Tool>,
    /// Resources/tool results judged relevant to the current query.
    pub relevant_resources: Vec<SearchHit>,
    /// History messages selected to fit the history sub-budget.
    pub history_messages: Vec<ChatMessage>,
}

/// Options passed to an [`crate::traits::LlmClient`] call.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling temperature, if the client supports it.
    pub temperature: Option<f32>,
    /// Tool schemas to surface, purely informational for text-protocol
    /// models (the core never relies on native function calling).
    pub tools: Vec<Tool>,
}

/// Result of a single `chat()` invocation on the facade-level API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Full message history after this turn.
    pub messages: Vec<ChatMessage>,
    /// Tool executions attempted during this turn.
    pub tool_executions: Vec<ToolExecution>,
    /// ReAct steps taken during this turn.
    pub react_steps: Vec<ReActStep>,
}

/// Runtime-tunable flags, all read live by the relevant component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaveConfig {
    /// Select ReAct controller vs. a legacy path (not implemented in this core).
    pub use_react_agent: bool,
    /// If false, retrieved resources are always empty.
    pub use_vector_search: bool,
    /// If false, no token-budget truncation is applied.
    pub enable_context_budgeting: bool,
    /// Hard cap on ReAct loop iterations.
    pub max_react_steps: usize,
    /// `t_candidate`: permissive threshold for the first-pass vector search.
    pub resource_candidate_threshold: f32,
    /// `t_final`: threshold applied after recency boosting.
    pub resource_final_threshold: f32,
    /// `delta`: additive score boost for recently-mentioned URIs.
    pub resource_recency_boost: f32,
    /// Max resources kept after boosting and filtering.
    pub resource_max_results: usize,
    /// Token-equivalent budget for retrieved content.
    pub budget_resources: usize,
    /// Token-equivalent budget for prior turns.
    pub budget_history: usize,
    /// Verbose per-candidate logging.
    pub debug_mode: bool,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            use_react_agent: true,
            use_vector_search: true,
            enable_context_budgeting: true,
            max_react_steps: 5,
            resource_candidate_threshold: 0.25,
            resource_final_threshold: 0.35,
            resource_recency_boost: 0.30,
            resource_max_results: 5,
            budget_resources: 2048,
            budget_history: 512,
            debug_mode: false,
        }
    }
}

impl WeaveConfig {
    /// Apply a partial update, leaving unset fields untouched.
    pub fn apply(&mut self, partial: WeaveConfigPatch) {
        if let Some(v) = partial.use_react_agent {
            self.use_react_agent = v;
        }
        if let Some(v) = partial.use_vector_search {
            self.use_vector_search = v;
        }
        if let Some(v) = partial.enable_context_budgeting {
            self.enable_context_budgeting = v;
        }
        if let Some(v) = partial.max_react_steps {
            self.max_react_steps = v;
        }
        if let Some(v) = partial.resource_candidate_threshold {
            self.resource_candidate_threshold = v;
        }
        if let Some(v) = partial.resource_final_threshold {
            self.resource_final_threshold = v;
        }
        if let Some(v) = partial.resource_recency_boost {
            self.resource_recency_boost = v;
        }
        if let Some(v) = partial.resource_max_results {
            self.resource_max_results = v;
        }
        if let Some(v) = partial.budget_resources {
            self.budget_resources = v;
        }
        if let Some(v) = partial.budget_history {
            self.budget_history = v;
        }
        if let Some(v) = partial.debug_mode {
            self.debug_mode = v;
        }
    }
}

/// A sparse update to [`WeaveConfig`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaveConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_react_agent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_vector_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_context_budgeting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_react_steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_candidate_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_final_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_recency_boost: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_resources: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_history: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
}

/// A JSON-RPC 2.0 request envelope, used by [`crate::traits::Transport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build a request envelope with `jsonrpc: "2.0"`.
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

/// Extra key/value pairs some transports attach (e.g. health probe metadata).
pub type Extra = HashMap<String, serde_json::Value>;

/// The content of one MCP resource, as returned by `resources/read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    /// The resource's URI, echoed back for correlation.
    pub uri: String,
    /// Short description, if the server advertised one in `resources/list`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The resource's raw text content.
    pub text: String,
}
