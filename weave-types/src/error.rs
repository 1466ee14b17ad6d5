//! Error types for all weave crates, mapped to the error kinds and recovery
//! policy: most failures degrade to an `ERROR:` observation fed back to the
//! model rather than aborting the loop.

use thiserror::Error;

/// Failures during the embedding service's lifetime.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Model load failed; fatal at `bootServer` time.
    #[error("embedding model failed to load: {0}")]
    ModelLoad(String),
    /// A single `embed()` call failed; callers treat this as "skip indexing".
    #[error("failed to encode text: {0}")]
    Encode(String),
    /// `embed()` called before `init()` completed.
    #[error("embedding service not ready")]
    NotReady,
}

/// Failures from the vector store. Per the spec's contract, corrupt rows are
/// skipped rather than surfaced — this enum exists only for the one fatal
/// precondition.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// `add`/`search` called before `init()`.
    #[error("vector store not ready; call init() first")]
    NotReady,
}

/// Failures raised while assembling a [`crate::types::ContextBundle`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// The embedding service failed; retrieval degrades to an empty bundle.
    #[error("embedding failed during retrieval: {0}")]
    Embedding(#[from] EmbeddingError),
    /// The vector store failed; retrieval degrades to an empty bundle.
    #[error("vector store error during retrieval: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Transport-level failure reaching the MCP tool runtime.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport could not establish or maintain a connection.
    #[error("transport disconnected: {0}")]
    Disconnected(String),
    /// The outer request exceeded its deadline (30s default).
    #[error("transport call timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// The transport received a malformed response.
    #[error("malformed transport response: {0}")]
    Malformed(String),
}

/// Failures from the MCP Bridge, covering handshake, schema validation, and
/// tool dispatch.
#[derive(Debug, Error)]
pub enum McpError {
    /// `initialize` handshake failed or the protocol version is unsupported.
    /// Fatal at `bootServer` time.
    #[error("MCP initialization failed: {0}")]
    Initialization(String),
    /// Transport-level disconnect/timeout during a call.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Arguments failed validation against the tool's JSON Schema.
    #[error("invalid arguments for tool '{tool}': {detail}")]
    SchemaValidation {
        /// The tool name the arguments were validated against.
        tool: String,
        /// Human-readable description of the offending field and expected shape.
        detail: String,
    },
    /// The server returned `isError: true` or raised within the tool itself.
    #[error("tool '{tool}' failed: {message}")]
    ToolRuntime {
        /// The tool name that failed.
        tool: String,
        /// The error message reported by the server.
        message: String,
    },
    /// The JSON-RPC error envelope `{code, message, data?}`.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// A requested tool name is not in the current catalog.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl McpError {
    /// Render this error as the `ERROR: ...` observation text fed back to the
    /// model, per the spec's non-fatal tool-failure policy.
    #[must_use]
    pub fn as_observation(&self) -> String {
        format!("ERROR: {self}")
    }
}

/// Failures from the [`crate::traits::LlmClient`] boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The underlying client call failed (network, model error, etc).
    #[error("LLM call failed: {0}")]
    CallFailed(String),
    /// The call was interrupted via `interrupt()`.
    #[error("LLM call interrupted")]
    Interrupted,
}

/// Failures surfaced by the ReAct Controller. Per the spec, most model
/// misbehavior (bad JSON, missing Thought) is absorbed gracefully rather than
/// raised here; this enum covers only the remaining hard failures.
#[derive(Debug, Error)]
pub enum ReActError {
    /// The underlying LLM call failed.
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),
    /// The loop was interrupted via `interrupt()`. Carries whatever steps and
    /// tool executions had already completed, so the caller can still report
    /// partial progress (`§5`) instead of losing the turn entirely.
    #[error("loop interrupted")]
    Interrupted {
        /// Steps recorded before the interrupt was observed.
        steps: Vec<crate::types::ReActStep>,
        /// Tool executions completed before the interrupt was observed.
        tool_executions: Vec<crate::types::ToolExecution>,
    },
}

/// Failures surfaced by the Agent Facade.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// `chat()` called before `bootServer()` completed successfully.
    #[error("facade not ready; call bootServer() first")]
    NotReady,
    /// `bootServer()` failed: embedding model load, transport connect, or MCP
    /// handshake. Fatal; the facade remains in its prior ready/not-ready state.
    #[error("boot failed: {0}")]
    Init(#[from] InitError),
    /// The ReAct loop failed outside of an interrupt (e.g. the LLM client
    /// itself errored). Interrupts are absorbed into a partial
    /// [`crate::types::ConversationState`] instead of reaching here.
    #[error("turn failed: {0}")]
    Turn(#[from] ReActError),
}

/// Failures raised by an [`crate::hooks::ObservabilityHook`] implementation.
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook's own logic failed (e.g. an exporter call errored).
    #[error("hook failed: {0}")]
    Failed(String),
}

/// The union of failure modes that can occur while bringing up a new server,
/// i.e. during `bootServer()`.
#[derive(Debug, Error)]
pub enum InitError {
    /// The embedding model failed to load.
    #[error("embedding model load failed: {0}")]
    Embedding(#[from] EmbeddingError),
    /// The transport failed to connect or the MCP handshake failed.
    #[error("MCP bridge init failed: {0}")]
    Mcp(#[from] McpError),
}
