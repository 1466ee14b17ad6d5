//! Agent Facade (`§4.8`, C8) and its Configuration surface (`§4.9`/`§6.4`, C9).
//!
//! The single entry point a host drives: boot an MCP server, hold the
//! embedding service, vector store, and chat history for the process
//! lifetime, and run one turn at a time through the Context Manager and
//! ReAct Controller. `chat()` calls against one instance are never
//! concurrent (`§5`) — callers serialize.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use weave_context::{ContextManager, ResourceIndexer};
use weave_embed::EmbeddingService;
use weave_loop::ReActController;
use weave_mcp::McpBridge;
use weave_types::{
    fire_hooks, BoxedHook, BoxedLlmClient, BoxedResourceReader, BoxedTransport, ChatMessage,
    ContextBundle, ConversationState, FacadeError, HookAction, HookError, HookEvent, InitError,
    McpError, ObservabilityHook, ReActError, ResourceContent, ResourceReader, Tool, ToolExecution,
    WeaveConfig, WeaveConfigPatch,
};
use weave_vectorstore::VectorStore;

/// Synthetic system message appended to history on every server switch
/// (`§4.8`), so the model never silently assumes stale tool context carried
/// over from the previous server.
pub const SERVER_SWITCH_NOTICE: &str = "MCP server switched — context reset";

/// The assistant answer recorded when a turn is interrupted (`§5`).
pub const INTERRUPTED_ANSWER: &str = "<interrupted>";

/// Adapts a shared [`McpBridge`] to [`ResourceReader`] so the indexer can
/// expand referenced resources without the bridge itself needing to be
/// `'static` at the call site.
struct SharedBridgeReader(Arc<McpBridge>);

impl ResourceReader for SharedBridgeReader {
    async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
        self.0.read_resource_content(uri).await
    }
}

/// Turns a flag set by [`AgentFacade::interrupt`] into a
/// [`HookAction::Terminate`] at the next hook firing. Always registered
/// first so an interrupt takes effect at the earliest opportunity; any tool
/// call already in flight still runs to completion; only its observation is
/// discarded, by the controller returning before recording it.
struct InterruptHook(Arc<AtomicBool>);

impl ObservabilityHook for InterruptHook {
    async fn on_event(&self, _event: HookEvent<'_>) -> Result<HookAction, HookError> {
        if self.0.swap(false, Ordering::SeqCst) {
            Ok(HookAction::Terminate { reason: "interrupted".to_string() })
        } else {
            Ok(HookAction::Continue)
        }
    }
}

struct Connected {
    bridge: Arc<McpBridge>,
    server_id: String,
}

/// Single-process, single-user agent core (`§1` Non-goals: no multi-user or
/// server-side operation; no persistence across restarts — the vector index
/// and history are in-memory only).
pub struct AgentFacade {
    llm: BoxedLlmClient,
    hooks: Vec<BoxedHook>,
    interrupt_flag: Arc<AtomicBool>,
    embeddings: EmbeddingService,
    store: VectorStore,
    context_manager: ContextManager,
    turn_counter: AtomicU64,
    config: RwLock<WeaveConfig>,
    history: Mutex<Vec<ChatMessage>>,
    connected: RwLock<Option<Connected>>,
}

impl AgentFacade {
    /// Construct a facade with no server connected yet. Call
    /// [`Self::boot_server`] before [`Self::chat`].
    ///
    /// `embeddings` is accepted rather than constructed internally so a host
    /// (or a test) can choose its backend — production code passes a fresh
    /// [`EmbeddingService::new`] and lets [`Self::boot_server`] load it;
    /// tests pass [`EmbeddingService::with_backend`] with a fixed backend.
    #[must_use]
    pub fn new(llm: BoxedLlmClient, embeddings: EmbeddingService, config: WeaveConfig, hooks: Vec<BoxedHook>) -> Self {
        let interrupt_flag = Arc::new(AtomicBool::new(false));
        let mut all_hooks = Vec::with_capacity(hooks.len() + 1);
        all_hooks.push(BoxedHook::new(InterruptHook(Arc::clone(&interrupt_flag))));
        all_hooks.extend(hooks);

        Self {
            llm,
            hooks: all_hooks,
            interrupt_flag,
            embeddings,
            store: VectorStore::new(),
            context_manager: ContextManager::new(),
            turn_counter: AtomicU64::new(0),
            config: RwLock::new(config),
            history: Mutex::new(Vec::new()),
            connected: RwLock::new(None),
        }
    }

    /// Whether a server is currently connected and `chat()` can be called.
    pub async fn is_ready(&self) -> bool {
        self.connected.read().await.is_some()
    }

    /// Bring up (or switch to) an MCP server (`§4.8`). In order: tear down
    /// the prior bridge, clear the vector store, clear chat history, emit a
    /// synthetic system notice, connect and handshake the new bridge, then
    /// fetch and index every resource it advertises.
    ///
    /// Fatal on failure. The prior bridge has already been torn down by the
    /// time any step here can fail, so a failed switch leaves the facade
    /// not-ready rather than silently keeping the old server connected —
    /// reusing a stale bridge after a failed switch would be its own
    /// correctness bug.
    pub async fn boot_server(
        &self,
        server_id: impl Into<String>,
        transport: BoxedTransport,
        now_millis: i64,
    ) -> Result<(), InitError> {
        let server_id = server_id.into();

        *self.connected.write().await = None;
        self.store.clear().await;
        self.context_manager.invalidate().await;
        self.turn_counter.store(0, Ordering::SeqCst);
        self.history.lock().await.clear();
        self.history.lock().await.push(ChatMessage::system(SERVER_SWITCH_NOTICE));

        if !self.embeddings.is_ready().await {
            self.embeddings.init().await?;
        }
        self.store.init().await;

        let bridge = Arc::new(McpBridge::new(transport));
        bridge.init().await?;

        let reader = BoxedResourceReader::new(SharedBridgeReader(Arc::clone(&bridge)));
        let indexer = ResourceIndexer::new(&self.embeddings, &self.store, &reader);
        for descriptor in bridge.list_resources().await {
            match bridge.read_resource_content(&descriptor.uri).await {
                Ok(content) => {
                    indexer
                        .index_resource(&descriptor.uri, content.description.as_deref(), &content.text, now_millis)
                        .await;
                }
                Err(err) => {
                    tracing::warn!(uri = %descriptor.uri, error = %err, "failed to fetch resource during boot indexing");
                }
            }
        }

        self.fire_lifecycle(HookEvent::ServerSwitch { server_id: &server_id }).await;
        *self.connected.write().await = Some(Connected { bridge, server_id });
        Ok(())
    }

    /// Run one turn (`§4.8` steps 1-5): append `user_message` to history,
    /// assemble a context bundle, drive the ReAct Controller, append its
    /// answer to history, and index every successful tool result for future
    /// retrieval.
    pub async fn chat(&self, user_message: &str, now_millis: i64) -> Result<ConversationState, FacadeError> {
        let connected_guard = self.connected.read().await;
        let connected = connected_guard.as_ref().ok_or(FacadeError::NotReady)?;

        self.history.lock().await.push(ChatMessage::user(user_message));

        let turn = self.turn_counter.fetch_add(1, Ordering::SeqCst);
        let config = self.config.read().await.clone();
        let tools = connected.bridge.list_tools().await;
        let history_snapshot = self.history.lock().await.clone();
        let bundle = self
            .build_context(user_message, &history_snapshot, tools, &connected.server_id, turn, &config)
            .await;

        let controller = ReActController::new(&self.llm, &connected.bridge, &self.hooks);

        match controller.run(user_message, &bundle, config.max_react_steps, now_millis).await {
            Ok(run) => {
                self.history.lock().await.push(ChatMessage::assistant(run.answer.clone()));
                self.index_tool_results(&connected.bridge, &run.tool_executions, now_millis).await;
                Ok(ConversationState {
                    messages: self.history.lock().await.clone(),
                    tool_executions: run.tool_executions,
                    react_steps: run.steps,
                })
            }
            Err(ReActError::Interrupted { steps, tool_executions }) => {
                self.history.lock().await.push(ChatMessage::assistant(INTERRUPTED_ANSWER));
                self.index_tool_results(&connected.bridge, &tool_executions, now_millis).await;
                Ok(ConversationState {
                    messages: self.history.lock().await.clone(),
                    tool_executions,
                    react_steps: steps,
                })
            }
            Err(err @ ReActError::Llm(_)) => Err(FacadeError::Turn(err)),
        }
    }

    /// Cancel the current turn, if any (`§5`): cancels the in-flight LLM
    /// call via [`weave_types::LlmClient::interrupt`] and arms the hook that
    /// aborts the loop at its next step boundary. A tool call already in
    /// flight still runs to completion; its observation is discarded.
    pub async fn interrupt(&self) {
        self.interrupt_flag.store(true, Ordering::SeqCst);
        self.llm.interrupt().await;
    }

    /// Current configuration snapshot (`§6.4`).
    pub async fn config(&self) -> WeaveConfig {
        self.config.read().await.clone()
    }

    /// Apply a partial configuration update. Every key is read live by the
    /// component that owns it; no restart required.
    pub async fn set_config(&self, patch: WeaveConfigPatch) {
        self.config.write().await.apply(patch);
    }

    #[allow(clippy::too_many_arguments)]
    async fn build_context(
        &self,
        user_message: &str,
        history: &[ChatMessage],
        tools: Vec<Tool>,
        server_id: &str,
        turn: u64,
        config: &WeaveConfig,
    ) -> ContextBundle {
        match self
            .context_manager
            .build(user_message, history, tools.clone(), server_id, turn, &self.embeddings, &self.store, config)
            .await
        {
            Ok(bundle) => bundle,
            Err(err) => {
                tracing::warn!(error = %err, "context retrieval failed; degrading to an empty bundle");
                ContextBundle {
                    tools,
                    relevant_resources: Vec::new(),
                    history_messages: history.to_vec(),
                }
            }
        }
    }

    async fn index_tool_results(&self, bridge: &Arc<McpBridge>, executions: &[ToolExecution], now_millis: i64) {
        let reader = BoxedResourceReader::new(SharedBridgeReader(Arc::clone(bridge)));
        let indexer = ResourceIndexer::new(&self.embeddings, &self.store, &reader);
        for execution in executions {
            let Some(result) = execution.result.as_ref() else { continue };
            indexer
                .index_tool_result(&execution.name, &execution.id, &execution.arguments, result, now_millis)
                .await;
        }
    }

    async fn fire_lifecycle(&self, event: HookEvent<'_>) {
        if let Err(err) = fire_hooks(&self.hooks, event).await {
            tracing::warn!(error = %err, "observability hook failed during lifecycle event");
        }
    }
}
