//! OpenTelemetry instrumentation for the weave agent core using GenAI
//! semantic conventions.
//!
//! Implements [`ObservabilityHook`] with the [OTel GenAI semantic conventions][spec]
//! (`gen_ai.*` namespace). Emits [`tracing`] spans; bring your own
//! `tracing-opentelemetry` subscriber for OTel export.
//!
//! # Usage
//!
//! ```no_run
//! use weave_otel::{OtelHook, OtelConfig};
//!
//! let hook = OtelHook::new(OtelConfig {
//!     capture_input: false,
//!     capture_output: false,
//! });
//! // Pass to AgentFacade::new(llm, config, vec![BoxedHook::new(hook)])
//! ```
//!
//! # Span hierarchy
//!
//! | Span name | OTel convention | When |
//! |-----------|-----------------|------|
//! | `gen_ai.step` | — | Each ReAct step completes |
//! | `gen_ai.chat` | `gen_ai.chat` | LLM request/response |
//! | `gen_ai.execute_tool` | `gen_ai.execute_tool` | Tool execution |
//! | `gen_ai.server_switch` | — | `bootServer` reconnects to a new MCP server |
//!
//! # Opt-in content capture
//!
//! By default, request/response content is NOT captured (privacy). Set
//! `capture_input` / `capture_output` to `true` to include message bodies in
//! span attributes.
//!
//! [spec]: https://opentelemetry.io/docs/specs/semconv/gen-ai/

use weave_types::{HookAction, HookError, HookEvent, ObservabilityHook};

/// Configuration for the OTel hook.
#[derive(Debug, Clone, Default)]
pub struct OtelConfig {
    /// Whether to capture input message content in span attributes.
    /// Disabled by default for privacy.
    pub capture_input: bool,
    /// Whether to capture output message content in span attributes.
    /// Disabled by default for privacy.
    pub capture_output: bool,
}

/// An [`ObservabilityHook`] that emits [`tracing`] spans following the OTel
/// GenAI semantic conventions.
///
/// Always returns [`HookAction::Continue`] — observes but never controls.
///
/// # Attributes emitted
///
/// | Attribute | Value |
/// |-----------|-------|
/// | `gen_ai.system` | `"weave"` |
/// | `gen_ai.request.messages` | Message count sent to the model |
/// | `gen_ai.tool.name` | Tool name |
/// | `gen_ai.tool.is_error` | Whether the tool call returned an error |
pub struct OtelHook {
    config: OtelConfig,
}

impl OtelHook {
    /// Create a new OTel hook with the given configuration.
    #[must_use]
    pub fn new(config: OtelConfig) -> Self {
        Self { config }
    }
}

impl Default for OtelHook {
    fn default() -> Self {
        Self::new(OtelConfig::default())
    }
}

impl ObservabilityHook for OtelHook {
    fn on_event(
        &self,
        event: HookEvent<'_>,
    ) -> impl std::future::Future<Output = Result<HookAction, HookError>> + Send {
        match &event {
            HookEvent::Step { step, index } => {
                tracing::info_span!(
                    "gen_ai.step",
                    gen_ai.system = "weave",
                    step.index = index,
                    step.is_final = step.is_final(),
                )
                .in_scope(|| {
                    tracing::debug!("react step {index} complete");
                });
            }
            HookEvent::PreLlmCall { messages } => {
                let span = tracing::info_span!(
                    "gen_ai.chat",
                    gen_ai.system = "weave",
                    gen_ai.request.messages = messages.len(),
                );
                span.in_scope(|| {
                    if self.config.capture_input {
                        let joined: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
                        tracing::debug!(messages = ?joined, "gen_ai.chat request");
                    } else {
                        tracing::debug!("gen_ai.chat request");
                    }
                });
            }
            HookEvent::PostLlmCall { message } => {
                let span = tracing::info_span!(
                    "gen_ai.chat",
                    gen_ai.system = "weave",
                    gen_ai.response.role = ?message.role,
                );
                span.in_scope(|| {
                    if self.config.capture_output {
                        tracing::debug!(content = %message.content, "gen_ai.chat response");
                    } else {
                        tracing::debug!("gen_ai.chat response");
                    }
                });
            }
            HookEvent::PreToolExecution { tool_name } => {
                tracing::info_span!(
                    "gen_ai.execute_tool",
                    gen_ai.system = "weave",
                    gen_ai.tool.name = %tool_name,
                )
                .in_scope(|| {
                    tracing::debug!("tool execution start");
                });
            }
            HookEvent::PostToolExecution { execution } => {
                tracing::info_span!(
                    "gen_ai.execute_tool",
                    gen_ai.system = "weave",
                    gen_ai.tool.name = %execution.name,
                    gen_ai.tool.is_error = !execution.is_success(),
                )
                .in_scope(|| {
                    tracing::debug!("tool execution complete");
                });
            }
            HookEvent::ServerSwitch { server_id } => {
                tracing::info!(gen_ai.system = "weave", server_id, "gen_ai.server_switch");
            }
        }
        std::future::ready(Ok(HookAction::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_types::{Action, ChatMessage, ReActStep, ToolExecution};

    fn tracing_guard() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[tokio::test]
    async fn step_event_never_terminates() {
        let _guard = tracing_guard();
        let hook = OtelHook::default();
        let step = ReActStep {
            thought: "t".to_string(),
            action: Some(Action { tool: "lookup".to_string(), args: serde_json::json!({}) }),
            observation: Some("ok".to_string()),
            final_answer: None,
        };
        let action = hook.on_event(HookEvent::Step { step: &step, index: 1 }).await.unwrap();
        assert!(matches!(action, HookAction::Continue));
    }

    #[tokio::test]
    async fn pre_llm_call_reports_message_count() {
        let _guard = tracing_guard();
        let hook = OtelHook::new(OtelConfig { capture_input: true, capture_output: false });
        let messages = vec![ChatMessage::system("preamble"), ChatMessage::user("hi")];
        let action = hook.on_event(HookEvent::PreLlmCall { messages: &messages }).await.unwrap();
        assert!(matches!(action, HookAction::Continue));
    }

    #[tokio::test]
    async fn post_tool_execution_reports_failure_flag() {
        let _guard = tracing_guard();
        let hook = OtelHook::default();
        let execution = ToolExecution {
            id: "exec-1".to_string(),
            name: "lookup".to_string(),
            arguments: serde_json::json!({}),
            result: None,
            error: Some("boom".to_string()),
            timestamp: 0,
        };
        let action = hook
            .on_event(HookEvent::PostToolExecution { execution: &execution })
            .await
            .unwrap();
        assert!(matches!(action, HookAction::Continue));
    }
}
