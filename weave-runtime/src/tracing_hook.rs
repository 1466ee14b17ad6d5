//! Concrete [`ObservabilityHook`] using the [`tracing`] crate.
//!
//! Emits structured `tracing` events for each stage of the ReAct loop and
//! facade lifecycle. Wire to any `tracing`-compatible subscriber
//! (`tracing-subscriber` for stdout, `tracing-opentelemetry` for OTel export
//! — or use [`weave_otel::OtelHook`] directly for GenAI semantic conventions).

use weave_types::{HookAction, HookError, HookEvent, ObservabilityHook};

/// An [`ObservabilityHook`] that emits structured [`tracing`] events.
///
/// Always returns [`HookAction::Continue`] — observes but never controls.
///
/// # Event levels
///
/// | Event | Level |
/// |-------|-------|
/// | `Step`, `PreLlmCall`, `PostLlmCall`, `PreToolExecution`, `PostToolExecution` | `DEBUG` |
/// | `ServerSwitch` | `INFO` |
pub struct TracingHook;

impl TracingHook {
    /// Create a new `TracingHook`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservabilityHook for TracingHook {
    async fn on_event(&self, event: HookEvent<'_>) -> Result<HookAction, HookError> {
        match event {
            HookEvent::Step { step, index } => {
                tracing::debug!(index, is_final = step.is_final(), "weave.step");
            }
            HookEvent::PreLlmCall { messages } => {
                tracing::debug!(messages = messages.len(), "weave.llm.pre_call");
            }
            HookEvent::PostLlmCall { message } => {
                tracing::debug!(role = ?message.role, "weave.llm.post_call");
            }
            HookEvent::PreToolExecution { tool_name } => {
                tracing::debug!(tool = %tool_name, "weave.tool.pre_execution");
            }
            HookEvent::PostToolExecution { execution } => {
                tracing::debug!(
                    tool = %execution.name,
                    is_error = !execution.is_success(),
                    "weave.tool.post_execution"
                );
            }
            HookEvent::ServerSwitch { server_id } => {
                tracing::info!(server_id, "weave.server_switch");
            }
        }
        Ok(HookAction::Continue)
    }
}
