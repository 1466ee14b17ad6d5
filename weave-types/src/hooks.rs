//! Observability hook points fired around the ReAct loop and server lifecycle.
//!
//! Mirrors the `onStep` callback named in the controller's contract (`§4.6`)
//! plus the wider lifecycle events a production deployment wants to trace.
//! Hooks observe; only [`HookAction::Terminate`] lets one short-circuit the
//! current turn (used by, e.g., interrupt plumbing), matching the core's
//! design note that there is no hook-driven tool-input mutation here.

use std::future::Future;
use std::sync::Arc;

use crate::error::HookError;
use crate::types::{ChatMessage, ReActStep, ToolExecution};
use crate::wasm::{WasmBoxedFuture, WasmCompatSend, WasmCompatSync};

/// A lifecycle event fired to registered [`ObservabilityHook`]s.
#[derive(Debug, Clone)]
pub enum HookEvent<'a> {
    /// A ReAct step completed (action+observation, or final answer).
    Step {
        /// The step that just completed.
        step: &'a ReActStep,
        /// 1-based index of this step within the current turn.
        index: usize,
    },
    /// Immediately before a message is sent to the LLM.
    PreLlmCall {
        /// The full message list about to be sent.
        messages: &'a [ChatMessage],
    },
    /// Immediately after the LLM responds.
    PostLlmCall {
        /// The response message.
        message: &'a ChatMessage,
    },
    /// Immediately before a tool call is dispatched.
    PreToolExecution {
        /// The tool name about to be invoked.
        tool_name: &'a str,
    },
    /// Immediately after a tool call completes (success or failure).
    PostToolExecution {
        /// The completed execution record.
        execution: &'a ToolExecution,
    },
    /// `bootServer` tore down the prior server and reset state.
    ServerSwitch {
        /// Identifier of the newly booted server.
        server_id: &'a str,
    },
}

/// What a hook asks the caller to do after observing an event.
#[derive(Debug, Clone, Default)]
pub enum HookAction {
    /// Proceed normally.
    #[default]
    Continue,
    /// Abort the current turn with the given reason.
    Terminate {
        /// Human-readable reason, surfaced to the caller of `interrupt`/`chat`.
        reason: String,
    },
}

/// Implemented by anything that wants to observe the loop and facade
/// lifecycle: structured loggers, OTel exporters, test harnesses recording
/// `onStep` traces.
pub trait ObservabilityHook: WasmCompatSend + WasmCompatSync {
    /// React to one lifecycle event.
    fn on_event(
        &self,
        event: HookEvent<'_>,
    ) -> impl Future<Output = Result<HookAction, HookError>> + WasmCompatSend;
}

trait ErasedHook: WasmCompatSend + WasmCompatSync {
    fn on_event_dyn<'a>(
        &'a self,
        event: HookEvent<'a>,
    ) -> WasmBoxedFuture<'a, Result<HookAction, HookError>>;
}

impl<H: ObservabilityHook> ErasedHook for H {
    fn on_event_dyn<'a>(
        &'a self,
        event: HookEvent<'a>,
    ) -> WasmBoxedFuture<'a, Result<HookAction, HookError>> {
        Box::pin(self.on_event(event))
    }
}

/// A type-erased, cheaply cloned handle to an [`ObservabilityHook`].
#[derive(Clone)]
pub struct BoxedHook(Arc<dyn ErasedHook>);

impl BoxedHook {
    /// Box any [`ObservabilityHook`] implementation.
    pub fn new<H: ObservabilityHook + 'static>(hook: H) -> Self {
        Self(Arc::new(hook))
    }

    /// Fire the event and return the requested action.
    pub async fn fire(&self, event: HookEvent<'_>) -> Result<HookAction, HookError> {
        self.0.on_event_dyn(event).await
    }
}

/// Fire `event` against every hook in `hooks`, short-circuiting on the first
/// non-[`HookAction::Continue`] result.
pub async fn fire_hooks(
    hooks: &[BoxedHook],
    event: HookEvent<'_>,
) -> Result<HookAction, HookError> {
    for hook in hooks {
        match hook.fire(event.clone()).await? {
            HookAction::Continue => {}
            action @ HookAction::Terminate { .. } => return Ok(action),
        }
    }
    Ok(HookAction::Continue)
}
