//! The ReAct step loop (`§4.6.2`, `§4.6.3`, C6).
//!
//! Drives `Thought -> Action -> Observation -> Final Answer` by text, never
//! native function calling: every model is steered through the same
//! [`weave_parser`] protocol. Intermediate scratch messages (the assistant's
//! raw response plus the synthesized `Observation:` line) live only in the
//! working message list built for this turn; the facade decides what, if
//! anything, gets appended to persisted history.

use serde_json::Value;
use uuid::Uuid;

use weave_mcp::McpBridge;
use weave_types::{
    fire_hooks, Action, BoxedHook, BoxedLlmClient, ChatMessage, ChatOptions, ContextBundle,
    HookAction, HookEvent, ReActError, ReActStep, ToolExecution,
};

use crate::preamble::build_system_preamble;

/// Outcome of one [`ReActController::run`] call.
#[derive(Debug, Clone)]
pub struct ReActRun {
    /// The final answer text returned to the caller.
    pub answer: String,
    /// Every step taken this turn, in order.
    pub steps: Vec<ReActStep>,
    /// Every tool call attempted this turn, in order.
    pub tool_executions: Vec<ToolExecution>,
}

/// Drives the step loop for a single turn.
pub struct ReActController<'a> {
    llm: &'a BoxedLlmClient,
    bridge: &'a McpBridge,
    hooks: &'a [BoxedHook],
}

impl<'a> ReActController<'a> {
    /// Build a controller over the given LLM client, MCP bridge, and hooks.
    #[must_use]
    pub fn new(llm: &'a BoxedLlmClient, bridge: &'a McpBridge, hooks: &'a [BoxedHook]) -> Self {
        Self { llm, bridge, hooks }
    }

    /// Run the step loop to completion: a final answer, a step-cap
    /// degradation, or an interrupt.
    ///
    /// `now_millis` stamps every [`ToolExecution`] recorded this turn; the
    /// caller supplies it rather than the controller reading the clock
    /// itself.
    pub async fn run(
        &self,
        user_message: &str,
        context: &ContextBundle,
        max_steps: usize,
        now_millis: i64,
    ) -> Result<ReActRun, ReActError> {
        let preamble = build_system_preamble(context);
        let mut messages = Vec::with_capacity(context.history_messages.len() + 2);
        messages.push(ChatMessage::system(preamble));
        messages.extend(context.history_messages.iter().cloned());
        messages.push(ChatMessage::user(user_message));

        let options = ChatOptions {
            temperature: None,
            tools: context.tools.clone(),
        };

        let mut steps = Vec::new();
        let mut tool_executions = Vec::new();

        let attempts = max_steps.saturating_sub(1);
        for index in 0..attempts {
            if self.fire(HookEvent::PreLlmCall { messages: &messages }).await {
                return Err(interrupted(steps, tool_executions));
            }

            let response = self.llm.chat(&messages, &options).await?;

            if self.fire(HookEvent::PostLlmCall { message: &response }).await {
                return Err(interrupted(steps, tool_executions));
            }

            let parsed = weave_parser::parse(&response.content);
            if parsed.hallucinated_observation {
                tracing::debug!("model emitted a hallucinated Observation line; stripped before parsing");
            }

            if let Some(final_answer) = parsed.final_answer {
                let step = ReActStep {
                    thought: parsed.thought.unwrap_or_default(),
                    action: None,
                    observation: None,
                    final_answer: Some(final_answer.clone()),
                };
                if self.record_step(&mut steps, step, index).await {
                    return Err(interrupted(steps, tool_executions));
                }
                return Ok(ReActRun { answer: final_answer, steps, tool_executions });
            }

            if let Some(tool_name) = parsed.action {
                let args = parsed.action_input.clone().unwrap_or_else(|| Value::Object(Default::default()));
                let mut execution = ToolExecution {
                    id: Uuid::new_v4().to_string(),
                    name: tool_name.clone(),
                    arguments: args.clone(),
                    result: None,
                    error: None,
                    timestamp: now_millis,
                };

                let observation = if let Some(parse_error) = parsed.action_input_error {
                    let message = format!("invalid Action Input: {parse_error}");
                    execution.error = Some(message.clone());
                    format!("ERROR: {message}")
                } else {
                    if self.fire(HookEvent::PreToolExecution { tool_name: &tool_name }).await {
                        return Err(interrupted(steps, tool_executions));
                    }

                    let outcome = self.bridge.execute_tool(&tool_name, args.clone()).await;
                    let observation = if outcome.ok {
                        execution.result.clone_from(&outcome.result);
                        outcome
                            .result
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "null".to_string())
                    } else {
                        let message = outcome.error.unwrap_or_else(|| "tool call failed".to_string());
                        execution.error = Some(message.clone());
                        format!("ERROR: {message}")
                    };

                    if self.fire(HookEvent::PostToolExecution { execution: &execution }).await {
                        return Err(interrupted(steps, tool_executions));
                    }
                    observation
                };

                tool_executions.push(execution);

                let step = ReActStep {
                    thought: parsed.thought.unwrap_or_default(),
                    action: Some(Action { tool: tool_name, args }),
                    observation: Some(observation.clone()),
                    final_answer: None,
                };
                if self.record_step(&mut steps, step, index).await {
                    return Err(interrupted(steps, tool_executions));
                }

                messages.push(ChatMessage::assistant(response.content));
                messages.push(ChatMessage::observation(format!("Observation: {observation}")));
                continue;
            }

            // Neither a final answer nor a recognizable action: the model's
            // raw text is the only thing we can return.
            let step = ReActStep {
                thought: parsed.thought.unwrap_or_default(),
                action: None,
                observation: None,
                final_answer: Some(response.content.clone()),
            };
            if self.record_step(&mut steps, step, index).await {
                return Err(interrupted(steps, tool_executions));
            }
            return Ok(ReActRun { answer: response.content, steps, tool_executions });
        }

        Ok(ReActRun { answer: degraded_answer(&steps), steps, tool_executions })
    }

    /// Fire an event against every hook, logging (not propagating) hook
    /// failures. Returns `true` iff a hook asked to terminate the turn.
    async fn fire(&self, event: HookEvent<'_>) -> bool {
        match fire_hooks(self.hooks, event).await {
            Ok(HookAction::Continue) => false,
            Ok(HookAction::Terminate { reason }) => {
                tracing::info!(reason, "turn terminated by observability hook");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "observability hook failed; continuing");
                false
            }
        }
    }

    async fn record_step(&self, steps: &mut Vec<ReActStep>, step: ReActStep, index: usize) -> bool {
        let terminate = self.fire(HookEvent::Step { step: &step, index: index + 1 }).await;
        steps.push(step);
        terminate
    }
}

fn interrupted(steps: Vec<ReActStep>, tool_executions: Vec<ToolExecution>) -> ReActError {
    ReActError::Interrupted { steps, tool_executions }
}

/// Step-cap graceful degradation (`§4.6.2`): summarize whatever succeeded,
/// or admit defeat if nothing did.
fn degraded_answer(steps: &[ReActStep]) -> String {
    let successful: Vec<&str> = steps
        .iter()
        .filter_map(|step| step.observation.as_deref())
        .filter(|observation| !observation.starts_with("ERROR"))
        .collect();

    if successful.is_empty() {
        "I could not complete the task within the step limit. Please rephrase or ask a narrower question.".to_string()
    } else {
        format!(
            "Based on what I gathered:\n\n{}\n\nI reached the step limit.",
            successful.join("\n\n")
        )
    }
}
