//! System preamble construction (`§4.6.1`).
//!
//! Built fresh each turn from the tool catalog and the retrieved context
//! bundle. Nothing here is persisted; the preamble is recomputed on every
//! `run()` so it always reflects the live tool list and the current turn's
//! retrieval.

use weave_types::ContextBundle;

const CONTEXT_HEADER: &str = "## \u{26a0}\u{fe0f} IMPORTANT - Context Already Available: CHECK THIS FIRST";
const MAX_CONTEXT_PREVIEW_CHARS: usize = 500;

const BASE_INSTRUCTIONS: &str = "You are a tool-using assistant. Reason step by step using \
Thought, Action, Action Input, and Final Answer lines. Never invent a tool result yourself \
— the system provides Observation lines after you act.";

const FEW_SHOT_EXAMPLES: &str = "Example (answer directly from context, no action needed):
Thought: The context above already names 12 oz pasta for this dish, I don't need to call a tool.
Final Answer: This recipe calls for 12 oz pasta.

Example (one action, then a final answer):
Thought: I need to look up recipes matching the requested diet.
Action: find_recipes_by_dietary
Action Input: {\"dietary_restriction\": \"vegan\"}
Thought: The search returned two matches, that's enough to answer.
Final Answer: I found two vegan recipes: Recipe A and Recipe B.";

const RULES: &str = "Rules:
- Check the context above before deciding whether you need to act at all.
- Emit at most one action per response.
- Always include a Thought line.
- Tool names must come from the list above, never invented.
- Action Input must be a single valid JSON object.
- Read tool results carefully before answering.
- Never emit an Observation line yourself; those are appended by the system.";

/// Build the system preamble for one turn.
#[must_use]
pub fn build_system_preamble(context: &ContextBundle) -> String {
    let mut sections = vec![BASE_INSTRUCTIONS.to_string()];

    let tool_names: Vec<&str> = context.tools.iter().map(|tool| tool.name.as_str()).collect();
    sections.push(format!("Use ONLY tools from: {}", tool_names.join(", ")));

    if !context.tools.is_empty() {
        sections.push(describe_tools(context));
    }

    if !context.relevant_resources.is_empty() {
        sections.push(render_context_block(context));
    }

    sections.push(FEW_SHOT_EXAMPLES.to_string());
    sections.push(RULES.to_string());

    sections.join("\n\n")
}

fn describe_tools(context: &ContextBundle) -> String {
    let mut lines = vec!["Available tools:".to_string()];
    for tool in &context.tools {
        lines.push(format!("- {}: {}", tool.name, tool.description));
        for hint in weave_mcp::tool_enum_hints(&tool.parameters) {
            lines.push(format!("  ({hint})"));
        }
    }
    lines.join("\n")
}

fn render_context_block(context: &ContextBundle) -> String {
    let mut lines = vec![CONTEXT_HEADER.to_string()];
    for (index, hit) in context.relevant_resources.iter().enumerate() {
        let preview: String = hit.text.chars().take(MAX_CONTEXT_PREVIEW_CHARS).collect();
        lines.push(format!("[Context {}]:\n{}", index + 1, preview));
    }
    lines.join("\n\n")
}
