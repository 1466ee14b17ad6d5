#![deny(missing_docs)]
//! Output parser (`§4.5`, C5).
//!
//! Treats `Thought/Action/Action Input/Observation/Final Answer` as a
//! line-oriented wire format between the facade and the LLM. This is the
//! single point of tolerance for format drift across model families —
//! anything that slips past this parser is caught by schema validation at
//! the MCP bridge.

use once_cell::sync::Lazy;
use regex::Regex;

/// Result of parsing one model response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// The model's stated reasoning. `None` means parse failure: the
    /// response carried neither `Thought:` nor a recognizable fallback tag.
    pub thought: Option<String>,
    /// The tool name from `Action: <toolName>`, or a fallback tag.
    pub action: Option<String>,
    /// The successfully parsed `Action Input` JSON object.
    pub action_input: Option<serde_json::Value>,
    /// Set when an `Action:` was recognized but its `Action Input` failed to
    /// parse as JSON; the controller turns this into an `ERROR:` observation
    /// rather than dispatching the call.
    pub action_input_error: Option<String>,
    /// The terminal answer, if present. Always wins over `action` when both
    /// are present (`action` is cleared in that case).
    pub final_answer: Option<String>,
    /// Whether the model emitted a hallucinated `Observation:` line, which
    /// was stripped before the rest of parsing ran.
    pub hallucinated_observation: bool,
}

impl ParsedOutput {
    /// True when no `Thought:` (or fallback) could be extracted — a parse
    /// failure per the spec's error policy. The controller's recovery is to
    /// treat the raw response as the final answer.
    #[must_use]
    pub fn is_parse_failure(&self) -> bool {
        self.thought.is_none()
    }
}

static FUNCTION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<function>(\{.*?\})</function>").unwrap());

// Matches the malformed `<toolName>{...}</function>` variant. Excludes the
// well-formed tag name so it never double-matches FUNCTION_TAG.
static NAMED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(?P<tag>[A-Za-z_][\w.-]*)>(?P<body>\{.*?\})</function>").unwrap());

const THOUGHT_PREFIX: &str = "Thought: ";
const ACTION_PREFIX: &str = "Action: ";
const ACTION_INPUT_PREFIX: &str = "Action Input: ";
const FINAL_ANSWER_PREFIX: &str = "Final Answer: ";
const OBSERVATION_PREFIX: &str = "Observation:";

#[derive(Default)]
enum Section {
    #[default]
    None,
    Thought,
    Action,
    ActionInput,
    FinalAnswer,
}

/// Parse one model response into its ReAct components.
#[must_use]
pub fn parse(text: &str) -> ParsedOutput {
    let (body, hallucinated_observation) = strip_hallucinated_observation(text);

    let mut thought_lines: Vec<&str> = Vec::new();
    let mut action_lines: Vec<&str> = Vec::new();
    let mut action_input_lines: Vec<&str> = Vec::new();
    let mut final_answer_lines: Vec<&str> = Vec::new();
    let mut section = Section::None;

    for line in body.lines() {
        if let Some(rest) = line.strip_prefix(THOUGHT_PREFIX) {
            section = Section::Thought;
            thought_lines.push(rest);
        } else if let Some(rest) = line.strip_prefix(ACTION_INPUT_PREFIX) {
            // Must check before ACTION_PREFIX: "Action Input: " also starts with "Action".
            section = Section::ActionInput;
            action_input_lines.push(rest);
        } else if let Some(rest) = line.strip_prefix(ACTION_PREFIX) {
            section = Section::Action;
            action_lines.push(rest);
        } else if let Some(rest) = line.strip_prefix(FINAL_ANSWER_PREFIX) {
            section = Section::FinalAnswer;
            final_answer_lines.push(rest);
        } else {
            match section {
                Section::Thought => thought_lines.push(line),
                Section::Action => action_lines.push(line),
                Section::ActionInput => action_input_lines.push(line),
                Section::FinalAnswer => final_answer_lines.push(line),
                Section::None => {}
            }
        }
    }

    let thought = joined_or_none(&thought_lines);
    let mut action = joined_or_none(&action_lines).map(|s| s.trim().to_string());
    let mut action_input_error = None;
    let mut action_input = None;
    let final_answer = joined_or_none(&final_answer_lines);

    if let Some(raw) = joined_or_none(&action_input_lines) {
        match serde_json::from_str::<serde_json::Value>(raw.trim()) {
            Ok(value) => action_input = Some(value),
            Err(err) => action_input_error = Some(err.to_string()),
        }
    }

    // Fallback legacy tag format, only consulted when the primary format
    // found no action — different model families emit one or the other.
    if action.is_none() {
        if let Some((tag_action, tag_input)) = parse_fallback_tag(&body) {
            action = Some(tag_action);
            action_input = Some(tag_input);
            action_input_error = None;
        }
    }

    // Final Answer always wins; discard any action in that case.
    if final_answer.is_some() {
        action = None;
        action_input = None;
        action_input_error = None;
    }

    ParsedOutput {
        thought,
        action,
        action_input,
        action_input_error,
        final_answer,
        hallucinated_observation,
    }
}

fn strip_hallucinated_observation(text: &str) -> (&str, bool) {
    for (offset, line) in line_offsets(text) {
        if line.starts_with(OBSERVATION_PREFIX) {
            return (text[..offset].trim_end_matches('\n'), true);
        }
    }
    (text, false)
}

/// Iterate `(byte_offset, line)` pairs without allocating, so the caller can
/// slice the original buffer rather than rebuild it from parts.
fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split('\n').map(move |line| {
        let this_offset = offset;
        offset += line.len() + 1;
        (this_offset, line)
    })
}

fn joined_or_none(lines: &[&str]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let joined = lines.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn parse_fallback_tag(body: &str) -> Option<(String, serde_json::Value)> {
    if let Some(caps) = FUNCTION_TAG.captures(body) {
        let payload: serde_json::Value = serde_json::from_str(&caps[1]).ok()?;
        let name = payload.get("name")?.as_str()?.to_string();
        let parameters = payload.get("parameters").cloned().unwrap_or(serde_json::json!({}));
        return Some((name, parameters));
    }
    if let Some(caps) = NAMED_TAG.captures(body) {
        let tag = caps.name("tag")?.as_str().to_string();
        if tag == "function" {
            return None;
        }
        let parameters: serde_json::Value = serde_json::from_str(&caps["body"]).ok()?;
        return Some((tag, parameters));
    }
    None
}
