//! Token budgeting heuristic (`§4.4.3`).
//!
//! Exact tokenization is out of scope; a char/4 heuristic with a small
//! per-message overhead is accurate enough to drive truncation decisions.

const CHARS_PER_TOKEN: usize = 4;
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Approximate the token cost of a chunk of text, with no per-message
/// overhead applied (used for retrieved-resource text, not chat messages).
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Approximate the token cost of a chat message, including a small
/// formatting/role overhead.
#[must_use]
pub fn estimate_message_tokens(content: &str) -> usize {
    estimate_tokens(content) + MESSAGE_OVERHEAD_TOKENS
}

/// Truncate `text` so its estimated cost fits within `budget_tokens`,
/// returning `None` if even the truncated text would fall below
/// `min_useful_chars` — the caller should omit the item entirely rather than
/// keep a sliver (`§4.4.3`).
#[must_use]
pub fn truncate_to_budget(text: &str, budget_tokens: usize, min_useful_chars: usize) -> Option<String> {
    let budget_chars = budget_tokens * CHARS_PER_TOKEN;
    if text.len() <= budget_chars {
        return Some(text.to_string());
    }
    if budget_chars < min_useful_chars {
        return None;
    }
    let mut end = budget_chars.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(text[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_uses_chars_per_four() {
        assert_eq!(estimate_tokens(&"a".repeat(400)), 100);
    }

    #[test]
    fn estimate_message_tokens_adds_overhead() {
        assert_eq!(estimate_message_tokens(&"a".repeat(400)), 104);
    }

    #[test]
    fn truncate_to_budget_keeps_short_text_whole() {
        let text = "short text";
        assert_eq!(truncate_to_budget(text, 100, 10), Some(text.to_string()));
    }

    #[test]
    fn truncate_to_budget_shrinks_oversized_text() {
        let text = "a".repeat(10_000);
        let truncated = truncate_to_budget(&text, 100, 10).unwrap();
        assert_eq!(truncated.len(), 400);
    }

    #[test]
    fn truncate_to_budget_omits_when_below_minimum() {
        let text = "a".repeat(10_000);
        assert_eq!(truncate_to_budget(&text, 1, 200), None);
    }
}
