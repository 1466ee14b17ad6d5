//! Query enhancement (`§4.4.1`).
//!
//! Appends at most one recent conversational entity to the raw user message
//! before embedding, so a follow-up like "what about the second one" still
//! retrieves against the dish named two turns earlier.

use once_cell::sync::Lazy;
use regex::Regex;

use weave_types::ChatMessage;

static CAPITALIZED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][\w'-]*(?:\s+[A-Z][\w'-]*)+)\b").unwrap());
static RESOURCE_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"res://[\w_]+").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["“]([^"”]{2,80})["”]"#).unwrap());

/// Extract the most salient entity mentioned in `text`, if any. Checked in
/// order: a quoted substring, a `res://` URI, a capitalized multi-word
/// phrase. The first match wins.
#[must_use]
pub fn extract_entity(text: &str) -> Option<String> {
    if let Some(caps) = QUOTED.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    if let Some(found) = RESOURCE_URI.find(text) {
        return Some(human_readable_uri(found.as_str()));
    }
    if let Some(caps) = CAPITALIZED_PHRASE.captures(text) {
        return Some(caps[1].to_string());
    }
    None
}

fn human_readable_uri(uri: &str) -> String {
    uri.trim_start_matches("res://").replace(['_', '-'], " ")
}

/// Build the embedding query for a turn: the current user message, plus the
/// single most-recent entity mined from the last two history messages
/// (most-recent-first). The current message itself is never scanned — only
/// prior turns can drift the topic enough to need re-anchoring.
#[must_use]
pub fn enhance_query(user_message: &str, history: &[ChatMessage]) -> String {
    let recent_entity = history
        .iter()
        .rev()
        .take(2)
        .find_map(|message| extract_entity(&message.content));

    match recent_entity {
        Some(entity) => format!("{user_message} {entity}"),
        None => user_message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_substring_first() {
        assert_eq!(
            extract_entity(r#"what about "Thai Green Curry" instead"#),
            Some("Thai Green Curry".to_string())
        );
    }

    #[test]
    fn extracts_resource_uri_as_readable_name() {
        assert_eq!(
            extract_entity("tell me more about res://vegan_pasta_primavera"),
            Some("vegan pasta primavera".to_string())
        );
    }

    #[test]
    fn extracts_capitalized_multiword_phrase() {
        assert_eq!(
            extract_entity("I really liked Vegan Pasta Primavera last time"),
            Some("Vegan Pasta Primavera".to_string())
        );
    }

    #[test]
    fn returns_none_when_nothing_salient() {
        assert_eq!(extract_entity("what else do you have"), None);
    }

    #[test]
    fn enhance_query_appends_most_recent_history_entity() {
        let history = vec![
            ChatMessage::user("Vegan Pasta Primavera sounds nice".to_string()),
            ChatMessage::assistant("Great choice!".to_string()),
        ];
        let query = enhance_query("what's the calorie count", &history);
        assert_eq!(query, "what's the calorie count Vegan Pasta Primavera");
    }

    #[test]
    fn enhance_query_ignores_entities_in_the_current_message() {
        let history = vec![ChatMessage::user("Thai Green Curry".to_string())];
        let query = enhance_query("how spicy is Vegan Pasta Primavera", &history);
        assert_eq!(query, "how spicy is Vegan Pasta Primavera Thai Green Curry");
    }

    #[test]
    fn enhance_query_only_considers_last_two_history_messages() {
        let history = vec![
            ChatMessage::user("Thai Green Curry".to_string()),
            ChatMessage::assistant("ok".to_string()),
            ChatMessage::assistant("fine".to_string()),
        ];
        let query = enhance_query("how many calories", &history);
        assert_eq!(query, "how many calories");
    }
}
