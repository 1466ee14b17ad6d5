//! Content framing (`§4.3`), applied before embedding and before storage.
//!
//! Surfacing the resource name into the embedded text materially improves
//! retrieval on short, name-containing queries.

/// Derive a human-readable name from a URI's last path segment, replacing
/// separators with spaces (`res://vegan_pasta_primavera` -> `vegan pasta primavera`).
#[must_use]
pub fn human_name_from_uri(uri: &str) -> String {
    let tail = uri.rsplit('/').next().unwrap_or(uri);
    tail.replace(['_', '-'], " ")
}

/// Frame a resource's raw content for embedding and storage.
#[must_use]
pub fn frame_resource(uri: &str, description: Option<&str>, content: &str) -> String {
    let name = human_name_from_uri(uri);
    let description_line = description.unwrap_or("");
    format!(
        "RESOURCE: {name}\nDESCRIPTION: {description_line}\nURI: {uri}\n\nCONTENT:\n{content}"
    )
}

/// Frame a tool execution's arguments and result for embedding and storage.
#[must_use]
pub fn frame_tool_result(tool_name: &str, arguments: &serde_json::Value, result: &serde_json::Value) -> String {
    let pretty_result = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    format!("Tool: {tool_name}\nArguments: {arguments}\nResult: {pretty_result}")
}
