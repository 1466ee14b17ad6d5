//! Structural argument validation against a tool's JSON Schema (`§4.7`).
//!
//! Lightweight: object-ness, required fields, declared property types. No
//! dependency on a full JSON Schema validation library. One trap this MUST
//! handle: a `Literal`/enum parameter may be encoded either as `"enum": [...]`
//! at the property level or as `"anyOf": [{"const": ...}, ...]` — both are
//! checked, and the allowed values are surfaced in the error message so the
//! same text can be reused in the system preamble.

use serde_json::Value;

/// Validate `input` against `schema`, returning a human-readable description
/// of the first mismatch found.
pub fn validate(input: &Value, schema: &Value) -> Result<(), String> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };

    if let Some(Value::String(ty)) = schema_obj.get("type") {
        if ty == "object" && !input.is_object() {
            return Err("expected object input".to_string());
        }
    }

    let Some(input_obj) = input.as_object() else {
        return Ok(());
    };

    if let Some(Value::Array(required)) = schema_obj.get("required") {
        for field in required {
            if let Some(name) = field.as_str() {
                if !input_obj.contains_key(name) {
                    return Err(format!("missing required field: {name}"));
                }
            }
        }
    }

    if let Some(Value::Object(properties)) = schema_obj.get("properties") {
        for (field_name, prop_schema) in properties {
            let Some(value) = input_obj.get(field_name) else {
                continue;
            };

            if let Some(allowed) = allowed_values(prop_schema) {
                if !allowed.iter().any(|candidate| candidate == value) {
                    return Err(format!(
                        "field '{field_name}' must be one of: {}",
                        allowed.iter().map(describe_value).collect::<Vec<_>>().join(", ")
                    ));
                }
                continue;
            }

            if let Some(Value::String(expected_type)) = prop_schema.get("type") {
                if !json_type_matches(value, expected_type) {
                    return Err(format!(
                        "field '{field_name}' expected type '{expected_type}', got {}",
                        json_type_name(value)
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Render "<property> must be one of: a, b, c" hints for every enum/const
/// property in a tool's parameter schema, for inlining into the system
/// preamble so the model sees legal values up front instead of guessing.
pub fn tool_enum_hints(schema: &Value) -> Vec<String> {
    let Some(Value::Object(properties)) = schema.get("properties") else {
        return Vec::new();
    };

    properties
        .iter()
        .filter_map(|(name, prop_schema)| {
            let allowed = allowed_values(prop_schema)?;
            Some(format!(
                "{name} must be one of: {}",
                allowed.iter().map(describe_value).collect::<Vec<_>>().join(", ")
            ))
        })
        .collect()
}

/// Extract the allowed-value set for a property, whichever way the schema
/// encodes it: `"enum": [...]` directly, or `"anyOf": [{"const": v}, ...]`.
fn allowed_values(prop_schema: &Value) -> Option<Vec<Value>> {
    if let Some(Value::Array(values)) = prop_schema.get("enum") {
        return Some(values.clone());
    }
    if let Some(Value::Array(variants)) = prop_schema.get("anyOf") {
        let consts: Vec<Value> = variants.iter().filter_map(|v| v.get("const").cloned()).collect();
        if consts.len() == variants.len() && !consts.is_empty() {
            return Some(consts);
        }
    }
    None
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_input_for_object_schema() {
        let schema = json!({"type": "object"});
        assert!(validate(&json!("nope"), &schema).is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let schema = json!({"type": "object", "required": ["goal"]});
        let err = validate(&json!({}), &schema).unwrap_err();
        assert!(err.contains("goal"));
    }

    #[test]
    fn rejects_wrong_property_type() {
        let schema = json!({"type": "object", "properties": {"n": {"type": "integer"}}});
        let err = validate(&json!({"n": "not a number"}), &schema).unwrap_err();
        assert!(err.contains("integer"));
    }

    #[test]
    fn accepts_top_level_enum_value() {
        let schema = json!({
            "type": "object",
            "properties": {"goal": {"enum": ["fat_loss", "muscle_gain"]}}
        });
        assert!(validate(&json!({"goal": "fat_loss"}), &schema).is_ok());
    }

    #[test]
    fn rejects_top_level_enum_mismatch_and_lists_values() {
        let schema = json!({
            "type": "object",
            "properties": {"goal": {"enum": ["fat_loss", "muscle_gain"]}}
        });
        let err = validate(&json!({"goal": "bulking"}), &schema).unwrap_err();
        assert!(err.contains("fat_loss"));
        assert!(err.contains("muscle_gain"));
    }

    #[test]
    fn accepts_any_of_const_encoding() {
        let schema = json!({
            "type": "object",
            "properties": {
                "diet": {"anyOf": [{"const": "vegan"}, {"const": "vegetarian"}]}
            }
        });
        assert!(validate(&json!({"diet": "vegan"}), &schema).is_ok());
    }

    #[test]
    fn tool_enum_hints_covers_both_encodings() {
        let schema = json!({
            "type": "object",
            "properties": {
                "goal": {"enum": ["fat loss", "muscle gain"]},
                "diet": {"anyOf": [{"const": "vegan"}, {"const": "vegetarian"}]},
                "note": {"type": "string"}
            }
        });
        let hints = tool_enum_hints(&schema);
        assert_eq!(hints.len(), 2);
        assert!(hints.iter().any(|h| h.contains("goal") && h.contains("fat loss")));
        assert!(hints.iter().any(|h| h.contains("diet") && h.contains("vegan")));
    }

    #[test]
    fn rejects_any_of_const_mismatch() {
        let schema = json!({
            "type": "object",
            "properties": {
                "diet": {"anyOf": [{"const": "vegan"}, {"const": "vegetarian"}]}
            }
        });
        let err = validate(&json!({"diet": "keto"}), &schema).unwrap_err();
        assert!(err.contains("vegan"));
    }
}
