use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const MAX_JSON_LOG_LEN: usize = 200;

/// Reads one top-level field of a stored document, falling back to the
/// type's default when it cannot be decoded.
///
/// Absent fields and JSON `null` fall back silently. Anything else that does
/// not decode (wrong type, malformed timestamp) is logged as a warning with a
/// truncated copy of the raw value.
pub fn parse_field_with_fallback<T: DeserializeOwned + Default>(
    doc: &Map<String, Value>,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    let json = match doc.get(field_name) {
        None | Some(Value::Null) => return T::default(),
        Some(json) => json,
    };

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        let raw_str = json.to_string();
        let truncated = if raw_str.chars().count() > MAX_JSON_LOG_LEN {
            format!("{}...", raw_str.chars().take(MAX_JSON_LOG_LEN).collect::<String>())
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse document field, using default value"
        );
        T::default()
    })
}
