use serde_json::Value;

/// Resolve a dotted property path (`"address.geo.lat"`) against `value`.
///
/// A missing or empty path resolves to the value itself. Array segments are
/// addressed by index (`"tags.0"`). `None` means the property is absent,
/// which is distinct from a property explicitly holding `null`.
pub fn resolve_nested<'a>(value: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        return Some(value);
    };

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Whether `value` carries a property at `path`.
pub fn has_property(value: &Value, path: &str) -> bool {
    resolve_nested(value, Some(path)).is_some()
}

/// Structural emptiness: `null`, `""`, `[]` and `{}` are empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub fn is_not_empty(value: &Value) -> bool {
    !is_empty(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_top_level_and_nested_properties() {
        let user = json!({"id": 1, "address": {"geo": {"lat": "-37.3159"}}});
        assert_eq!(resolve_nested(&user, Some("id")), Some(&json!(1)));
        assert_eq!(
            resolve_nested(&user, Some("address.geo.lat")),
            Some(&json!("-37.3159"))
        );
        assert_eq!(resolve_nested(&user, Some("address.zip")), None);
    }

    #[test]
    fn missing_path_returns_value_itself() {
        let value = json!(42);
        assert_eq!(resolve_nested(&value, None), Some(&value));
        assert_eq!(resolve_nested(&value, Some("")), Some(&value));
    }

    #[test]
    fn explicit_null_is_not_absent() {
        let value = json!({"name": null});
        assert_eq!(resolve_nested(&value, Some("name")), Some(&Value::Null));
        assert!(has_property(&value, "name"));
        assert!(!has_property(&value, "label"));
    }

    #[test]
    fn array_segments_use_indices() {
        let value = json!({"tags": ["a", "b"]});
        assert_eq!(resolve_nested(&value, Some("tags.1")), Some(&json!("b")));
        assert_eq!(resolve_nested(&value, Some("tags.x")), None);
    }

    #[test]
    fn emptiness_covers_containers() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!({})));
        assert!(is_empty(&json!([])));
        assert!(is_not_empty(&json!(0)));
        assert!(is_not_empty(&json!({"a": 1})));
    }
}
