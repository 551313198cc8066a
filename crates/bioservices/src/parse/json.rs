//! JSON lookups that do not assume a schema

use serde_json::Value;

/// Every value stored under `key`, at any depth, in document order
pub fn find_values<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(value, key, &mut found);
    found
}

fn collect<'a>(value: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                }
                collect(v, key, found);
            }
        },
        Value::Array(items) => {
            for item in items {
                collect(item, key, found);
            }
        },
        _ => {},
    }
}

/// First value stored under `key`, at any depth
pub fn find_first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_first(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_first(v, key)),
        _ => None,
    }
}

/// Flatten a scalar or an array of scalars into strings
///
/// Strings are taken as is, numbers and booleans are formatted, nulls and
/// nested containers are skipped.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_values_nested() {
        let doc = json!({
            "results": [
                {"from": "P43403", "to": {"primaryAccession": "P43403"}},
                {"from": "P00750", "to": "hsa:5327"}
            ],
            "from": "top"
        });
        let froms = find_values(&doc, "from");
        assert_eq!(froms.len(), 3);
        assert_eq!(find_values(&doc, "primaryAccession"), vec![&json!("P43403")]);
        assert!(find_values(&doc, "absent").is_empty());
    }

    #[test]
    fn test_find_first() {
        let doc = json!({"a": {"b": {"count": "12"}}, "list": [{"count": "3"}]});
        assert!(find_first(&doc, "count").is_some());
        assert_eq!(find_first(&json!([{"x": 1}]), "x"), Some(&json!(1)));
        assert_eq!(find_first(&json!("scalar"), "x"), None);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list(&json!(["1", 2, true, null])), vec!["1", "2", "true"]);
        assert_eq!(string_list(&json!("single")), vec!["single"]);
        assert!(string_list(&json!({"k": "v"})).is_empty());
    }
}
