use serde_json::Value;

/// Collect `(path, old, new)` for every leaf that differs between two replies.
/// Keys missing from `current` are reported with a `null` new value.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = join(path_prefix, key);
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => {
                        if curr_val.is_object() {
                            diff_json(&Value::Object(serde_json::Map::new()), curr_val, &path, changes);
                        } else {
                            changes.push((path, Value::Null, curr_val.clone()));
                        }
                    }
                }
            }
            for (key, prev_val) in prev_map {
                if !curr_map.contains_key(key) {
                    changes.push((join(path_prefix, key), prev_val.clone(), Value::Null));
                }
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_replies_have_no_changes() {
        let v = json!({"sn": "1", "t.1": "352"});
        let mut changes = Vec::new();
        diff_json(&v, &v, "", &mut changes);
        assert!(changes.is_empty());
    }

    #[test]
    fn changed_added_and_removed_keys() {
        let prev = json!({"t.1": "352", "f.0": "0"});
        let curr = json!({"t.1": "360", "m.3": "2"});
        let mut changes = Vec::new();
        diff_json(&prev, &curr, "", &mut changes);

        assert!(changes.contains(&("t.1".to_string(), json!("352"), json!("360"))));
        assert!(changes.contains(&("m.3".to_string(), Value::Null, json!("2"))));
        assert!(changes.contains(&("f.0".to_string(), json!("0"), Value::Null)));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn arrays_compare_as_leaves() {
        let prev = json!({"par": [[2, 2, "1"]]});
        let curr = json!({"par": [[2, 2, "0"]]});
        let mut changes = Vec::new();
        diff_json(&prev, &curr, "", &mut changes);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "par");
    }
}
