//! Structural auto-merge of a field both sides changed
//!
//! Only reached when local and remote both differ from base and from each
//! other. Returns the merged value, or the reason the field needs a person.

use serde_json::{Map, Value};

/// Try to combine diverging values without human input.
///
/// - strings: both sides appended to base; local's suffix goes first
/// - lists: base, then local additions, then remote additions
/// - mappings: shallow merge that gives up on the first contested key
///
/// A missing base counts as empty for lists and mappings. Anything else
/// (mixed kinds, scalars, deletions) cannot be merged.
pub fn auto_merge(
    base: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
) -> Result<Value, String> {
    match (base, local, remote) {
        (Some(Value::String(b)), Some(Value::String(l)), Some(Value::String(r))) => {
            merge_appends(b, l, r).map(Value::String)
        }
        (None | Some(Value::Array(_)), Some(Value::Array(l)), Some(Value::Array(r))) => {
            let b = match base {
                Some(Value::Array(b)) => b.as_slice(),
                _ => &[],
            };
            Ok(Value::Array(merge_lists(b, l, r)))
        }
        (None | Some(Value::Object(_)), Some(Value::Object(l)), Some(Value::Object(r))) => {
            let empty = Map::new();
            let b = match base {
                Some(Value::Object(b)) => b,
                _ => &empty,
            };
            merge_maps(b, l, r).map(Value::Object)
        }
        _ => Err("incompatible types for automatic merge".to_string()),
    }
}

fn merge_appends(base: &str, local: &str, remote: &str) -> Result<String, String> {
    match (local.strip_prefix(base), remote.strip_prefix(base)) {
        (Some(local_suffix), Some(remote_suffix)) => {
            Ok(format!("{base}{local_suffix}{remote_suffix}"))
        }
        _ => Err("both modified differently (not a pure append)".to_string()),
    }
}

/// Never fails: additions from both sides are kept, even when they
/// duplicate each other or undo a removal.
fn merge_lists(base: &[Value], local: &[Value], remote: &[Value]) -> Vec<Value> {
    let additions = |side: &[Value]| -> Vec<Value> {
        side.iter()
            .filter(|item| !base.contains(item))
            .cloned()
            .collect()
    };

    let mut merged = base.to_vec();
    merged.extend(additions(local));
    merged.extend(additions(remote));
    merged
}

/// Keys removed on either side stay at their base value.
fn merge_maps(
    base: &Map<String, Value>,
    local: &Map<String, Value>,
    remote: &Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut merged = base.clone();

    for (key, value) in local {
        if base.get(key) != Some(value) {
            merged.insert(key.clone(), value.clone());
        }
    }

    for (key, value) in remote {
        match base.get(key) {
            None => {
                merged.insert(key.clone(), value.clone());
            }
            Some(base_value) if base_value != value => {
                if local.get(key) != Some(value) {
                    return Err(format!("both modified nested key '{key}'"));
                }
            }
            Some(_) => {}
        }
    }

    Ok(merged)
}
