use crate::errors::{AppError, AppResult};
use crate::models::PatchMode;
use serde_json::{Map, Value};

/// Returns `root` with `value` written at the dotted `path`.
///
/// Missing or scalar intermediates become empty objects. A numeric segment
/// indexes into an array; it may address an existing slot or append one
/// past the end. The empty path replaces the whole tree.
pub fn with_value_at_path(root: Value, path: &str, value: Value) -> AppResult<Value> {
    if path.is_empty() {
        return Ok(value);
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(AppError::Validation(format!("invalid field path '{}'", path)));
    }
    set_segments(root, &segments, value, path)
}

fn set_segments(node: Value, segments: &[&str], value: Value, path: &str) -> AppResult<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(value);
    };

    match node {
        Value::Array(mut items) => {
            let index: usize = head
                .parse()
                .map_err(|_| AppError::Validation(format!("'{}' in path '{}' is not an array index", head, path)))?;
            if index > items.len() {
                return Err(AppError::Validation(format!(
                    "index {} in path '{}' is past the end of an array of {}",
                    index,
                    path,
                    items.len()
                )));
            }
            if index == items.len() {
                items.push(Value::Null);
            }
            let child = std::mem::take(&mut items[index]);
            items[index] = set_segments(child, rest, value, path)?;
            Ok(Value::Array(items))
        }
        Value::Object(mut fields) => {
            // an existing key keeps its slot on insert
            let child = fields.get_mut(*head).map(std::mem::take).unwrap_or(Value::Null);
            let updated = set_segments(child, rest, value, path)?;
            fields.insert((*head).to_string(), updated);
            Ok(Value::Object(fields))
        }
        _ => set_segments(Value::Object(Map::new()), segments, value, path),
    }
}

/// Combines an existing record with an incoming patch.
///
/// `Merge` overlays the patch's top-level fields on the existing record
/// when both are objects. In every other case the patch replaces.
pub fn merge_record(existing: &Value, patch: Value, mode: PatchMode) -> Value {
    match (mode, existing, patch) {
        (PatchMode::Merge, Value::Object(existing), Value::Object(patch)) => {
            let mut merged = existing.clone();
            for (key, value) in patch {
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, _, patch) => patch,
    }
}
