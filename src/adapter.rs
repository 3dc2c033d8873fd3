use crate::errors::{AppError, AppResult};
use crate::store::{json_kind, CommandMap};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One row of the table view: an object with exactly one key.
pub type DisplayEntry = Map<String, Value>;

pub fn to_display_list(commands: &CommandMap) -> Vec<DisplayEntry> {
    commands
        .iter()
        .map(|(key, value)| {
            let mut entry = Map::with_capacity(1);
            entry.insert(key.to_string(), value.clone());
            entry
        })
        .collect()
}

/// Folds table rows back into a mapping, keeping row order.
///
/// Rows must be single-key objects with distinct keys; a repeated key is
/// rejected instead of letting one row silently overwrite another.
pub fn to_mapping(entries: Vec<Value>) -> AppResult<CommandMap> {
    let mut commands = CommandMap::new();
    let mut seen = HashSet::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = match entry {
            Value::Object(entry) => entry,
            other => {
                return Err(AppError::Validation(format!(
                    "row {} must be an object, got {}",
                    index,
                    json_kind(&other)
                )))
            }
        };
        if entry.len() != 1 {
            return Err(AppError::Validation(format!(
                "row {} must have exactly one key, got {}",
                index,
                entry.len()
            )));
        }
        for (key, value) in entry {
            if !seen.insert(key.clone()) {
                return Err(AppError::Validation(format!("duplicate command key '{}' at row {}", key, index)));
            }
            commands.insert(key, value);
        }
    }

    Ok(commands)
}
